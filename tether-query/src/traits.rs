//! Core traits for the query engine seam.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use crate::error::QueryResult;
use crate::filter::Filter;
use crate::record::Record;

/// A boxed future, used so engines can be called through recursion.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// The persistence collaborator: fetches the rows of one model matching a
/// filter.
///
/// Engines never see include specs; nested relations are resolved by the
/// loader on top of the rows an engine returns. Engines must support
/// [`Filter::In`], which is the only predicate the loader issues.
pub trait QueryEngine: Send + Sync {
    /// Fetch every row of `model` matching `filter`.
    fn fetch_many(&self, model: &str, filter: Filter) -> BoxFuture<'_, QueryResult<Vec<Record>>>;
}

impl<E: QueryEngine + ?Sized> QueryEngine for Arc<E> {
    fn fetch_many(&self, model: &str, filter: Filter) -> BoxFuture<'_, QueryResult<Vec<Record>>> {
        (**self).fetch_many(model, filter)
    }
}

impl<E: QueryEngine + ?Sized> QueryEngine for &E {
    fn fetch_many(&self, model: &str, filter: Filter) -> BoxFuture<'_, QueryResult<Vec<Record>>> {
        (**self).fetch_many(model, filter)
    }
}
