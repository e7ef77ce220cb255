//! The relation loader: model-level fetches with batched eager loading.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, warn};

use super::coordinator;
use super::include::{IncludeSpec, normalize};
use crate::config::LoaderConfig;
use crate::error::{QueryError, QueryResult};
use crate::filter::Filter;
use crate::record::{Record, RelationValue};
use crate::schema::Schema;
use crate::traits::{BoxFuture, QueryEngine};

/// A model-level fetch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    /// Which rows to fetch.
    pub filter: Filter,
    /// Relations to attach to the fetched rows.
    pub include: IncludeSpec,
    /// Return the records cached under this relation instead of the rows.
    pub collect: Option<String>,
}

impl FindQuery {
    /// A query matching every row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.filter = filter;
        self
    }

    /// Set the include spec.
    pub fn include(mut self, spec: impl Into<IncludeSpec>) -> Self {
        self.include = spec.into();
        self
    }

    /// Project each row to one of its relations.
    pub fn collect(mut self, relation: impl Into<String>) -> Self {
        self.collect = Some(relation.into());
        self
    }
}

/// Counters for one include call, nested calls included.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IncludeStats {
    /// Include steps resolved.
    pub steps: usize,
    /// Fetches issued to the engine.
    pub fetches: usize,
    /// Relation entries written onto records.
    pub merged: usize,
}

impl IncludeStats {
    pub(crate) fn absorb(&mut self, other: &IncludeStats) {
        self.steps += other.steps;
        self.fetches += other.fetches;
        self.merged += other.merged;
    }
}

/// Resolves relations for records of a [`Schema`] using a [`QueryEngine`].
///
/// A loader holds no per-call state and can serve any number of concurrent
/// calls. Two calls resolving the same relation on overlapping records race
/// on those records' cache entries; callers that need an order must
/// serialize such calls themselves.
#[derive(Debug, Clone)]
pub struct RelationLoader<E> {
    schema: Arc<Schema>,
    engine: E,
    config: LoaderConfig,
}

impl<E: QueryEngine> RelationLoader<E> {
    /// Create a loader with default settings.
    pub fn new(schema: Arc<Schema>, engine: E) -> Self {
        Self {
            schema,
            engine,
            config: LoaderConfig::default(),
        }
    }

    /// Replace the loader settings.
    pub fn with_config(mut self, config: LoaderConfig) -> Self {
        self.config = config;
        self
    }

    /// The schema relations are resolved against.
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// The engine fetches are issued to.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// The loader settings.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Fetch rows of `model`, resolve `query.include` on them and, when
    /// `query.collect` is set, return the collected records instead.
    ///
    /// Rows whose collected relation resolved to nothing are dropped from a
    /// collected result.
    pub async fn find_many(&self, model: &str, query: FindQuery) -> QueryResult<Vec<Record>> {
        if !self.schema.has_model(model) {
            return Err(QueryError::unknown_model(model));
        }

        let FindQuery {
            filter,
            include,
            collect,
        } = query;

        let Some(collect) = collect else {
            let (rows, _) = self.fetch_rows(model, filter, &include).await?;
            return Ok(rows);
        };

        let already_included = normalize(&include)
            .iter()
            .any(|step| step.relation_name == collect);
        let include = if already_included {
            include
        } else {
            IncludeSpec::List(vec![include, IncludeSpec::from(collect.as_str())])
        };

        let (rows, _) = self.fetch_rows(model, filter, &include).await?;
        Ok(project(&rows, &collect))
    }

    /// Resolve `spec` on `records` of `model`, populating their relation
    /// caches in place.
    ///
    /// All-or-nothing: on error nothing is returned, although steps that
    /// completed before the failure keep their merged entries.
    pub async fn include(&self, model: &str, records: &mut [Record], spec: &IncludeSpec) -> QueryResult<()> {
        self.include_with_stats(model, records, spec).await.map(|_| ())
    }

    /// Like [`include`](Self::include), also reporting what was done.
    pub async fn include_with_stats(
        &self,
        model: &str,
        records: &mut [Record],
        spec: &IncludeSpec,
    ) -> QueryResult<IncludeStats> {
        coordinator::resolve(self, model, records, spec).await
    }

    /// The value of relation `name` on `record`.
    ///
    /// Served from the record's cache unless `refresh` is set or nothing is
    /// cached yet; otherwise resolved and cached first.
    pub async fn related(
        &self,
        model: &str,
        record: &mut Record,
        name: &str,
        refresh: bool,
    ) -> QueryResult<RelationValue> {
        if !refresh {
            if let Some(cached) = record.relation(name) {
                return Ok(cached.clone());
            }
        }

        let spec = IncludeSpec::from(name);
        self.include(model, std::slice::from_mut(record), &spec).await?;
        record.relation(name).cloned().ok_or_else(|| {
            QueryError::internal(format!("relation \"{}\" was not cached after resolving", name))
                .with_model(model)
                .with_field(name)
        })
    }

    /// Fetch rows through the engine and resolve `include` on them.
    pub(crate) fn fetch_rows<'a>(
        &'a self,
        model: &'a str,
        filter: Filter,
        include: &'a IncludeSpec,
    ) -> BoxFuture<'a, QueryResult<(Vec<Record>, IncludeStats)>> {
        Box::pin(async move {
            if self.config.log_fetches {
                debug!(model = %model, filter = ?filter, "Fetching records");
            }

            let started = Instant::now();
            let mut rows = self.engine.fetch_many(model, filter).await?;
            let elapsed = started.elapsed();
            if elapsed >= self.config.slow_fetch_threshold {
                warn!(
                    model = %model,
                    rows = rows.len(),
                    elapsed_ms = elapsed.as_millis() as u64,
                    "Slow fetch detected"
                );
            }

            let stats = coordinator::resolve(self, model, &mut rows, include).await?;
            QueryResult::Ok((rows, stats))
        })
    }
}

fn project(rows: &[Record], collect: &str) -> Vec<Record> {
    rows.iter()
        .flat_map(|row| match row.relation(collect) {
            Some(RelationValue::One(target)) => vec![(**target).clone()],
            Some(RelationValue::Many(targets)) => targets.iter().map(|t| (**t).clone()).collect(),
            _ => Vec::new(),
        })
        .collect()
}
