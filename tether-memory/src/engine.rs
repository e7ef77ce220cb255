//! In-memory query engine.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::{debug, instrument};

use tether_query::error::QueryResult;
use tether_query::filter::Filter;
use tether_query::record::Record;
use tether_query::relations::key_string;
use tether_query::traits::{BoxFuture, QueryEngine};

use crate::error::{MemoryError, MemoryResult};

/// One fetch received by the engine.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchLogEntry {
    /// Model fetched.
    pub model: String,
    /// Filter as received.
    pub filter: Filter,
}

#[derive(Debug, Default)]
struct Table {
    rows: IndexMap<String, Map<String, Value>>,
    next_id: i64,
}

#[derive(Debug, Default)]
struct Store {
    tables: HashMap<String, Table>,
    log: Vec<FetchLogEntry>,
    failures: HashMap<String, String>,
    delays: HashMap<String, Duration>,
}

/// A query engine over rows held in memory.
///
/// Clones share the same store. Every fetch is recorded in a log, and
/// failures or delays can be injected per model.
#[derive(Debug, Clone, Default)]
pub struct MemoryEngine {
    store: Arc<RwLock<Store>>,
}

impl MemoryEngine {
    /// Create an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a row, assigning an integer `id` when it has none.
    pub fn insert(&self, model: &str, row: Value) -> MemoryResult<Record> {
        let Value::Object(mut data) = row else {
            return Err(MemoryError::NotAnObject {
                model: model.to_string(),
            });
        };

        let mut store = self.store.write();
        let table = store.tables.entry(model.to_string()).or_default();

        match data.get("id") {
            None | Some(Value::Null) => {
                table.next_id += 1;
                data.insert("id".to_string(), Value::from(table.next_id));
            }
            Some(Value::Number(n)) => {
                if let Some(id) = n.as_i64() {
                    table.next_id = table.next_id.max(id);
                }
            }
            Some(_) => {}
        }

        let id = key_string(data.get("id"));
        if table.rows.contains_key(&id) {
            return Err(MemoryError::DuplicateId {
                model: model.to_string(),
                id,
            });
        }
        table.rows.insert(id, data.clone());
        Ok(Record::new(data))
    }

    /// Insert several rows in order.
    pub fn insert_many(&self, model: &str, rows: impl IntoIterator<Item = Value>) -> MemoryResult<Vec<Record>> {
        rows.into_iter().map(|row| self.insert(model, row)).collect()
    }

    /// Number of rows stored for `model`.
    pub fn len(&self, model: &str) -> usize {
        self.store.read().tables.get(model).map_or(0, |t| t.rows.len())
    }

    /// Make every fetch of `model` fail with `message`.
    pub fn fail_on(&self, model: &str, message: impl Into<String>) {
        self.store.write().failures.insert(model.to_string(), message.into());
    }

    /// Delay every fetch of `model` by `delay`.
    pub fn delay_on(&self, model: &str, delay: Duration) {
        self.store.write().delays.insert(model.to_string(), delay);
    }

    /// All fetches received so far.
    pub fn fetch_log(&self) -> Vec<FetchLogEntry> {
        self.store.read().log.clone()
    }

    /// Number of fetches received so far.
    pub fn fetch_count(&self) -> usize {
        self.store.read().log.len()
    }

    /// Number of fetches of `model` received so far.
    pub fn fetch_count_for(&self, model: &str) -> usize {
        self.store.read().log.iter().filter(|e| e.model == model).count()
    }

    /// Forget the fetch log.
    pub fn clear_log(&self) {
        self.store.write().log.clear();
    }

    fn select(&self, model: &str, filter: &Filter) -> MemoryResult<Vec<Record>> {
        let store = self.store.read();
        if let Some(message) = store.failures.get(model) {
            return Err(MemoryError::Injected {
                model: model.to_string(),
                message: message.clone(),
            });
        }

        let rows = store
            .tables
            .get(model)
            .map(|table| {
                table
                    .rows
                    .values()
                    .filter(|row| filter.matches(row))
                    .map(|row| Record::new(row.clone()))
                    .collect()
            })
            .unwrap_or_default();
        Ok(rows)
    }
}

impl QueryEngine for MemoryEngine {
    #[instrument(skip_all, fields(model = %model))]
    fn fetch_many(&self, model: &str, filter: Filter) -> BoxFuture<'_, QueryResult<Vec<Record>>> {
        let model = model.to_string();
        let delay = {
            let mut store = self.store.write();
            store.log.push(FetchLogEntry {
                model: model.clone(),
                filter: filter.clone(),
            });
            store.delays.get(&model).copied()
        };

        Box::pin(async move {
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let rows = self.select(&model, &filter)?;
            debug!(model = %model, rows = rows.len(), "Fetched rows");
            QueryResult::Ok(rows)
        })
    }
}
