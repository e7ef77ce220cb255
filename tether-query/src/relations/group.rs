//! Grouping source records by owning key.
//!
//! Key values are compared by their string form, so `10` and `"10"` land in
//! the same group. Which values are left out of the fetch predicate is
//! decided by [`KeyMode`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::trace;

use crate::filter::FilterValue;
use crate::record::Record;

/// How absent owning keys are recognised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyMode {
    /// Any key whose string form is `"null"` or `"undefined"` is excluded,
    /// including string values spelled that way.
    #[default]
    Legacy,
    /// Only real nulls and missing attributes are excluded.
    Typed,
}

/// String form of an owning-key value.
pub fn key_string(value: Option<&Value>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(Value::Null) => "null".to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Number(n)) => n.to_string(),
        Some(other) => other.to_string(),
    }
}

/// Source records sharing one key value.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyEntry {
    /// First value seen for this key; sent in the predicate.
    pub value: Value,
    /// Positions of the owning records in the source slice.
    pub indices: Vec<usize>,
    requested: bool,
}

impl KeyEntry {
    /// Check if this key is part of the fetch predicate.
    pub fn is_requested(&self) -> bool {
        self.requested
    }
}

/// Source records of one relation step grouped by owning key.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeyGroup {
    entries: IndexMap<String, KeyEntry>,
    unkeyed: Vec<usize>,
}

impl KeyGroup {
    /// Group `records` by the value of `key`.
    pub fn build(records: &[Record], key: &str, mode: KeyMode) -> Self {
        let mut group = Self::default();

        for (index, record) in records.iter().enumerate() {
            let value = record.get(key);
            if mode == KeyMode::Typed && matches!(value, None | Some(Value::Null)) {
                group.unkeyed.push(index);
                continue;
            }

            let key_str = key_string(value);
            let requested = match mode {
                KeyMode::Legacy => key_str != "null" && key_str != "undefined",
                KeyMode::Typed => true,
            };
            group
                .entries
                .entry(key_str)
                .or_insert_with(|| KeyEntry {
                    value: value.cloned().unwrap_or(Value::Null),
                    indices: Vec::new(),
                    requested,
                })
                .indices
                .push(index);
        }

        trace!(
            key = %key,
            records = records.len(),
            keys = group.entries.len(),
            requested = group.len(),
            "Key group built"
        );
        group
    }

    /// Values for the membership predicate, deduplicated.
    pub fn predicate_values(&self) -> Vec<FilterValue> {
        self.entries
            .values()
            .filter(|e| e.requested)
            .map(|e| FilterValue::from(&e.value))
            .collect()
    }

    /// Look up a requested key.
    pub fn lookup(&self, key: &str) -> Option<&KeyEntry> {
        self.entries.get(key).filter(|e| e.requested)
    }

    /// All keyed entries, requested or not.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &KeyEntry)> {
        self.entries.iter().map(|(k, e)| (k.as_str(), e))
    }

    /// Positions of records with no key value at all.
    pub fn unkeyed(&self) -> &[usize] {
        &self.unkeyed
    }

    /// Number of requested keys.
    pub fn len(&self) -> usize {
        self.entries.values().filter(|e| e.requested).count()
    }

    /// Check if there is nothing to fetch.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
