//! Records and their per-record relation caches.
//!
//! A [`Record`] is a loaded row: its attributes plus a [`RelationCache`]
//! holding the relations that have been resolved for it. A relation name
//! absent from the cache is "not yet resolved"; [`RelationValue::NotFound`]
//! is the resolved-but-empty value of a singular relation.
//!
//! ```rust
//! use serde_json::json;
//! use tether_query::{Record, RelationValue};
//!
//! let mut post = Record::from_json(json!({"id": 1, "authorId": null})).unwrap();
//! assert!(post.relation("author").is_none());
//!
//! post.set_relation("author", RelationValue::NotFound);
//! assert!(post.relation("author").unwrap().is_not_found());
//! ```

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::{Map, Value};

use crate::error::{QueryError, QueryResult};

/// The resolved value of one relation on one record.
#[derive(Debug, Clone, PartialEq)]
pub enum RelationValue {
    /// A singular relation that matched a record.
    One(Arc<Record>),
    /// A plural relation; possibly empty.
    Many(Vec<Arc<Record>>),
    /// A singular relation that matched nothing.
    NotFound,
}

impl RelationValue {
    /// The empty default for a relation of the given multiplicity.
    pub fn empty(multiple: bool) -> Self {
        if multiple { Self::Many(Vec::new()) } else { Self::NotFound }
    }

    /// Check if this is the singular "not found" marker.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    /// Get the single related record, if any.
    pub fn as_one(&self) -> Option<&Record> {
        match self {
            Self::One(record) => Some(record),
            _ => None,
        }
    }

    /// Get the related records of a plural relation.
    pub fn as_many(&self) -> Option<&[Arc<Record>]> {
        match self {
            Self::Many(records) => Some(records),
            _ => None,
        }
    }

    /// Number of related records held.
    pub fn len(&self) -> usize {
        match self {
            Self::One(_) => 1,
            Self::Many(records) => records.len(),
            Self::NotFound => 0,
        }
    }

    /// Check if no related record is held.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Convert to JSON, recursing into the related records' caches.
    pub fn to_json(&self, with_relations: bool) -> Value {
        match self {
            Self::One(record) => record.to_json(with_relations),
            Self::Many(records) => {
                Value::Array(records.iter().map(|r| r.to_json(with_relations)).collect())
            }
            Self::NotFound => Value::Null,
        }
    }
}

/// Per-record mapping from relation name to its resolved value.
pub type RelationCache = IndexMap<String, RelationValue>;

/// A loaded record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    data: Map<String, Value>,
    relations: RelationCache,
}

impl Record {
    /// Create a record from an attribute map.
    pub fn new(data: Map<String, Value>) -> Self {
        Self {
            data,
            relations: RelationCache::new(),
        }
    }

    /// Create a record from a JSON object.
    pub fn from_json(value: Value) -> QueryResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::new(map)),
            other => Err(QueryError::deserialization(format!(
                "expected a JSON object for a record, got {}",
                other
            ))),
        }
    }

    /// Get an attribute value.
    pub fn get(&self, attr: &str) -> Option<&Value> {
        self.data.get(attr)
    }

    /// Set an attribute value.
    pub fn set(&mut self, attr: impl Into<String>, value: Value) {
        self.data.insert(attr.into(), value);
    }

    /// All attributes.
    pub fn data(&self) -> &Map<String, Value> {
        &self.data
    }

    /// Get a cached relation value.
    pub fn relation(&self, name: &str) -> Option<&RelationValue> {
        self.relations.get(name)
    }

    /// Check if a relation has been resolved for this record.
    pub fn has_relation(&self, name: &str) -> bool {
        self.relations.contains_key(name)
    }

    /// Store a relation value, replacing any previous value.
    pub fn set_relation(&mut self, name: impl Into<String>, value: RelationValue) {
        self.relations.insert(name.into(), value);
    }

    /// Forget a cached relation.
    pub fn clear_relation(&mut self, name: &str) -> Option<RelationValue> {
        self.relations.shift_remove(name)
    }

    /// The full relation cache.
    pub fn relations(&self) -> &RelationCache {
        &self.relations
    }

    /// Canonical JSON object for this record.
    ///
    /// With `with_relations`, cached relations are emitted under their names
    /// unless an attribute already uses that name.
    pub fn to_json(&self, with_relations: bool) -> Value {
        let mut out = self.data.clone();
        if with_relations {
            for (name, value) in &self.relations {
                if !out.contains_key(name) {
                    out.insert(name.clone(), value.to_json(true));
                }
            }
        }
        Value::Object(out)
    }
}

impl From<Map<String, Value>> for Record {
    fn from(data: Map<String, Value>) -> Self {
        Self::new(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(value: Value) -> Record {
        Record::from_json(value).unwrap()
    }

    #[test]
    fn test_empty_defaults() {
        assert_eq!(RelationValue::empty(true), RelationValue::Many(Vec::new()));
        assert!(RelationValue::empty(false).is_not_found());
    }

    #[test]
    fn test_from_json_rejects_non_objects() {
        assert!(Record::from_json(json!([1, 2])).is_err());
    }

    #[test]
    fn test_set_relation_overwrites() {
        let mut user = record(json!({"id": 1}));
        let post = Arc::new(record(json!({"id": 5})));
        user.set_relation("posts", RelationValue::Many(vec![post.clone(), post.clone()]));
        user.set_relation("posts", RelationValue::Many(vec![post]));
        assert_eq!(user.relation("posts").map(RelationValue::len), Some(1));
    }

    #[test]
    fn test_to_json_with_relations() {
        let mut post = record(json!({"id": 1, "authorId": 10}));
        let author = Arc::new(record(json!({"id": 10, "name": "A"})));
        post.set_relation("author", RelationValue::One(author));
        post.set_relation("tags", RelationValue::Many(Vec::new()));
        post.set_relation("editor", RelationValue::NotFound);

        assert_eq!(
            post.to_json(true),
            json!({
                "id": 1,
                "authorId": 10,
                "author": {"id": 10, "name": "A"},
                "tags": [],
                "editor": null
            })
        );
        assert_eq!(post.to_json(false), json!({"id": 1, "authorId": 10}));
    }

    #[test]
    fn test_attribute_shadows_relation_in_json() {
        let mut rec = record(json!({"id": 1, "owner": "me"}));
        rec.set_relation("owner", RelationValue::NotFound);
        assert_eq!(rec.to_json(true), json!({"id": 1, "owner": "me"}));
    }

    #[test]
    fn test_clear_relation() {
        let mut rec = record(json!({"id": 1}));
        rec.set_relation("owner", RelationValue::NotFound);
        assert!(rec.clear_relation("owner").is_some());
        assert!(!rec.has_relation("owner"));
    }
}
