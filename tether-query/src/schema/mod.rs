//! Model definitions and the relation registry they own.
//!
//! A [`Schema`] is built once: models are defined, relations are declared
//! between them (see [`crate::relations`]), and the finished schema is then
//! shared read-only by every [`RelationLoader`](crate::RelationLoader).
//!
//! Property types, validation, and storage mapping are owned by the
//! persistence layer; the schema only tracks property names so that
//! declaring a relation can add its foreign key to the right model.

pub mod error;
pub mod naming;

use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use tracing::debug;

use crate::error::{QueryError, QueryResult};
use crate::record::{Record, RelationValue};
use crate::relations::RelationRegistry;

pub use error::{SchemaError, SchemaResult};

/// A property on a model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Property {
    /// The model this property references, when it is a foreign key.
    pub references: Option<String>,
}

impl Property {
    /// A plain property.
    pub fn new() -> Self {
        Self::default()
    }

    /// A foreign key property referencing `model`.
    pub fn foreign_key(model: impl Into<String>) -> Self {
        Self {
            references: Some(model.into()),
        }
    }

    /// Check if this property is a foreign key.
    pub fn is_foreign_key(&self) -> bool {
        self.references.is_some()
    }
}

/// A model definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDefinition {
    name: String,
    properties: IndexMap<String, Property>,
}

impl ModelDefinition {
    fn new(name: impl Into<String>) -> Self {
        let mut properties = IndexMap::new();
        properties.insert("id".to_string(), Property::new());
        Self {
            name: name.into(),
            properties,
        }
    }

    /// The model name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// All properties in definition order.
    pub fn properties(&self) -> &IndexMap<String, Property> {
        &self.properties
    }

    /// Look up a property.
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    /// Check if a property is defined.
    pub fn has_property(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }
}

/// The set of models and the relations declared between them.
#[derive(Debug, Clone, Default)]
pub struct Schema {
    models: IndexMap<String, ModelDefinition>,
    pub(crate) relations: RelationRegistry,
}

impl Schema {
    /// Create an empty schema.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define a model with the given properties. Every model has an `id`.
    pub fn define<I, S>(&mut self, name: impl Into<String>, properties: I) -> SchemaResult<&ModelDefinition>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = name.into();
        if self.models.contains_key(&name) {
            return Err(SchemaError::duplicate("model", name));
        }

        let mut model = ModelDefinition::new(name.clone());
        for prop in properties {
            model.properties.entry(prop.into()).or_default();
        }
        debug!(model = %name, properties = model.properties.len(), "Model defined");

        Ok(self.models.entry(name).or_insert(model))
    }

    /// Ensure `model` has a foreign key property `key` referencing `target`.
    ///
    /// An existing plain property of the same name is upgraded in place.
    pub fn define_foreign_key(&mut self, model: &str, key: &str, target: &str) -> SchemaResult<()> {
        let definition = self
            .models
            .get_mut(model)
            .ok_or_else(|| SchemaError::unknown_model(model))?;
        definition
            .properties
            .insert(key.to_string(), Property::foreign_key(target));
        debug!(model = %model, key = %key, target = %target, "Foreign key defined");
        Ok(())
    }

    /// Look up a model by exact name.
    pub fn model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models.get(name)
    }

    /// Look up a model by name, ignoring case.
    pub fn lookup_model(&self, name: &str) -> Option<&ModelDefinition> {
        self.models
            .values()
            .find(|m| m.name.eq_ignore_ascii_case(name))
    }

    /// Check if a model is defined.
    pub fn has_model(&self, name: &str) -> bool {
        self.models.contains_key(name)
    }

    /// All models in definition order.
    pub fn models(&self) -> impl Iterator<Item = &ModelDefinition> {
        self.models.values()
    }

    /// The relation registry.
    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    pub(crate) fn require_model(&self, name: &str) -> SchemaResult<&ModelDefinition> {
        self.models
            .get(name)
            .ok_or_else(|| SchemaError::unknown_model(name))
    }

    /// Build a record of `model` from a JSON object.
    ///
    /// Declared properties are stored as attributes. Any other key naming a
    /// declared relation is not: the nested object is cached as the
    /// relation's value and, for a relation with a single owning key, that
    /// key is copied from the nested object.
    pub fn build_record(&self, model: &str, data: Value) -> QueryResult<Record> {
        let definition = self
            .model(model)
            .ok_or_else(|| QueryError::unknown_model(model))?;
        let Value::Object(map) = data else {
            return Err(QueryError::deserialization(format!(
                "expected a JSON object for a {} record",
                model
            )));
        };

        let mut record = Record::default();
        for (key, value) in map {
            if definition.has_property(&key) {
                record.set(key, value);
                continue;
            }
            match self.relations.lookup(model, &key) {
                Some(relation) if !relation.multiple => {
                    let related = Record::from_json(value)?;
                    let key_value = related.get(&relation.key_to).cloned().unwrap_or(Value::Null);
                    record.set(relation.key_from.clone(), key_value);
                    record.set_relation(key, RelationValue::One(Arc::new(related)));
                }
                Some(_) => {
                    let related = match value {
                        Value::Array(items) => items
                            .into_iter()
                            .map(|item| Record::from_json(item).map(Arc::new))
                            .collect::<QueryResult<Vec<_>>>()?,
                        other => {
                            return Err(QueryError::deserialization(format!(
                                "expected an array for relation \"{}\", got {}",
                                key, other
                            )));
                        }
                    };
                    record.set_relation(key, RelationValue::Many(related));
                }
                None => record.set(key, value),
            }
        }
        Ok(record)
    }

    /// Point a belongsTo relation of `record` at `target`.
    ///
    /// Writes the foreign key from the target and caches the target.
    pub fn assign_related(
        &self,
        model: &str,
        record: &mut Record,
        relation: &str,
        target: Record,
    ) -> QueryResult<()> {
        let descriptor = self
            .relations
            .lookup(model, relation)
            .ok_or_else(|| QueryError::undefined_relation(model, relation))?;
        if descriptor.multiple {
            return Err(QueryError::invalid_include(format!(
                "\"{}\" on {} is a plural relation and cannot be assigned a single record",
                relation, model
            ))
            .with_model(model)
            .with_field(relation));
        }

        let key_value = target.get(&descriptor.key_to).cloned().unwrap_or(Value::Null);
        record.set(descriptor.key_from.clone(), key_value);
        record.set_relation(relation, RelationValue::One(Arc::new(target)));
        Ok(())
    }
}
