//! Relation descriptors and the registry that owns them.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

/// Kind of relation between models.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// The target model holds a key referencing this model (Book has many Chapters).
    HasMany,
    /// This model holds a key referencing the target (Post belongs to User).
    BelongsTo,
    /// Many-to-many through a join model (Article has and belongs to many Tags).
    HasAndBelongsToMany,
}

impl RelationKind {
    /// Name used in logs and error messages.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::HasMany => "hasMany",
            Self::BelongsTo => "belongsTo",
            Self::HasAndBelongsToMany => "hasAndBelongsToMany",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The join side of a relation declared with a through model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThroughSpec {
    /// The join model.
    pub model: String,
    /// Key on the join model referencing the target model.
    pub key_through: String,
    /// belongsTo relation on the join model that yields the target entity.
    pub collect: String,
}

/// Everything the loader needs to resolve one relation.
///
/// For a through relation, `key_to` lives on the join model and the fetch
/// targets [`ThroughSpec::model`]; `model_to` stays the final entity model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationDescriptor {
    /// Relation name on the declaring model.
    pub name: String,
    /// Kind of relation.
    pub kind: RelationKind,
    /// The declaring model.
    pub model_from: String,
    /// Owning key, read from the source records.
    pub key_from: String,
    /// Target key, matched against `key_from` values.
    pub key_to: String,
    /// The related model.
    pub model_to: String,
    /// Whether the relation yields a list.
    pub multiple: bool,
    /// Join model for many-to-many relations.
    pub through: Option<ThroughSpec>,
}

impl RelationDescriptor {
    /// The model whose rows are fetched to resolve this relation.
    pub fn fetch_model(&self) -> &str {
        match &self.through {
            Some(through) => &through.model,
            None => &self.model_to,
        }
    }

    /// Check if this relation goes through a join model.
    pub fn is_through(&self) -> bool {
        self.through.is_some()
    }
}

/// Per-model mapping from relation name to descriptor, keyed by `(model, name)`.
#[derive(Debug, Clone, Default)]
pub struct RelationRegistry {
    relations: HashMap<String, IndexMap<String, Arc<RelationDescriptor>>>,
}

impl RelationRegistry {
    /// Create a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a descriptor under its declaring model and name.
    ///
    /// Declaring the same name twice replaces the earlier descriptor.
    pub fn declare(&mut self, descriptor: RelationDescriptor) -> Arc<RelationDescriptor> {
        let descriptor = Arc::new(descriptor);
        self.relations
            .entry(descriptor.model_from.clone())
            .or_default()
            .insert(descriptor.name.clone(), Arc::clone(&descriptor));
        descriptor
    }

    /// Look up a relation by model and name.
    pub fn lookup(&self, model: &str, name: &str) -> Option<&Arc<RelationDescriptor>> {
        self.relations.get(model).and_then(|r| r.get(name))
    }

    /// All relations of a model in declaration order.
    pub fn relations_of(&self, model: &str) -> impl Iterator<Item = &Arc<RelationDescriptor>> {
        self.relations.get(model).into_iter().flat_map(|r| r.values())
    }

    /// Name of the belongsTo relation on `model` owning `foreign_key`.
    pub fn relation_name_for(&self, model: &str, foreign_key: &str) -> Option<&str> {
        self.relations_of(model)
            .find(|r| r.kind == RelationKind::BelongsTo && r.key_from == foreign_key)
            .map(|r| r.name.as_str())
    }

    /// Total number of declared relations.
    pub fn len(&self) -> usize {
        self.relations.values().map(IndexMap::len).sum()
    }

    /// Check if no relation is declared.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
