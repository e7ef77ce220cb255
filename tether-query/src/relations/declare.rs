//! Relation declaration API.
//!
//! Declaring a relation builds its [`RelationDescriptor`], registers it on
//! the schema, and defines the foreign key property on whichever model owns
//! it.
//!
//! ```rust
//! use tether_query::relations::{BelongsToOptions, HasManyOptions};
//! use tether_query::Schema;
//!
//! let mut schema = Schema::new();
//! schema.define("Book", ["title"]).unwrap();
//! schema.define("Chapter", ["title"]).unwrap();
//!
//! let chapters = schema.has_many("Book", "Chapter", HasManyOptions::new()).unwrap();
//! assert_eq!(chapters.name, "chapters");
//! assert_eq!(chapters.key_to, "bookId");
//!
//! let book = schema.belongs_to("Chapter", "Book", BelongsToOptions::new()).unwrap();
//! assert_eq!(book.key_from, "bookId");
//! ```

use std::sync::Arc;

use tracing::debug;

use super::spec::{RelationDescriptor, RelationKind, ThroughSpec};
use crate::schema::naming::{camel, foreign_key_for, plural_relation_name, singularize};
use crate::schema::{Schema, SchemaError, SchemaResult};

/// Target of a relation declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RelationTarget {
    /// A model name; the relation name is derived from it.
    Model(String),
    /// A relation name; the model is given by the options or derived from
    /// the singular form of the name.
    Named(String),
}

impl RelationTarget {
    /// A short-form target naming the relation.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named(name.into())
    }
}

impl From<&str> for RelationTarget {
    fn from(model: &str) -> Self {
        Self::Model(model.to_string())
    }
}

impl From<String> for RelationTarget {
    fn from(model: String) -> Self {
        Self::Model(model)
    }
}

/// Options for [`Schema::has_many`].
#[derive(Debug, Clone, Default)]
pub struct HasManyOptions {
    alias: Option<String>,
    foreign_key: Option<String>,
    through: Option<String>,
    through_foreign_key: Option<String>,
    through_as: Option<String>,
    model: Option<String>,
}

impl HasManyOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Key on the target (or join) model referencing the declaring model.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Join model.
    pub fn through(mut self, model: impl Into<String>) -> Self {
        self.through = Some(model.into());
        self
    }

    /// Key on the join model referencing the target model.
    pub fn through_foreign_key(mut self, key: impl Into<String>) -> Self {
        self.through_foreign_key = Some(key.into());
        self
    }

    /// Relation on the join model that yields the target.
    pub fn through_as(mut self, name: impl Into<String>) -> Self {
        self.through_as = Some(name.into());
        self
    }

    /// Target model for a short-form declaration.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Options for [`Schema::belongs_to`].
#[derive(Debug, Clone, Default)]
pub struct BelongsToOptions {
    alias: Option<String>,
    foreign_key: Option<String>,
    model: Option<String>,
}

impl BelongsToOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Key on the declaring model referencing the target.
    pub fn foreign_key(mut self, key: impl Into<String>) -> Self {
        self.foreign_key = Some(key.into());
        self
    }

    /// Target model for a short-form declaration.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

/// Options for [`Schema::has_and_belongs_to_many`].
#[derive(Debug, Clone, Default)]
pub struct HabtmOptions {
    alias: Option<String>,
    through: Option<String>,
    model: Option<String>,
}

impl HabtmOptions {
    /// Create default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relation name.
    pub fn alias(mut self, name: impl Into<String>) -> Self {
        self.alias = Some(name.into());
        self
    }

    /// Join model to use instead of the derived one.
    pub fn through(mut self, model: impl Into<String>) -> Self {
        self.through = Some(model.into());
        self
    }

    /// Target model for a short-form declaration.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }
}

impl Schema {
    /// Declare a one-to-many relation from `model` to `target`.
    pub fn has_many(
        &mut self,
        model: &str,
        target: impl Into<RelationTarget>,
        opts: HasManyOptions,
    ) -> SchemaResult<Arc<RelationDescriptor>> {
        self.require_model(model)?;
        let (name, model_to) = self.resolve_target(model, target.into(), opts.alias, opts.model)?;
        let foreign_key = opts.foreign_key.unwrap_or_else(|| foreign_key_for(model));

        let through = match opts.through {
            Some(join) => {
                self.require_model(&join)?;
                Some(ThroughSpec {
                    model: join,
                    key_through: opts
                        .through_foreign_key
                        .unwrap_or_else(|| foreign_key_for(&model_to)),
                    collect: opts.through_as.unwrap_or_else(|| camel(&model_to)),
                })
            }
            None => {
                self.define_foreign_key(&model_to, &foreign_key, model)?;
                None
            }
        };

        Ok(self.register(RelationDescriptor {
            name,
            kind: RelationKind::HasMany,
            model_from: model.to_string(),
            key_from: "id".to_string(),
            key_to: foreign_key,
            model_to,
            multiple: true,
            through,
        }))
    }

    /// Declare that `model` references one `target` record.
    pub fn belongs_to(
        &mut self,
        model: &str,
        target: impl Into<RelationTarget>,
        opts: BelongsToOptions,
    ) -> SchemaResult<Arc<RelationDescriptor>> {
        self.require_model(model)?;
        let (name, model_to) = match target.into() {
            RelationTarget::Model(target) => {
                let name = opts.alias.unwrap_or_else(|| camel(&target));
                (name, target)
            }
            short => self.resolve_target(model, short, opts.alias, opts.model)?,
        };
        self.require_model(&model_to)?;

        let foreign_key = opts.foreign_key.unwrap_or_else(|| format!("{}Id", name));
        self.define_foreign_key(model, &foreign_key, &model_to)?;

        Ok(self.register(RelationDescriptor {
            name,
            kind: RelationKind::BelongsTo,
            model_from: model.to_string(),
            key_from: foreign_key,
            key_to: "id".to_string(),
            model_to,
            multiple: false,
            through: None,
        }))
    }

    /// Declare a many-to-many relation through a join model.
    ///
    /// The join model is `opts.through` if given, otherwise an existing model
    /// named `<Model><Target>` or `<Target><Model>` (compared ignoring case),
    /// otherwise a new `<Model><Target>` model.
    pub fn has_and_belongs_to_many(
        &mut self,
        model: &str,
        target: impl Into<RelationTarget>,
        opts: HabtmOptions,
    ) -> SchemaResult<Arc<RelationDescriptor>> {
        self.require_model(model)?;
        let (name, model_to) = self.resolve_target(model, target.into(), opts.alias, opts.model)?;

        let join = match opts.through {
            Some(join) => {
                self.require_model(&join)?;
                join
            }
            None => self.join_model(model, &model_to)?,
        };

        let from_side = self.belongs_to(&join, model, BelongsToOptions::new())?;
        let to_side = self.belongs_to(&join, model_to.as_str(), BelongsToOptions::new())?;

        let through = ThroughSpec {
            model: join,
            key_through: to_side.key_from.clone(),
            collect: to_side.name.clone(),
        };

        Ok(self.register(RelationDescriptor {
            name,
            kind: RelationKind::HasAndBelongsToMany,
            model_from: model.to_string(),
            key_from: "id".to_string(),
            key_to: from_side.key_from.clone(),
            model_to,
            multiple: true,
            through: Some(through),
        }))
    }

    /// Find or create the join model between `a` and `b`.
    fn join_model(&mut self, a: &str, b: &str) -> SchemaResult<String> {
        let forward = format!("{}{}", a, b);
        let backward = format!("{}{}", b, a);

        let existing = self
            .lookup_model(&forward)
            .or_else(|| self.lookup_model(&backward))
            .map(|m| m.name().to_string());
        if let Some(name) = existing {
            return Ok(name);
        }

        self.define(forward.clone(), Vec::<String>::new())?;
        debug!(join = %forward, "Join model created");
        Ok(forward)
    }

    /// Resolve the relation name and target model of a declaration.
    fn resolve_target(
        &self,
        model: &str,
        target: RelationTarget,
        alias: Option<String>,
        explicit_model: Option<String>,
    ) -> SchemaResult<(String, String)> {
        match target {
            RelationTarget::Model(target) => {
                self.require_model(&target)?;
                let name = alias.unwrap_or_else(|| plural_relation_name(&target));
                Ok((name, target))
            }
            RelationTarget::Named(name) => {
                let resolved = match explicit_model {
                    Some(explicit) => self.model(&explicit),
                    None => self.lookup_model(&singularize(&name)),
                };
                let target = resolved
                    .map(|m| m.name().to_string())
                    .ok_or_else(|| SchemaError::unresolved_target(model, name.clone()))?;
                Ok((alias.unwrap_or(name), target))
            }
        }
    }

    fn register(&mut self, descriptor: RelationDescriptor) -> Arc<RelationDescriptor> {
        debug!(
            model = %descriptor.model_from,
            relation = %descriptor.name,
            kind = %descriptor.kind,
            target = %descriptor.model_to,
            "Relation declared"
        );
        self.relations.declare(descriptor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn library() -> Schema {
        let mut schema = Schema::new();
        for model in ["Book", "Chapter", "Author", "Reader", "Article", "Tag"] {
            schema.define(model, ["name"]).unwrap();
        }
        schema
    }

    #[test]
    fn test_has_many_defaults() {
        let mut schema = library();
        let rel = schema.has_many("Book", "Chapter", HasManyOptions::new()).unwrap();

        assert_eq!(rel.name, "chapters");
        assert_eq!(rel.kind, RelationKind::HasMany);
        assert_eq!(rel.key_from, "id");
        assert_eq!(rel.key_to, "bookId");
        assert_eq!(rel.model_to, "Chapter");
        assert!(rel.multiple);
        assert!(rel.through.is_none());

        let fk = schema.model("Chapter").and_then(|m| m.property("bookId")).cloned();
        assert_eq!(fk.and_then(|p| p.references), Some("Book".to_string()));
    }

    #[test]
    fn test_has_many_options() {
        let mut schema = library();
        let rel = schema
            .has_many(
                "Author",
                "Book",
                HasManyOptions::new().alias("works").foreign_key("writerId"),
            )
            .unwrap();

        assert_eq!(rel.name, "works");
        assert_eq!(rel.key_to, "writerId");
        assert!(schema.relations().lookup("Author", "works").is_some());
    }

    #[test]
    fn test_belongs_to_defaults() {
        let mut schema = library();
        let rel = schema.belongs_to("Book", "Author", BelongsToOptions::new()).unwrap();

        assert_eq!(rel.name, "author");
        assert_eq!(rel.key_from, "authorId");
        assert_eq!(rel.key_to, "id");
        assert!(!rel.multiple);
        assert!(schema.model("Book").is_some_and(|m| m.has_property("authorId")));
        assert_eq!(schema.relations().relation_name_for("Book", "authorId"), Some("author"));
    }

    #[test]
    fn test_short_form_resolves_singular_model() {
        let mut schema = library();
        let rel = schema
            .has_many("Book", RelationTarget::named("readers"), HasManyOptions::new())
            .unwrap();

        assert_eq!(rel.name, "readers");
        assert_eq!(rel.model_to, "Reader");
    }

    #[test]
    fn test_short_form_with_explicit_model() {
        let mut schema = library();
        let rel = schema
            .has_many(
                "Author",
                RelationTarget::named("works"),
                HasManyOptions::new().model("Book"),
            )
            .unwrap();
        assert_eq!(rel.model_to, "Book");
        assert_eq!(rel.key_to, "authorId");
    }

    #[test]
    fn test_short_form_unresolved() {
        let mut schema = library();
        let err = schema
            .has_many("Book", RelationTarget::named("ghosts"), HasManyOptions::new())
            .unwrap_err();
        assert_eq!(err.to_string(), "could not find \"ghosts\" relation for Book");
    }

    #[test]
    fn test_unknown_declaring_model() {
        let mut schema = library();
        assert!(matches!(
            schema.belongs_to("Ghost", "Author", BelongsToOptions::new()),
            Err(SchemaError::UnknownModel { .. })
        ));
    }

    #[test]
    fn test_has_many_through_does_not_define_fk_on_target() {
        let mut schema = library();
        schema.define("BookReader", Vec::<String>::new()).unwrap();
        let rel = schema
            .has_many("Book", "Reader", HasManyOptions::new().through("BookReader"))
            .unwrap();

        let through = rel.through.clone().unwrap();
        assert_eq!(through.model, "BookReader");
        assert_eq!(through.key_through, "readerId");
        assert_eq!(through.collect, "reader");
        assert!(!schema.model("Reader").is_some_and(|m| m.has_property("bookId")));
    }

    #[test]
    fn test_habtm_creates_join_model() {
        let mut schema = library();
        let rel = schema
            .has_and_belongs_to_many("Article", "Tag", HabtmOptions::new())
            .unwrap();

        assert_eq!(rel.kind, RelationKind::HasAndBelongsToMany);
        assert_eq!(rel.name, "tags");
        assert_eq!(rel.key_to, "articleId");
        let through = rel.through.clone().unwrap();
        assert_eq!(through.model, "ArticleTag");
        assert_eq!(through.key_through, "tagId");
        assert_eq!(through.collect, "tag");

        let relations = schema.relations();
        assert!(relations.lookup("ArticleTag", "article").is_some());
        assert!(relations.lookup("ArticleTag", "tag").is_some());
    }

    #[test]
    fn test_habtm_reuses_reversed_join_model() {
        let mut schema = library();
        schema.define("tagarticle", Vec::<String>::new()).unwrap();
        let rel = schema
            .has_and_belongs_to_many("Article", "Tag", HabtmOptions::new())
            .unwrap();

        assert_eq!(rel.through.as_ref().map(|t| t.model.as_str()), Some("tagarticle"));
        assert!(!schema.has_model("ArticleTag"));
    }

    #[test]
    fn test_habtm_short_form() {
        let mut schema = library();
        let rel = schema
            .has_and_belongs_to_many("Article", RelationTarget::named("tags"), HabtmOptions::new())
            .unwrap();
        assert_eq!(rel.model_to, "Tag");
    }
}
