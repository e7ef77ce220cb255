//! # tether-query
//!
//! Relation registry and batched eager loading for Tether.
//!
//! This crate provides:
//! - Model definitions and relation declarations (`has_many`, `belongs_to`,
//!   `has_and_belongs_to_many`)
//! - Records with per-record relation caches
//! - Include specs in any nesting of names, lists and mappings
//! - A loader that resolves each include step with a single batched fetch
//! - The [`QueryEngine`] seam a persistence layer implements
//!
//! ## Declaring relations
//!
//! ```rust
//! use tether_query::prelude::*;
//!
//! let mut schema = Schema::new();
//! schema.define("User", ["name"]).unwrap();
//! schema.define("Post", ["title"]).unwrap();
//! schema.has_many("User", "Post", HasManyOptions::new()).unwrap();
//! schema.belongs_to("Post", "User", BelongsToOptions::new().alias("author")).unwrap();
//!
//! let author = schema.relations().lookup("Post", "author").unwrap();
//! assert_eq!(author.key_from, "authorId");
//! ```
//!
//! ## Include specs
//!
//! ```rust
//! use tether_query::{IncludeSpec, normalize};
//!
//! let spec = IncludeSpec::from(vec![
//!     IncludeSpec::from("author"),
//!     IncludeSpec::nested("comments", "author"),
//! ]);
//! let names: Vec<_> = normalize(&spec).into_iter().map(|s| s.relation_name).collect();
//! assert_eq!(names, ["author", "comments"]);
//! ```
//!
//! ## Filters
//!
//! The loader only issues set-membership filters, which every engine must
//! support:
//!
//! ```rust
//! use tether_query::{Filter, FilterValue};
//!
//! let filter = Filter::member_of("id", [FilterValue::Int(10), FilterValue::Int(11)]);
//! assert_eq!(filter.membership_values("id").map(<[_]>::len), Some(2));
//! ```

pub mod config;
pub mod error;
pub mod filter;
pub mod logging;
pub mod record;
pub mod relations;
pub mod schema;
pub mod traits;

pub use config::{LoaderConfig, TetherConfig};
pub use error::{ErrorCode, ErrorContext, QueryError, QueryResult, Suggestion};
pub use filter::{Filter, FilterValue};
pub use record::{Record, RelationCache, RelationValue};
pub use relations::{
    BelongsToOptions, FindQuery, HabtmOptions, HasManyOptions, IncludeSpec, IncludeStats,
    IncludeStep, KeyMode, RelationDescriptor, RelationKind, RelationLoader, RelationRegistry,
    RelationTarget, ThroughSpec, normalize,
};
pub use schema::{ModelDefinition, Schema, SchemaError, SchemaResult};
pub use traits::{BoxFuture, QueryEngine};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::error::{QueryError, QueryResult};
    pub use crate::filter::{Filter, FilterValue};
    pub use crate::record::{Record, RelationValue};
    pub use crate::relations::{
        BelongsToOptions, FindQuery, HabtmOptions, HasManyOptions, IncludeSpec, RelationLoader,
        RelationTarget,
    };
    pub use crate::schema::{Schema, SchemaError};
    pub use crate::traits::QueryEngine;
}
