//! # Tether
//!
//! Batched relation eager-loading for record-oriented data layers.
//!
//! Tether provides:
//! - A relation registry with `has_many`, `belongs_to` and
//!   `has_and_belongs_to_many` declarations
//! - Include specs nested to any depth, given as names, lists or mappings
//! - One fetch per include step, however many records share a key
//! - Concurrent sibling steps with fail-fast error handling
//! - An in-memory engine for tests and small programs
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tether::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut schema = Schema::new();
//!     schema.define("Book", ["title"])?;
//!     schema.define("Chapter", ["title"])?;
//!     schema.has_many("Book", "Chapter", HasManyOptions::new())?;
//!
//!     let engine = MemoryEngine::new();
//!     engine.insert("Book", json!({"title": "Dune"}))?;
//!     engine.insert("Chapter", json!({"title": "One", "bookId": 1}))?;
//!
//!     let loader = RelationLoader::new(Arc::new(schema), engine);
//!     let books = loader
//!         .find_many("Book", FindQuery::new().include("chapters"))
//!         .await?;
//!
//!     println!("{}", books[0].to_json(true));
//!     Ok(())
//! }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// Relation registry, include specs and the batched loader.
pub mod query {
    pub use tether_query::*;
}

/// In-memory query engine.
pub mod memory {
    pub use tether_memory::*;
}

/// Prelude module for convenient imports.
pub mod prelude {
    pub use tether_memory::MemoryEngine;
    pub use tether_query::prelude::*;
    pub use tether_query::{IncludeStats, LoaderConfig, TetherConfig};
}

// Re-export key types at the crate root
pub use tether_memory::MemoryEngine;
pub use tether_query::{
    FindQuery, IncludeSpec, QueryEngine, QueryError, QueryResult, Record, RelationLoader,
    RelationValue, Schema, SchemaError, TetherConfig, logging,
};
