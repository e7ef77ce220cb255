//! In-memory query engine for Tether.
//!
//! Rows are stored per model as JSON objects and fetched by evaluating
//! [`Filter`](tether_query::Filter)s against them. The engine records every
//! fetch it receives, which makes it the natural collaborator for tests that
//! need to count fetches or inspect the predicates the loader sends.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use serde_json::json;
//! use tether_memory::MemoryEngine;
//! use tether_query::prelude::*;
//!
//! # tokio_test_block(async {
//! let mut schema = Schema::new();
//! schema.define("User", ["name"]).unwrap();
//! schema.define("Post", ["title"]).unwrap();
//! schema.belongs_to("Post", "User", BelongsToOptions::new().alias("author")).unwrap();
//!
//! let engine = MemoryEngine::new();
//! engine.insert("User", json!({"id": 10, "name": "A"})).unwrap();
//! engine.insert("Post", json!({"title": "hello", "authorId": 10})).unwrap();
//!
//! let loader = RelationLoader::new(Arc::new(schema), engine.clone());
//! let posts = loader
//!     .find_many("Post", FindQuery::new().include("author"))
//!     .await
//!     .unwrap();
//!
//! assert_eq!(posts[0].to_json(true)["author"]["name"], json!("A"));
//! assert_eq!(engine.fetch_count(), 2);
//! # });
//! # fn tokio_test_block<F: std::future::Future>(f: F) -> F::Output {
//! #     tokio::runtime::Builder::new_current_thread().enable_all().build().unwrap().block_on(f)
//! # }
//! ```

pub mod engine;
pub mod error;

pub use engine::{FetchLogEntry, MemoryEngine};
pub use error::{MemoryError, MemoryResult};
