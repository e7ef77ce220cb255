//! Relation declaration and batched eager loading.
//!
//! Relations are declared on a [`Schema`](crate::Schema) and resolved by a
//! [`RelationLoader`]: each include step issues one fetch for all the keys
//! it needs, no matter how many records share them.
//!
//! ```rust,ignore
//! let mut posts = loader.find_many("Post", FindQuery::new()).await?;
//! loader
//!     .include("Post", &mut posts, &IncludeSpec::from(["author", "tags"]))
//!     .await?;
//! ```

pub mod coordinator;
pub mod declare;
pub mod group;
pub mod include;
pub mod loader;
pub mod merge;
pub mod spec;

pub use coordinator::CoordinatorState;
pub use declare::{BelongsToOptions, HabtmOptions, HasManyOptions, RelationTarget};
pub use group::{KeyEntry, KeyGroup, KeyMode, key_string};
pub use include::{IncludeSpec, IncludeStep, normalize};
pub use loader::{FindQuery, IncludeStats, RelationLoader};
pub use merge::{MergeStats, merge};
pub use spec::{RelationDescriptor, RelationKind, RelationRegistry, ThroughSpec};
