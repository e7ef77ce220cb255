//! Include specifications for eager loading relations.
//!
//! An [`IncludeSpec`] is the caller-facing, recursive description of which
//! relations to attach; [`normalize`] flattens one level of it into ordered
//! [`IncludeStep`]s. Sub-specs are carried unnormalized and handled by the
//! recursive fetch of the relation's target model.
//!
//! Specs deserialize from the same JSON shapes callers write by hand:
//!
//! ```rust
//! use tether_query::relations::{IncludeSpec, normalize};
//!
//! let spec: IncludeSpec = serde_json::from_str(r#"["author", {"chapters": "pages"}]"#).unwrap();
//! let steps = normalize(&spec);
//! assert_eq!(steps[0].relation_name, "author");
//! assert_eq!(steps[1].relation_name, "chapters");
//! assert_eq!(steps[1].sub_spec, IncludeSpec::from("pages"));
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Which related records to attach, at arbitrary depth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum IncludeSpec {
    /// A single relation name.
    Name(String),
    /// An ordered list of names and mappings.
    List(Vec<IncludeSpec>),
    /// Relation name to nested spec, in declaration order.
    Map(IndexMap<String, IncludeSpec>),
}

impl IncludeSpec {
    /// The empty spec.
    pub fn none() -> Self {
        Self::List(Vec::new())
    }

    /// Check if this spec requests no relation at all.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Name(name) => name.is_empty(),
            Self::List(items) => items.iter().all(Self::is_empty),
            Self::Map(map) => map.keys().all(String::is_empty),
        }
    }

    /// A mapping with one relation and its nested spec.
    pub fn nested(name: impl Into<String>, sub_spec: impl Into<IncludeSpec>) -> Self {
        let mut map = IndexMap::new();
        map.insert(name.into(), sub_spec.into());
        Self::Map(map)
    }
}

impl Default for IncludeSpec {
    fn default() -> Self {
        Self::none()
    }
}

impl From<&str> for IncludeSpec {
    fn from(name: &str) -> Self {
        Self::Name(name.to_string())
    }
}

impl From<String> for IncludeSpec {
    fn from(name: String) -> Self {
        Self::Name(name)
    }
}

impl<T: Into<IncludeSpec>> From<Vec<T>> for IncludeSpec {
    fn from(items: Vec<T>) -> Self {
        Self::List(items.into_iter().map(Into::into).collect())
    }
}

impl<const N: usize> From<[&str; N]> for IncludeSpec {
    fn from(names: [&str; N]) -> Self {
        Self::List(names.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, IncludeSpec>> for IncludeSpec {
    fn from(map: IndexMap<String, IncludeSpec>) -> Self {
        Self::Map(map)
    }
}

/// One relation to resolve, with the spec forwarded to its target model.
#[derive(Debug, Clone, PartialEq)]
pub struct IncludeStep {
    /// Relation name on the current model.
    pub relation_name: String,
    /// Nested spec for the related model; empty when there is none.
    pub sub_spec: IncludeSpec,
}

impl IncludeStep {
    fn new(relation_name: impl Into<String>, sub_spec: IncludeSpec) -> Self {
        Self {
            relation_name: relation_name.into(),
            sub_spec,
        }
    }
}

/// Flatten one level of `spec` into ordered steps.
///
/// Lists keep element order, mappings keep declaration order, nested lists
/// are flattened in place and empty names are skipped. A name repeated in
/// the spec yields a step each time.
pub fn normalize(spec: &IncludeSpec) -> Vec<IncludeStep> {
    let mut steps = Vec::new();
    collect_steps(spec, &mut steps);
    steps
}

fn collect_steps(spec: &IncludeSpec, steps: &mut Vec<IncludeStep>) {
    match spec {
        IncludeSpec::Name(name) if name.is_empty() => {}
        IncludeSpec::Name(name) => steps.push(IncludeStep::new(name.as_str(), IncludeSpec::none())),
        IncludeSpec::List(items) => {
            for item in items {
                collect_steps(item, steps);
            }
        }
        IncludeSpec::Map(map) => {
            for (name, sub_spec) in map {
                if !name.is_empty() {
                    steps.push(IncludeStep::new(name.as_str(), sub_spec.clone()));
                }
            }
        }
    }
}
