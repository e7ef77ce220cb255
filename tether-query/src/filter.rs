//! Filter types for building `where` clauses.
//!
//! The loader only ever builds one kind of predicate, set membership
//! (`Filter::In`), but engines receive the full [`Filter`] tree so a caller's
//! own queries can use the other operators too.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A filter value that can be used in comparisons.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    /// Null value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// String value.
    String(String),
    /// JSON value.
    Json(Value),
    /// List of values.
    List(Vec<FilterValue>),
}

impl FilterValue {
    /// Check if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Compare against a stored attribute value.
    ///
    /// A missing attribute only equals `Null`.
    pub fn matches_value(&self, value: Option<&Value>) -> bool {
        match value {
            None | Some(Value::Null) => self.is_null(),
            Some(v) => *self == FilterValue::from(v),
        }
    }
}

impl From<&Value> for FilterValue {
    fn from(v: &Value) -> Self {
        match v {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => n.as_f64().map(Self::Float).unwrap_or_else(|| Self::Json(v.clone())),
            },
            Value::String(s) => Self::String(s.clone()),
            Value::Array(items) => Self::List(items.iter().map(Self::from).collect()),
            Value::Object(_) => Self::Json(v.clone()),
        }
    }
}

impl From<bool> for FilterValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for FilterValue {
    fn from(v: i32) -> Self {
        Self::Int(v as i64)
    }
}

impl From<i64> for FilterValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for FilterValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl<T: Into<FilterValue>> From<Vec<T>> for FilterValue {
    fn from(v: Vec<T>) -> Self {
        Self::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<FilterValue>> From<Option<T>> for FilterValue {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Self::Null,
        }
    }
}

/// A complete filter over a model's attributes.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// No filter (always true).
    #[default]
    None,

    /// Equals comparison.
    Equals(String, FilterValue),
    /// Not equals comparison.
    NotEquals(String, FilterValue),

    /// Set membership: the field's value is one of the listed values.
    In(String, Vec<FilterValue>),
    /// Not in a list of values.
    NotIn(String, Vec<FilterValue>),

    /// Is null check.
    IsNull(String),
    /// Is not null check.
    IsNotNull(String),

    /// Logical AND of multiple filters.
    And(Vec<Filter>),
    /// Logical OR of multiple filters.
    Or(Vec<Filter>),
    /// Logical NOT of a filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Create an empty filter (matches everything).
    pub fn none() -> Self {
        Self::None
    }

    /// Check if this filter is empty.
    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }

    /// Create a set membership filter.
    pub fn member_of(field: impl Into<String>, values: impl IntoIterator<Item = FilterValue>) -> Self {
        Self::In(field.into(), values.into_iter().collect())
    }

    /// Create an AND filter, dropping empty operands.
    pub fn and(filters: impl IntoIterator<Item = Filter>) -> Self {
        let filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.into_iter().next().unwrap_or_default(),
            _ => Self::And(filters),
        }
    }

    /// Create an OR filter, dropping empty operands.
    pub fn or(filters: impl IntoIterator<Item = Filter>) -> Self {
        let filters: Vec<_> = filters.into_iter().filter(|f| !f.is_none()).collect();
        match filters.len() {
            0 => Self::None,
            1 => filters.into_iter().next().unwrap_or_default(),
            _ => Self::Or(filters),
        }
    }

    /// Negate this filter.
    pub fn not(filter: Filter) -> Self {
        if filter.is_none() {
            return Self::None;
        }
        Self::Not(Box::new(filter))
    }

    /// The values of a top-level membership predicate on `field`, if any.
    pub fn membership_values(&self, field: &str) -> Option<&[FilterValue]> {
        match self {
            Self::In(f, values) if f == field => Some(values),
            Self::And(filters) => filters.iter().find_map(|f| f.membership_values(field)),
            _ => None,
        }
    }

    /// Evaluate the filter against a record's attributes.
    pub fn matches(&self, data: &Map<String, Value>) -> bool {
        match self {
            Self::None => true,
            Self::Equals(field, value) => value.matches_value(data.get(field)),
            Self::NotEquals(field, value) => !value.matches_value(data.get(field)),
            Self::In(field, values) => values.iter().any(|v| v.matches_value(data.get(field))),
            Self::NotIn(field, values) => !values.iter().any(|v| v.matches_value(data.get(field))),
            Self::IsNull(field) => matches!(data.get(field), None | Some(Value::Null)),
            Self::IsNotNull(field) => !matches!(data.get(field), None | Some(Value::Null)),
            Self::And(filters) => filters.iter().all(|f| f.matches(data)),
            Self::Or(filters) => filters.iter().any(|f| f.matches(data)),
            Self::Not(filter) => !filter.matches(data),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    }

    #[test]
    fn test_filter_value_from_json() {
        assert_eq!(FilterValue::from(&json!(10)), FilterValue::Int(10));
        assert_eq!(FilterValue::from(&json!("a")), FilterValue::String("a".into()));
        assert_eq!(FilterValue::from(&json!(null)), FilterValue::Null);
        assert_eq!(FilterValue::from(&json!(1.5)), FilterValue::Float(1.5));
    }

    #[test]
    fn test_member_of_matches() {
        let filter = Filter::member_of("id", [FilterValue::Int(10), FilterValue::Int(11)]);
        assert!(filter.matches(&row(json!({"id": 10}))));
        assert!(!filter.matches(&row(json!({"id": 12}))));
        assert!(!filter.matches(&row(json!({"name": "x"}))));
    }

    #[test]
    fn test_member_of_is_type_strict() {
        let filter = Filter::member_of("id", [FilterValue::String("10".into())]);
        assert!(!filter.matches(&row(json!({"id": 10}))));
    }

    #[test]
    fn test_null_checks() {
        let data = row(json!({"authorId": null}));
        assert!(Filter::IsNull("authorId".into()).matches(&data));
        assert!(Filter::IsNull("missing".into()).matches(&data));
        assert!(!Filter::IsNotNull("authorId".into()).matches(&data));
        assert!(Filter::Equals("authorId".into(), FilterValue::Null).matches(&data));
    }

    #[test]
    fn test_and_or_not() {
        let data = row(json!({"id": 1, "name": "A"}));
        let filter = Filter::and([
            Filter::Equals("id".into(), 1.into()),
            Filter::not(Filter::Equals("name".into(), "B".into())),
        ]);
        assert!(filter.matches(&data));
        assert!(Filter::or([Filter::Equals("id".into(), 2.into()), Filter::None]).matches(&row(json!({"id": 2}))));
    }

    #[test]
    fn test_and_collapses() {
        assert!(Filter::and([Filter::None, Filter::None]).is_none());
        let single = Filter::and([Filter::IsNull("x".into())]);
        assert_eq!(single, Filter::IsNull("x".into()));
    }

    #[test]
    fn test_membership_values() {
        let filter = Filter::and([
            Filter::member_of("bookId", [FilterValue::Int(1)]),
            Filter::IsNotNull("name".into()),
        ]);
        assert_eq!(filter.membership_values("bookId"), Some(&[FilterValue::Int(1)][..]));
        assert_eq!(filter.membership_values("id"), None);
    }
}
