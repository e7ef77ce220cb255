//! Merging fetched related records onto their owners.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use super::group::KeyGroup;
use crate::record::{Record, RelationValue};

/// Counters from one merge pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MergeStats {
    /// Fetched records that matched a requested key.
    pub matched: usize,
    /// Source records whose relation was set to the empty default.
    pub defaulted: usize,
    /// Source records whose relation entry was written.
    pub assigned: usize,
}

/// Write the relation `name` on every record of `group`.
///
/// `fetched` yields each related record with the string form of its target
/// key. Plural relations receive all matches in fetch order, singular ones
/// the last match. Any record whose key matched nothing, or whose key was
/// never requested, receives [`RelationValue::empty`]. Existing entries are
/// replaced, never appended to.
pub fn merge<I>(records: &mut [Record], name: &str, multiple: bool, group: &KeyGroup, fetched: I) -> MergeStats
where
    I: IntoIterator<Item = (String, Arc<Record>)>,
{
    let mut stats = MergeStats::default();
    let mut matches: HashMap<String, Vec<Arc<Record>>> = HashMap::new();

    for (key, related) in fetched {
        if group.lookup(&key).is_some() {
            matches.entry(key).or_default().push(related);
            stats.matched += 1;
        } else {
            trace!(relation = %name, key = %key, "Fetched record matched no owner");
        }
    }

    for (key, entry) in group.entries() {
        let value = match matches.get(key) {
            Some(related) if multiple => RelationValue::Many(related.clone()),
            Some(related) => related
                .last()
                .map(|r| RelationValue::One(Arc::clone(r)))
                .unwrap_or(RelationValue::NotFound),
            None => {
                stats.defaulted += entry.indices.len();
                RelationValue::empty(multiple)
            }
        };
        stats.assigned += assign(records, &entry.indices, name, &value);
    }

    if !group.unkeyed().is_empty() {
        stats.defaulted += group.unkeyed().len();
        stats.assigned += assign(records, group.unkeyed(), name, &RelationValue::empty(multiple));
    }

    trace!(
        relation = %name,
        matched = stats.matched,
        defaulted = stats.defaulted,
        "Relation merged"
    );
    stats
}

fn assign(records: &mut [Record], indices: &[usize], name: &str, value: &RelationValue) -> usize {
    let mut assigned = 0;
    for &index in indices {
        if let Some(record) = records.get_mut(index) {
            record.set_relation(name, value.clone());
            assigned += 1;
        }
    }
    assigned
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::relations::group::{KeyMode, key_string};
    use pretty_assertions::assert_eq;
    use serde_json::{Value, json};

    fn records(values: Vec<Value>) -> Vec<Record> {
        values.into_iter().map(|v| Record::from_json(v).unwrap()).collect()
    }

    fn keyed(rows: Vec<Value>, key: &str) -> Vec<(String, Arc<Record>)> {
        records(rows)
            .into_iter()
            .map(|r| (key_string(r.get(key)), Arc::new(r)))
            .collect()
    }

    #[test]
    fn test_singular_with_null_key() {
        let mut posts = records(vec![
            json!({"id": 1, "authorId": 10}),
            json!({"id": 2, "authorId": 10}),
            json!({"id": 3, "authorId": null}),
        ]);
        let group = KeyGroup::build(&posts, "authorId", KeyMode::Legacy);
        let stats = merge(
            &mut posts,
            "author",
            false,
            &group,
            keyed(vec![json!({"id": 10, "name": "A"})], "id"),
        );

        assert_eq!(posts[0].to_json(true)["author"], json!({"id": 10, "name": "A"}));
        assert_eq!(posts[1].to_json(true)["author"], json!({"id": 10, "name": "A"}));
        assert!(posts[2].relation("author").unwrap().is_not_found());
        assert_eq!(stats, MergeStats { matched: 1, defaulted: 1, assigned: 3 });
    }

    #[test]
    fn test_plural_defaults_to_empty_list() {
        let mut books = records(vec![json!({"id": 1}), json!({"id": 2})]);
        let group = KeyGroup::build(&books, "id", KeyMode::Legacy);
        merge(
            &mut books,
            "chapters",
            true,
            &group,
            keyed(
                vec![json!({"id": 5, "bookId": 1}), json!({"id": 6, "bookId": 1})],
                "bookId",
            ),
        );

        assert_eq!(books[0].relation("chapters").map(RelationValue::len), Some(2));
        assert_eq!(books[1].relation("chapters"), Some(&RelationValue::Many(Vec::new())));
    }

    #[test]
    fn test_remerge_overwrites() {
        let mut books = records(vec![json!({"id": 1})]);
        let group = KeyGroup::build(&books, "id", KeyMode::Legacy);
        let chapters = || keyed(vec![json!({"id": 5, "bookId": 1})], "bookId");

        merge(&mut books, "chapters", true, &group, chapters());
        merge(&mut books, "chapters", true, &group, chapters());

        assert_eq!(books[0].relation("chapters").map(RelationValue::len), Some(1));
    }

    #[test]
    fn test_unrequested_key_never_matches() {
        let mut posts = records(vec![json!({"id": 1, "authorId": "undefined"})]);
        let group = KeyGroup::build(&posts, "authorId", KeyMode::Legacy);
        let stats = merge(
            &mut posts,
            "author",
            false,
            &group,
            keyed(vec![json!({"id": "undefined"})], "id"),
        );

        assert!(posts[0].relation("author").unwrap().is_not_found());
        assert_eq!(stats.matched, 0);
    }

    #[test]
    fn test_singular_takes_last_match() {
        let mut posts = records(vec![json!({"id": 1, "authorId": 10})]);
        let group = KeyGroup::build(&posts, "authorId", KeyMode::Typed);
        merge(
            &mut posts,
            "author",
            false,
            &group,
            keyed(vec![json!({"id": 10, "v": 1}), json!({"id": 10, "v": 2})], "id"),
        );

        let author = posts[0].relation("author").and_then(RelationValue::as_one).unwrap();
        assert_eq!(author.get("v"), Some(&json!(2)));
    }
}
