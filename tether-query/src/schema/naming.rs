//! Default names for relations and foreign keys.

use convert_case::{Case, Casing};

/// Lower camel case (`ArticleTag` → `articleTag`, `Book_id` → `bookId`).
pub fn camel(name: &str) -> String {
    name.to_case(Case::Camel)
}

/// Plural form, keeping the input's casing.
pub fn pluralize(name: &str) -> String {
    pluralizer::pluralize(name, 2, false)
}

/// Singular form, keeping the input's casing.
pub fn singularize(name: &str) -> String {
    pluralizer::pluralize(name, 1, false)
}

/// Default name of a plural relation toward `model` (`Chapter` → `chapters`).
pub fn plural_relation_name(model: &str) -> String {
    camel(&pluralize(model))
}

/// Default foreign key referencing `model` (`Book` → `bookId`).
pub fn foreign_key_for(model: &str) -> String {
    camel(&format!("{}_id", model))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camel() {
        assert_eq!(camel("ArticleTag"), "articleTag");
        assert_eq!(camel("Author"), "author");
    }

    #[test]
    fn test_plural_relation_name() {
        assert_eq!(plural_relation_name("Chapter"), "chapters");
        assert_eq!(plural_relation_name("Reader"), "readers");
    }

    #[test]
    fn test_singularize() {
        assert_eq!(singularize("tags"), "tag");
        assert_eq!(singularize("readers"), "reader");
    }

    #[test]
    fn test_foreign_key_for() {
        assert_eq!(foreign_key_for("Book"), "bookId");
        assert_eq!(foreign_key_for("ArticleTag"), "articleTagId");
    }
}
