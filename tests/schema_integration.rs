//! Integration tests for model definitions and relation declarations.
//!
//! These tests verify default naming, foreign key side effects, join model
//! resolution and the record helpers that understand relations.

use pretty_assertions::assert_eq;
use serde_json::json;

use tether::prelude::*;
use tether::query::{RelationKind, RelationValue};

fn library() -> Schema {
    let mut schema = Schema::new();
    for model in ["Author", "Book", "Chapter", "Reader", "Article", "Tag"] {
        schema.define(model, ["name"]).unwrap();
    }
    schema
}

/// Test the defaults of a plain one-to-many declaration
#[test]
fn test_has_many_defaults() {
    let mut schema = library();
    let chapters = schema.has_many("Book", "Chapter", HasManyOptions::new()).unwrap();

    assert_eq!(chapters.name, "chapters");
    assert_eq!(chapters.kind, RelationKind::HasMany);
    assert_eq!((chapters.key_from.as_str(), chapters.key_to.as_str()), ("id", "bookId"));
    assert!(chapters.multiple);

    let fk = schema.model("Chapter").and_then(|m| m.property("bookId"));
    assert_eq!(fk.and_then(|p| p.references.as_deref()), Some("Book"));
}

/// Test the defaults of a belongsTo declaration
#[test]
fn test_belongs_to_defaults() {
    let mut schema = library();
    let author = schema.belongs_to("Book", "Author", BelongsToOptions::new()).unwrap();

    assert_eq!(author.name, "author");
    assert_eq!((author.key_from.as_str(), author.key_to.as_str()), ("authorId", "id"));
    assert!(!author.multiple);
    assert_eq!(schema.relations().relation_name_for("Book", "authorId"), Some("author"));
}

/// Test a short-form declaration naming the relation instead of the model
#[test]
fn test_short_form_declaration() {
    let mut schema = library();
    let readers = schema
        .has_many("Book", RelationTarget::named("readers"), HasManyOptions::new())
        .unwrap();
    assert_eq!((readers.name.as_str(), readers.model_to.as_str()), ("readers", "Reader"));

    let err = schema
        .belongs_to("Book", RelationTarget::named("publisher"), BelongsToOptions::new())
        .unwrap_err();
    assert_eq!(err.to_string(), "could not find \"publisher\" relation for Book");
}

/// Test declarations against models that were never defined
#[test]
fn test_unknown_models() {
    let mut schema = library();
    assert!(matches!(
        schema.has_many("Book", "Publisher", HasManyOptions::new()),
        Err(SchemaError::UnknownModel { .. })
    ));
    assert!(matches!(
        schema.belongs_to("Publisher", "Book", BelongsToOptions::new()),
        Err(SchemaError::UnknownModel { .. })
    ));
}

/// Test hasAndBelongsToMany join model creation and reuse
#[test]
fn test_habtm_join_models() {
    let mut schema = library();
    let tags = schema
        .has_and_belongs_to_many("Article", "Tag", HabtmOptions::new())
        .unwrap();
    assert_eq!(tags.kind, RelationKind::HasAndBelongsToMany);
    assert_eq!(tags.through.as_ref().map(|t| t.model.as_str()), Some("ArticleTag"));

    // The other side finds the join model under the reversed name.
    let articles = schema
        .has_and_belongs_to_many("Tag", "Article", HabtmOptions::new())
        .unwrap();
    assert_eq!(articles.through.as_ref().map(|t| t.model.as_str()), Some("ArticleTag"));
    assert_eq!(articles.key_to, "tagId");
    assert!(!schema.has_model("TagArticle"));

    let join = schema.model("ArticleTag").unwrap();
    assert!(join.has_property("articleId"));
    assert!(join.has_property("tagId"));
}

/// Test an explicit join model
#[test]
fn test_habtm_explicit_through() {
    let mut schema = library();
    schema.define("Shelf", Vec::<String>::new()).unwrap();
    let readers = schema
        .has_and_belongs_to_many("Book", "Reader", HabtmOptions::new().through("Shelf"))
        .unwrap();

    let through = readers.through.clone().unwrap();
    assert_eq!((through.model.as_str(), through.key_through.as_str()), ("Shelf", "readerId"));
    assert!(schema.relations().lookup("Shelf", "book").is_some());
}

/// Test building a record with a nested belongsTo value
#[test]
fn test_build_record_with_relation() {
    let mut schema = library();
    schema.belongs_to("Book", "Author", BelongsToOptions::new()).unwrap();

    let book = schema
        .build_record("Book", json!({"name": "Dune", "author": {"id": 4, "name": "Frank"}}))
        .unwrap();

    assert_eq!(book.get("authorId"), Some(&json!(4)));
    assert_eq!(
        book.to_json(true),
        json!({"name": "Dune", "authorId": 4, "author": {"id": 4, "name": "Frank"}})
    );
    assert!(schema.build_record("Publisher", json!({})).is_err());
}

/// Test assigning a belongsTo target directly
#[test]
fn test_assign_related() {
    let mut schema = library();
    schema.belongs_to("Book", "Author", BelongsToOptions::new()).unwrap();
    schema.has_many("Author", "Book", HasManyOptions::new()).unwrap();

    let mut book = schema.build_record("Book", json!({"name": "Emma"})).unwrap();
    let author = Record::from_json(json!({"id": 9, "name": "Jane"})).unwrap();
    schema.assign_related("Book", &mut book, "author", author.clone()).unwrap();

    assert_eq!(book.get("authorId"), Some(&json!(9)));
    assert!(matches!(book.relation("author"), Some(RelationValue::One(_))));

    let mut author = author;
    let err = schema
        .assign_related("Author", &mut author, "books", Record::default())
        .unwrap_err();
    assert!(err.message.contains("plural relation"));
}
