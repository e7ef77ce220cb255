//! Integration tests for configuration parsing and handling.

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;

use tether::prelude::*;
use tether::query::{KeyMode, SchemaError};

/// Test that an empty file yields the defaults
#[test]
fn test_config_empty() {
    let config = TetherConfig::from_str("").expect("Failed to parse config");
    let loader = config.loader_config();

    assert_eq!(loader.max_concurrent_steps, 0);
    assert_eq!(loader.key_mode, KeyMode::Legacy);
    assert!(!loader.log_fetches);
    assert_eq!(loader.slow_fetch_threshold, Duration::from_secs(1));
}

/// Test full configuration with all options
#[test]
fn test_config_full() {
    let config_str = r#"
        [loader]
        max_concurrent_steps = 8
        key_mode = "typed"

        [debug]
        log_fetches = true
        slow_fetch_threshold = 50

        [environments.production.debug]
        log_fetches = false
        slow_fetch_threshold = 500
    "#;

    let config = TetherConfig::from_str(config_str).expect("Failed to parse config");
    assert_eq!(config.loader.max_concurrent_steps, 8);
    assert_eq!(config.loader.key_mode, KeyMode::Typed);
    assert!(config.debug.log_fetches);

    let production = config.with_environment("production").loader_config();
    assert!(!production.log_fetches);
    assert_eq!(production.slow_fetch_threshold, Duration::from_millis(500));
    assert_eq!(production.max_concurrent_steps, 8);
}

/// Test that invalid key modes are rejected
#[test]
fn test_config_invalid_key_mode() {
    let result = TetherConfig::from_str("[loader]\nkey_mode = \"loose\"\n");
    assert!(matches!(result, Err(SchemaError::TomlError { .. })));
}

/// Test loading from a file on disk
#[test]
fn test_config_from_file() {
    let path = std::env::temp_dir().join(format!("tether-config-{}.toml", std::process::id()));
    std::fs::write(&path, "[loader]\nmax_concurrent_steps = 2\n").expect("Failed to write config");

    let config = TetherConfig::from_file(&path);
    std::fs::remove_file(&path).ok();

    assert_eq!(config.expect("Failed to load config").loader.max_concurrent_steps, 2);
}

/// Test that a missing file reports its path
#[test]
fn test_config_missing_file() {
    let err = TetherConfig::from_file("/nonexistent/tether.toml").unwrap_err();
    assert!(matches!(err, SchemaError::IoError { ref path, .. } if path == "/nonexistent/tether.toml"));
}

/// Test that a configured loader behaves according to the file
#[tokio::test]
async fn test_config_drives_loader() {
    let config = TetherConfig::from_str("[loader]\nkey_mode = \"typed\"\nmax_concurrent_steps = 1\n")
        .expect("Failed to parse config");

    let mut schema = Schema::new();
    schema.define("User", ["name"]).unwrap();
    schema.define("Post", ["title"]).unwrap();
    schema
        .belongs_to("Post", "User", BelongsToOptions::new().alias("author"))
        .unwrap();

    let engine = MemoryEngine::new();
    engine.insert("User", json!({"id": "null", "name": "literal"})).unwrap();
    engine.insert("Post", json!({"authorId": "null"})).unwrap();

    let loader = RelationLoader::new(Arc::new(schema), engine).with_config(config.loader_config());
    let posts = loader
        .find_many("Post", FindQuery::new().include("author"))
        .await
        .unwrap();

    assert_eq!(posts[0].to_json(true)["author"]["name"], json!("literal"));
}
