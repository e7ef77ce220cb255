//! Error types for schema declaration and configuration loading.

// These warnings are false positives - the fields are used by derive macros
#![allow(unused_assignments)]

use miette::Diagnostic;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors that can occur while declaring models and relations.
#[derive(Error, Debug, Diagnostic)]
pub enum SchemaError {
    /// Error reading a file.
    #[error("failed to read file: {path}")]
    #[diagnostic(code(tether::schema::io_error))]
    IoError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Reference to a model that was never defined.
    #[error("model `{name}` is not defined")]
    #[diagnostic(
        code(tether::schema::unknown_model),
        help("call `Schema::define` for `{name}` before declaring relations on it")
    )]
    UnknownModel { name: String },

    /// Short-form relation whose target model could not be resolved.
    #[error("could not find \"{target}\" relation for {model}")]
    #[diagnostic(
        code(tether::schema::unresolved_target),
        help("pass the target model explicitly with `.model(...)`")
    )]
    UnresolvedTarget { model: String, target: String },

    /// Duplicate definition.
    #[error("duplicate {kind} `{name}`")]
    #[diagnostic(code(tether::schema::duplicate))]
    Duplicate { kind: String, name: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    #[diagnostic(code(tether::schema::config_error))]
    ConfigError { message: String },

    /// TOML parsing error.
    #[error("failed to parse TOML")]
    #[diagnostic(code(tether::schema::toml_error))]
    TomlError {
        #[source]
        source: toml::de::Error,
    },
}

impl SchemaError {
    /// Create an unknown model error.
    pub fn unknown_model(name: impl Into<String>) -> Self {
        Self::UnknownModel { name: name.into() }
    }

    /// Create an unresolved short-form target error.
    pub fn unresolved_target(model: impl Into<String>, target: impl Into<String>) -> Self {
        Self::UnresolvedTarget {
            model: model.into(),
            target: target.into(),
        }
    }

    /// Create a duplicate definition error.
    pub fn duplicate(kind: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Duplicate {
            kind: kind.into(),
            name: name.into(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::ConfigError {
            message: message.into(),
        }
    }
}
