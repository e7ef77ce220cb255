//! Error types for relation loading with actionable messages.
//!
//! Every failure surfaced by the loader is a [`QueryError`] carrying:
//! - An error code for programmatic handling
//! - Context about the model and relation involved
//! - Suggestions for fixing the issue
//!
//! # Error Codes
//!
//! Error codes follow a pattern: T{category}{number}
//! - 1xxx: Query errors (undefined relation, unknown model, bad include)
//! - 5xxx: Execution errors (engine failures)
//! - 6xxx: Data errors (record shape)
//! - 9xxx: Internal errors
//!
//! ```rust
//! use tether_query::{QueryError, ErrorCode};
//!
//! let err = QueryError::undefined_relation("Book", "bogus");
//! assert_eq!(err.code, ErrorCode::UndefinedRelation);
//! assert!(err.to_string().contains("bogus"));
//! ```
//!
//! Errors returned by a [`QueryEngine`](crate::traits::QueryEngine) are
//! passed through the loader unchanged, so callers see the engine's own code
//! and message.

use std::fmt;
use thiserror::Error;

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    // Query errors (1xxx)
    /// Invalid include specification (T1004).
    InvalidInclude = 1004,
    /// Unknown model (T1005).
    UnknownModel = 1005,
    /// Relation is not declared on the model (T1006).
    UndefinedRelation = 1006,

    // Query execution errors (5xxx)
    /// General database error (T5005).
    DatabaseError = 5005,

    // Data errors (6xxx)
    /// Deserialization error (T6003).
    DeserializationError = 6003,

    // Internal errors (9xxx)
    /// Internal error (T9001).
    Internal = 9001,
}

impl ErrorCode {
    /// Get the error code string (e.g., "T1006").
    pub fn code(&self) -> String {
        format!("T{}", *self as u16)
    }

    /// Get a short description of the error code.
    pub fn description(&self) -> &'static str {
        match self {
            Self::InvalidInclude => "Invalid include specification",
            Self::UnknownModel => "Unknown model",
            Self::UndefinedRelation => "Relation not defined",
            Self::DatabaseError => "Database error",
            Self::DeserializationError => "Deserialization error",
            Self::Internal => "Internal error",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Suggestion for fixing an error.
#[derive(Debug, Clone)]
pub struct Suggestion {
    /// The suggestion text.
    pub text: String,
    /// Optional code example.
    pub code: Option<String>,
}

impl Suggestion {
    /// Create a new suggestion.
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            code: None,
        }
    }

    /// Add a code example.
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }
}

/// Additional context for an error.
#[derive(Debug, Clone, Default)]
pub struct ErrorContext {
    /// The model involved.
    pub model: Option<String>,
    /// The field or relation involved.
    pub field: Option<String>,
    /// Suggestions for fixing the error.
    pub suggestions: Vec<Suggestion>,
    /// Help text.
    pub help: Option<String>,
}

/// Errors that can occur while fetching or loading relations.
#[derive(Error, Debug)]
pub struct QueryError {
    /// The error code.
    pub code: ErrorCode,
    /// The error message.
    pub message: String,
    /// Additional context.
    pub context: ErrorContext,
    /// The source error (if any).
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for QueryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code.code(), self.message)
    }
}

impl QueryError {
    /// Create a new error with the given code and message.
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: ErrorContext::default(),
            source: None,
        }
    }

    /// Add a suggestion for fixing the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(suggestion));
        self
    }

    /// Add a code suggestion.
    pub fn with_code_suggestion(mut self, text: impl Into<String>, code: impl Into<String>) -> Self {
        self.context.suggestions.push(Suggestion::new(text).with_code(code));
        self
    }

    /// Add help text.
    pub fn with_help(mut self, help: impl Into<String>) -> Self {
        self.context.help = Some(help.into());
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.context.model = Some(model.into());
        self
    }

    /// Set the field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.context.field = Some(field.into());
        self
    }

    /// Set the source error.
    pub fn with_source<E: std::error::Error + Send + Sync + 'static>(mut self, source: E) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    // ============== Constructor Functions ==============

    /// Create an error for a relation name that is not declared on a model.
    pub fn undefined_relation(model: impl Into<String>, relation: impl Into<String>) -> Self {
        let model = model.into();
        let relation = relation.into();
        Self::new(
            ErrorCode::UndefinedRelation,
            format!("Relation \"{}\" is not defined for {} model", relation, model),
        )
        .with_model(&model)
        .with_field(&relation)
        .with_suggestion(format!("Check the spelling of \"{}\" in the include spec", relation))
        .with_code_suggestion(
            "Declare the relation before including it",
            format!("schema.has_many(\"{}\", \"Target\", HasManyOptions::new().alias(\"{}\"))?;", model, relation),
        )
    }

    /// Create an error for a model that is not defined in the schema.
    pub fn unknown_model(model: impl Into<String>) -> Self {
        let model = model.into();
        Self::new(ErrorCode::UnknownModel, format!("Model \"{}\" is not defined", model))
            .with_model(&model)
            .with_suggestion("Define the model on the schema before loading its records")
    }

    /// Create an invalid include error.
    pub fn invalid_include(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidInclude, format!("Invalid include: {}", message.into()))
            .with_help("An include is a relation name, a list of names and maps, or a map of name to nested include")
    }

    /// Create a deserialization error.
    pub fn deserialization(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::DeserializationError, format!("Failed to deserialize: {}", message))
    }

    /// Create a general database error.
    pub fn database(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::DatabaseError, message)
            .with_suggestion("Check the engine logs for more details")
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        let message = message.into();
        Self::new(ErrorCode::Internal, format!("Internal error: {}", message))
    }

    // ============== Error Checks ==============

    /// Check if this is an undefined relation error.
    pub fn is_undefined_relation(&self) -> bool {
        self.code == ErrorCode::UndefinedRelation
    }

    /// Check if this error came from the query engine.
    pub fn is_engine_error(&self) -> bool {
        self.code == ErrorCode::DatabaseError
    }

    // ============== Display Functions ==============

    /// Display the full error with all context and suggestions.
    pub fn display_full(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("Error [{}]: {}\n", self.code.code(), self.message));

        if let Some(ref model) = self.context.model {
            output.push_str(&format!("  → Model: {}\n", model));
        }
        if let Some(ref field) = self.context.field {
            output.push_str(&format!("  → Field: {}\n", field));
        }

        if !self.context.suggestions.is_empty() {
            output.push_str("\nSuggestions:\n");
            for (i, suggestion) in self.context.suggestions.iter().enumerate() {
                output.push_str(&format!("  {}. {}\n", i + 1, suggestion.text));
                if let Some(ref code) = suggestion.code {
                    output.push_str(&format!("     ```\n     {}\n     ```\n", code.replace('\n', "\n     ")));
                }
            }
        }

        if let Some(ref help) = self.context.help {
            output.push_str(&format!("\nHelp: {}\n", help));
        }

        output
    }
}
