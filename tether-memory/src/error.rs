//! Error types for the in-memory engine.

use thiserror::Error;

use tether_query::error::QueryError;

/// Result type for in-memory operations.
pub type MemoryResult<T> = Result<T, MemoryError>;

/// Error type for in-memory operations.
#[derive(Debug, Error)]
pub enum MemoryError {
    /// A row that is not a JSON object.
    #[error("rows of {model} must be JSON objects")]
    NotAnObject {
        /// Model the row was inserted into.
        model: String,
    },

    /// A row whose id is already taken.
    #[error("duplicate id {id} for {model}")]
    DuplicateId {
        /// Model the row was inserted into.
        model: String,
        /// String form of the id.
        id: String,
    },

    /// A failure injected with [`MemoryEngine::fail_on`](crate::MemoryEngine::fail_on).
    #[error("fetch of {model} failed: {message}")]
    Injected {
        /// Model whose fetch failed.
        model: String,
        /// Configured message.
        message: String,
    },
}

impl MemoryError {
    /// The model the error concerns.
    pub fn model(&self) -> &str {
        match self {
            Self::NotAnObject { model } | Self::DuplicateId { model, .. } | Self::Injected { model, .. } => model,
        }
    }
}

impl From<MemoryError> for QueryError {
    fn from(err: MemoryError) -> Self {
        let model = err.model().to_string();
        let base = match &err {
            MemoryError::NotAnObject { .. } => QueryError::deserialization(err.to_string()),
            MemoryError::DuplicateId { .. } => QueryError::database(err.to_string()),
            MemoryError::Injected { .. } => QueryError::database(err.to_string()),
        };
        base.with_model(model).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_query::ErrorCode;

    #[test]
    fn test_error_display() {
        let err = MemoryError::DuplicateId {
            model: "User".into(),
            id: "1".into(),
        };
        assert_eq!(err.to_string(), "duplicate id 1 for User");
    }

    #[test]
    fn test_error_conversion() {
        let err: QueryError = MemoryError::Injected {
            model: "Author".into(),
            message: "connection reset".into(),
        }
        .into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.is_engine_error());
        assert_eq!(err.context.model.as_deref(), Some("Author"));
    }
}
