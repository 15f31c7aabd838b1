//! Error types for the entity model.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors that can occur while building or patching entities.
#[derive(Debug, Error)]
pub enum ModelError {
    /// The payload was not a JSON object.
    #[error("patch document must be a JSON object, got {0}")]
    NotAnObject(&'static str),

    /// A snapshot document lacked its identity field.
    #[error("snapshot document is missing identity field `{0}`")]
    MissingIdentity(&'static str),

    /// The identity field was present but malformed.
    #[error("invalid identity field `{key}`: {source}")]
    InvalidIdentity {
        key: &'static str,
        #[source]
        source: serde_json::Error,
    },
}
