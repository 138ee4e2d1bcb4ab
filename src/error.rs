//! Failure taxonomy for Tome.
//!
//! A `thiserror` enum of the distinct, matchable error kinds the spec
//! requires. Each variant carries enough context to render the JSON error
//! envelope `{ "error": { "code", "message" } }` produced by the server, and
//! a stable [`TomeError::code`] string the HTTP layer maps to status codes.

use thiserror::Error;

/// Crate-wide result alias over [`TomeError`].
pub type Result<T> = std::result::Result<T, TomeError>;

/// The distinct failure kinds produced across the Tome pipeline.
#[derive(Debug, Error)]
pub enum TomeError {
    /// Caller supplied input that failed validation (empty question, k < 1, …).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A source document could not be parsed.
    #[error("failed to parse {path}: {reason}")]
    Parse { path: String, reason: String },

    /// The requested vector collection does not exist.
    #[error("collection not found: {0}")]
    CollectionNotFound(String),

    /// An operation exceeded its deadline.
    #[error("{operation} timed out after {seconds}s")]
    Timeout { operation: String, seconds: u64 },

    /// The embedding collaborator was unavailable or returned an invalid response.
    #[error("embedding unavailable ({operation}): {reason}")]
    EmbeddingUnavailable { operation: String, reason: String },

    /// The vector index collaborator was unavailable or returned an invalid response.
    #[error("index unavailable ({operation}): {reason}")]
    IndexUnavailable { operation: String, reason: String },

    /// The completion collaborator was unavailable or returned an invalid response.
    #[error("completion unavailable ({operation}): {reason}")]
    CompletionUnavailable { operation: String, reason: String },

    /// A local storage operation (SQLite) failed.
    #[error("storage error ({operation}): {reason}")]
    Storage { operation: String, reason: String },
}

impl TomeError {
    /// Construct a [`TomeError::Storage`] from an operation label and a source
    /// error (or any displayable reason).
    pub fn storage(operation: &str, source: impl std::fmt::Display) -> TomeError {
        TomeError::Storage {
            operation: operation.to_string(),
            reason: source.to_string(),
        }
    }

    /// Stable machine-readable code for the error envelope.
    pub fn code(&self) -> &'static str {
        match self {
            TomeError::InvalidInput(_) => "invalid_input",
            TomeError::Parse { .. } => "parse",
            TomeError::CollectionNotFound(_) => "collection_not_found",
            TomeError::Timeout { .. } => "timeout",
            TomeError::EmbeddingUnavailable { .. } => "embedding_unavailable",
            TomeError::IndexUnavailable { .. } => "index_unavailable",
            TomeError::CompletionUnavailable { .. } => "completion_unavailable",
            TomeError::Storage { .. } => "storage",
        }
    }
}
