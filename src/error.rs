//! Crate-wide error taxonomy.
//!
//! Every fallible operation in `sylvan` returns [`Result<T>`], an alias over
//! [`SylvanError`]. Validation errors carry no side effects; mutation and
//! storage errors leave the engine in its pre-mutation state (see §7/§5 of
//! the design).

use thiserror::Error;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SylvanError>;

/// The error taxonomy exposed by the engine.
#[derive(Debug, Error)]
pub enum SylvanError {
    /// A `SearchOptions` value failed validation (negative `max_results`,
    /// out-of-range `threshold`, non-sequence `fields`, ...).
    #[error("invalid search options: {0}")]
    InvalidOptions(String),

    /// A document failed validation before any trie/postings mutation.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// `update_document` / `remove_document` / `restore_version` referenced
    /// an id that does not exist in the document store.
    #[error("document not found: {0}")]
    DocumentNotFound(String),

    /// A regex pattern supplied to `search` failed to compile.
    #[error("invalid regex pattern: {0}")]
    InvalidPattern(String),

    /// A persisted blob's `config.version` does not match the engine's
    /// current version, or its shape otherwise drifted from what this
    /// build expects.
    #[error("serialization mismatch: {0}")]
    SerializationMismatch(String),

    /// The storage backend could not be reached during `initialize`.
    #[error("storage unavailable: {0}")]
    StorageUnavailable(String),

    /// The storage backend failed during a load/store/clear call after
    /// initialization.
    #[error("storage error: {0}")]
    StorageError(String),

    /// A regex traversal exceeded its configured wall-clock budget. Not
    /// surfaced to callers by default (see §7) — present for completeness
    /// of the taxonomy and for event payloads.
    #[error("operation timed out: {0}")]
    OperationTimeout(String),

    /// Anything else unexpected.
    #[error("internal error: {0}")]
    Internal(String),
}

impl SylvanError {
    pub fn invalid_options(msg: impl Into<String>) -> Self {
        Self::InvalidOptions(msg.into())
    }

    pub fn invalid_document(msg: impl Into<String>) -> Self {
        Self::InvalidDocument(msg.into())
    }

    pub fn document_not_found(id: impl Into<String>) -> Self {
        Self::DocumentNotFound(id.into())
    }

    pub fn invalid_pattern(msg: impl Into<String>) -> Self {
        Self::InvalidPattern(msg.into())
    }

    pub fn serialization_mismatch(msg: impl Into<String>) -> Self {
        Self::SerializationMismatch(msg.into())
    }

    pub fn storage_unavailable(msg: impl Into<String>) -> Self {
        Self::StorageUnavailable(msg.into())
    }

    pub fn storage_error(msg: impl Into<String>) -> Self {
        Self::StorageError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
