//! # Collection Errors
//!
//! Failures raised by a document collection. A missing document is not
//! an error at this layer; lookups return `None` instead.

use thiserror::Error;

pub type CollectionResult<T> = Result<T, CollectionError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectionError {
    /// Payload rejected by the document type's rules
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Filter or projection the engine cannot execute
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// A unique field already holds this value
    #[error("Duplicate value for unique field '{field}': {value}")]
    DuplicateKey { field: String, value: String },

    /// A relation points at a collection that was never registered
    #[error("Unknown collection: {0}")]
    UnknownCollection(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CollectionError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedQuery(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub(crate) fn lock_poisoned() -> Self {
        Self::internal("Lock poisoned")
    }
}
