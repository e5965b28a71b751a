//! Error types and result types for document store operations.
//!
//! Every fallible operation in the workspace returns [`DocumentStoreResult<T>`]. Errors are
//! never downgraded on their way up: a backend's classification reaches the caller intact,
//! and [`DocumentStoreError::class`] folds the variants into the three families callers
//! branch on.

use bson::error::Error as BsonError;
use serde_json::Error as SerdeJsonError;
use std::fmt;
use thiserror::Error;

/// The kind of resource an error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Database,
    Collection,
    Document,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ResourceKind::Database => "database",
            ResourceKind::Collection => "collection",
            ResourceKind::Document => "document",
        })
    }
}

/// Coarse error families.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// The addressed resource does not exist.
    NotFound,
    /// The request was rejected: duplicate id, malformed input, or a policy violation.
    ConflictOrValidation,
    /// Connectivity, authentication, throttling, or any other backend-side failure.
    TransportOrAuth,
}

/// Represents all possible errors that can occur when talking to a document store.
#[derive(Error, Debug)]
pub enum DocumentStoreError {
    /// The addressed database, collection, or document does not exist.
    #[error("{kind} not found: {id}")]
    NotFound { kind: ResourceKind, id: String },
    /// A resource with the same id already exists.
    #[error("{kind} already exists: {id}")]
    Conflict { kind: ResourceKind, id: String },
    /// The request was malformed or violates a store policy.
    #[error("Validation error: {0}")]
    Validation(String),
    /// Serialization/deserialization error when converting between document formats (BSON, JSON).
    #[error("Serialization error: {0}")]
    Serialization(String),
    /// The store could not be reached or the connection broke mid-request.
    #[error("Transport error: {0}")]
    Transport(String),
    /// The store rejected the credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),
    /// The store refused the request because the provisioned throughput was exceeded.
    #[error("Request throttled: {0}")]
    Throttled(String),
    /// Error during endpoint construction or connection setup.
    #[error("Initialization error: {0}")]
    Initialization(String),
    /// Any other failure reported by the underlying backend.
    #[error("Backend error: {0}")]
    Backend(String),
}

impl DocumentStoreError {
    pub fn not_found(kind: ResourceKind, id: impl Into<String>) -> Self {
        DocumentStoreError::NotFound { kind, id: id.into() }
    }

    pub fn conflict(kind: ResourceKind, id: impl Into<String>) -> Self {
        DocumentStoreError::Conflict { kind, id: id.into() }
    }

    /// Folds this error into one of the three error families.
    pub fn class(&self) -> ErrorClass {
        match self {
            DocumentStoreError::NotFound { .. } => ErrorClass::NotFound,
            DocumentStoreError::Conflict { .. }
            | DocumentStoreError::Validation(_)
            | DocumentStoreError::Serialization(_) => ErrorClass::ConflictOrValidation,
            DocumentStoreError::Transport(_)
            | DocumentStoreError::Unauthorized(_)
            | DocumentStoreError::Throttled(_)
            | DocumentStoreError::Initialization(_)
            | DocumentStoreError::Backend(_) => ErrorClass::TransportOrAuth,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.class() == ErrorClass::NotFound
    }
}

/// A specialized `Result` type for document store operations.
pub type DocumentStoreResult<T> = Result<T, DocumentStoreError>;

impl From<BsonError> for DocumentStoreError {
    fn from(err: BsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}

impl From<SerdeJsonError> for DocumentStoreError {
    fn from(err: SerdeJsonError) -> Self {
        DocumentStoreError::Serialization(err.to_string())
    }
}
