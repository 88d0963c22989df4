//! Persistence error model.

use thiserror::Error;

use rbacadmin_core::DomainError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Error raised by a [`crate::kv::KeyValueStore`] backend.
///
/// These are **infrastructure errors**. A blob that fails to decode is not one
/// of them: decode failures are recovered inside the collection codec.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StorageError {
    /// A compare-and-swap write found a different version than expected.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// A value could not be encoded for storage.
    #[error("encode failed: {0}")]
    Encode(String),

    /// The backing medium failed (I/O, SQL, lock poisoning).
    #[error("backend failure: {0}")]
    Backend(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

/// Error returned by the identity, role and permission stores.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl StoreError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::Domain(DomainError::NotFound(_)))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, StoreError::Domain(DomainError::Validation(_)))
    }

    /// True for stale writes, whether detected by the domain or the backend.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            StoreError::Domain(DomainError::Conflict(_)) | StoreError::Storage(StorageError::Conflict(_))
        )
    }
}
