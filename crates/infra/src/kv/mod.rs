//! Key/value backing store for whole-collection blobs.
//!
//! Every collection (`users`, `roles`, `permissions`, `activityLogs`) is a
//! single UTF-8 JSON value stored under one key. Each key carries a version
//! stamp that increments on every write; version `0` means "never written".

pub mod in_memory;
pub mod latency;
pub mod sqlite;

use std::sync::Arc;

use async_trait::async_trait;

use rbacadmin_core::{ExpectedVersion, Versioned};

use crate::error::StorageError;

pub use in_memory::InMemoryKeyValueStore;
pub use latency::LatencyStore;
pub use sqlite::SqliteKeyValueStore;

/// Persistence contract shared by all backends.
///
/// Implementations provide the versioned primitives; the plain `load`/`store`
/// pair is layered on top and ignores versions (last writer wins).
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Current value and its version (`None`/`0` when absent).
    async fn load_versioned(&self, key: &str) -> Result<Versioned<Option<String>>, StorageError>;

    /// Write `value` if the stored version matches `expected`.
    ///
    /// Returns the new version, or [`StorageError::Conflict`].
    async fn compare_and_swap(
        &self,
        key: &str,
        value: String,
        expected: ExpectedVersion,
    ) -> Result<u64, StorageError>;

    async fn load(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.load_versioned(key).await?.value)
    }

    async fn store(&self, key: &str, value: String) -> Result<(), StorageError> {
        self.compare_and_swap(key, value, ExpectedVersion::Any).await.map(|_| ())
    }
}

#[async_trait]
impl<S> KeyValueStore for Arc<S>
where
    S: KeyValueStore + ?Sized,
{
    async fn load_versioned(&self, key: &str) -> Result<Versioned<Option<String>>, StorageError> {
        (**self).load_versioned(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        value: String,
        expected: ExpectedVersion,
    ) -> Result<u64, StorageError> {
        (**self).compare_and_swap(key, value, expected).await
    }
}
