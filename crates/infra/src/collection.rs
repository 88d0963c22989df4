//! Whole-collection persistence shared by every store.
//!
//! A collection is one JSON blob under one key. Reads decode the blob and fall
//! back to the type's empty default when the key is absent or the content is
//! malformed; the decode error is logged and never reaches the caller. Writes
//! replace the whole blob.

use std::marker::PhantomData;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use rbacadmin_core::{DomainError, Entity, ExpectedVersion, Versioned};

use crate::config::{StoreConfig, WriteMode};
use crate::error::{StorageError, StoreError, StoreResult};
use crate::kv::KeyValueStore;

pub const USERS_KEY: &str = "users";
pub const ROLES_KEY: &str = "roles";
pub const PERMISSIONS_KEY: &str = "permissions";
pub const ACTIVITY_LOGS_KEY: &str = "activityLogs";

/// Outcome of a mutation closure passed to [`Collection::modify`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change<R> {
    /// The collection was changed and must be written back.
    Commit(R),
    /// Nothing changed; skip the write.
    Unchanged(R),
}

/// Typed view of one key in the backing store.
pub struct Collection<T> {
    kv: Arc<dyn KeyValueStore>,
    key: &'static str,
    write_mode: WriteMode,
    max_attempts: u32,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Collection<T> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            key: self.key,
            write_mode: self.write_mode,
            max_attempts: self.max_attempts,
            _marker: PhantomData,
        }
    }
}

impl<T> core::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Collection")
            .field("key", &self.key)
            .field("write_mode", &self.write_mode)
            .field("max_attempts", &self.max_attempts)
            .finish_non_exhaustive()
    }
}

impl<T> Collection<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    pub fn new(kv: Arc<dyn KeyValueStore>, key: &'static str, config: &StoreConfig) -> Self {
        Self {
            kv,
            key,
            write_mode: config.write_mode,
            max_attempts: config.max_cas_attempts.max(1),
            _marker: PhantomData,
        }
    }

    pub async fn load(&self) -> StoreResult<T> {
        let raw = self.kv.load(self.key).await?;
        Ok(decode_or_default(self.key, raw.as_deref()))
    }

    pub async fn load_versioned(&self) -> StoreResult<Versioned<T>> {
        let loaded = self.kv.load_versioned(self.key).await?;
        let value = decode_or_default(self.key, loaded.value.as_deref());
        Ok(Versioned::new(value, loaded.version))
    }

    /// Overwrite the blob unconditionally (last writer wins).
    pub async fn replace(&self, value: &T) -> StoreResult<()> {
        let encoded = encode(self.key, value)?;
        self.kv.store(self.key, encoded).await?;
        Ok(())
    }

    /// Overwrite the blob only if it is still at `expected`.
    pub async fn replace_if(&self, value: &T, expected: ExpectedVersion) -> StoreResult<u64> {
        let encoded = encode(self.key, value)?;
        Ok(self.kv.compare_and_swap(self.key, encoded, expected).await?)
    }

    /// Read-modify-write cycle.
    ///
    /// `f` may run more than once under [`WriteMode::CompareAndSwap`], each time
    /// against a fresh read. An `Err` from `f` aborts without writing.
    pub async fn modify<R, F>(&self, mut f: F) -> StoreResult<R>
    where
        F: FnMut(&mut T) -> StoreResult<Change<R>>,
    {
        match self.write_mode {
            WriteMode::LastWriterWins => {
                let mut value = self.load().await?;
                match f(&mut value)? {
                    Change::Unchanged(out) => Ok(out),
                    Change::Commit(out) => {
                        self.replace(&value).await?;
                        Ok(out)
                    }
                }
            }
            WriteMode::CompareAndSwap => {
                for attempt in 1..=self.max_attempts {
                    let Versioned { mut value, version } = self.load_versioned().await?;
                    let out = match f(&mut value)? {
                        Change::Unchanged(out) => return Ok(out),
                        Change::Commit(out) => out,
                    };

                    match self.replace_if(&value, ExpectedVersion::Exact(version)).await {
                        Ok(_) => return Ok(out),
                        Err(StoreError::Storage(StorageError::Conflict(reason))) => {
                            tracing::debug!(key = self.key, attempt, %reason, "stale write; retrying");
                        }
                        Err(other) => return Err(other),
                    }
                }

                tracing::warn!(key = self.key, attempts = self.max_attempts, "gave up after repeated conflicts");
                Err(DomainError::conflict(format!(
                    "'{}' changed concurrently {} times",
                    self.key, self.max_attempts
                ))
                .into())
            }
        }
    }
}

fn decode_or_default<T>(key: &str, raw: Option<&str>) -> T
where
    T: DeserializeOwned + Default,
{
    let Some(raw) = raw else {
        return T::default();
    };

    match serde_json::from_str(raw) {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!(key, error = %err, "failed to decode collection; using empty default");
            T::default()
        }
    }
}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String, StorageError> {
    serde_json::to_string(value).map_err(|e| StorageError::Encode(format!("{key}: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Replace the record sharing `record`'s id, or fail with `NotFound`.
pub fn replace_entity<E>(records: &mut [E], record: E) -> StoreResult<()>
where
    E: Entity,
    E::Id: core::fmt::Display,
{
    match records.iter_mut().find(|r| r.id() == record.id()) {
        Some(slot) => {
            *slot = record;
            Ok(())
        }
        None => Err(DomainError::not_found(record.id().to_string()).into()),
    }
}

/// Remove every record with `id`; returns whether anything was removed.
pub fn remove_entity<E: Entity>(records: &mut Vec<E>, id: &E::Id) -> bool {
    let before = records.len();
    records.retain(|r| r.id() != id);
    records.len() != before
}
