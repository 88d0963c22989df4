use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use rbacadmin_core::{ExpectedVersion, Versioned};

use super::KeyValueStore;
use crate::error::StorageError;

#[derive(Debug, Clone)]
struct Slot {
    value: String,
    version: u64,
}

/// In-memory key/value store.
///
/// Intended for tests/dev. Contents are lost when the process exits.
#[derive(Debug, Default)]
pub struct InMemoryKeyValueStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl InMemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for InMemoryKeyValueStore {
    async fn load_versioned(&self, key: &str) -> Result<Versioned<Option<String>>, StorageError> {
        let slots = self
            .slots
            .read()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        Ok(match slots.get(key) {
            Some(slot) => Versioned::new(Some(slot.value.clone()), slot.version),
            None => Versioned::new(None, 0),
        })
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        value: String,
        expected: ExpectedVersion,
    ) -> Result<u64, StorageError> {
        let mut slots = self
            .slots
            .write()
            .map_err(|_| StorageError::Backend("lock poisoned".to_string()))?;

        let current = slots.get(key).map(|s| s.version).unwrap_or(0);
        if !expected.matches(current) {
            return Err(StorageError::Conflict(format!(
                "key '{key}': expected {expected:?}, found {current}"
            )));
        }

        let version = current + 1;
        slots.insert(key.to_string(), Slot { value, version });
        Ok(version)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::contract;

    #[tokio::test]
    async fn absent_key_is_version_zero() {
        contract::absent_key_is_version_zero(&InMemoryKeyValueStore::new()).await;
    }

    #[tokio::test]
    async fn store_then_load() {
        contract::store_then_load(&InMemoryKeyValueStore::new()).await;
    }

    #[tokio::test]
    async fn cas_rejects_stale_version() {
        contract::cas_rejects_stale_version(&InMemoryKeyValueStore::new()).await;
    }

    #[tokio::test]
    async fn keys_are_independent() {
        contract::keys_are_independent(&InMemoryKeyValueStore::new()).await;
    }
}
