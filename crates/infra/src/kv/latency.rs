use std::time::Duration;

use async_trait::async_trait;

use rbacadmin_core::{ExpectedVersion, Versioned};

use super::KeyValueStore;
use crate::error::StorageError;

/// Decorator that suspends before every backend call.
///
/// Stands in for network/disk latency so that interleavings between
/// concurrent callers can be reproduced in tests and demos.
#[derive(Debug)]
pub struct LatencyStore<S> {
    inner: S,
    delay: Duration,
}

impl<S> LatencyStore<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self { inner, delay }
    }

    async fn pause(&self) {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
    }
}

#[async_trait]
impl<S> KeyValueStore for LatencyStore<S>
where
    S: KeyValueStore,
{
    async fn load_versioned(&self, key: &str) -> Result<Versioned<Option<String>>, StorageError> {
        self.pause().await;
        self.inner.load_versioned(key).await
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        value: String,
        expected: ExpectedVersion,
    ) -> Result<u64, StorageError> {
        self.pause().await;
        self.inner.compare_and_swap(key, value, expected).await
    }
}
