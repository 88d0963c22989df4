//! Store configuration, read from the environment.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::error::StorageError;
use crate::kv::{InMemoryKeyValueStore, KeyValueStore, LatencyStore, SqliteKeyValueStore};

pub const ENV_BACKEND: &str = "RBACADMIN_BACKEND";
pub const ENV_SQLITE_URL: &str = "RBACADMIN_SQLITE_URL";
pub const ENV_LATENCY_MS: &str = "RBACADMIN_LATENCY_MS";
pub const ENV_WRITE_MODE: &str = "RBACADMIN_WRITE_MODE";
pub const ENV_CAS_ATTEMPTS: &str = "RBACADMIN_CAS_ATTEMPTS";

pub const DEFAULT_SQLITE_URL: &str = "sqlite://rbacadmin.db?mode=rwc";

/// Backend used when `RBACADMIN_BACKEND` is unset and the caller names none.
pub const DEFAULT_BACKEND: &str = "memory";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {var}: '{value}' ({reason})")]
    Invalid {
        var: &'static str,
        value: String,
        reason: &'static str,
    },
}

/// Which medium holds the collections.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Backend {
    Memory,
    Sqlite { url: String },
}

/// How stores perform their read-modify-write cycles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Unguarded read → mutate → write. Concurrent writers can lose updates.
    #[default]
    LastWriterWins,
    /// Writes carry the version they read; a stale write is re-read and
    /// re-applied, up to `max_cas_attempts` times.
    CompareAndSwap,
}

impl core::str::FromStr for WriteMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "last-writer-wins" | "lww" => Ok(WriteMode::LastWriterWins),
            "compare-and-swap" | "cas" => Ok(WriteMode::CompareAndSwap),
            _ => Err("expected last-writer-wins or compare-and-swap"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub backend: Backend,
    /// Artificial delay before every backend call.
    pub latency: Duration,
    pub write_mode: WriteMode,
    pub max_cas_attempts: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::Memory,
            latency: Duration::ZERO,
            write_mode: WriteMode::LastWriterWins,
            max_cas_attempts: 3,
        }
    }
}

impl StoreConfig {
    /// Read the process environment; `default_backend` ("memory" or
    /// "sqlite") applies when `RBACADMIN_BACKEND` is unset.
    pub fn from_env_or(default_backend: &str) -> Result<Self, ConfigError> {
        Self::from_lookup_or(|var| std::env::var(var).ok(), default_backend)
    }

    /// Build from an arbitrary variable source (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Self::from_lookup_or(lookup, DEFAULT_BACKEND)
    }

    pub fn from_lookup_or(
        lookup: impl Fn(&str) -> Option<String>,
        default_backend: &str,
    ) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        let raw = lookup(ENV_BACKEND).unwrap_or_else(|| default_backend.to_string());
        config.backend = match raw.trim().to_ascii_lowercase().as_str() {
            "memory" => Backend::Memory,
            "sqlite" => Backend::Sqlite {
                url: lookup(ENV_SQLITE_URL).unwrap_or_else(|| DEFAULT_SQLITE_URL.to_string()),
            },
            _ => {
                return Err(ConfigError::Invalid {
                    var: ENV_BACKEND,
                    value: raw,
                    reason: "expected memory or sqlite",
                });
            }
        };

        if let Some(raw) = lookup(ENV_LATENCY_MS) {
            let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: ENV_LATENCY_MS,
                value: raw.clone(),
                reason: "expected milliseconds",
            })?;
            config.latency = Duration::from_millis(ms);
        }

        if let Some(raw) = lookup(ENV_WRITE_MODE) {
            config.write_mode = raw.parse().map_err(|reason| ConfigError::Invalid {
                var: ENV_WRITE_MODE,
                value: raw.clone(),
                reason,
            })?;
        }

        if let Some(raw) = lookup(ENV_CAS_ATTEMPTS) {
            config.max_cas_attempts = match raw.trim().parse::<u32>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        var: ENV_CAS_ATTEMPTS,
                        value: raw,
                        reason: "expected a positive integer",
                    });
                }
            };
        }

        Ok(config)
    }

    /// Open the configured backend, wrapped in the latency decorator if set.
    pub async fn open_backend(&self) -> Result<Arc<dyn KeyValueStore>, StorageError> {
        let latency = self.latency;
        let kv: Arc<dyn KeyValueStore> = match &self.backend {
            Backend::Memory => Arc::new(LatencyStore::new(InMemoryKeyValueStore::new(), latency)),
            Backend::Sqlite { url } => {
                let store = SqliteKeyValueStore::connect(url).await?;
                Arc::new(LatencyStore::new(store, latency))
            }
        };

        tracing::info!(
            backend = ?self.backend,
            latency_ms = latency.as_millis() as u64,
            write_mode = ?self.write_mode,
            "opened backing store"
        );
        Ok(kv)
    }
}
