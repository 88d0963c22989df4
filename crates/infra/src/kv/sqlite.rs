//! Durable key/value store on SQLite.

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use rbacadmin_core::{ExpectedVersion, Versioned};

use super::KeyValueStore;
use crate::error::StorageError;

/// SQLite-backed key/value store.
///
/// One row per key. `version` is bumped inside the same statement that writes
/// the value, so compare-and-swap needs no explicit transaction.
#[derive(Debug, Clone)]
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
}

impl SqliteKeyValueStore {
    /// Open (creating if missing) the database at `url` and ensure the schema.
    pub async fn connect(url: &str) -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true);
        let pool = SqlitePoolOptions::new().connect_with(options).await?;
        Self::with_pool(pool).await
    }

    /// Private in-memory database, kept alive by a single pinned connection.
    pub async fn in_memory() -> Result<Self, StorageError> {
        let options = SqliteConnectOptions::from_str("sqlite::memory:")?;
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(options)
            .await?;
        Self::with_pool(pool).await
    }

    pub async fn with_pool(pool: SqlitePool) -> Result<Self, StorageError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS kv_blobs (
                key     TEXT PRIMARY KEY NOT NULL,
                value   TEXT NOT NULL,
                version INTEGER NOT NULL
            )
            "#,
        )
        .execute(&pool)
        .await?;

        Ok(Self { pool })
    }

    fn conflict(key: &str, expected: ExpectedVersion) -> StorageError {
        StorageError::Conflict(format!("key '{key}': expected {expected:?}"))
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn load_versioned(&self, key: &str) -> Result<Versioned<Option<String>>, StorageError> {
        let row = sqlx::query("SELECT value, version FROM kv_blobs WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(row) => {
                let value: String = row.try_get("value")?;
                let version: i64 = row.try_get("version")?;
                Ok(Versioned::new(Some(value), version as u64))
            }
            None => Ok(Versioned::new(None, 0)),
        }
    }

    async fn compare_and_swap(
        &self,
        key: &str,
        value: String,
        expected: ExpectedVersion,
    ) -> Result<u64, StorageError> {
        match expected {
            ExpectedVersion::Any => {
                let row = sqlx::query(
                    r#"
                    INSERT INTO kv_blobs (key, value, version)
                    VALUES (?1, ?2, 1)
                    ON CONFLICT (key)
                    DO UPDATE SET
                        value = excluded.value,
                        version = kv_blobs.version + 1
                    RETURNING version
                    "#,
                )
                .bind(key)
                .bind(&value)
                .fetch_one(&self.pool)
                .await?;

                let version: i64 = row.try_get("version")?;
                Ok(version as u64)
            }
            ExpectedVersion::Exact(0) => {
                let result = sqlx::query(
                    r#"
                    INSERT INTO kv_blobs (key, value, version)
                    VALUES (?1, ?2, 1)
                    ON CONFLICT (key) DO NOTHING
                    "#,
                )
                .bind(key)
                .bind(&value)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 1 {
                    Ok(1)
                } else {
                    Err(Self::conflict(key, expected))
                }
            }
            ExpectedVersion::Exact(current) => {
                let result = sqlx::query(
                    r#"
                    UPDATE kv_blobs
                    SET value = ?2, version = version + 1
                    WHERE key = ?1 AND version = ?3
                    "#,
                )
                .bind(key)
                .bind(&value)
                .bind(current as i64)
                .execute(&self.pool)
                .await?;

                if result.rows_affected() == 1 {
                    Ok(current + 1)
                } else {
                    Err(Self::conflict(key, expected))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::contract;

    async fn store() -> SqliteKeyValueStore {
        SqliteKeyValueStore::in_memory().await.unwrap()
    }

    #[tokio::test]
    async fn absent_key_is_version_zero() {
        contract::absent_key_is_version_zero(&store().await).await;
    }

    #[tokio::test]
    async fn store_then_load() {
        contract::store_then_load(&store().await).await;
    }

    #[tokio::test]
    async fn cas_rejects_stale_version() {
        contract::cas_rejects_stale_version(&store().await).await;
    }

    #[tokio::test]
    async fn keys_are_independent() {
        contract::keys_are_independent(&store().await).await;
    }

    #[tokio::test]
    async fn survives_reconnect_on_disk() {
        let dir = std::env::temp_dir().join(format!("rbacadmin-kv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let url = format!("sqlite://{}", dir.join("kv.db").display());

        {
            let kv = SqliteKeyValueStore::connect(&url).await.unwrap();
            kv.store("users", "[]".to_string()).await.unwrap();
            kv.pool.close().await;
        }

        let kv = SqliteKeyValueStore::connect(&url).await.unwrap();
        let loaded = kv.load_versioned("users").await.unwrap();
        assert_eq!(loaded.value.as_deref(), Some("[]"));
        assert!(loaded.version >= 1);

        kv.pool.close().await;
        let _ = std::fs::remove_dir_all(&dir);
    }
}
