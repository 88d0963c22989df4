//! Infrastructure layer: backing store, collection codec, and the identity,
//! role and permission stores built on it.

pub mod activity_log;
pub mod collection;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod identity_store;
pub mod integrity;
pub mod kv;
pub mod permission_store;
pub mod role_store;

use std::sync::Arc;

pub use activity_log::ActivityLog;
pub use config::{Backend, ConfigError, StoreConfig, WriteMode};
pub use dashboard::{DashboardStats, dashboard_stats};
pub use error::{StorageError, StoreError, StoreResult};
pub use identity_store::IdentityStore;
pub use integrity::{IntegrityReport, IntegritySweep};
pub use kv::KeyValueStore;
pub use permission_store::PermissionStore;
pub use role_store::RoleStore;

/// Every store, sharing one backing store and one configuration.
#[derive(Debug, Clone)]
pub struct AdminStores {
    pub identities: IdentityStore,
    pub roles: RoleStore,
    pub permissions: PermissionStore,
    pub activity: ActivityLog,
}

impl AdminStores {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            identities: IdentityStore::new(kv.clone(), config),
            roles: RoleStore::new(kv.clone(), config),
            permissions: PermissionStore::new(kv.clone(), config),
            activity: ActivityLog::new(kv, config),
        }
    }

    /// Open the configured backend and wire every store to it.
    pub async fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        let kv = config.open_backend().await?;
        Ok(Self::new(kv, config))
    }

    pub fn integrity(&self) -> IntegritySweep {
        IntegritySweep::new(self.identities.clone(), self.roles.clone(), self.permissions.clone())
    }

    pub async fn dashboard(&self) -> StoreResult<DashboardStats> {
        dashboard_stats(&self.identities, &self.roles, &self.permissions).await
    }
}
