//! Read-only view of the audit trail.
//!
//! Entries are appended by whatever produces them; nothing in this crate
//! writes the `activityLogs` key.

use std::sync::Arc;

use rbacadmin_auth::ActivityLogEntry;

use crate::collection::{ACTIVITY_LOGS_KEY, Collection};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::kv::KeyValueStore;

#[derive(Debug, Clone)]
pub struct ActivityLog {
    entries: Collection<Vec<ActivityLogEntry>>,
}

impl ActivityLog {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            entries: Collection::new(kv, ACTIVITY_LOGS_KEY, config),
        }
    }

    /// Entries in storage order.
    pub async fn list(&self) -> StoreResult<Vec<ActivityLogEntry>> {
        self.entries.load().await
    }

    /// Newest `limit` entries, newest first.
    pub async fn recent(&self, limit: usize) -> StoreResult<Vec<ActivityLogEntry>> {
        let mut entries = self.list().await?;
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        entries.truncate(limit);
        Ok(entries)
    }
}
