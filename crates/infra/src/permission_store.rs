//! The persisted role → permission grid.

use std::collections::HashSet;
use std::sync::Arc;

use rbacadmin_auth::PermissionMatrix;
use rbacadmin_core::{RoleId, Versioned};

use crate::collection::{Change, Collection, PERMISSIONS_KEY};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Owns the `permissions` collection.
///
/// Callers load the matrix, edit a working copy with
/// [`PermissionStore::set_cell`], and hand the whole copy back to
/// [`PermissionStore::save`]. `save` overwrites: two callers that loaded the
/// same snapshot and edited different cells will lose whichever edit is saved
/// first. [`PermissionStore::save_versioned`] rejects such a stale save.
#[derive(Debug, Clone)]
pub struct PermissionStore {
    matrix: Collection<PermissionMatrix>,
}

impl PermissionStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            matrix: Collection::new(kv, PERMISSIONS_KEY, config),
        }
    }

    pub async fn get(&self) -> StoreResult<PermissionMatrix> {
        self.matrix.load().await
    }

    /// Merge one cell into a working copy. Does not persist.
    pub fn set_cell(
        matrix: PermissionMatrix,
        role_id: &RoleId,
        permission: impl AsRef<str>,
        value: bool,
    ) -> PermissionMatrix {
        matrix.set_cell(role_id, permission, value)
    }

    /// Persist `matrix` as the entire grid, replacing whatever was stored.
    pub async fn save(&self, matrix: PermissionMatrix) -> StoreResult<PermissionMatrix> {
        self.matrix.replace(&matrix).await?;
        tracing::info!(roles = matrix.len(), "permission matrix saved");
        Ok(matrix)
    }

    /// Load the grid together with its version stamp.
    pub async fn load_versioned(&self) -> StoreResult<Versioned<PermissionMatrix>> {
        self.matrix.load_versioned().await
    }

    /// Persist an edited snapshot only if nobody saved since it was loaded.
    ///
    /// A stale snapshot fails with a conflict; reload, re-apply the edit, and
    /// save again.
    pub async fn save_versioned(
        &self,
        snapshot: Versioned<PermissionMatrix>,
    ) -> StoreResult<Versioned<PermissionMatrix>> {
        let version = self
            .matrix
            .replace_if(&snapshot.value, snapshot.expected())
            .await
            .inspect_err(|err| {
                if err.is_conflict() {
                    tracing::warn!(loaded_version = snapshot.version, "stale permission matrix save rejected");
                }
            })?;

        tracing::info!(roles = snapshot.value.len(), version, "permission matrix saved");
        Ok(Versioned::new(snapshot.value, version))
    }

    /// Remove rows for roles not in `live`; returns the removed ids.
    pub async fn prune_roles(&self, live: &HashSet<RoleId>) -> StoreResult<Vec<RoleId>> {
        let removed = self
            .matrix
            .modify(|matrix| {
                let removed = matrix.retain_roles(|id| live.contains(id));
                Ok(if removed.is_empty() {
                    Change::Unchanged(removed)
                } else {
                    Change::Commit(removed)
                })
            })
            .await?;

        if !removed.is_empty() {
            tracing::info!(removed = removed.len(), "pruned stale permission rows");
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;
    use rbacadmin_auth::Permission;

    fn store() -> PermissionStore {
        PermissionStore::new(Arc::new(InMemoryKeyValueStore::new()), &StoreConfig::default())
    }

    fn role(id: &str) -> RoleId {
        RoleId::new(id)
    }

    #[tokio::test]
    async fn empty_store_yields_empty_matrix() {
        assert!(store().get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn set_cell_is_pure_until_saved() {
        let store = store();
        let loaded = store.get().await.unwrap();

        let edited = PermissionStore::set_cell(loaded, &role("r1"), Permission::Read, true);
        assert!(edited.is_granted(&role("r1"), Permission::Read));
        assert!(store.get().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_get_is_deep_equal() {
        let store = store();
        let matrix = PermissionMatrix::new()
            .set_cell(&role("r1"), Permission::Read, true)
            .set_cell(&role("r1"), "export", false)
            .set_cell(&role("r2"), Permission::Delete, true);

        let saved = store.save(matrix.clone()).await.unwrap();

        assert_eq!(saved, matrix);
        assert_eq!(store.get().await.unwrap(), matrix);
    }

    #[tokio::test]
    async fn save_overwrites_instead_of_merging() {
        let store = store();
        store
            .save(PermissionMatrix::new().set_cell(&role("r1"), Permission::Read, true))
            .await
            .unwrap();
        store
            .save(PermissionMatrix::new().set_cell(&role("r2"), Permission::Update, true))
            .await
            .unwrap();

        let stored = store.get().await.unwrap();
        assert!(!stored.contains_role(&role("r1")));
        assert!(stored.is_granted(&role("r2"), Permission::Update));
    }

    #[tokio::test]
    async fn versioned_save_advances_version() {
        let store = store();
        let snapshot = store.load_versioned().await.unwrap();
        assert_eq!(snapshot.version, 0);

        let saved = store
            .save_versioned(snapshot.map(|m| m.set_cell(&role("r1"), Permission::Create, true)))
            .await
            .unwrap();
        assert_eq!(saved.version, 1);
        assert_eq!(store.load_versioned().await.unwrap(), saved);
    }

    #[tokio::test]
    async fn prune_removes_only_stale_rows() {
        let store = store();
        store
            .save(
                PermissionMatrix::new()
                    .set_cell(&role("live"), Permission::Read, true)
                    .set_cell(&role("gone"), Permission::Read, true),
            )
            .await
            .unwrap();

        let live: HashSet<RoleId> = [role("live")].into_iter().collect();
        let removed = store.prune_roles(&live).await.unwrap();

        assert_eq!(removed, vec![role("gone")]);
        assert!(store.get().await.unwrap().contains_role(&role("live")));
        assert!(store.prune_roles(&live).await.unwrap().is_empty());
    }
}
