//! Role records.

use std::sync::Arc;

use rbacadmin_auth::{Role, RoleDraft};
use rbacadmin_core::RoleId;

use crate::collection::{Change, Collection, ROLES_KEY, remove_entity, replace_entity};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Owns the `roles` collection.
///
/// Deleting a role leaves users that reference it, and its permission matrix
/// row, exactly as they were.
#[derive(Debug, Clone)]
pub struct RoleStore {
    roles: Collection<Vec<Role>>,
}

impl RoleStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            roles: Collection::new(kv, ROLES_KEY, config),
        }
    }

    pub async fn list(&self) -> StoreResult<Vec<Role>> {
        self.roles.load().await
    }

    pub async fn get(&self, id: &RoleId) -> StoreResult<Option<Role>> {
        Ok(self.list().await?.into_iter().find(|r| &r.id == id))
    }

    /// Roles whose name or description contains `term`, ignoring case.
    pub async fn search(&self, term: &str) -> StoreResult<Vec<Role>> {
        let mut roles = self.list().await?;
        roles.retain(|r| r.matches(term));
        Ok(roles)
    }

    pub async fn create(&self, draft: RoleDraft) -> StoreResult<Role> {
        draft.validate()?;
        let role = draft.into_role(RoleId::generate());

        self.roles
            .modify(|roles| {
                roles.push(role.clone());
                Ok(Change::Commit(()))
            })
            .await?;

        tracing::info!(role_id = %role.id, name = %role.name, "role created");
        Ok(role)
    }

    pub async fn update(&self, role: Role) -> StoreResult<Role> {
        self.roles
            .modify(|roles| {
                replace_entity(roles, role.clone())?;
                Ok(Change::Commit(()))
            })
            .await
            .inspect_err(|err| {
                if err.is_not_found() {
                    tracing::warn!(role_id = %role.id, "update of unknown role");
                }
            })?;

        tracing::info!(role_id = %role.id, "role updated");
        Ok(role)
    }

    pub async fn delete(&self, id: &RoleId) -> StoreResult<()> {
        let removed = self
            .roles
            .modify(|roles| {
                Ok(if remove_entity(roles, id) {
                    Change::Commit(true)
                } else {
                    Change::Unchanged(false)
                })
            })
            .await?;

        tracing::info!(role_id = %id, removed, "role delete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kv::InMemoryKeyValueStore;

    fn store() -> RoleStore {
        RoleStore::new(Arc::new(InMemoryKeyValueStore::new()), &StoreConfig::default())
    }

    fn store_with_kv() -> (Arc<InMemoryKeyValueStore>, RoleStore) {
        let kv = Arc::new(InMemoryKeyValueStore::new());
        (kv.clone(), RoleStore::new(kv, &StoreConfig::default()))
    }

    #[tokio::test]
    async fn create_requires_name() {
        let err = store().create(RoleDraft::new("  ", "blank")).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn create_update_round_trip() {
        let store = store();
        let editor = store.create(RoleDraft::new("Editor", "Edits")).await.unwrap();
        let viewer = store.create(RoleDraft::new("Viewer", "Reads")).await.unwrap();
        assert_ne!(editor.id, viewer.id);

        let mut renamed = editor.clone();
        renamed.name = "Senior Editor".to_string();
        store.update(renamed.clone()).await.unwrap();

        let roles = store.list().await.unwrap();
        assert_eq!(roles, vec![renamed, viewer]);
    }

    #[tokio::test]
    async fn update_missing_fails_and_leaves_collection_unchanged() {
        let (kv, store) = store_with_kv();
        let editor = store.create(RoleDraft::new("Editor", "")).await.unwrap();
        let before = kv.load_versioned(ROLES_KEY).await.unwrap();

        let ghost = RoleDraft::new("Ghost", "").into_role(RoleId::new("nonexistent"));
        assert!(store.update(ghost).await.unwrap_err().is_not_found());

        assert_eq!(store.list().await.unwrap(), vec![editor]);
        assert_eq!(kv.load_versioned(ROLES_KEY).await.unwrap(), before);
    }

    #[tokio::test]
    async fn delete_missing_is_a_no_op() {
        let store = store();
        let editor = store.create(RoleDraft::new("Editor", "")).await.unwrap();

        store.delete(&RoleId::new("nonexistent")).await.unwrap();
        assert_eq!(store.list().await.unwrap(), vec![editor.clone()]);

        store.delete(&editor.id).await.unwrap();
        store.delete(&editor.id).await.unwrap();
        assert!(store.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn search_matches_description() {
        let store = store();
        store.create(RoleDraft::new("Editor", "Publishes articles")).await.unwrap();
        store.create(RoleDraft::new("Auditor", "Reads billing")).await.unwrap();

        let found = store.search("billing").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Auditor");
    }
}
