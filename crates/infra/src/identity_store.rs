//! User records.

use std::sync::Arc;

use rbacadmin_auth::{User, UserDraft};
use rbacadmin_core::UserId;

use crate::collection::{Change, Collection, USERS_KEY, remove_entity, replace_entity};
use crate::config::StoreConfig;
use crate::error::StoreResult;
use crate::kv::KeyValueStore;

/// Owns the `users` collection.
///
/// `User::role` is stored as given; whether it names a live role is not
/// checked here (see [`crate::integrity`]).
#[derive(Debug, Clone)]
pub struct IdentityStore {
    users: Collection<Vec<User>>,
}

impl IdentityStore {
    pub fn new(kv: Arc<dyn KeyValueStore>, config: &StoreConfig) -> Self {
        Self {
            users: Collection::new(kv, USERS_KEY, config),
        }
    }

    /// All users in storage order.
    pub async fn list(&self) -> StoreResult<Vec<User>> {
        self.users.load().await
    }

    pub async fn get(&self, id: &UserId) -> StoreResult<Option<User>> {
        Ok(self.list().await?.into_iter().find(|u| &u.id == id))
    }

    /// Users whose name or email contains `term`, ignoring case.
    pub async fn search(&self, term: &str) -> StoreResult<Vec<User>> {
        let mut users = self.list().await?;
        users.retain(|u| u.matches(term));
        Ok(users)
    }

    pub async fn create(&self, draft: UserDraft) -> StoreResult<User> {
        draft.validate()?;
        let user = draft.into_user(UserId::generate());

        self.users
            .modify(|users| {
                users.push(user.clone());
                Ok(Change::Commit(()))
            })
            .await?;

        tracing::info!(user_id = %user.id, role_id = %user.role, "user created");
        Ok(user)
    }

    /// Replace the whole record; fails with `NotFound` for an unknown id.
    pub async fn update(&self, user: User) -> StoreResult<User> {
        self.users
            .modify(|users| {
                replace_entity(users, user.clone())?;
                Ok(Change::Commit(()))
            })
            .await
            .inspect_err(|err| {
                if err.is_not_found() {
                    tracing::warn!(user_id = %user.id, "update of unknown user");
                }
            })?;

        tracing::info!(user_id = %user.id, status = %user.status, "user updated");
        Ok(user)
    }

    /// Remove the record if present. Unknown ids are not an error.
    pub async fn delete(&self, id: &UserId) -> StoreResult<()> {
        let removed = self
            .users
            .modify(|users| {
                Ok(if remove_entity(users, id) {
                    Change::Commit(true)
                } else {
                    Change::Unchanged(false)
                })
            })
            .await?;

        tracing::info!(user_id = %id, removed, "user delete");
        Ok(())
    }
}
