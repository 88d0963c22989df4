//! Referential integrity sweep.
//!
//! Users and matrix rows reference roles by id, and nothing keeps those
//! references live. The sweep reports what is dangling; it only ever writes
//! when asked to prune matrix rows, and never touches users.

use std::collections::HashSet;

use serde::Serialize;

use rbacadmin_core::{RoleId, UserId};

use crate::error::StoreResult;
use crate::{IdentityStore, PermissionStore, RoleStore};

/// A user whose `role` names no existing role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DanglingUserRole {
    pub user_id: UserId,
    pub role_id: RoleId,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IntegrityReport {
    pub dangling_user_roles: Vec<DanglingUserRole>,
    /// Matrix rows keyed by role ids that no longer exist.
    pub stale_matrix_roles: Vec<RoleId>,
}

impl IntegrityReport {
    pub fn is_clean(&self) -> bool {
        self.dangling_user_roles.is_empty() && self.stale_matrix_roles.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct IntegritySweep {
    identities: IdentityStore,
    roles: RoleStore,
    permissions: PermissionStore,
}

impl IntegritySweep {
    pub fn new(identities: IdentityStore, roles: RoleStore, permissions: PermissionStore) -> Self {
        Self {
            identities,
            roles,
            permissions,
        }
    }

    async fn live_roles(&self) -> StoreResult<HashSet<RoleId>> {
        Ok(self.roles.list().await?.into_iter().map(|r| r.id).collect())
    }

    /// Read-only scan of all three collections.
    pub async fn scan(&self) -> StoreResult<IntegrityReport> {
        let live = self.live_roles().await?;
        let users = self.identities.list().await?;
        let matrix = self.permissions.get().await?;

        let report = IntegrityReport {
            dangling_user_roles: users
                .into_iter()
                .filter(|u| !live.contains(&u.role))
                .map(|u| DanglingUserRole {
                    user_id: u.id,
                    role_id: u.role,
                })
                .collect(),
            stale_matrix_roles: matrix
                .role_ids()
                .filter(|id| !live.contains(*id))
                .cloned()
                .collect(),
        };

        tracing::info!(
            dangling_users = report.dangling_user_roles.len(),
            stale_rows = report.stale_matrix_roles.len(),
            "integrity scan complete"
        );
        Ok(report)
    }

    /// Drop matrix rows for deleted roles; returns the removed ids.
    ///
    /// Reads the role list, then rewrites the matrix. The two steps are not
    /// atomic with respect to a concurrent role create.
    pub async fn prune_stale_matrix(&self) -> StoreResult<Vec<RoleId>> {
        let live = self.live_roles().await?;
        self.permissions.prune_roles(&live).await
    }
}
