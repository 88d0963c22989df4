//! Summary counts for the console landing page.

use serde::Serialize;

use crate::error::StoreResult;
use crate::{IdentityStore, PermissionStore, RoleStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DashboardStats {
    pub total_users: usize,
    pub active_users: usize,
    pub total_roles: usize,
    /// Number of roles with a matrix row, stale rows included.
    pub total_permissions: usize,
}

pub async fn dashboard_stats(
    identities: &IdentityStore,
    roles: &RoleStore,
    permissions: &PermissionStore,
) -> StoreResult<DashboardStats> {
    let (users, roles, matrix) = tokio::try_join!(identities.list(), roles.list(), permissions.get())?;

    Ok(DashboardStats {
        total_users: users.len(),
        active_users: users.iter().filter(|u| u.status.is_active()).count(),
        total_roles: roles.len(),
        total_permissions: matrix.len(),
    })
}
