use serde::Serialize;
use thiserror::Error;

use rbacadmin_core::{RoleId, UserId};

use crate::{Permission, PermissionMatrix, User};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("user is inactive")]
    Inactive,

    #[error("forbidden: missing permission '{0}'")]
    Forbidden(Permission),
}

/// Decide whether `user` may perform `required`.
///
/// - No IO
/// - No panics
/// - Dangling role references simply grant nothing
pub fn authorize(
    user: &User,
    required: Permission,
    matrix: &PermissionMatrix,
) -> Result<(), AuthzError> {
    if !user.status.is_active() {
        return Err(AuthzError::Inactive);
    }

    if matrix.is_granted(&user.role, required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Authorization Explanation (Audit Trail)
// ─────────────────────────────────────────────────────────────────────────────

/// Detailed explanation of an authorization decision.
#[derive(Debug, Clone, Serialize)]
pub struct AuthorizationExplanation {
    pub user_id: UserId,
    pub role_id: RoleId,
    pub required_permission: Permission,
    pub granted: bool,
    /// Human-readable reason for the decision.
    pub reason: String,
    /// Everything the user's role currently enables, sorted.
    pub effective_permissions: Vec<String>,
    /// False when the matrix has no row for the user's role at all.
    pub role_in_matrix: bool,
}

/// Explain why [`authorize`] would allow or deny a request.
pub fn explain_authorization(
    user: &User,
    required: Permission,
    matrix: &PermissionMatrix,
) -> AuthorizationExplanation {
    let effective_permissions: Vec<String> = matrix
        .granted(&user.role)
        .into_iter()
        .map(str::to_string)
        .collect();
    let role_in_matrix = matrix.contains_role(&user.role);

    let (granted, reason) = match authorize(user, required, matrix) {
        Ok(()) => (
            true,
            format!("role '{}' grants '{}'", user.role, required),
        ),
        Err(AuthzError::Inactive) => (false, format!("user '{}' is inactive", user.id)),
        Err(AuthzError::Forbidden(_)) if !role_in_matrix => (
            false,
            format!("role '{}' has no permission entry", user.role),
        ),
        Err(AuthzError::Forbidden(_)) => (
            false,
            format!("role '{}' does not grant '{}'", user.role, required),
        ),
    };

    AuthorizationExplanation {
        user_id: user.id.clone(),
        role_id: user.role.clone(),
        required_permission: required,
        granted,
        reason,
        effective_permissions,
        role_in_matrix,
    }
}
