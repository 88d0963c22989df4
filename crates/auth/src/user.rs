//! User records managed by the identity store.

use serde::{Deserialize, Serialize};

use rbacadmin_core::{DomainResult, Entity, RoleId, UserId, require_non_blank};

// ─────────────────────────────────────────────────────────────────────────────
// User Status
// ─────────────────────────────────────────────────────────────────────────────

/// User account status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    /// User is active and can be granted access.
    #[default]
    Active,
    /// User is disabled; authorization checks deny everything.
    Inactive,
}

impl UserStatus {
    pub fn is_active(self) -> bool {
        self == UserStatus::Active
    }
}

impl core::fmt::Display for UserStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            UserStatus::Active => write!(f, "active"),
            UserStatus::Inactive => write!(f, "inactive"),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// User
// ─────────────────────────────────────────────────────────────────────────────

/// A console identity.
///
/// `role` references a [`crate::Role`] by id. The reference is not enforced:
/// it may point at a role that was never created or has since been deleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: RoleId,
    #[serde(default)]
    pub status: UserStatus,
}

impl User {
    /// Case-insensitive substring match on name or email.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.email.to_lowercase().contains(&term)
    }
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a user; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserDraft {
    pub name: String,
    pub email: String,
    pub role: RoleId,
    #[serde(default)]
    pub status: UserStatus,
}

impl UserDraft {
    pub fn new(name: impl Into<String>, email: impl Into<String>, role: impl Into<RoleId>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            role: role.into(),
            status: UserStatus::Active,
        }
    }

    pub fn with_status(mut self, status: UserStatus) -> Self {
        self.status = status;
        self
    }

    /// Name, email and role are required.
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)?;
        require_non_blank("email", &self.email)?;
        require_non_blank("role", self.role.as_str())?;
        Ok(())
    }

    pub fn into_user(self, id: UserId) -> User {
        User {
            id,
            name: self.name,
            email: self.email,
            role: self.role,
            status: self.status,
        }
    }
}
