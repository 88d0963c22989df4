//! `rbacadmin-auth` — authorization data model for the admin console.
//!
//! This crate is intentionally decoupled from storage and transport.

pub mod activity;
pub mod authorize;
pub mod permissions;
pub mod roles;
pub mod session;
pub mod user;

pub use activity::ActivityLogEntry;
pub use authorize::{AuthorizationExplanation, AuthzError, authorize, explain_authorization};
pub use permissions::{Permission, PermissionMatrix};
pub use roles::{Role, RoleDraft};
pub use session::{AuthSession, ChangePassword, StubAuthSession, TwoFactorSetup, submit_password_change};
pub use user::{User, UserDraft, UserStatus};
