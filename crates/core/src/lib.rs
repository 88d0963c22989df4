//! `rbacadmin-core` — domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod version;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, require_non_blank};
pub use id::{EntryId, RoleId, UserId};
pub use version::{ExpectedVersion, Versioned};
