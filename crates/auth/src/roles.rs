//! Role records and the drafts the console submits to create them.

use serde::{Deserialize, Serialize};

use rbacadmin_core::{DomainResult, Entity, RoleId, require_non_blank};

/// A named bundle of permissions assignable to users.
///
/// What the role actually grants lives in the [`crate::PermissionMatrix`],
/// keyed by this role's id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: RoleId,
    pub name: String,
    pub description: String,
}

impl Role {
    /// Case-insensitive substring match on name or description.
    pub fn matches(&self, term: &str) -> bool {
        let term = term.trim().to_lowercase();
        term.is_empty()
            || self.name.to_lowercase().contains(&term)
            || self.description.to_lowercase().contains(&term)
    }
}

impl Entity for Role {
    type Id = RoleId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

/// Input for creating a role; the store assigns the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDraft {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

impl RoleDraft {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("name", &self.name)
    }

    pub fn into_role(self, id: RoleId) -> Role {
        Role {
            id,
            name: self.name,
            description: self.description,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_is_required_description_is_not() {
        assert!(RoleDraft::new("", "whatever").validate().is_err());
        assert!(RoleDraft::new("Editor", "").validate().is_ok());
    }

    #[test]
    fn missing_description_defaults_to_empty() {
        let draft: RoleDraft = serde_json::from_str(r#"{"name":"Viewer"}"#).unwrap();
        assert_eq!(draft.description, "");
    }

    #[test]
    fn search_covers_description() {
        let role = RoleDraft::new("Editor", "Can publish articles").into_role(RoleId::new("r1"));
        assert!(role.matches("PUBLISH"));
        assert!(!role.matches("billing"));
    }
}
