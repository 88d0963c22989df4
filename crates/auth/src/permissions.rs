//! Permission vocabulary and the role → permission grid.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use rbacadmin_core::{DomainError, RoleId};

/// Operation a role can be granted.
///
/// This is the closed vocabulary the console offers. The persisted matrix is
/// keyed by plain strings, so names outside this set survive a load/save cycle
/// untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Permission {
    Create,
    Read,
    Update,
    Delete,
}

impl Permission {
    pub const ALL: [Permission; 4] = [
        Permission::Create,
        Permission::Read,
        Permission::Update,
        Permission::Delete,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::Create => "create",
            Permission::Read => "read",
            Permission::Update => "update",
            Permission::Delete => "delete",
        }
    }
}

impl AsRef<str> for Permission {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Permission {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| DomainError::validation(format!("unknown permission '{s}'")))
    }
}

/// Grid mapping (role id, permission name) to an enabled flag.
///
/// Roles without an entry are treated as having every permission disabled.
/// Entries for roles that no longer exist are kept as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionMatrix(BTreeMap<RoleId, BTreeMap<String, bool>>);

impl PermissionMatrix {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a copy of this matrix with one cell set.
    ///
    /// Every other cell, for this role and for other roles, is carried over.
    pub fn set_cell(mut self, role_id: &RoleId, permission: impl AsRef<str>, value: bool) -> Self {
        self.set(role_id, permission, value);
        self
    }

    /// In-place variant of [`PermissionMatrix::set_cell`].
    pub fn set(&mut self, role_id: &RoleId, permission: impl AsRef<str>, value: bool) {
        self.0
            .entry(role_id.clone())
            .or_default()
            .insert(permission.as_ref().to_string(), value);
    }

    /// Absent roles and absent cells read as `false`.
    pub fn is_granted(&self, role_id: &RoleId, permission: impl AsRef<str>) -> bool {
        self.0
            .get(role_id)
            .and_then(|cells| cells.get(permission.as_ref()))
            .copied()
            .unwrap_or(false)
    }

    /// Enabled permission names for a role, sorted.
    pub fn granted(&self, role_id: &RoleId) -> Vec<&str> {
        self.0
            .get(role_id)
            .map(|cells| {
                cells
                    .iter()
                    .filter(|(_, enabled)| **enabled)
                    .map(|(name, _)| name.as_str())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains_role(&self, role_id: &RoleId) -> bool {
        self.0.contains_key(role_id)
    }

    pub fn role_ids(&self) -> impl Iterator<Item = &RoleId> {
        self.0.keys()
    }

    /// Number of roles that have an entry (stale ones included).
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Drop entries whose role id fails `keep`; returns the removed ids.
    pub fn retain_roles(&mut self, mut keep: impl FnMut(&RoleId) -> bool) -> Vec<RoleId> {
        let removed: Vec<RoleId> = self.0.keys().filter(|id| !keep(id)).cloned().collect();
        for id in &removed {
            self.0.remove(id);
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn role(id: &str) -> RoleId {
        RoleId::new(id)
    }

    #[test]
    fn absent_role_reads_as_denied() {
        let matrix = PermissionMatrix::new();
        assert!(!matrix.is_granted(&role("r1"), Permission::Read));
        assert!(matrix.granted(&role("r1")).is_empty());
    }

    #[test]
    fn set_cell_merges_into_existing_role() {
        let matrix = PermissionMatrix::new()
            .set_cell(&role("r1"), Permission::Create, true)
            .set_cell(&role("r2"), Permission::Delete, true)
            .set_cell(&role("r1"), Permission::Read, true);

        assert!(matrix.is_granted(&role("r1"), Permission::Create));
        assert!(matrix.is_granted(&role("r1"), Permission::Read));
        assert!(matrix.is_granted(&role("r2"), Permission::Delete));
        assert_eq!(matrix.granted(&role("r1")), vec!["create", "read"]);
    }

    #[test]
    fn set_cell_does_not_touch_the_source_snapshot() {
        let loaded = PermissionMatrix::new().set_cell(&role("r1"), Permission::Read, true);
        let edited = loaded.clone().set_cell(&role("r1"), Permission::Read, false);

        assert!(loaded.is_granted(&role("r1"), Permission::Read));
        assert!(!edited.is_granted(&role("r1"), Permission::Read));
    }

    #[test]
    fn unknown_permission_names_survive_serde() {
        let raw = r#"{"r1":{"read":true,"export":true},"gone":{"create":false}}"#;
        let matrix: PermissionMatrix = serde_json::from_str(raw).unwrap();

        assert!(matrix.is_granted(&role("r1"), "export"));
        assert_eq!(matrix.len(), 2);

        let back: serde_json::Value = serde_json::to_value(&matrix).unwrap();
        assert_eq!(back, serde_json::from_str::<serde_json::Value>(raw).unwrap());
    }

    #[test]
    fn permission_parses_case_insensitively() {
        assert_eq!("READ".parse::<Permission>().unwrap(), Permission::Read);
        assert!("export".parse::<Permission>().is_err());
    }

    #[test]
    fn retain_roles_reports_removed_ids() {
        let mut matrix = PermissionMatrix::new()
            .set_cell(&role("live"), Permission::Read, true)
            .set_cell(&role("stale"), Permission::Read, true);

        let removed = matrix.retain_roles(|id| id.as_str() == "live");

        assert_eq!(removed, vec![role("stale")]);
        assert!(matrix.contains_role(&role("live")));
        assert!(!matrix.contains_role(&role("stale")));
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Property-Based Tests
    // ─────────────────────────────────────────────────────────────────────────

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        fn cell() -> impl Strategy<Value = (String, String, bool)> {
            ("[a-d]{1,2}", "[a-z]{1,8}", any::<bool>())
        }

        proptest! {
            #![proptest_config(ProptestConfig {
                cases: 256,
                ..ProptestConfig::default()
            })]

            /// Property: setting one cell never disturbs any other cell.
            #[test]
            fn set_cell_preserves_other_cells(
                cells in proptest::collection::vec(cell(), 0..20),
                (role_id, name, value) in cell(),
            ) {
                let mut before = PermissionMatrix::new();
                for (r, p, v) in &cells {
                    before.set(&RoleId::new(r.clone()), p, *v);
                }

                let target = RoleId::new(role_id);
                let after = before.clone().set_cell(&target, &name, value);

                prop_assert_eq!(after.is_granted(&target, &name), value);
                for (r, p, _) in &cells {
                    let r = RoleId::new(r.clone());
                    if r == target && *p == name {
                        continue;
                    }
                    prop_assert_eq!(after.is_granted(&r, p), before.is_granted(&r, p));
                }
            }
        }
    }
}
