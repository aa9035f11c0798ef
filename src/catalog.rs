//! Role-to-capability mapping.
//!
//! A capability is a dotted action name such as `leave.approve`.  The
//! catalog is built once at process start, validated, and then only
//! read.  Route-level gatekeeping lives in [`crate::policy`]; the
//! catalog answers finer questions such as "may this role export the
//! payroll report".

use crate::error::CoreError;
use crate::models::Role;
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A named action a role is allowed to perform.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Capability(String);

impl Capability {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for Capability {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Capability {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

const EMPLOYEE_CAPABILITIES: &[&str] = &[
    "profile.read",
    "attendance.clock",
    "attendance.read_own",
    "leave.request",
    "leave.read_own",
    "payslip.read_own",
];

const MANAGER_CAPABILITIES: &[&str] = &[
    "employee.read",
    "attendance.read_team",
    "leave.read_team",
    "leave.approve",
    "report.view",
    "report.export",
];

const HR_CAPABILITIES: &[&str] = &[
    "employee.write",
    "department.manage",
    "attendance.read_all",
    "attendance.manage",
    "leave.read_all",
    "leave.manage_types",
    "payroll.read",
    "payroll.manage",
];

const ADMIN_CAPABILITIES: &[&str] = &["user.manage", "settings.manage", "audit.read"];

/// Immutable mapping from [`Role`] to its capability set.
#[derive(Debug, Clone)]
pub struct PermissionCatalog {
    grants: HashMap<Role, HashSet<Capability>>,
}

impl PermissionCatalog {
    /// Builds a catalog from explicit entries.
    ///
    /// Every role must be present with at least one capability.  A
    /// duplicated role merges its capabilities.
    pub fn new<I, C>(entries: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = (Role, C)>,
        C: IntoIterator<Item = Capability>,
    {
        let mut grants: HashMap<Role, HashSet<Capability>> = HashMap::new();
        for (role, capabilities) in entries {
            grants.entry(role).or_default().extend(capabilities);
        }
        for role in Role::ALL {
            match grants.get(&role) {
                None => {
                    let message = format!("no capabilities defined for role {role}");
                    return Err(CoreError::config(message));
                }
                Some(set) if set.is_empty() => {
                    return Err(CoreError::config(format!("empty capability set for role {role}")))
                }
                Some(_) => {}
            }
        }
        Ok(Self { grants })
    }

    /// The application's capability table.  Roles are cumulative:
    /// a manager holds every employee capability, HR every manager
    /// capability, and admin everything.
    pub fn standard() -> Result<Self, CoreError> {
        let tiers = [
            EMPLOYEE_CAPABILITIES,
            MANAGER_CAPABILITIES,
            HR_CAPABILITIES,
            ADMIN_CAPABILITIES,
        ];
        let entries = [Role::Employee, Role::Manager, Role::Hr, Role::Admin]
            .into_iter()
            .enumerate()
            .map(|(level, role)| {
                let capabilities: Vec<Capability> = tiers[..=level]
                    .iter()
                    .flat_map(|tier| tier.iter().copied().map(Capability::from))
                    .collect();
                (role, capabilities)
            });
        Self::new(entries)
    }

    /// Returns the capabilities granted to `role`.
    ///
    /// A role missing from the table is a configuration error; it is
    /// never reported as an empty set.
    pub fn capabilities_of(&self, role: Role) -> Result<&HashSet<Capability>, CoreError> {
        self.grants
            .get(&role)
            .ok_or_else(|| {
                CoreError::config(format!("role {role} missing from capability catalog"))
            })
    }

    pub fn has_capability(&self, role: Role, capability: &str) -> bool {
        self.grants
            .get(&role)
            .is_some_and(|set| set.contains(capability))
    }

    /// Returns whether `role` holds at least one of `capabilities`.
    /// False for an empty list.
    pub fn has_any(&self, role: Role, capabilities: &[&str]) -> bool {
        capabilities.iter().any(|c| self.has_capability(role, c))
    }

    /// Returns whether `role` holds every one of `capabilities`.
    /// True for an empty list.
    pub fn has_all(&self, role: Role, capabilities: &[&str]) -> bool {
        capabilities.iter().all(|c| self.has_capability(role, c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_role_has_capabilities() {
        let catalog = PermissionCatalog::standard().unwrap();
        for role in Role::ALL {
            let first = catalog.capabilities_of(role).unwrap().clone();
            assert!(!first.is_empty(), "{role} has no capabilities");
            assert_eq!(&first, catalog.capabilities_of(role).unwrap());
        }
    }

    #[test]
    fn test_standard_tiers() {
        let catalog = PermissionCatalog::standard().unwrap();
        assert!(catalog.has_capability(Role::Employee, "leave.request"));
        assert!(!catalog.has_capability(Role::Employee, "leave.approve"));

        assert!(catalog.has_capability(Role::Manager, "leave.approve"));
        assert!(catalog.has_capability(Role::Manager, "leave.request"));
        assert!(!catalog.has_capability(Role::Manager, "payroll.read"));

        assert!(catalog.has_capability(Role::Hr, "payroll.read"));
        assert!(!catalog.has_capability(Role::Hr, "settings.manage"));

        assert!(catalog.has_capability(Role::Admin, "settings.manage"));
        assert!(catalog.has_capability(Role::Admin, "attendance.clock"));
    }

    #[test]
    fn test_any_and_all() {
        let catalog = PermissionCatalog::standard().unwrap();
        assert!(catalog.has_any(Role::Manager, &["payroll.read", "report.export"]));
        assert!(!catalog.has_all(Role::Manager, &["payroll.read", "report.export"]));
        assert!(catalog.has_all(Role::Hr, &["payroll.read", "report.export"]));

        assert!(!catalog.has_any(Role::Admin, &[]));
        assert!(catalog.has_all(Role::Employee, &[]));
        assert!(!catalog.has_capability(Role::Admin, "no.such.capability"));
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_catalog_is_shareable_across_threads() {
        assert_send_sync::<PermissionCatalog>();

        let catalog = PermissionCatalog::standard().unwrap();
        std::thread::scope(|scope| {
            for role in Role::ALL {
                let catalog = &catalog;
                scope.spawn(move || {
                    assert!(!catalog.capabilities_of(role).unwrap().is_empty());
                });
            }
        });
    }

    #[test]
    fn test_missing_role_is_config_error() {
        let entries = vec![
            (Role::Admin, vec![Capability::from("settings.manage")]),
            (Role::Hr, vec![Capability::from("payroll.read")]),
            (Role::Manager, vec![Capability::from("leave.approve")]),
        ];
        let err = PermissionCatalog::new(entries).unwrap_err();
        assert!(matches!(err, CoreError::Config(_)));
    }

    #[test]
    fn test_empty_role_is_config_error() {
        let entries = Role::ALL.map(|role| {
            let caps = if role == Role::Employee {
                Vec::new()
            } else {
                vec![Capability::from("profile.read")]
            };
            (role, caps)
        });
        let err = PermissionCatalog::new(entries).unwrap_err();
        assert_eq!(err, CoreError::Config("empty capability set for role EMPLOYEE".into()));
    }
}
