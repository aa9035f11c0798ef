//! Route-level access policy.
//!
//! The policy is a list of [`RouteRule`]s plus a whitelist of public
//! prefixes.  Evaluation for an authenticated caller is a conjunction
//! over every rule whose prefixes match the path: all matching rules
//! must admit the caller's role.  A path matched by no rule is allowed
//! once the caller is authenticated.
//!
//! The engine holds only immutable data and may be shared across
//! threads without synchronisation.

use crate::models::{Principal, Role};
use std::collections::HashSet;

/// Outcome of a policy evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Allow,
    /// No principal was supplied for a non-public path.
    DenyUnauthenticated,
    /// A matching rule excludes the principal's role.
    DenyForbidden,
}

/// A set of path prefixes guarded by a set of roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    /// Matched case-sensitively against the start of the request path.
    pub path_prefixes: Vec<String>,
    pub allowed_roles: HashSet<Role>,
}

impl RouteRule {
    pub fn new(path_prefixes: &[&str], allowed_roles: &[Role]) -> Self {
        Self {
            path_prefixes: path_prefixes.iter().map(|p| p.to_string()).collect(),
            allowed_roles: allowed_roles.iter().copied().collect(),
        }
    }

    pub fn matches(&self, path: &str) -> bool {
        self.path_prefixes.iter().any(|prefix| path.starts_with(prefix.as_str()))
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed_roles.contains(&role)
    }
}

/// The static tables an engine evaluates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyTable {
    pub public_prefixes: Vec<String>,
    pub rules: Vec<RouteRule>,
}

impl PolicyTable {
    /// Route coverage of the personnel application.
    ///
    /// Report exports are governed by two rules at once: the broad
    /// `/reports` rule and the narrower payroll rule, so a manager can
    /// export attendance and leave but not payroll.
    pub fn standard() -> Self {
        use Role::{Admin, Employee, Hr, Manager};

        let public_prefixes = [
            "/login",
            "/api/auth",
            "/unauthorized",
            "/health",
            "/static",
            "/favicon.ico",
        ]
        .iter()
        .map(|p| p.to_string())
        .collect();

        let rules = vec![
            RouteRule::new(&["/admin", "/api/admin", "/settings", "/api/settings"], &[Admin]),
            RouteRule::new(&["/employees", "/api/employees"], &[Admin, Hr, Manager]),
            RouteRule::new(&["/employees/new", "/api/employees/import"], &[Admin, Hr]),
            RouteRule::new(&["/departments", "/api/departments"], &[Admin, Hr]),
            RouteRule::new(&["/payroll", "/api/payroll"], &[Admin, Hr]),
            RouteRule::new(&["/attendance/all", "/api/attendance/all"], &[Admin, Hr, Manager]),
            RouteRule::new(&["/leave/approvals", "/api/leave/approve"], &[Admin, Hr, Manager]),
            RouteRule::new(&["/leave/types", "/api/leave/types"], &[Admin, Hr]),
            RouteRule::new(&["/reports", "/api/reports"], &[Admin, Hr, Manager]),
            RouteRule::new(&["/reports/payroll", "/api/reports/payroll"], &[Admin, Hr]),
            RouteRule::new(&["/dashboard", "/api/me"], &[Admin, Hr, Manager, Employee]),
        ];

        Self { public_prefixes, rules }
    }
}

/// Gatekeeper for (principal, path) pairs.
#[derive(Debug, Clone)]
pub struct PolicyEngine {
    table: PolicyTable,
}

impl PolicyEngine {
    pub fn new(table: PolicyTable) -> Self {
        Self { table }
    }

    pub fn is_public(&self, path: &str) -> bool {
        self.table
            .public_prefixes
            .iter()
            .any(|prefix| path.starts_with(prefix.as_str()))
    }

    /// Rules governing `path`, in table order.
    pub fn matching_rules<'a>(&'a self, path: &'a str) -> impl Iterator<Item = &'a RouteRule> + 'a {
        self.table.rules.iter().filter(move |rule| rule.matches(path))
    }

    /// Decides whether `principal` may access `path`.
    pub fn authorize(&self, principal: Option<&Principal>, path: &str) -> Decision {
        if self.is_public(path) {
            return Decision::Allow;
        }
        let Some(principal) = principal else {
            return Decision::DenyUnauthenticated;
        };
        if self.matching_rules(path).all(|rule| rule.admits(principal.role)) {
            Decision::Allow
        } else {
            Decision::DenyForbidden
        }
    }
}

impl Default for PolicyEngine {
    fn default() -> Self {
        Self::new(PolicyTable::standard())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: Role) -> Principal {
        Principal {
            id: format!("user-{}", role.as_str().to_lowercase()),
            email: "someone@example.com".into(),
            role,
            employee_id: None,
        }
    }

    #[test]
    fn test_public_paths_always_allowed() {
        let engine = PolicyEngine::default();
        for path in ["/login", "/api/auth/session", "/health", "/unauthorized"] {
            assert!(engine.is_public(path));
            assert_eq!(engine.authorize(None, path), Decision::Allow);
            for role in Role::ALL {
                assert_eq!(engine.authorize(Some(&principal(role)), path), Decision::Allow);
            }
        }
    }

    #[test]
    fn test_missing_principal_is_unauthenticated() {
        let engine = PolicyEngine::default();
        assert_eq!(engine.authorize(None, "/payroll"), Decision::DenyUnauthenticated);
        // Unmatched paths still require a session.
        assert_eq!(engine.authorize(None, "/profile"), Decision::DenyUnauthenticated);
    }

    #[test]
    fn test_unmatched_paths_default_open() {
        let engine = PolicyEngine::default();
        assert_eq!(engine.matching_rules("/profile").count(), 0);
        for role in Role::ALL {
            assert_eq!(engine.authorize(Some(&principal(role)), "/profile"), Decision::Allow);
        }
    }

    #[test]
    fn test_single_rule_roles() {
        let engine = PolicyEngine::default();
        assert_eq!(engine.authorize(Some(&principal(Role::Hr)), "/payroll/run"), Decision::Allow);
        assert_eq!(
            engine.authorize(Some(&principal(Role::Manager)), "/payroll/run"),
            Decision::DenyForbidden
        );
        assert_eq!(
            engine.authorize(Some(&principal(Role::Hr)), "/settings"),
            Decision::DenyForbidden
        );
        assert_eq!(engine.authorize(Some(&principal(Role::Admin)), "/settings"), Decision::Allow);
    }

    #[test]
    fn test_all_matching_rules_must_pass() {
        let engine = PolicyEngine::default();
        let path = "/api/reports/payroll/export";
        assert_eq!(engine.matching_rules(path).count(), 2);

        // Manager passes the broad reports rule but fails the payroll one.
        assert_eq!(
            engine.authorize(Some(&principal(Role::Manager)), path),
            Decision::DenyForbidden
        );
        assert_eq!(engine.authorize(Some(&principal(Role::Hr)), path), Decision::Allow);
        assert_eq!(
            engine.authorize(Some(&principal(Role::Employee)), path),
            Decision::DenyForbidden
        );

        assert_eq!(
            engine.authorize(Some(&principal(Role::Manager)), "/api/reports/leave/export"),
            Decision::Allow
        );
    }

    #[test]
    fn test_decision_independent_of_rule_order() {
        let mut table = PolicyTable::standard();
        let forward = PolicyEngine::new(table.clone());
        table.rules.reverse();
        let reversed = PolicyEngine::new(table);

        let paths = [
            "/api/reports/payroll/export",
            "/employees/new",
            "/employees",
            "/leave/approvals",
            "/profile",
        ];
        for path in paths {
            for role in Role::ALL {
                let p = principal(role);
                assert_eq!(forward.authorize(Some(&p), path), reversed.authorize(Some(&p), path));
            }
        }
    }

    fn assert_send_sync<T: Send + Sync>() {}

    #[test]
    fn test_engine_is_shareable_across_threads() {
        assert_send_sync::<PolicyEngine>();

        let engine = PolicyEngine::default();
        let manager = principal(Role::Manager);
        let path = "/api/reports/payroll/export";
        let expected = engine.authorize(Some(&manager), path);
        std::thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| engine.authorize(Some(&manager), path)))
                .collect();
            for handle in handles {
                assert_eq!(handle.join().unwrap(), expected);
            }
        });
    }

    #[test]
    fn test_prefix_match_is_case_sensitive() {
        let engine = PolicyEngine::default();
        let employee = principal(Role::Employee);
        assert_eq!(engine.authorize(Some(&employee), "/payroll"), Decision::DenyForbidden);
        assert_eq!(engine.authorize(Some(&employee), "/Payroll"), Decision::Allow);
        assert_eq!(engine.authorize(None, "/LOGIN"), Decision::DenyUnauthenticated);
    }
}
