//! Role allow-lists and the capability predicate shared by sign-in and the
//! route guard.

use crate::api::AppKind;
use std::fmt;

/// Roles allowed into the employee portal.
pub const EMPLOYEE_ROLES: [&str; 4] = ["user", "employee", "admin", "super_admin"];

/// Roles allowed into the admin dashboard.
pub const ADMIN_ROLES: [&str; 2] = ["admin", "super_admin"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Employee,
    Admin,
}

impl Capability {
    #[must_use]
    pub const fn for_app(app: AppKind) -> Self {
        match app {
            AppKind::Admin => Self::Admin,
            AppKind::Employee => Self::Employee,
        }
    }

    #[must_use]
    pub const fn allowed_roles(self) -> &'static [&'static str] {
        match self {
            Self::Employee => &EMPLOYEE_ROLES,
            Self::Admin => &ADMIN_ROLES,
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Employee => f.write_str("Employee"),
            Self::Admin => f.write_str("Admin"),
        }
    }
}

/// Lowercases a role and strips the Spring-style `ROLE_` prefix.
#[must_use]
pub fn normalize_role(role: &str) -> String {
    let role = role.trim().to_lowercase();
    match role.strip_prefix("role_") {
        Some(stripped) => stripped.to_string(),
        None => role,
    }
}

/// The roles from `roles` that grant `capability`, normalized.
#[must_use]
pub fn granted_roles<S: AsRef<str>>(roles: &[S], capability: Capability) -> Vec<String> {
    let allowed = capability.allowed_roles();
    roles
        .iter()
        .map(|role| normalize_role(role.as_ref()))
        .filter(|role| allowed.contains(&role.as_str()))
        .collect()
}

#[must_use]
pub fn has_capability<S: AsRef<str>>(roles: &[S], capability: Capability) -> bool {
    !granted_roles(roles, capability).is_empty()
}
