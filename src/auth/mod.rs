pub mod roles;
pub mod service;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use roles::{granted_roles, has_capability, normalize_role, Capability};
pub use service::{AuthService, HttpAuthService};
pub use types::{LoginResponse, RefreshResponse, ValidationResponse};
