//! Roles, role sets, and permission checks.
//!
//! This module provides:
//! - Company roles and constant role sets for each operation family
//! - The permission guard resolving and authorizing callers
//! - The `AuthProvider` seam turning request tokens into user IDs

mod guard;
mod provider;
mod role;

pub use guard::{Authorized, PermissionGuard, Principal};
pub use provider::{AuthProvider, StaticAuthProvider};
pub use role::{Role, RoleSet};
