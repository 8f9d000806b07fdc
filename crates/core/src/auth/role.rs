//! Company roles and role sets.

use serde::{Deserialize, Serialize};

/// Role of a user within their company.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    /// Runs the company; created the company or was promoted.
    Director,
    /// Company-wide administration.
    Admin,
    /// Runs a worker (branch).
    WorkerDirector,
    /// Administers a worker (branch) and sells.
    WorkerAdmin,
    /// Branch sales staff.
    WorkerUser,
    /// A registered buyer.
    Customer,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Self; 6] = [
        Self::Director,
        Self::Admin,
        Self::WorkerDirector,
        Self::WorkerAdmin,
        Self::WorkerUser,
        Self::Customer,
    ];

    /// Returns the database/API representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Director => "DIRECTOR",
            Self::Admin => "ADMIN",
            Self::WorkerDirector => "WORKER_DIRECTOR",
            Self::WorkerAdmin => "WORKER_ADMIN",
            Self::WorkerUser => "WORKER_USER",
            Self::Customer => "CUSTOMER",
        }
    }

    const fn bit(self) -> u8 {
        1 << (self as u8)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A set of roles, checked with a single mask test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RoleSet(u8);

impl RoleSet {
    /// No role at all.
    pub const EMPTY: Self = Self(0);

    /// Company-level management: invoices for restocking, finance, budget,
    /// and the company balance.
    pub const MANAGEMENT: Self = Self::EMPTY.with(Role::Director).with(Role::Admin);

    /// Branch staff allowed to sell.
    pub const SALES: Self = Self::EMPTY.with(Role::WorkerAdmin).with(Role::WorkerUser);

    /// Everyone employed by a company.
    pub const STAFF: Self = Self::MANAGEMENT
        .with(Role::WorkerDirector)
        .with(Role::WorkerAdmin)
        .with(Role::WorkerUser);

    /// Roles that may read company invoices.
    pub const INVOICE_READERS: Self = Self::MANAGEMENT
        .with(Role::WorkerDirector)
        .with(Role::WorkerAdmin);

    /// Returns a copy of the set including `role`.
    #[must_use]
    pub const fn with(self, role: Role) -> Self {
        Self(self.0 | role.bit())
    }

    /// Returns true if `role` is in the set.
    #[must_use]
    pub const fn contains(self, role: Role) -> bool {
        self.0 & role.bit() != 0
    }

    /// Returns true if the set holds no role.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterates the roles in the set in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Role> {
        Role::ALL.into_iter().filter(move |role| self.contains(*role))
    }
}

impl FromIterator<Role> for RoleSet {
    fn from_iter<I: IntoIterator<Item = Role>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

impl std::fmt::Display for RoleSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, role) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(role.as_str())?;
        }
        Ok(())
    }
}
