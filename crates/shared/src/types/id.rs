//! Typed IDs for type-safe entity references.
//!
//! A `BalanceId` cannot be passed where a `BudgetId` is expected, which keeps
//! ledger back-references honest across crate boundaries.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Generates a typed ID wrapper around a UUID.
macro_rules! typed_id {
    ($name:ident, $doc:expr) => {
        #[doc = $doc]
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            /// Creates a new time-ordered ID (UUID v7).
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::now_v7())
            }

            /// Wraps an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// Returns the inner UUID.
            #[must_use]
            pub const fn into_inner(self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(uuid: Uuid) -> Self {
                Self(uuid)
            }
        }

        impl From<$name> for Uuid {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::str::FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(Uuid::parse_str(s)?))
            }
        }
    };
}

typed_id!(UserId, "Unique identifier for a user.");
typed_id!(CompanyId, "Unique identifier for a company.");
typed_id!(WorkerId, "Unique identifier for a worker (company branch).");
typed_id!(BalanceId, "Unique identifier for a monetary balance.");
typed_id!(
    BalanceHistoryId,
    "Unique identifier for a balance history entry."
);
typed_id!(BudgetId, "Unique identifier for a company budget.");
typed_id!(
    BudgetHistoryId,
    "Unique identifier for a budget history entry."
);
typed_id!(FinanceId, "Unique identifier for a finance record.");
typed_id!(ProductId, "Unique identifier for a product.");
typed_id!(InvoiceId, "Unique identifier for an invoice.");
