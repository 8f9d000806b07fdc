//! Users, companies, and workers: the records permission checks resolve.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tally_shared::types::{CompanyId, UserId, WorkerId};

use crate::auth::Role;

/// A registered user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User ID.
    pub id: UserId,
    /// Login name, unique across the system.
    pub username: String,
    /// Email address, unique across the system.
    pub email: String,
    /// Given name.
    pub first_name: Option<String>,
    /// Family name.
    pub last_name: Option<String>,
    /// Role within the user's company, if any.
    pub role: Option<Role>,
    /// Company the user belongs to.
    pub company_id: Option<CompanyId>,
    /// Worker (branch) the user belongs to.
    pub worker_id: Option<WorkerId>,
}

impl User {
    /// Creates an unaffiliated user without a role.
    #[must_use]
    pub fn new(username: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            id: UserId::new(),
            username: username.into(),
            email: email.into(),
            first_name: None,
            last_name: None,
            role: None,
            company_id: None,
            worker_id: None,
        }
    }
}

/// A company (tenant).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Company {
    /// Company ID.
    pub id: CompanyId,
    /// Company name, unique across the system.
    pub name: String,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

/// A branch of a company with its own sales staff.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Worker ID.
    pub id: WorkerId,
    /// Branch name.
    pub name: String,
    /// Owning company.
    pub company_id: CompanyId,
    /// The branch's managing user, if assigned.
    pub user_id: Option<UserId>,
}
