//! Permission guard.
//!
//! Every mutating operation starts by resolving the caller and checking their
//! role against a [`RoleSet`]. Resolution touches the store; the check itself
//! is pure.

use tally_shared::types::{CompanyId, UserId, WorkerId};
use tracing::debug;

use super::role::{Role, RoleSet};
use crate::directory::User;
use crate::error::{LedgerError, LedgerResult};
use crate::store::StoreTx;

/// A resolved caller, before any permission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Principal {
    /// The caller.
    pub user_id: UserId,
    /// Role within their company.
    pub role: Option<Role>,
    /// Company affiliation.
    pub company_id: Option<CompanyId>,
    /// Worker (branch) affiliation.
    pub worker_id: Option<WorkerId>,
}

impl From<&User> for Principal {
    fn from(user: &User) -> Self {
        Self {
            user_id: user.id,
            role: user.role,
            company_id: user.company_id,
            worker_id: user.worker_id,
        }
    }
}

/// A caller who passed a role check and belongs to a company.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Authorized {
    /// The caller.
    pub user_id: UserId,
    /// The role that satisfied the check.
    pub role: Role,
    /// The company every operation is scoped to.
    pub company_id: CompanyId,
    /// Worker (branch) affiliation.
    pub worker_id: Option<WorkerId>,
}

impl Authorized {
    /// The caller's worker, required for sales.
    pub fn worker(&self) -> LedgerResult<WorkerId> {
        self.worker_id
            .ok_or(LedgerError::NoWorkerAffiliation(self.user_id))
    }
}

/// Resolves callers and checks them against role sets.
#[derive(Debug, Clone, Copy, Default)]
pub struct PermissionGuard;

impl PermissionGuard {
    /// Loads the caller.
    pub async fn resolve<T: StoreTx>(&self, tx: &mut T, user_id: UserId) -> LedgerResult<Principal> {
        let user = tx
            .find_user(user_id)
            .await?
            .ok_or(LedgerError::UserNotFound(user_id))?;
        Ok(Principal::from(&user))
    }

    /// Checks `principal` holds one of `allowed` and belongs to a company.
    pub fn authorize(&self, principal: &Principal, allowed: RoleSet) -> LedgerResult<Authorized> {
        let Some(role) = principal.role.filter(|role| allowed.contains(*role)) else {
            debug!(user_id = %principal.user_id, %allowed, "Role check failed");
            return Err(LedgerError::Forbidden {
                user_id: principal.user_id,
                role: principal.role,
                allowed,
            });
        };
        let company_id = principal
            .company_id
            .ok_or(LedgerError::NoCompanyAffiliation(principal.user_id))?;

        Ok(Authorized {
            user_id: principal.user_id,
            role,
            company_id,
            worker_id: principal.worker_id,
        })
    }

    /// Resolves then authorizes in one step.
    pub async fn require<T: StoreTx>(
        &self,
        tx: &mut T,
        user_id: UserId,
        allowed: RoleSet,
    ) -> LedgerResult<Authorized> {
        let principal = self.resolve(tx, user_id).await?;
        self.authorize(&principal, allowed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn principal(role: Option<Role>, company: bool, worker: bool) -> Principal {
        Principal {
            user_id: UserId::new(),
            role,
            company_id: company.then(CompanyId::new),
            worker_id: worker.then(WorkerId::new),
        }
    }

    #[test]
    fn test_authorize_accepts_member_role() {
        let caller = principal(Some(Role::Admin), true, false);
        let authorized = PermissionGuard.authorize(&caller, RoleSet::MANAGEMENT).unwrap();
        assert_eq!(authorized.role, Role::Admin);
        assert_eq!(Some(authorized.company_id), caller.company_id);
    }

    #[test]
    fn test_authorize_rejects_role_outside_set() {
        let caller = principal(Some(Role::WorkerUser), true, true);
        let err = PermissionGuard
            .authorize(&caller, RoleSet::MANAGEMENT)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[test]
    fn test_authorize_rejects_missing_role() {
        let caller = principal(None, true, false);
        let err = PermissionGuard.authorize(&caller, RoleSet::STAFF).unwrap_err();
        assert!(matches!(err, LedgerError::Forbidden { role: None, .. }));
    }

    #[test]
    fn test_authorize_requires_company() {
        let caller = principal(Some(Role::Director), false, false);
        let err = PermissionGuard
            .authorize(&caller, RoleSet::MANAGEMENT)
            .unwrap_err();
        assert!(matches!(err, LedgerError::NoCompanyAffiliation(_)));
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_sales_need_worker() {
        let with_worker = principal(Some(Role::WorkerUser), true, true);
        let without = principal(Some(Role::WorkerUser), true, false);

        let ok = PermissionGuard.authorize(&with_worker, RoleSet::SALES).unwrap();
        assert_eq!(ok.worker().ok(), with_worker.worker_id);

        let authorized = PermissionGuard.authorize(&without, RoleSet::SALES).unwrap();
        assert!(matches!(
            authorized.worker(),
            Err(LedgerError::NoWorkerAffiliation(_))
        ));
    }
}
