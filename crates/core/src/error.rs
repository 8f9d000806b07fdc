//! Ledger error types.
//!
//! Every failure the core can produce is a [`LedgerError`]. Each variant maps
//! onto one [`ErrorKind`], which fixes the public message and status code a
//! caller sees.

use rust_decimal::Decimal;
use tally_shared::AppError;
use tally_shared::types::{BalanceId, BudgetId, CompanyId, InvoiceId, ProductId, UserId};
use thiserror::Error;

use crate::auth::{Role, RoleSet};
use crate::balance::BalanceOwner;
use crate::store::StoreError;

/// Result type alias using `LedgerError`.
pub type LedgerResult<T> = Result<T, LedgerError>;

/// Caller-facing error categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The caller could not be identified.
    Unauthenticated,
    /// The caller's role is not permitted.
    Forbidden,
    /// A referenced entity or affiliation is missing.
    NotFound,
    /// A non-positive amount or quantity, or a negative price.
    InvalidAmount,
    /// A malformed request.
    Validation,
    /// A product has nothing available for sale.
    OutOfStock,
    /// A product has less available for sale than requested.
    InsufficientStock,
    /// An overdraft or deficit refused by ledger policy.
    PolicyViolation,
    /// The request conflicts with current state.
    Conflict,
    /// A uniqueness constraint was violated.
    DuplicateKey,
    /// A reference points at a row that does not exist.
    DanglingReference,
    /// A numeric value exceeds what can be represented or stored.
    OutOfRange,
    /// Anything the caller cannot act on.
    Internal,
}

impl ErrorKind {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden => "FORBIDDEN",
            Self::NotFound => "NOT_FOUND",
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::Validation => "VALIDATION_ERROR",
            Self::OutOfStock => "OUT_OF_STOCK",
            Self::InsufficientStock => "INSUFFICIENT_STOCK",
            Self::PolicyViolation => "POLICY_VIOLATION",
            Self::Conflict => "CONFLICT",
            Self::DuplicateKey => "DUPLICATE_KEY",
            Self::DanglingReference => "DANGLING_REFERENCE",
            Self::OutOfRange => "OUT_OF_RANGE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// Returns the HTTP status code for this kind.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Unauthenticated => 401,
            Self::Forbidden => 403,
            Self::NotFound => 404,
            Self::InvalidAmount | Self::Validation | Self::OutOfRange => 400,
            Self::Conflict | Self::DuplicateKey | Self::DanglingReference => 409,
            Self::OutOfStock | Self::InsufficientStock | Self::PolicyViolation => 422,
            Self::Internal => 500,
        }
    }

    /// Returns a fixed message that never includes internal details.
    #[must_use]
    pub const fn public_message(self) -> &'static str {
        match self {
            Self::Unauthenticated => "Authentication credentials were not provided or are invalid",
            Self::Forbidden => "You do not have permission to perform this action",
            Self::NotFound => "The requested resource was not found",
            Self::InvalidAmount => "Amounts and quantities must be positive with at most three decimal places",
            Self::Validation => "The request is invalid",
            Self::OutOfStock => "The product is out of stock",
            Self::InsufficientStock => "Not enough of the product is available for sale",
            Self::PolicyViolation => "The operation would overdraw the account",
            Self::Conflict => "The request conflicts with the current state",
            Self::DuplicateKey => "The resource already exists",
            Self::DanglingReference => "The request references a resource that does not exist",
            Self::OutOfRange => "A value is too large",
            Self::Internal => "An internal error occurred",
        }
    }
}

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    // ========== Identity & Permission ==========
    /// The request carried no valid credentials.
    #[error("Authentication required")]
    Unauthenticated,

    /// The caller's role is not in the required set.
    #[error("User {user_id} with role {} is not one of [{allowed}]", role.map_or("NONE", Role::as_str))]
    Forbidden {
        /// The caller.
        user_id: UserId,
        /// The caller's role, if any.
        role: Option<Role>,
        /// Roles that would have been accepted.
        allowed: RoleSet,
    },

    /// User not found.
    #[error("User not found: {0}")]
    UserNotFound(UserId),

    /// The caller does not belong to a company.
    #[error("User {0} is not affiliated with a company")]
    NoCompanyAffiliation(UserId),

    /// The caller does not belong to a worker (branch).
    #[error("User {0} is not affiliated with a worker")]
    NoWorkerAffiliation(UserId),

    /// The caller already belongs to a company.
    #[error("User {0} already belongs to a company")]
    AlreadyAffiliated(UserId),

    // ========== Missing Ledger State ==========
    /// Company not found.
    #[error("Company not found: {0}")]
    CompanyNotFound(CompanyId),

    /// The owner has no balance.
    #[error("No balance for {0}")]
    BalanceNotFound(BalanceOwner),

    /// The company has no budget.
    #[error("No budget for company {0}")]
    BudgetNotFound(CompanyId),

    /// Product not found (or not visible to the caller's company).
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Invoice not found (or not visible to the caller's company).
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    // ========== Validation ==========
    /// Monetary amount must be strictly positive and fit the stored scale.
    #[error("Amount must be positive with at most three decimal places, got {0}")]
    InvalidAmount(Decimal),

    /// Quantity must be strictly positive and fit the stored scale.
    #[error("Quantity must be positive with at most three decimal places, got {0}")]
    InvalidQuantity(Decimal),

    /// Prices cannot be negative.
    #[error("Price cannot be negative, got {0}")]
    NegativePrice(Decimal),

    /// An invoice needs at least one line.
    #[error("Invoice must have at least one line")]
    EmptyInvoice,

    /// Free-form validation failure.
    #[error("Validation error: {0}")]
    Validation(String),

    // ========== Stock ==========
    /// Nothing of the product is available for sale.
    #[error("Product {product} is out of stock")]
    OutOfStock {
        /// Product name.
        product: String,
    },

    /// Less of the product is available for sale than requested.
    #[error("Insufficient stock for {product}: requested {requested}, available {available}")]
    InsufficientStock {
        /// Product name.
        product: String,
        /// Requested quantity.
        requested: Decimal,
        /// Quantity available for sale.
        available: Decimal,
    },

    // ========== Policy ==========
    /// An expense would drive the balance below zero.
    #[error("Balance {balance_id} holds {available}, cannot spend {requested}")]
    Overdraft {
        /// The balance.
        balance_id: BalanceId,
        /// Amount held before the expense.
        available: Decimal,
        /// Expense amount.
        requested: Decimal,
    },

    /// An expense would drive the budget's profit below zero.
    #[error("Budget {budget_id} profit {profit} cannot absorb expense {amount}")]
    Deficit {
        /// The budget.
        budget_id: BudgetId,
        /// Profit before the expense.
        profit: Decimal,
        /// Expense amount.
        amount: Decimal,
    },

    // ========== Audit ==========
    /// A stored history does not reproduce its aggregate.
    #[error("History diverges at entry {position}: expected {expected}, recorded {recorded}")]
    HistoryMismatch {
        /// Zero-based index of the offending entry (or the entry count when
        /// the final total disagrees).
        position: usize,
        /// Value implied by replaying earlier entries.
        expected: Decimal,
        /// Value found in storage.
        recorded: Decimal,
    },

    // ========== Storage ==========
    /// Unique constraint violation.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// Foreign key violation.
    #[error("Dangling reference: {0}")]
    DanglingReference(String),

    /// Arithmetic or column overflow.
    #[error("Value out of range: {0}")]
    OutOfRange(String),

    /// The store detected a concurrent write.
    #[error("Concurrent modification detected, please retry")]
    ConcurrentModification,

    /// Unclassified storage failure.
    #[error("Store error: {0}")]
    Store(String),
}

impl LedgerError {
    /// Returns the caller-facing category.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Unauthenticated => ErrorKind::Unauthenticated,
            Self::Forbidden { .. } => ErrorKind::Forbidden,
            Self::UserNotFound(_)
            | Self::NoCompanyAffiliation(_)
            | Self::NoWorkerAffiliation(_)
            | Self::CompanyNotFound(_)
            | Self::BalanceNotFound(_)
            | Self::BudgetNotFound(_)
            | Self::ProductNotFound(_)
            | Self::InvoiceNotFound(_) => ErrorKind::NotFound,
            Self::InvalidAmount(_) | Self::InvalidQuantity(_) | Self::NegativePrice(_) => {
                ErrorKind::InvalidAmount
            }
            Self::EmptyInvoice | Self::Validation(_) => ErrorKind::Validation,
            Self::OutOfStock { .. } => ErrorKind::OutOfStock,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::Overdraft { .. } | Self::Deficit { .. } => ErrorKind::PolicyViolation,
            Self::AlreadyAffiliated(_) | Self::ConcurrentModification => ErrorKind::Conflict,
            Self::DuplicateKey(_) => ErrorKind::DuplicateKey,
            Self::DanglingReference(_) => ErrorKind::DanglingReference,
            Self::OutOfRange(_) => ErrorKind::OutOfRange,
            Self::HistoryMismatch { .. } | Self::Store(_) => ErrorKind::Internal,
        }
    }

    /// Returns the detailed error code for logs and API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::Forbidden { .. } => "ROLE_NOT_PERMITTED",
            Self::UserNotFound(_) => "USER_NOT_FOUND",
            Self::NoCompanyAffiliation(_) => "NO_COMPANY_AFFILIATION",
            Self::NoWorkerAffiliation(_) => "NO_WORKER_AFFILIATION",
            Self::AlreadyAffiliated(_) => "ALREADY_AFFILIATED",
            Self::CompanyNotFound(_) => "COMPANY_NOT_FOUND",
            Self::BalanceNotFound(_) => "BALANCE_NOT_FOUND",
            Self::BudgetNotFound(_) => "BUDGET_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::InvalidAmount(_) => "INVALID_AMOUNT",
            Self::InvalidQuantity(_) => "INVALID_QUANTITY",
            Self::NegativePrice(_) => "NEGATIVE_PRICE",
            Self::EmptyInvoice => "EMPTY_INVOICE",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OutOfStock { .. } => "OUT_OF_STOCK",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::Overdraft { .. } => "OVERDRAFT",
            Self::Deficit { .. } => "DEFICIT",
            Self::HistoryMismatch { .. } => "HISTORY_MISMATCH",
            Self::DuplicateKey(_) => "DUPLICATE_KEY",
            Self::DanglingReference(_) => "DANGLING_REFERENCE",
            Self::OutOfRange(_) => "OUT_OF_RANGE",
            Self::ConcurrentModification => "CONCURRENT_MODIFICATION",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        self.kind().http_status_code()
    }

    /// Returns true if retrying the whole operation may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::ConcurrentModification)
    }

    /// Message safe to show to the caller.
    ///
    /// Kinds whose detail comes from storage (constraint names, column names,
    /// backend text) collapse to the fixed message of their kind; the detail
    /// stays in `Display` for logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        let kind = self.kind();
        match kind {
            ErrorKind::DuplicateKey
            | ErrorKind::DanglingReference
            | ErrorKind::OutOfRange
            | ErrorKind::Internal => kind.public_message().to_string(),
            _ => self.to_string(),
        }
    }
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateKey(what) => Self::DuplicateKey(what),
            StoreError::DanglingReference(what) => Self::DanglingReference(what),
            StoreError::OutOfRange(what) => Self::OutOfRange(what),
            StoreError::Conflict(_) => Self::ConcurrentModification,
            StoreError::Backend(msg) => Self::Store(msg),
        }
    }
}

impl From<tally_shared::types::PeriodError> for LedgerError {
    fn from(err: tally_shared::types::PeriodError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        let message = err.public_message();
        match err.kind() {
            ErrorKind::Unauthenticated => Self::Unauthorized(message),
            ErrorKind::Forbidden => Self::Forbidden(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InvalidAmount | ErrorKind::Validation | ErrorKind::OutOfRange => {
                Self::Validation(message)
            }
            ErrorKind::OutOfStock | ErrorKind::InsufficientStock | ErrorKind::PolicyViolation => {
                Self::BusinessRule(message)
            }
            ErrorKind::Conflict | ErrorKind::DuplicateKey | ErrorKind::DanglingReference => {
                Self::Conflict(message)
            }
            ErrorKind::Internal if matches!(err, LedgerError::Store(_)) => {
                Self::Database(message)
            }
            ErrorKind::Internal => Self::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(LedgerError::Unauthenticated, ErrorKind::Unauthenticated, 401)]
    #[case(LedgerError::UserNotFound(UserId::new()), ErrorKind::NotFound, 404)]
    #[case(LedgerError::BudgetNotFound(CompanyId::new()), ErrorKind::NotFound, 404)]
    #[case(LedgerError::InvalidQuantity(dec!(0)), ErrorKind::InvalidAmount, 400)]
    #[case(LedgerError::EmptyInvoice, ErrorKind::Validation, 400)]
    #[case(LedgerError::OutOfStock { product: "Flour".into() }, ErrorKind::OutOfStock, 422)]
    #[case(LedgerError::AlreadyAffiliated(UserId::new()), ErrorKind::Conflict, 409)]
    #[case(LedgerError::DuplicateKey("balances_user_id_key".into()), ErrorKind::DuplicateKey, 409)]
    #[case(LedgerError::OutOfRange("balances.amount".into()), ErrorKind::OutOfRange, 400)]
    #[case(LedgerError::Store("connection reset".into()), ErrorKind::Internal, 500)]
    fn test_kind_and_status(
        #[case] err: LedgerError,
        #[case] kind: ErrorKind,
        #[case] status: u16,
    ) {
        assert_eq!(err.kind(), kind);
        assert_eq!(err.http_status_code(), status);
    }

    #[test]
    fn test_insufficient_stock_names_product_and_quantities() {
        let err = LedgerError::InsufficientStock {
            product: "Apples".to_string(),
            requested: dec!(4),
            available: dec!(3),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Apples: requested 4, available 3"
        );
        assert_eq!(err.error_code(), "INSUFFICIENT_STOCK");
    }

    #[test]
    fn test_forbidden_lists_allowed_roles() {
        let err = LedgerError::Forbidden {
            user_id: UserId::new(),
            role: Some(Role::Customer),
            allowed: RoleSet::MANAGEMENT,
        };
        let text = err.to_string();
        assert!(text.contains("CUSTOMER"));
        assert!(text.contains("DIRECTOR, ADMIN"));
    }

    #[test]
    fn test_internal_errors_do_not_leak() {
        let err = LedgerError::Store("password authentication failed for user tally".into());
        assert_eq!(err.public_message(), "An internal error occurred");

        let app: AppError = err.into();
        assert_eq!(app.error_code(), "DATABASE_ERROR");
        assert!(!app.to_string().contains("password"));
    }

    #[rstest]
    #[case(LedgerError::DuplicateKey("companies_name_key".into()), "The resource already exists")]
    #[case(
        LedgerError::DanglingReference("invoices_buyer_id_fkey".into()),
        "The request references a resource that does not exist"
    )]
    #[case(LedgerError::OutOfRange("balances.amount".into()), "A value is too large")]
    fn test_storage_detail_stays_out_of_public_message(
        #[case] err: LedgerError,
        #[case] expected: &str,
    ) {
        let detail = err.to_string();
        assert_eq!(err.public_message(), expected);

        let app: AppError = err.into();
        assert!(!app.to_string().contains(detail.split(": ").last().unwrap()));
    }

    #[test]
    fn test_domain_errors_keep_their_detail() {
        let err = LedgerError::InvalidAmount(dec!(0));
        assert_eq!(
            err.public_message(),
            "Amount must be positive with at most three decimal places, got 0"
        );
    }

    #[test]
    fn test_store_errors_map_to_kinds() {
        let err: LedgerError = StoreError::Conflict("could not serialize access".into()).into();
        assert!(err.is_retryable());
        assert_eq!(err.kind(), ErrorKind::Conflict);

        let err: LedgerError = StoreError::DanglingReference("invoices_buyer_id_fkey".into()).into();
        assert_eq!(err.kind(), ErrorKind::DanglingReference);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_policy_violation_becomes_business_rule() {
        let err = LedgerError::Overdraft {
            balance_id: BalanceId::new(),
            available: dec!(10),
            requested: dec!(25),
        };
        let app: AppError = err.into();
        assert_eq!(app.status_code(), 422);
    }
}
