//! Application-wide error types.

use thiserror::Error;

use crate::types::PeriodError;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error categories.
///
/// Domain crates convert their own errors into one of these at the boundary;
/// the message carried here is already safe to show to a caller.
#[derive(Debug, Error)]
pub enum AppError {
    /// The caller could not be identified.
    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    /// The caller is not allowed to perform the operation.
    #[error("Access denied: {0}")]
    Forbidden(String),

    /// A referenced resource does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The request is malformed.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request is well-formed but breaks a business rule.
    #[error("Business rule violation: {0}")]
    BusinessRule(String),

    /// The request conflicts with existing state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The storage layer failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::Unauthorized(_) => 401,
            Self::Forbidden(_) => 403,
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::BusinessRule(_) => 422,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::BusinessRule(_) => "BUSINESS_RULE_VIOLATION",
            Self::Conflict(_) => "CONFLICT",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl From<PeriodError> for AppError {
    fn from(err: PeriodError) -> Self {
        Self::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::Unauthorized(String::new()), 401, "UNAUTHORIZED")]
    #[case(AppError::Forbidden(String::new()), 403, "FORBIDDEN")]
    #[case(AppError::NotFound(String::new()), 404, "NOT_FOUND")]
    #[case(AppError::Validation(String::new()), 400, "VALIDATION_ERROR")]
    #[case(AppError::BusinessRule(String::new()), 422, "BUSINESS_RULE_VIOLATION")]
    #[case(AppError::Conflict(String::new()), 409, "CONFLICT")]
    #[case(AppError::Database(String::new()), 500, "DATABASE_ERROR")]
    #[case(AppError::Internal(String::new()), 500, "INTERNAL_ERROR")]
    fn test_status_and_code(
        #[case] err: AppError,
        #[case] status: u16,
        #[case] code: &'static str,
    ) {
        assert_eq!(err.status_code(), status);
        assert_eq!(err.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::BusinessRule("insufficient stock".into()).to_string(),
            "Business rule violation: insufficient stock"
        );
        assert_eq!(
            AppError::Forbidden("role not permitted".into()).to_string(),
            "Access denied: role not permitted"
        );
    }

    #[test]
    fn test_period_error_is_validation() {
        use chrono::{TimeZone, Utc};

        let from = Utc.with_ymd_and_hms(2026, 1, 2, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
        let err: AppError = PeriodError::Inverted { from, to }.into();
        assert_eq!(err.status_code(), 400);
    }
}
