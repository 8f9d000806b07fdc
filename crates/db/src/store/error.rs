//! Classification of database errors.

use sea_orm::{DbErr, RuntimeErr, SqlErr};
use tally_core::store::StoreError;

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";
/// SQLSTATE `serialization_failure`.
const SERIALIZATION_FAILURE: &str = "40001";
/// SQLSTATE `deadlock_detected`.
const DEADLOCK_DETECTED: &str = "40P01";

/// Maps a database error onto the store's error conditions.
pub(crate) fn store_err(err: DbErr) -> StoreError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(detail)) => return StoreError::DuplicateKey(detail),
        Some(SqlErr::ForeignKeyConstraintViolation(detail)) => {
            return StoreError::DanglingReference(detail);
        }
        _ => {}
    }

    match sqlstate(&err).as_deref() {
        Some(NUMERIC_OUT_OF_RANGE) => StoreError::OutOfRange(err.to_string()),
        Some(SERIALIZATION_FAILURE | DEADLOCK_DETECTED) => StoreError::Conflict(err.to_string()),
        _ => StoreError::Backend(err.to_string()),
    }
}

fn sqlstate(err: &DbErr) -> Option<String> {
    let source: &sqlx::Error = match err {
        DbErr::Exec(RuntimeErr::SqlxError(source))
        | DbErr::Query(RuntimeErr::SqlxError(source))
        | DbErr::Conn(RuntimeErr::SqlxError(source)) => source,
        _ => return None,
    };
    source
        .as_database_error()
        .and_then(|db_err| db_err.code())
        .map(std::borrow::Cow::into_owned)
}
