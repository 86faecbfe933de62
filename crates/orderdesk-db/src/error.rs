//! # Database Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error ──► DbError (constraint parsing, categorization)           │
//! │  CoreError  ──► DbError::Domain (rule violations inside transactions)   │
//! │                      │                                                  │
//! │                      ▼                                                  │
//! │              ApiError (apps/server) ──► JSON error envelope             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use orderdesk_core::CoreError;
use thiserror::Error;

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// Entity not found in database.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Second live receipt for an order (`receipts.order_id`)
    /// - Duplicate receipt number (`receipts.number`)
    /// - Duplicate user email (`users.email`)
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// A business rule rejected the operation; the transaction was rolled back.
    #[error(transparent)]
    Domain(#[from] CoreError),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// SQLite gave up waiting for a lock (`SQLITE_BUSY` / `SQLITE_LOCKED`).
    #[error("Database busy: {0}")]
    Busy(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// True when SQLite reported a lock it could not get.
    pub fn is_busy(&self) -> bool {
        matches!(self, DbError::Busy(_))
    }

    /// True when this is a unique violation on `table.column`.
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.split(", ").any(|f| f == column))
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type,
///                               primary code 5 / 6 → DbError::Busy
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let busy = db_err
                    .code()
                    .and_then(|code| code.parse::<i32>().ok())
                    .is_some_and(is_lock_code);
                let msg = db_err.message();

                // SQLite messages:
                //   "UNIQUE constraint failed: receipts.order_id"
                //   "FOREIGN KEY constraint failed"
                if busy {
                    DbError::Busy(msg.to_string())
                } else if let Some(field) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    DbError::UniqueViolation {
                        field: field.to_string(),
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

/// `SQLITE_BUSY` (5) and `SQLITE_LOCKED` (6), including their extended codes.
fn is_lock_code(code: i32) -> bool {
    matches!(code & 0xff, 5 | 6)
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_violation_matching() {
        let err = DbError::UniqueViolation {
            field: "receipts.order_id".to_string(),
            value: "unknown".to_string(),
        };
        assert!(err.is_unique_violation_on("receipts.order_id"));
        assert!(!err.is_unique_violation_on("receipts.number"));
        assert!(!DbError::PoolExhausted.is_unique_violation_on("receipts.order_id"));
    }

    #[test]
    fn test_lock_codes() {
        assert!(is_lock_code(5));
        assert!(is_lock_code(6));
        // SQLITE_BUSY_SNAPSHOT, SQLITE_LOCKED_SHAREDCACHE
        assert!(is_lock_code(517));
        assert!(is_lock_code(262));
        // SQLITE_CONSTRAINT_UNIQUE
        assert!(!is_lock_code(2067));
        assert!(DbError::Busy("database is locked".into()).is_busy());
        assert!(!DbError::PoolExhausted.is_busy());
    }

    #[test]
    fn test_domain_errors_pass_through() {
        let err: DbError = CoreError::OrderAlreadyCancelled.into();
        assert_eq!(err.to_string(), "Order already cancelled");
    }
}
