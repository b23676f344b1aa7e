//! Database error categorization
//!
//! Classifies `sea_orm::DbErr` values so services can tell a constraint race apart from
//! an outage, and so [`crate::errors::CoreError`] can pick the right kind.
//!
//! ```
//! use range_plan::common::db_errors::{format_db_error, DbErrorKind};
//! use sea_orm::{DbErr, RuntimeErr};
//!
//! let err = DbErr::Query(RuntimeErr::Internal(
//!     "UNIQUE constraint failed: plan_snapshots.plan_id".to_string(),
//! ));
//! let (kind, message) = format_db_error("append snapshot", &err);
//! assert_eq!(kind, DbErrorKind::UniqueViolation);
//! assert_eq!(message, "append snapshot: duplicate key violation");
//! ```

use sea_orm::{DbErr, RuntimeErr, SqlErr};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DbErrorKind {
    /// Query returned no row where one was required
    NotFound,
    /// Unique constraint violation, e.g. a concurrent snapshot version
    UniqueViolation,
    ForeignKeyViolation,
    ConnectionError,
    Timeout,
    /// Transaction deadlock or SQLite busy lock
    Deadlock,
    Unknown,
}

impl DbErrorKind {
    pub fn from_db_err(err: &DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => return Self::UniqueViolation,
            Some(SqlErr::ForeignKeyConstraintViolation(_)) => return Self::ForeignKeyViolation,
            _ => {}
        }

        match err {
            DbErr::RecordNotFound(_) => Self::NotFound,
            DbErr::Conn(RuntimeErr::Internal(msg)) if msg.to_lowercase().contains("timeout") => {
                Self::Timeout
            }
            DbErr::Conn(_) | DbErr::ConnectionAcquire(_) => Self::ConnectionError,
            DbErr::Exec(RuntimeErr::Internal(msg))
            | DbErr::Query(RuntimeErr::Internal(msg)) => Self::from_message(msg),
            other => Self::from_message(&other.to_string()),
        }
    }

    fn from_message(msg: &str) -> Self {
        let msg_lower = msg.to_lowercase();
        if msg_lower.contains("unique") || msg_lower.contains("duplicate") {
            Self::UniqueViolation
        } else if msg_lower.contains("foreign key") || msg_lower.contains("fk_") {
            Self::ForeignKeyViolation
        } else if msg_lower.contains("deadlock") || msg_lower.contains("database is locked") {
            Self::Deadlock
        } else if msg_lower.contains("timeout") {
            Self::Timeout
        } else {
            Self::Unknown
        }
    }

    /// Transient errors that might succeed when the caller resubmits.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConnectionError | Self::Timeout | Self::Deadlock)
    }
}

pub fn is_unique_violation(err: &DbErr) -> bool {
    DbErrorKind::from_db_err(err) == DbErrorKind::UniqueViolation
}

/// Format a database error with the operation that failed.
pub fn format_db_error(operation: &str, err: &DbErr) -> (DbErrorKind, String) {
    let kind = DbErrorKind::from_db_err(err);

    let message = match kind {
        DbErrorKind::NotFound => format!("{}: record not found", operation),
        DbErrorKind::UniqueViolation => format!("{}: duplicate key violation", operation),
        DbErrorKind::ForeignKeyViolation => {
            format!("{}: foreign key constraint violation", operation)
        }
        DbErrorKind::ConnectionError => format!("{}: database connection failed", operation),
        DbErrorKind::Timeout => format!("{}: query timeout", operation),
        DbErrorKind::Deadlock => format!("{}: transaction deadlock", operation),
        DbErrorKind::Unknown => format!("{}: database error - {}", operation, err),
    };

    (kind, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query_err(msg: &str) -> DbErr {
        DbErr::Query(RuntimeErr::Internal(msg.to_string()))
    }

    #[test]
    fn test_categorize_record_not_found() {
        let err = DbErr::RecordNotFound("plan".to_string());
        assert_eq!(DbErrorKind::from_db_err(&err), DbErrorKind::NotFound);
    }

    #[test]
    fn test_categorize_unique_violation() {
        let err = query_err("UNIQUE constraint failed: plan_snapshots.plan_id, plan_snapshots.version");
        assert!(is_unique_violation(&err));
        assert!(!DbErrorKind::UniqueViolation.is_retryable());
    }

    #[test]
    fn test_categorize_foreign_key_violation() {
        let err = DbErr::Exec(RuntimeErr::Internal(
            "FOREIGN KEY constraint failed".to_string(),
        ));
        assert_eq!(
            DbErrorKind::from_db_err(&err),
            DbErrorKind::ForeignKeyViolation
        );
    }

    #[test]
    fn test_sqlite_busy_is_retryable() {
        let err = query_err("database is locked");
        let kind = DbErrorKind::from_db_err(&err);
        assert_eq!(kind, DbErrorKind::Deadlock);
        assert!(kind.is_retryable());
    }

    #[test]
    fn test_format_db_error() {
        let err = DbErr::RecordNotFound("plan".to_string());
        let (kind, message) = format_db_error("load plan", &err);
        assert_eq!(kind, DbErrorKind::NotFound);
        assert_eq!(message, "load plan: record not found");
    }
}
