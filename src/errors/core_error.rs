use std::collections::BTreeMap;
use std::error::Error as StdError;
use std::fmt;

use sea_orm::DbErr;

use crate::common::db_errors::{format_db_error, DbErrorKind};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CoreErrorKind {
    NotFound,
    Validation,
    Conflict,
    Forbidden,
    Unauthorized,
    Unavailable,
    Internal,
}

impl CoreErrorKind {
    /// Transport status the outer API layer should answer with.
    pub fn http_status_code(&self) -> u16 {
        match self {
            CoreErrorKind::Validation => 400,
            CoreErrorKind::Unauthorized => 401,
            CoreErrorKind::Forbidden => 403,
            CoreErrorKind::NotFound => 404,
            CoreErrorKind::Conflict => 409,
            CoreErrorKind::Internal => 500,
            CoreErrorKind::Unavailable => 503,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            CoreErrorKind::NotFound => "NOT_FOUND",
            CoreErrorKind::Validation => "VALIDATION_FAILED",
            CoreErrorKind::Conflict => "CONFLICT",
            CoreErrorKind::Forbidden => "FORBIDDEN",
            CoreErrorKind::Unauthorized => "UNAUTHORIZED",
            CoreErrorKind::Unavailable => "SERVICE_ERROR",
            CoreErrorKind::Internal => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug)]
pub struct CoreError {
    kind: CoreErrorKind,
    message: String,
    fields: Option<BTreeMap<String, String>>,
    source: Option<Box<dyn StdError + Send + Sync>>,
}

pub type CoreResult<T> = Result<T, CoreError>;

impl CoreError {
    pub fn new(kind: CoreErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            fields: None,
            source: None,
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        let mut fields = BTreeMap::new();
        fields.insert("entity".to_string(), entity.into());
        fields.insert("id".to_string(), id.into());

        Self {
            kind: CoreErrorKind::NotFound,
            message: "Resource not found".to_string(),
            fields: Some(fields),
            source: None,
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Validation, message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Conflict, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Forbidden, message)
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unauthorized, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Unavailable, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(CoreErrorKind::Internal, message)
    }

    pub fn with_fields(mut self, fields: BTreeMap<String, String>) -> Self {
        self.fields = Some(fields);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.source = Some(Box::new(source));
        self
    }

    pub fn kind(&self) -> CoreErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn fields(&self) -> Option<&BTreeMap<String, String>> {
        self.fields.as_ref()
    }
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.message)
    }
}

impl StdError for CoreError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.source
            .as_ref()
            .map(|source| source.as_ref() as &(dyn StdError + 'static))
    }
}

impl From<DbErr> for CoreError {
    fn from(err: DbErr) -> Self {
        let (kind, message) = format_db_error("database operation", &err);
        let kind = match kind {
            DbErrorKind::NotFound => CoreErrorKind::NotFound,
            DbErrorKind::UniqueViolation => CoreErrorKind::Conflict,
            DbErrorKind::ForeignKeyViolation => CoreErrorKind::Validation,
            DbErrorKind::ConnectionError | DbErrorKind::Timeout | DbErrorKind::Deadlock => {
                CoreErrorKind::Unavailable
            }
            DbErrorKind::Unknown => CoreErrorKind::Internal,
        };
        CoreError::new(kind, message).with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::RuntimeErr;

    #[test]
    fn kinds_map_to_transport_statuses() {
        assert_eq!(CoreErrorKind::Validation.http_status_code(), 400);
        assert_eq!(CoreErrorKind::Forbidden.http_status_code(), 403);
        assert_eq!(CoreErrorKind::NotFound.http_status_code(), 404);
        assert_eq!(CoreErrorKind::Conflict.http_status_code(), 409);
        assert_eq!(CoreErrorKind::Internal.http_status_code(), 500);
    }

    #[test]
    fn not_found_carries_entity_fields() {
        let err = CoreError::not_found("Plan", "7");
        let fields = err.fields().expect("fields");
        assert_eq!(fields.get("entity").map(String::as_str), Some("Plan"));
        assert_eq!(fields.get("id").map(String::as_str), Some("7"));
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: CoreError =
            DbErr::Query(RuntimeErr::Internal("UNIQUE constraint failed: x".to_string())).into();
        assert_eq!(err.kind(), CoreErrorKind::Conflict);

        let err: CoreError =
            DbErr::Conn(RuntimeErr::Internal("connection refused".to_string())).into();
        assert_eq!(err.kind(), CoreErrorKind::Unavailable);
    }

    #[test]
    fn database_errors_keep_their_source() {
        let err: CoreError = DbErr::RecordNotFound("plan".to_string()).into();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        assert!(err.source().is_some());
    }
}
