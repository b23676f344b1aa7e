//! Plan lifecycle error types
//!
//! Structured errors raised by the status state machine, the snapshot store and the
//! amendment confirmation protocol. Every variant converts into a [`CoreError`] so the
//! outer API layer only ever sees one error envelope.
//!
//! ```rust
//! use range_plan::errors::{CoreError, CoreErrorKind, PlanError};
//!
//! let err: CoreError = PlanError::StatusNotActive(100).into();
//! assert_eq!(err.kind(), CoreErrorKind::Forbidden);
//! ```

use thiserror::Error;

use super::{CoreError, CoreErrorKind};

#[derive(Error, Debug)]
pub enum PlanError {
    #[error("Plan {0} not found")]
    NotFound(i32),

    #[error("Agreement {0} not found")]
    AgreementNotFound(i32),

    #[error("Confirmation {0} not found")]
    ConfirmationNotFound(i32),

    #[error("Snapshot {0} not found")]
    SnapshotNotFound(i32),

    #[error("Status id must be numeric, got {0}")]
    InvalidStatusId(String),

    #[error("Status {0} is not an active plan status")]
    StatusNotActive(i32),

    #[error("Only the plan creator may request confirmation from agreement holders")]
    NotPlanCreator,

    #[error("Plan {plan_id} is not awaiting confirmation")]
    NotAwaitingConfirmation { plan_id: i32 },

    #[error("Plan {plan_id} is not legally effective and cannot be amended")]
    NotAmendable { plan_id: i32 },

    #[error("Amendment type {0} does not exist")]
    UnknownAmendmentType(i32),

    #[error("Client {client_id} is already linked to agreement {agreement_id}")]
    DuplicateMembership { agreement_id: i32, client_id: i32 },

    #[error("Client {client_id} is not linked to agreement {agreement_id}")]
    MembershipNotFound { agreement_id: i32, client_id: i32 },

    #[error("Snapshot version {version} already exists for plan {plan_id}")]
    VersionConflict { plan_id: i32, version: i32 },

    #[error("Snapshot {0} document is unreadable")]
    CorruptSnapshot(i32),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

impl PlanError {
    pub fn kind(&self) -> CoreErrorKind {
        match self {
            PlanError::NotFound(_)
            | PlanError::AgreementNotFound(_)
            | PlanError::ConfirmationNotFound(_)
            | PlanError::SnapshotNotFound(_)
            | PlanError::MembershipNotFound { .. } => CoreErrorKind::NotFound,
            PlanError::InvalidStatusId(_)
            | PlanError::NotAwaitingConfirmation { .. }
            | PlanError::NotAmendable { .. }
            | PlanError::UnknownAmendmentType(_)
            | PlanError::MissingField(_) => CoreErrorKind::Validation,
            PlanError::StatusNotActive(_) | PlanError::NotPlanCreator => CoreErrorKind::Forbidden,
            PlanError::DuplicateMembership { .. } => CoreErrorKind::Conflict,
            PlanError::VersionConflict { .. } | PlanError::CorruptSnapshot(_) => {
                CoreErrorKind::Internal
            }
        }
    }
}

impl From<PlanError> for CoreError {
    fn from(err: PlanError) -> Self {
        match err {
            PlanError::NotFound(id) => CoreError::not_found("Plan", id.to_string()),
            PlanError::AgreementNotFound(id) => CoreError::not_found("Agreement", id.to_string()),
            PlanError::ConfirmationNotFound(id) => {
                CoreError::not_found("Confirmation", id.to_string())
            }
            PlanError::SnapshotNotFound(id) => CoreError::not_found("Snapshot", id.to_string()),
            other => CoreError::new(other.kind(), other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_status_is_forbidden() {
        let err: CoreError = PlanError::StatusNotActive(100).into();
        assert_eq!(err.kind(), CoreErrorKind::Forbidden);
        assert_eq!(err.message(), "Status 100 is not an active plan status");
    }

    #[test]
    fn missing_plan_keeps_entity_fields() {
        let err: CoreError = PlanError::NotFound(9).into();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
        assert_eq!(
            err.fields().and_then(|f| f.get("entity")).map(String::as_str),
            Some("Plan")
        );
    }

    #[test]
    fn version_race_is_integrity_failure() {
        let err = PlanError::VersionConflict {
            plan_id: 1,
            version: 4,
        };
        assert_eq!(err.kind(), CoreErrorKind::Internal);
        assert_eq!(
            err.to_string(),
            "Snapshot version 4 already exists for plan 1"
        );
    }
}
