use chrono::{DateTime, Utc};
use sea_orm::*;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::auth::Actor;
use crate::database::entities::{plan_snapshots, plan_status_history, plan_statuses, plans};
use crate::errors::{CoreResult, PlanError};
use crate::plan_status::PlanStatusCode;
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::confirmation_coordinator::ConfirmationCoordinator;
use crate::services::snapshot_store::SnapshotStore;
use crate::services::status_history_service::StatusHistoryService;

/// How a transition treats one of the plan's timestamp columns.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldChange {
    Keep,
    Now,
    NowIfEmpty,
    Clear,
}

impl FieldChange {
    pub fn apply(
        self,
        current: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> Option<DateTime<Utc>> {
        match self {
            FieldChange::Keep => current,
            FieldChange::Now => Some(now),
            FieldChange::NowIfEmpty => current.or(Some(now)),
            FieldChange::Clear => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TimestampEffects {
    pub effective_at: FieldChange,
    pub submitted_at: FieldChange,
}

/// Head-row side effects of entering `target`.
///
/// `effective_at` is only ever non-null while the plan sits in a legally effective
/// status.
pub fn timestamp_effects(target: PlanStatusCode) -> TimestampEffects {
    use FieldChange::{Clear, Keep, Now, NowIfEmpty};
    use PlanStatusCode::*;

    let (effective_at, submitted_at) = match target {
        Approved => (Now, Keep),
        Stands => (Now, Now),
        StandsWronglyMade | StandsReview => (NowIfEmpty, Keep),
        SubmittedForReview | SubmittedForFinalDecision => (Clear, Now),
        _ => (Clear, Keep),
    };

    TimestampEffects {
        effective_at,
        submitted_at,
    }
}

/// Accept a status id sent as a JSON number or a numeric string.
pub fn parse_status_id(input: &Value) -> Result<i32, PlanError> {
    let parsed = match input {
        Value::Number(n) => n.as_i64().and_then(|id| i32::try_from(id).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| PlanError::InvalidStatusId(input.to_string()))
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionOutcome {
    pub plan: plans::Model,
    pub status: plan_statuses::Model,
    pub history: plan_status_history::Model,
    pub snapshot: plan_snapshots::Model,
}

/// Validates and executes plan status transitions.
///
/// The head update, history row and snapshot commit in one transaction; any failure
/// leaves the plan untouched.
#[derive(Clone)]
pub struct PlanStateMachine {
    db: DatabaseConnection,
}

impl PlanStateMachine {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn transition(
        &self,
        actor: &Actor,
        plan_id: i32,
        status_id: &Value,
        note: Option<String>,
    ) -> CoreResult<TransitionOutcome> {
        let status_id = parse_status_id(status_id)?;

        let txn = self.db.begin().await?;

        let plan = lock_plan(&txn, plan_id).await?;
        let agreement = load_agreement(&txn, plan.agreement_id).await?;
        AccessGate::require(&txn, actor, &agreement).await?;
        let target = resolve_active_status(&txn, status_id).await?;

        let from = plan.status_id;
        let outcome = Self::apply_in(&txn, plan, target, actor, note).await?;

        txn.commit().await?;

        info!(
            "Plan {} moved from status {} to {} ({}) by user {}",
            plan_id,
            from,
            target.id(),
            target.code(),
            actor.user_id
        );

        Ok(outcome)
    }

    /// Apply a transition inside an open transaction. The caller has already checked
    /// access and that `target` is an active status.
    pub(crate) async fn apply_in(
        txn: &DatabaseTransaction,
        plan: plans::Model,
        target: PlanStatusCode,
        actor: &Actor,
        note: Option<String>,
    ) -> CoreResult<TransitionOutcome> {
        if target == PlanStatusCode::AwaitingConfirmation && plan.creator_id != actor.user_id {
            return Err(PlanError::NotPlanCreator.into());
        }

        if let Some(current) = plan.status_code().filter(|s| s.is_terminal()) {
            warn!(
                "Plan {} leaves terminal status {} for {}",
                plan.id,
                current.code(),
                target.code()
            );
        }

        let now = Utc::now();
        let effects = timestamp_effects(target);
        let from_status_id = plan.status_id;

        let mut active: plans::ActiveModel = plan.clone().into();
        active.status_id = Set(target.id());
        active.effective_at = Set(effects.effective_at.apply(plan.effective_at, now));
        active.submitted_at = Set(effects.submitted_at.apply(plan.submitted_at, now));
        active.updated_at = Set(now);
        let updated = active.update(txn).await?;

        let history = StatusHistoryService::record_in(
            txn,
            updated.id,
            Some(from_status_id),
            target.id(),
            actor.user_id,
            note,
        )
        .await?;

        if target == PlanStatusCode::AwaitingConfirmation {
            ConfirmationCoordinator::reset(txn, updated.agreement_id, updated.id).await?;
            ConfirmationCoordinator::refresh(txn, updated.id, actor).await?;
        }

        let snapshot = SnapshotStore::append(txn, &updated, Some(actor.user_id)).await?;

        let status = plan_statuses::Entity::find_by_id(target.id())
            .one(txn)
            .await?
            .ok_or(PlanError::StatusNotActive(target.id()))?;

        Ok(TransitionOutcome {
            plan: updated,
            status,
            history,
            snapshot,
        })
    }
}

pub(crate) async fn load_plan<C: ConnectionTrait>(
    conn: &C,
    plan_id: i32,
) -> CoreResult<plans::Model> {
    plans::Entity::find_by_id(plan_id)
        .one(conn)
        .await?
        .ok_or_else(|| PlanError::NotFound(plan_id).into())
}

/// Load the plan head and hold its row lock until `txn` ends, so concurrent
/// transitions on one plan apply in sequence.
pub(crate) async fn lock_plan(
    txn: &DatabaseTransaction,
    plan_id: i32,
) -> CoreResult<plans::Model> {
    plan_for_update(txn.get_database_backend(), plan_id)
        .one(txn)
        .await?
        .ok_or_else(|| PlanError::NotFound(plan_id).into())
}

// SQLite serialises writers already and has no row locks
fn plan_for_update(backend: DbBackend, plan_id: i32) -> Select<plans::Entity> {
    let query = plans::Entity::find_by_id(plan_id);
    if backend == DbBackend::Sqlite {
        query
    } else {
        query.lock_exclusive()
    }
}

/// Look the status up in the reference table; unknown and inactive ids are both refused.
pub(crate) async fn resolve_active_status<C: ConnectionTrait>(
    conn: &C,
    status_id: i32,
) -> CoreResult<PlanStatusCode> {
    let status = plan_statuses::Entity::find_by_id(status_id)
        .one(conn)
        .await?
        .filter(|s| s.active)
        .ok_or(PlanError::StatusNotActive(status_id))?;

    Ok(status
        .status_code()
        .ok_or(PlanError::StatusNotActive(status_id))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use serde_json::json;

    #[test]
    fn plan_head_is_locked_where_supported() {
        let postgres = plan_for_update(DbBackend::Postgres, 7)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(postgres.contains("FOR UPDATE"), "{}", postgres);

        let sqlite = plan_for_update(DbBackend::Sqlite, 7)
            .build(DbBackend::Sqlite)
            .to_string();
        assert!(!sqlite.contains("FOR UPDATE"), "{}", sqlite);
    }

    #[test]
    fn status_id_parsing() {
        assert_eq!(parse_status_id(&json!(12)).unwrap(), 12);
        assert_eq!(parse_status_id(&json!("12")).unwrap(), 12);
        assert_eq!(parse_status_id(&json!(" 4 ")).unwrap(), 4);
        assert!(matches!(
            parse_status_id(&json!("word")),
            Err(PlanError::InvalidStatusId(_))
        ));
        assert!(parse_status_id(&json!(1.5)).is_err());
        assert!(parse_status_id(&json!(null)).is_err());
        assert!(parse_status_id(&json!(9_000_000_000i64)).is_err());
    }

    #[test]
    fn legal_statuses_set_effective_date() {
        let now = Utc::now();
        let earlier = now - Duration::days(30);

        let approved = timestamp_effects(PlanStatusCode::Approved);
        assert_eq!(approved.effective_at.apply(None, now), Some(now));
        assert_eq!(approved.submitted_at.apply(Some(earlier), now), Some(earlier));

        let stands = timestamp_effects(PlanStatusCode::Stands);
        assert_eq!(stands.effective_at.apply(Some(earlier), now), Some(now));
        assert_eq!(stands.submitted_at.apply(None, now), Some(now));

        let review = timestamp_effects(PlanStatusCode::StandsReview);
        assert_eq!(review.effective_at.apply(Some(earlier), now), Some(earlier));
        assert_eq!(review.effective_at.apply(None, now), Some(now));
    }

    #[test]
    fn non_legal_statuses_clear_effective_date() {
        let now = Utc::now();
        for status in [
            PlanStatusCode::WronglyMadeWithoutEffect,
            PlanStatusCode::SubmittedForReview,
            PlanStatusCode::Draft,
            PlanStatusCode::Retired,
        ] {
            assert_eq!(
                timestamp_effects(status).effective_at.apply(Some(now), now),
                None,
                "{:?}",
                status
            );
        }

        let submitted = timestamp_effects(PlanStatusCode::SubmittedForFinalDecision);
        assert_eq!(submitted.submitted_at, FieldChange::Now);
    }
}
