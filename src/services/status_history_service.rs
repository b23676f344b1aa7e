use chrono::Utc;
use sea_orm::*;
use tracing::info;

use crate::auth::Actor;
use crate::database::entities::{plan_status_history, plan_statuses};
use crate::errors::{CoreResult, PlanError};
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::plan_state_machine::load_plan;

#[derive(Clone, Debug)]
pub struct StatusRecordInput {
    pub from_plan_status_id: Option<i32>,
    pub to_plan_status_id: i32,
    pub note: Option<String>,
}

/// Append-only audit log of status changes.
#[derive(Clone)]
pub struct StatusHistoryService {
    db: DatabaseConnection,
}

impl StatusHistoryService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub(crate) async fn record_in<C: ConnectionTrait>(
        conn: &C,
        plan_id: i32,
        from_status_id: Option<i32>,
        to_status_id: i32,
        user_id: i32,
        note: Option<String>,
    ) -> CoreResult<plan_status_history::Model> {
        let row = plan_status_history::ActiveModel {
            plan_id: Set(plan_id),
            from_status_id: Set(from_status_id),
            to_status_id: Set(to_status_id),
            user_id: Set(user_id),
            note: Set(note),
            created_at: Set(Utc::now()),
            ..Default::default()
        };
        Ok(row.insert(conn).await?)
    }

    /// Record a status change note without moving the plan. The note is required.
    pub async fn record(
        &self,
        actor: &Actor,
        plan_id: i32,
        input: StatusRecordInput,
    ) -> CoreResult<plan_status_history::Model> {
        let note = input
            .note
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .ok_or_else(|| PlanError::MissingField("note".to_string()))?;

        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;

        for status_id in input
            .from_plan_status_id
            .into_iter()
            .chain(std::iter::once(input.to_plan_status_id))
        {
            if plan_statuses::Entity::find_by_id(status_id)
                .one(&self.db)
                .await?
                .is_none()
            {
                return Err(PlanError::InvalidStatusId(status_id.to_string()).into());
            }
        }

        let row = Self::record_in(
            &self.db,
            plan_id,
            input.from_plan_status_id,
            input.to_plan_status_id,
            actor.user_id,
            Some(note),
        )
        .await?;

        info!(
            "User {} recorded status note {} on plan {}",
            actor.user_id, row.id, plan_id
        );

        Ok(row)
    }

    pub async fn list(
        &self,
        actor: &Actor,
        plan_id: i32,
    ) -> CoreResult<Vec<plan_status_history::Model>> {
        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;

        Ok(plan_status_history::Entity::find()
            .filter(plan_status_history::Column::PlanId.eq(plan_id))
            .order_by_asc(plan_status_history::Column::CreatedAt)
            .order_by_asc(plan_status_history::Column::Id)
            .all(&self.db)
            .await?)
    }
}
