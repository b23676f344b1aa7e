use std::collections::HashSet;

use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::auth::Actor;
use crate::database::entities::amendment_types::AmendmentKind;
use crate::database::entities::{client_memberships, plan_confirmations, plans};
use crate::errors::{CoreError, CoreResult, PlanError};
use crate::plan_status::PlanStatusCode;
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::plan_state_machine::{load_plan, lock_plan, PlanStateMachine};

/// Result of a single vote.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationOutcome {
    pub all_confirmed: bool,
    pub confirmation: plan_confirmations::Model,
    /// Present when the vote completed consensus and moved the plan.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<plans::Model>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanConsensus {
    pub plan_id: i32,
    pub all_confirmed: bool,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationSummary {
    pub all_confirmed: bool,
    pub confirmations: Vec<plan_confirmations::Model>,
}

/// Per-client voting on plan amendments.
///
/// The voter set for an amendment always equals the agreement's current client
/// memberships. Consensus is recomputed from the rows after every write.
#[derive(Clone)]
pub struct ConfirmationCoordinator {
    db: DatabaseConnection,
}

impl ConfirmationCoordinator {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Insert an unconfirmed row for every linked client that lacks one.
    pub async fn create_confirmations<C: ConnectionTrait>(
        conn: &C,
        agreement_id: i32,
        plan_id: i32,
    ) -> CoreResult<Vec<plan_confirmations::Model>> {
        let existing: HashSet<i32> = plan_confirmations::Entity::find()
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .all(conn)
            .await?
            .into_iter()
            .map(|c| c.client_id)
            .collect();

        let members = client_memberships::Entity::find()
            .filter(client_memberships::Column::AgreementId.eq(agreement_id))
            .order_by_asc(client_memberships::Column::ClientId)
            .all(conn)
            .await?;

        let mut created = Vec::new();
        for member in members {
            if existing.contains(&member.client_id) {
                continue;
            }
            created.push(insert_unconfirmed(conn, plan_id, member.client_id).await?);
        }

        debug!(
            "Created {} confirmation rows for plan {}",
            created.len(),
            plan_id
        );

        Ok(created)
    }

    /// Regenerate the voter set from current membership with every vote cleared.
    pub async fn reset<C: ConnectionTrait>(
        conn: &C,
        agreement_id: i32,
        plan_id: i32,
    ) -> CoreResult<Vec<plan_confirmations::Model>> {
        plan_confirmations::Entity::delete_many()
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .exec(conn)
            .await?;
        Self::create_confirmations(conn, agreement_id, plan_id).await
    }

    /// Mark the acting user's own client row confirmed; other rows are left alone.
    pub async fn refresh<C: ConnectionTrait>(
        conn: &C,
        plan_id: i32,
        actor: &Actor,
    ) -> CoreResult<Option<plan_confirmations::Model>> {
        let Some(client_id) = actor.client_id else {
            return Ok(None);
        };

        let row = plan_confirmations::Entity::find()
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .filter(plan_confirmations::Column::ClientId.eq(client_id))
            .one(conn)
            .await?;

        match row {
            Some(row) => Ok(Some(set_confirmed(conn, row, true).await?)),
            None => Ok(None),
        }
    }

    /// True when no row for the plan is still unconfirmed.
    pub async fn all_confirmed<C: ConnectionTrait>(conn: &C, plan_id: i32) -> CoreResult<bool> {
        let pending = plan_confirmations::Entity::find()
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .filter(plan_confirmations::Column::Confirmed.eq(false))
            .count(conn)
            .await?;
        Ok(pending == 0)
    }

    /// Membership reaction: add an unconfirmed row for `client_id` on every plan of the
    /// agreement with an amendment in flight.
    pub async fn on_client_linked<C: ConnectionTrait>(
        conn: &C,
        agreement_id: i32,
        client_id: i32,
    ) -> CoreResult<Vec<PlanConsensus>> {
        let mut affected = Vec::new();
        for plan in in_flight_plans(conn, agreement_id).await? {
            let exists = plan_confirmations::Entity::find()
                .filter(plan_confirmations::Column::PlanId.eq(plan.id))
                .filter(plan_confirmations::Column::ClientId.eq(client_id))
                .one(conn)
                .await?
                .is_some();
            if !exists {
                insert_unconfirmed(conn, plan.id, client_id).await?;
            }
            affected.push(PlanConsensus {
                plan_id: plan.id,
                all_confirmed: Self::all_confirmed(conn, plan.id).await?,
            });
        }
        Ok(affected)
    }

    /// Membership reaction: drop `client_id`'s row from every in-flight amendment.
    pub async fn on_client_unlinked<C: ConnectionTrait>(
        conn: &C,
        agreement_id: i32,
        client_id: i32,
    ) -> CoreResult<Vec<PlanConsensus>> {
        let mut affected = Vec::new();
        for plan in in_flight_plans(conn, agreement_id).await? {
            plan_confirmations::Entity::delete_many()
                .filter(plan_confirmations::Column::PlanId.eq(plan.id))
                .filter(plan_confirmations::Column::ClientId.eq(client_id))
                .exec(conn)
                .await?;
            affected.push(PlanConsensus {
                plan_id: plan.id,
                all_confirmed: Self::all_confirmed(conn, plan.id).await?,
            });
        }
        Ok(affected)
    }

    /// Record one client's vote. When the vote completes consensus the plan moves, in
    /// the same transaction, to Stands for a minor amendment or Submitted For Final
    /// Decision otherwise. The caller's `is_minor_amendment` flag decides.
    pub async fn confirm(
        &self,
        actor: &Actor,
        plan_id: i32,
        confirmation_id: i32,
        confirmed: bool,
        is_minor_amendment: bool,
    ) -> CoreResult<ConfirmationOutcome> {
        let txn = self.db.begin().await?;

        let plan = lock_plan(&txn, plan_id).await?;
        let confirmation = plan_confirmations::Entity::find_by_id(confirmation_id)
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .one(&txn)
            .await?
            .ok_or(PlanError::ConfirmationNotFound(confirmation_id))?;
        let agreement = load_agreement(&txn, plan.agreement_id).await?;
        AccessGate::require(&txn, actor, &agreement).await?;

        if plan.status_code() != Some(PlanStatusCode::AwaitingConfirmation) {
            return Err(PlanError::NotAwaitingConfirmation { plan_id }.into());
        }

        if !actor.is_staff() && actor.client_id != Some(confirmation.client_id) {
            return Err(CoreError::forbidden(
                "Agreement holders may only confirm for their own client",
            ));
        }

        let confirmation = set_confirmed(&txn, confirmation, confirmed).await?;
        let all_confirmed = Self::all_confirmed(&txn, plan_id).await?;

        let mut moved = None;
        if all_confirmed && confirmed {
            let stored_minor = plan
                .amendment_type_id
                .and_then(AmendmentKind::from_id)
                .map(|kind| kind == AmendmentKind::Minor);
            if stored_minor.is_some_and(|minor| minor != is_minor_amendment) {
                warn!(
                    "Plan {} amendment type {:?} disagrees with isMinorAmendment={}",
                    plan_id, plan.amendment_type_id, is_minor_amendment
                );
            }

            let target = if is_minor_amendment {
                PlanStatusCode::Stands
            } else {
                PlanStatusCode::SubmittedForFinalDecision
            };
            let outcome = PlanStateMachine::apply_in(
                &txn,
                plan,
                target,
                actor,
                Some("All agreement holders confirmed the amendment".to_string()),
            )
            .await?;
            info!(
                "Consensus reached on plan {}; moved to {}",
                plan_id,
                target.code()
            );
            moved = Some(outcome.plan);
        }

        txn.commit().await?;

        debug!(
            "User {} set confirmation {} on plan {} to {}",
            actor.user_id, confirmation_id, plan_id, confirmed
        );

        Ok(ConfirmationOutcome {
            all_confirmed,
            confirmation,
            plan: moved,
        })
    }

    pub async fn list(&self, actor: &Actor, plan_id: i32) -> CoreResult<ConfirmationSummary> {
        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;

        let confirmations = plan_confirmations::Entity::find()
            .filter(plan_confirmations::Column::PlanId.eq(plan_id))
            .order_by_asc(plan_confirmations::Column::ClientId)
            .all(&self.db)
            .await?;

        Ok(ConfirmationSummary {
            all_confirmed: confirmations.iter().all(|c| c.confirmed),
            confirmations,
        })
    }
}

async fn in_flight_plans<C: ConnectionTrait>(
    conn: &C,
    agreement_id: i32,
) -> CoreResult<Vec<plans::Model>> {
    Ok(plans::Entity::find()
        .filter(plans::Column::AgreementId.eq(agreement_id))
        .filter(plans::Column::AmendmentTypeId.is_not_null())
        .order_by_asc(plans::Column::Id)
        .all(conn)
        .await?
        .into_iter()
        .filter(plans::Model::has_amendment_in_flight)
        .collect())
}

async fn insert_unconfirmed<C: ConnectionTrait>(
    conn: &C,
    plan_id: i32,
    client_id: i32,
) -> CoreResult<plan_confirmations::Model> {
    let now = Utc::now();
    let row = plan_confirmations::ActiveModel {
        plan_id: Set(plan_id),
        client_id: Set(client_id),
        confirmed: Set(false),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };
    Ok(row.insert(conn).await?)
}

async fn set_confirmed<C: ConnectionTrait>(
    conn: &C,
    row: plan_confirmations::Model,
    confirmed: bool,
) -> CoreResult<plan_confirmations::Model> {
    let mut active: plan_confirmations::ActiveModel = row.into();
    active.confirmed = Set(confirmed);
    active.updated_at = Set(Utc::now());
    Ok(active.update(conn).await?)
}
