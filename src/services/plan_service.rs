use chrono::Utc;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::auth::Actor;
use crate::database::entities::amendment_types::AmendmentKind;
use crate::database::entities::{pastures, plan_confirmations, plan_snapshots, plans};
use crate::errors::{CoreError, CoreResult, PlanError};
use crate::plan_status::PlanStatusCode;
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::confirmation_coordinator::ConfirmationCoordinator;
use crate::services::plan_state_machine::load_plan;
use crate::services::snapshot_store::SnapshotStore;
use crate::services::status_history_service::StatusHistoryService;

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPasture {
    pub name: String,
    pub allowable_aum: Option<i32>,
    pub grace_days: Option<i32>,
    pub notes: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanInput {
    pub agreement_id: i32,
    pub range_name: String,
    pub extension_id: Option<i32>,
    #[serde(default)]
    pub pastures: Vec<NewPasture>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatedPlan {
    pub plan: plans::Model,
    pub snapshot: plan_snapshots::Model,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub confirmations: Vec<plan_confirmations::Model>,
}

/// Plan creation, amendment and head reads.
#[derive(Clone)]
pub struct PlanService {
    db: DatabaseConnection,
}

impl PlanService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Staff start in Staff Draft, agreement holders in Draft. The head row, first history
    /// row and snapshot version 1 commit together.
    pub async fn create_plan(
        &self,
        actor: &Actor,
        input: CreatePlanInput,
    ) -> CoreResult<CreatedPlan> {
        let range_name = input.range_name.trim().to_string();
        if range_name.is_empty() {
            return Err(PlanError::MissingField("rangeName".to_string()).into());
        }

        let txn = self.db.begin().await?;

        let agreement = load_agreement(&txn, input.agreement_id).await?;
        AccessGate::require(&txn, actor, &agreement).await?;

        let status = if actor.is_staff() {
            PlanStatusCode::StaffDraft
        } else {
            PlanStatusCode::Draft
        };

        let now = Utc::now();
        let plan = plans::ActiveModel {
            agreement_id: Set(agreement.id),
            status_id: Set(status.id()),
            creator_id: Set(actor.user_id),
            range_name: Set(range_name),
            effective_at: Set(None),
            submitted_at: Set(None),
            amendment_type_id: Set(None),
            extension_id: Set(input.extension_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        insert_pastures(&txn, plan.id, input.pastures).await?;
        StatusHistoryService::record_in(&txn, plan.id, None, status.id(), actor.user_id, None)
            .await?;
        let snapshot = SnapshotStore::append(&txn, &plan, Some(actor.user_id)).await?;

        txn.commit().await?;

        info!(
            "User {} created plan {} on agreement {} in status {}",
            actor.user_id,
            plan.id,
            agreement.forest_file_id,
            status.code()
        );

        Ok(CreatedPlan {
            plan,
            snapshot,
            confirmations: Vec::new(),
        })
    }

    /// Start an amendment of a legally effective plan. The new plan copies the source's
    /// range name, extension and pastures, and every linked client gets an unconfirmed
    /// vote.
    pub async fn create_amendment(
        &self,
        actor: &Actor,
        source_plan_id: i32,
        amendment_type_id: i32,
    ) -> CoreResult<CreatedPlan> {
        let kind = AmendmentKind::from_id(amendment_type_id)
            .ok_or(PlanError::UnknownAmendmentType(amendment_type_id))?;

        let txn = self.db.begin().await?;

        let source = load_plan(&txn, source_plan_id).await?;
        let agreement = load_agreement(&txn, source.agreement_id).await?;
        AccessGate::require(&txn, actor, &agreement).await?;

        if !source.status_code().map_or(false, PlanStatusCode::is_legal) {
            return Err(PlanError::NotAmendable {
                plan_id: source_plan_id,
            }
            .into());
        }

        let status = match kind {
            AmendmentKind::Mandatory if !actor.is_staff() => {
                return Err(CoreError::forbidden(
                    "Only staff may start a mandatory amendment",
                ));
            }
            AmendmentKind::Mandatory => PlanStatusCode::MandatoryAmendmentStaff,
            AmendmentKind::Minor | AmendmentKind::Major => PlanStatusCode::Draft,
        };

        let now = Utc::now();
        let plan = plans::ActiveModel {
            agreement_id: Set(source.agreement_id),
            status_id: Set(status.id()),
            creator_id: Set(actor.user_id),
            range_name: Set(source.range_name.clone()),
            effective_at: Set(None),
            submitted_at: Set(None),
            amendment_type_id: Set(Some(kind.id())),
            extension_id: Set(source.extension_id),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let copied: Vec<NewPasture> = pastures::Entity::find()
            .filter(pastures::Column::PlanId.eq(source.id))
            .order_by_asc(pastures::Column::Id)
            .all(&txn)
            .await?
            .into_iter()
            .map(|p| NewPasture {
                name: p.name,
                allowable_aum: p.allowable_aum,
                grace_days: p.grace_days,
                notes: p.notes,
            })
            .collect();
        insert_pastures(&txn, plan.id, copied).await?;

        StatusHistoryService::record_in(
            &txn,
            plan.id,
            None,
            status.id(),
            actor.user_id,
            Some(format!("Amendment of plan {}", source.id)),
        )
        .await?;
        let snapshot = SnapshotStore::append(&txn, &plan, Some(actor.user_id)).await?;
        let confirmations =
            ConfirmationCoordinator::create_confirmations(&txn, plan.agreement_id, plan.id).await?;

        txn.commit().await?;

        info!(
            "User {} started {} amendment {} of plan {} with {} voters",
            actor.user_id,
            kind.code(),
            plan.id,
            source.id,
            confirmations.len()
        );

        Ok(CreatedPlan {
            plan,
            snapshot,
            confirmations,
        })
    }

    pub async fn get_plan(&self, actor: &Actor, plan_id: i32) -> CoreResult<plans::Model> {
        let plan = load_plan(&self.db, plan_id).await?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require(&self.db, actor, &agreement).await?;
        debug!("User {} read plan {}", actor.user_id, plan_id);
        Ok(plan)
    }
}

async fn insert_pastures(
    txn: &DatabaseTransaction,
    plan_id: i32,
    new_pastures: Vec<NewPasture>,
) -> CoreResult<()> {
    for pasture in new_pastures {
        if pasture.name.trim().is_empty() {
            return Err(PlanError::MissingField("pastures.name".to_string()).into());
        }
        pastures::ActiveModel {
            plan_id: Set(plan_id),
            name: Set(pasture.name),
            allowable_aum: Set(pasture.allowable_aum),
            grace_days: Set(pasture.grace_days),
            notes: Set(pasture.notes),
            ..Default::default()
        }
        .insert(txn)
        .await?;
    }
    Ok(())
}
