use chrono::{DateTime, Utc};
use sea_orm::*;
use tracing::{debug, info, warn};

use crate::auth::Actor;
use crate::common::db_errors::is_unique_violation;
use crate::database::entities::plan_snapshots::{
    self, PlanSnapshotDocument, SnapshotAgreement, SnapshotClient, SnapshotPasture, SnapshotZone,
};
use crate::database::entities::{agreements, client_memberships, clients, pastures, plans, zones};
use crate::errors::{CoreError, CoreResult, PlanError};
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::plan_state_machine::lock_plan;

/// Append-only, versioned capture of plan aggregates.
#[derive(Clone)]
pub struct SnapshotStore {
    db: DatabaseConnection,
}

impl SnapshotStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Capture `plan` as the next version. Runs inside the caller's transition
    /// transaction so the head row, history row and snapshot commit together.
    pub async fn append(
        txn: &DatabaseTransaction,
        plan: &plans::Model,
        user_id: Option<i32>,
    ) -> CoreResult<plan_snapshots::Model> {
        lock_plan(txn, plan.id).await?;

        let last_version = plan_snapshots::Entity::find()
            .filter(plan_snapshots::Column::PlanId.eq(plan.id))
            .order_by_desc(plan_snapshots::Column::Version)
            .one(txn)
            .await?
            .map(|s| s.version)
            .unwrap_or(0);
        let version = last_version + 1;

        let document = Self::capture(txn, plan).await?;
        let saved = Self::insert_version(txn, plan.id, version, &document, user_id).await?;

        debug!(
            "Appended snapshot {} (version {}) for plan {}",
            saved.id, saved.version, plan.id
        );

        Ok(saved)
    }

    /// Write one snapshot row. A version already taken for the plan is an integrity
    /// failure, never overwritten.
    pub(crate) async fn insert_version<C: ConnectionTrait>(
        conn: &C,
        plan_id: i32,
        version: i32,
        document: &PlanSnapshotDocument,
        user_id: Option<i32>,
    ) -> CoreResult<plan_snapshots::Model> {
        let snapshot = serde_json::to_value(document).map_err(|e| {
            CoreError::internal(format!("Failed to serialise plan {}", plan_id)).with_source(e)
        })?;

        let row = plan_snapshots::ActiveModel {
            plan_id: Set(plan_id),
            version: Set(version),
            snapshot: Set(snapshot),
            created_at: Set(Utc::now()),
            user_id: Set(user_id),
            is_discarded: Set(false),
            ..Default::default()
        };

        match row.insert(conn).await {
            Ok(saved) => Ok(saved),
            Err(err) if is_unique_violation(&err) => {
                warn!(
                    "Concurrent append for plan {} claimed version {}",
                    plan_id, version
                );
                Err(PlanError::VersionConflict { plan_id, version }.into())
            }
            Err(err) => Err(err.into()),
        }
    }

    /// Materialise the full plan aggregate: head fields, pastures and the denormalised
    /// agreement view.
    pub async fn capture<C: ConnectionTrait>(
        conn: &C,
        plan: &plans::Model,
    ) -> CoreResult<PlanSnapshotDocument> {
        let pastures = pastures::Entity::find()
            .filter(pastures::Column::PlanId.eq(plan.id))
            .order_by_asc(pastures::Column::Id)
            .all(conn)
            .await?
            .into_iter()
            .map(|p| SnapshotPasture {
                id: p.id,
                name: p.name,
                allowable_aum: p.allowable_aum,
                grace_days: p.grace_days,
                notes: p.notes,
            })
            .collect();

        let agreement = load_agreement(conn, plan.agreement_id).await?;
        let zone = zones::Entity::find_by_id(agreement.zone_id)
            .one(conn)
            .await?
            .ok_or_else(|| CoreError::not_found("Zone", agreement.zone_id.to_string()))?;

        let memberships = client_memberships::Entity::find()
            .filter(client_memberships::Column::AgreementId.eq(agreement.id))
            .order_by_asc(client_memberships::Column::ClientId)
            .find_also_related(clients::Entity)
            .all(conn)
            .await?;

        let clients = memberships
            .into_iter()
            .map(|(membership, client)| SnapshotClient {
                id: membership.client_id,
                name: client.map(|c| c.name).unwrap_or_default(),
                client_type_id: membership.client_type_id,
            })
            .collect();

        Ok(PlanSnapshotDocument {
            id: plan.id,
            agreement_id: plan.agreement_id,
            status_id: plan.status_id,
            creator_id: plan.creator_id,
            range_name: plan.range_name.clone(),
            effective_at: plan.effective_at,
            submitted_at: plan.submitted_at,
            amendment_type_id: plan.amendment_type_id,
            extension_id: plan.extension_id,
            created_at: plan.created_at,
            updated_at: plan.updated_at,
            pastures,
            agreement: agreement_view(&agreement, zone, clients),
        })
    }

    pub async fn latest(&self, plan_id: i32) -> CoreResult<Option<plan_snapshots::Model>> {
        Ok(plan_snapshots::Entity::find()
            .filter(plan_snapshots::Column::PlanId.eq(plan_id))
            .filter(plan_snapshots::Column::IsDiscarded.eq(false))
            .order_by_desc(plan_snapshots::Column::Version)
            .one(&self.db)
            .await?)
    }

    /// Every snapshot, discarded ones included, ordered by version.
    pub async fn all_for_plan(&self, plan_id: i32) -> CoreResult<Vec<plan_snapshots::Model>> {
        Self::all_for_plan_in(&self.db, plan_id).await
    }

    pub async fn all_for_plan_in<C: ConnectionTrait>(
        conn: &C,
        plan_id: i32,
    ) -> CoreResult<Vec<plan_snapshots::Model>> {
        Ok(plan_snapshots::Entity::find()
            .filter(plan_snapshots::Column::PlanId.eq(plan_id))
            .order_by_asc(plan_snapshots::Column::Version)
            .all(conn)
            .await?)
    }

    /// The most recent non-discarded capture taken at or before `at`.
    pub async fn at_or_before(
        &self,
        plan_id: i32,
        at: DateTime<Utc>,
    ) -> CoreResult<Option<plan_snapshots::Model>> {
        Ok(plan_snapshots::Entity::find()
            .filter(plan_snapshots::Column::PlanId.eq(plan_id))
            .filter(plan_snapshots::Column::IsDiscarded.eq(false))
            .filter(plan_snapshots::Column::CreatedAt.lte(at))
            .order_by_desc(plan_snapshots::Column::CreatedAt)
            .order_by_desc(plan_snapshots::Column::Version)
            .one(&self.db)
            .await?)
    }

    pub async fn find(&self, plan_id: i32, snapshot_id: i32) -> CoreResult<plan_snapshots::Model> {
        plan_snapshots::Entity::find_by_id(snapshot_id)
            .filter(plan_snapshots::Column::PlanId.eq(plan_id))
            .one(&self.db)
            .await?
            .ok_or_else(|| PlanError::SnapshotNotFound(snapshot_id).into())
    }

    /// Flag a bad capture so derived views skip it. Staff only; repeat calls are no-ops.
    pub async fn discard(
        &self,
        actor: &Actor,
        plan_id: i32,
        snapshot_id: i32,
    ) -> CoreResult<plan_snapshots::Model> {
        let snapshot = self.find(plan_id, snapshot_id).await?;
        let plan = plans::Entity::find_by_id(plan_id)
            .one(&self.db)
            .await?
            .ok_or(PlanError::NotFound(plan_id))?;
        let agreement = load_agreement(&self.db, plan.agreement_id).await?;
        AccessGate::require_staff(&self.db, actor, &agreement).await?;

        if snapshot.is_discarded {
            debug!("Snapshot {} already discarded", snapshot_id);
            return Ok(snapshot);
        }

        let mut active: plan_snapshots::ActiveModel = snapshot.into();
        active.is_discarded = Set(true);
        let updated = active.update(&self.db).await?;

        info!(
            "User {} discarded snapshot {} (version {}) of plan {}",
            actor.user_id, updated.id, updated.version, plan_id
        );

        Ok(updated)
    }
}

fn agreement_view(
    agreement: &agreements::Model,
    zone: zones::Model,
    clients: Vec<SnapshotClient>,
) -> SnapshotAgreement {
    SnapshotAgreement {
        id: agreement.id,
        forest_file_id: agreement.forest_file_id.clone(),
        zone: SnapshotZone {
            id: zone.id,
            code: zone.code,
            description: zone.description,
            user_id: zone.user_id,
        },
        clients,
    }
}
