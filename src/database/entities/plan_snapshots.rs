use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::errors::PlanError;

/// Immutable versioned capture of a plan aggregate.
///
/// Only `is_discarded` may change after insert.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "plan_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub plan_id: i32,
    pub version: i32,
    pub snapshot: Json,
    pub created_at: ChronoDateTimeUtc,
    pub user_id: Option<i32>,
    pub is_discarded: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::plans::Entity",
        from = "Column::PlanId",
        to = "super::plans::Column::Id"
    )]
    Plans,
}

impl Related<super::plans::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Plans.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn document(&self) -> Result<PlanSnapshotDocument, PlanError> {
        serde_json::from_value(self.snapshot.clone())
            .map_err(|_| PlanError::CorruptSnapshot(self.id))
    }

    /// Status embedded at capture time, independent of later label changes.
    pub fn status_id(&self) -> Result<i32, PlanError> {
        self.snapshot
            .get("statusId")
            .and_then(|value| value.as_i64())
            .and_then(|id| i32::try_from(id).ok())
            .ok_or(PlanError::CorruptSnapshot(self.id))
    }
}

/// The self-describing document stored in `plan_snapshots.snapshot`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanSnapshotDocument {
    pub id: i32,
    pub agreement_id: i32,
    pub status_id: i32,
    pub creator_id: i32,
    pub range_name: String,
    pub effective_at: Option<ChronoDateTimeUtc>,
    pub submitted_at: Option<ChronoDateTimeUtc>,
    pub amendment_type_id: Option<i32>,
    pub extension_id: Option<i32>,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
    #[serde(default)]
    pub pastures: Vec<SnapshotPasture>,
    pub agreement: SnapshotAgreement,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotPasture {
    pub id: i32,
    pub name: String,
    pub allowable_aum: Option<i32>,
    pub grace_days: Option<i32>,
    pub notes: Option<String>,
}

/// Denormalised agreement view captured alongside the plan.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotAgreement {
    pub id: i32,
    pub forest_file_id: String,
    pub zone: SnapshotZone,
    #[serde(default)]
    pub clients: Vec<SnapshotClient>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotZone {
    pub id: i32,
    pub code: String,
    pub description: Option<String>,
    pub user_id: Option<i32>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotClient {
    pub id: i32,
    pub name: String,
    pub client_type_id: i32,
}
