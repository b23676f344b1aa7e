use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plan_status::PlanStatusCode;

/// Mutable head row of a range use plan.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[sea_orm(table_name = "plans")]
pub struct Model {
    #[sea_orm(primary_key)]
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
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::agreements::Entity",
        from = "Column::AgreementId",
        to = "super::agreements::Column::Id"
    )]
    Agreements,
    #[sea_orm(
        belongs_to = "super::plan_statuses::Entity",
        from = "Column::StatusId",
        to = "super::plan_statuses::Column::Id"
    )]
    PlanStatuses,
    #[sea_orm(has_many = "super::pastures::Entity")]
    Pastures,
    #[sea_orm(has_many = "super::plan_snapshots::Entity")]
    PlanSnapshots,
}

impl Related<super::agreements::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Agreements.def()
    }
}

impl Related<super::pastures::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Pastures.def()
    }
}

impl Related<super::plan_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PlanSnapshots.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status_code(&self) -> Option<PlanStatusCode> {
        PlanStatusCode::from_id(self.status_id)
    }

    /// An amendment still collecting agreement-holder input or votes.
    pub fn has_amendment_in_flight(&self) -> bool {
        self.amendment_type_id.is_some()
            && !self
                .status_code()
                .map(PlanStatusCode::concludes_amendment)
                .unwrap_or(false)
    }
}
