use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::plan_status::PlanStatusCode;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "plan_statuses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub code: String,
    pub name: String,
    pub active: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    pub fn status_code(&self) -> Option<PlanStatusCode> {
        PlanStatusCode::from_id(self.id).filter(|status| status.code() == self.code)
    }
}
