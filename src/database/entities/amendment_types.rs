use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "amendment_types")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub code: String,
    pub description: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AmendmentKind {
    Minor,
    Major,
    Mandatory,
}

impl AmendmentKind {
    pub const ALL: [AmendmentKind; 3] = [
        AmendmentKind::Minor,
        AmendmentKind::Major,
        AmendmentKind::Mandatory,
    ];

    pub fn id(self) -> i32 {
        match self {
            AmendmentKind::Minor => 1,
            AmendmentKind::Major => 2,
            AmendmentKind::Mandatory => 3,
        }
    }

    pub fn from_id(id: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.id() == id)
    }

    pub fn code(self) -> &'static str {
        match self {
            AmendmentKind::Minor => "MI",
            AmendmentKind::Major => "MA",
            AmendmentKind::Mandatory => "MD",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            AmendmentKind::Minor => "Minor Amendment",
            AmendmentKind::Major => "Major Amendment",
            AmendmentKind::Mandatory => "Mandatory Amendment",
        }
    }
}
