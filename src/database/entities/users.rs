use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub display_name: String,
    pub roles: String, // JSON: ["administrator", "range_officer", "agreement_holder"]
    pub client_id: Option<i32>,
    pub is_active: bool,
    pub created_at: ChronoDateTimeUtc,
    pub updated_at: ChronoDateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::clients::Entity",
        from = "Column::ClientId",
        to = "super::clients::Column::Id"
    )]
    Clients,
}

impl Related<super::clients::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Clients.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// Role names as stored; malformed JSON yields no roles.
    pub fn role_names(&self) -> Vec<String> {
        serde_json::from_str(&self.roles).unwrap_or_default()
    }
}

impl ActiveModel {
    pub fn new(username: &str, roles: &[&str], client_id: Option<i32>) -> Self {
        let now = chrono::Utc::now();
        let roles_json = serde_json::to_string(roles).unwrap_or_else(|_| "[]".to_string());

        Self {
            id: ActiveValue::NotSet,
            username: Set(username.to_string()),
            display_name: Set(username.to_string()),
            roles: Set(roles_json),
            client_id: Set(client_id),
            is_active: Set(true),
            created_at: Set(now),
            updated_at: Set(now),
        }
    }
}
