#[cfg(test)]
use chrono::Utc;
#[cfg(test)]
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};

#[cfg(test)]
use crate::database::entities::{agreements, client_memberships, clients, users, zones};

#[cfg(test)]
pub async fn setup_test_db() -> DatabaseConnection {
    // In-memory SQLite with the full schema and reference data
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");

    use sea_orm_migration::MigratorTrait;
    crate::database::migrations::Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    db
}

#[cfg(test)]
pub async fn seed_user(
    db: &DatabaseConnection,
    username: &str,
    roles: &[&str],
    client_id: Option<i32>,
) -> users::Model {
    users::ActiveModel::new(username, roles, client_id)
        .insert(db)
        .await
        .expect("Failed to insert user")
}

#[cfg(test)]
pub async fn seed_client(db: &DatabaseConnection, name: &str) -> clients::Model {
    clients::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert client")
}

/// Agreement in a fresh zone, optionally owned by a range officer.
#[cfg(test)]
pub async fn seed_agreement(
    db: &DatabaseConnection,
    forest_file_id: &str,
    zone_owner: Option<i32>,
) -> agreements::Model {
    let zone = zones::ActiveModel {
        code: Set(format!("Z-{}", forest_file_id)),
        description: Set(Some("Test zone".to_string())),
        user_id: Set(zone_owner),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert zone");

    agreements::ActiveModel {
        forest_file_id: Set(forest_file_id.to_string()),
        zone_id: Set(zone.id),
        created_at: Set(Utc::now()),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert agreement")
}

#[cfg(test)]
pub async fn seed_membership(db: &DatabaseConnection, agreement_id: i32, client_id: i32) {
    client_memberships::ActiveModel {
        agreement_id: Set(agreement_id),
        client_id: Set(client_id),
        client_type_id: Set(1),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert membership");
}
