#![allow(dead_code)]

use chrono::Utc;
use range_plan::auth::Actor;
use range_plan::database::entities::{agreements, client_memberships, clients, users, zones};
use range_plan::database::migrations::Migrator;
use sea_orm::{ActiveModelTrait, Database, DatabaseConnection, Set};
use sea_orm_migration::MigratorTrait;

/// An agreement in a zone owned by `officer`, with clients A and B linked and one
/// agreement holder user per client.
pub struct Fixture {
    pub db: DatabaseConnection,
    pub admin: Actor,
    pub officer: Actor,
    pub other_officer: Actor,
    pub holder_a: Actor,
    pub holder_b: Actor,
    pub outsider: Actor,
    pub client_a: clients::Model,
    pub client_b: clients::Model,
    pub agreement: agreements::Model,
}

pub async fn setup_db() -> DatabaseConnection {
    let db = Database::connect("sqlite::memory:")
        .await
        .expect("Failed to connect to test database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");
    db
}

pub async fn fixture() -> Fixture {
    fixture_on(setup_db().await).await
}

pub async fn fixture_on(db: DatabaseConnection) -> Fixture {
    let admin = create_user(&db, "admin", &["administrator"], None).await;
    let officer = create_user(&db, "officer", &["range_officer"], None).await;
    let other_officer = create_user(&db, "other_officer", &["range_officer"], None).await;

    let client_a = create_client(&db, "Ranch A").await;
    let client_b = create_client(&db, "Ranch B").await;
    let client_c = create_client(&db, "Ranch C").await;

    let holder_a = create_user(&db, "holder_a", &["agreement_holder"], Some(client_a.id)).await;
    let holder_b = create_user(&db, "holder_b", &["agreement_holder"], Some(client_b.id)).await;
    let outsider = create_user(&db, "outsider", &["agreement_holder"], Some(client_c.id)).await;

    let agreement = create_agreement(&db, "RAN073421", officer.id).await;
    link_client(&db, agreement.id, client_a.id).await;
    link_client(&db, agreement.id, client_b.id).await;

    Fixture {
        db,
        admin: Actor::from_user(&admin),
        officer: Actor::from_user(&officer),
        other_officer: Actor::from_user(&other_officer),
        holder_a: Actor::from_user(&holder_a),
        holder_b: Actor::from_user(&holder_b),
        outsider: Actor::from_user(&outsider),
        client_a,
        client_b,
        agreement,
    }
}

pub async fn create_user(
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

pub async fn create_client(db: &DatabaseConnection, name: &str) -> clients::Model {
    clients::ActiveModel {
        name: Set(name.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("Failed to insert client")
}

pub async fn create_agreement(
    db: &DatabaseConnection,
    forest_file_id: &str,
    officer_id: i32,
) -> agreements::Model {
    let zone = zones::ActiveModel {
        code: Set(format!("Z-{}", forest_file_id)),
        description: Set(Some("Okanagan".to_string())),
        user_id: Set(Some(officer_id)),
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

pub async fn link_client(db: &DatabaseConnection, agreement_id: i32, client_id: i32) {
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
