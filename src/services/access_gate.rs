use sea_orm::{ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter};
use tracing::debug;

use crate::auth::{Actor, Role};
use crate::database::entities::{agreements, client_memberships, users, zones};
use crate::errors::{CoreError, CoreResult, PlanError};

/// Role- and relationship-based authorization for agreements and their plans.
#[derive(Clone, Debug)]
pub struct AccessGate {
    db: DatabaseConnection,
}

impl AccessGate {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Resolve the caller identity forwarded by the credential layer.
    pub async fn resolve_actor(&self, user_id: i32) -> CoreResult<Actor> {
        let user = users::Entity::find_by_id(user_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| CoreError::unauthorized("Unknown user"))?;

        if !user.is_active {
            return Err(CoreError::forbidden("Account is deactivated"));
        }

        Ok(Actor::from_user(&user))
    }

    pub async fn can_access_agreement(
        &self,
        actor: &Actor,
        agreement_id: i32,
    ) -> CoreResult<bool> {
        let agreement = load_agreement(&self.db, agreement_id).await?;
        Self::check(&self.db, actor, &agreement).await
    }

    /// Administrator: always. Range officer: owns the agreement's zone. Agreement holder:
    /// their client is linked to the agreement. Unrecognised roles are denied; an actor
    /// with no role at all is an internal error.
    pub async fn check<C: ConnectionTrait>(
        conn: &C,
        actor: &Actor,
        agreement: &agreements::Model,
    ) -> CoreResult<bool> {
        if !actor.has_any_role() {
            return Err(CoreError::internal("Unable to determine user role"));
        }

        let roles = actor.roles();
        if roles.contains(&Role::Administrator) {
            return Ok(true);
        }

        if roles.contains(&Role::RangeOfficer) {
            let zone = zones::Entity::find_by_id(agreement.zone_id).one(conn).await?;
            if zone.and_then(|z| z.user_id) == Some(actor.user_id) {
                return Ok(true);
            }
        }

        if roles.contains(&Role::AgreementHolder) {
            if let Some(client_id) = actor.client_id {
                let membership = client_memberships::Entity::find()
                    .filter(client_memberships::Column::AgreementId.eq(agreement.id))
                    .filter(client_memberships::Column::ClientId.eq(client_id))
                    .one(conn)
                    .await?;
                if membership.is_some() {
                    return Ok(true);
                }
            }
        }

        debug!(
            "User {} denied access to agreement {}",
            actor.user_id, agreement.id
        );
        Ok(false)
    }

    pub async fn require<C: ConnectionTrait>(
        conn: &C,
        actor: &Actor,
        agreement: &agreements::Model,
    ) -> CoreResult<()> {
        if Self::check(conn, actor, agreement).await? {
            Ok(())
        } else {
            Err(CoreError::forbidden(format!(
                "Access denied: no access to agreement {}",
                agreement.forest_file_id
            )))
        }
    }

    /// Staff-only operations still require the relationship check.
    pub async fn require_staff<C: ConnectionTrait>(
        conn: &C,
        actor: &Actor,
        agreement: &agreements::Model,
    ) -> CoreResult<()> {
        if actor.has_any_role() && !actor.is_staff() {
            return Err(CoreError::forbidden("Access denied: staff only"));
        }
        Self::require(conn, actor, agreement).await
    }
}

pub(crate) async fn load_agreement<C: ConnectionTrait>(
    conn: &C,
    agreement_id: i32,
) -> CoreResult<agreements::Model> {
    agreements::Entity::find_by_id(agreement_id)
        .one(conn)
        .await?
        .ok_or_else(|| PlanError::AgreementNotFound(agreement_id).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::test_utils::{
        seed_agreement, seed_client, seed_membership, seed_user, setup_test_db,
    };
    use crate::errors::CoreErrorKind;
    use sea_orm::{ActiveModelTrait, Set};

    #[tokio::test]
    async fn administrator_always_passes() {
        let db = setup_test_db().await;
        let admin = seed_user(&db, "admin", &["administrator"], None).await;
        let agreement = seed_agreement(&db, "RAN001", None).await;

        let actor = Actor::from_user(&admin);
        assert!(AccessGate::check(&db, &actor, &agreement).await.unwrap());
    }

    #[tokio::test]
    async fn range_officer_needs_zone_ownership() {
        let db = setup_test_db().await;
        let owner = seed_user(&db, "owner", &["range_officer"], None).await;
        let other = seed_user(&db, "other", &["range_officer"], None).await;
        let agreement = seed_agreement(&db, "RAN001", Some(owner.id)).await;

        let gate = AccessGate::new(db.clone());
        assert!(gate
            .can_access_agreement(&Actor::from_user(&owner), agreement.id)
            .await
            .unwrap());
        assert!(!gate
            .can_access_agreement(&Actor::from_user(&other), agreement.id)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn agreement_holder_needs_membership() {
        let db = setup_test_db().await;
        let linked_client = seed_client(&db, "Linked Ranch").await;
        let other_client = seed_client(&db, "Other Ranch").await;
        let agreement = seed_agreement(&db, "RAN001", None).await;
        seed_membership(&db, agreement.id, linked_client.id).await;

        let linked = seed_user(&db, "linked", &["agreement_holder"], Some(linked_client.id)).await;
        let outsider =
            seed_user(&db, "outsider", &["agreement_holder"], Some(other_client.id)).await;

        assert!(AccessGate::check(&db, &Actor::from_user(&linked), &agreement)
            .await
            .unwrap());
        assert!(!AccessGate::check(&db, &Actor::from_user(&outsider), &agreement)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn unknown_role_is_denied_and_no_role_is_internal() {
        let db = setup_test_db().await;
        let agreement = seed_agreement(&db, "RAN001", None).await;

        let auditor = Actor::new(99).with_role("auditor");
        assert!(!AccessGate::check(&db, &auditor, &agreement).await.unwrap());

        let nobody = Actor::new(100);
        let err = AccessGate::check(&db, &nobody, &agreement)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Internal);
    }

    #[tokio::test]
    async fn missing_agreement_is_not_found() {
        let db = setup_test_db().await;
        let gate = AccessGate::new(db.clone());
        let err = gate
            .can_access_agreement(&Actor::new(1).with_role("administrator"), 404)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn inactive_and_unknown_users_are_rejected() {
        let db = setup_test_db().await;
        let user = seed_user(&db, "gone", &["administrator"], None).await;
        let mut active: users::ActiveModel = user.clone().into();
        active.is_active = Set(false);
        active.update(&db).await.unwrap();

        let gate = AccessGate::new(db.clone());
        let err = gate.resolve_actor(user.id).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Forbidden);
        let err = gate.resolve_actor(4242).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Unauthorized);
    }
}
