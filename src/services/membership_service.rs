use chrono::Utc;
use sea_orm::*;
use serde::Serialize;
use tracing::info;

use crate::auth::Actor;
use crate::database::entities::{client_memberships, clients};
use crate::errors::{CoreError, CoreResult, PlanError};
use crate::services::access_gate::{load_agreement, AccessGate};
use crate::services::confirmation_coordinator::{ConfirmationCoordinator, PlanConsensus};

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipChange {
    pub agreement_id: i32,
    pub client_id: i32,
    /// Recomputed consensus for every plan with an amendment in flight.
    pub plans: Vec<PlanConsensus>,
}

/// Links clients to agreements and keeps amendment voter sets in step, within the same
/// transaction as the membership change.
#[derive(Clone)]
pub struct MembershipService {
    db: DatabaseConnection,
}

impl MembershipService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn link_client(
        &self,
        actor: &Actor,
        agreement_id: i32,
        client_id: i32,
        client_type_id: i32,
    ) -> CoreResult<MembershipChange> {
        let txn = self.db.begin().await?;

        let agreement = load_agreement(&txn, agreement_id).await?;
        AccessGate::require_staff(&txn, actor, &agreement).await?;

        if clients::Entity::find_by_id(client_id).one(&txn).await?.is_none() {
            return Err(CoreError::not_found("Client", client_id.to_string()));
        }

        if find_membership(&txn, agreement_id, client_id).await?.is_some() {
            return Err(PlanError::DuplicateMembership {
                agreement_id,
                client_id,
            }
            .into());
        }

        client_memberships::ActiveModel {
            agreement_id: Set(agreement_id),
            client_id: Set(client_id),
            client_type_id: Set(client_type_id),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let plans =
            ConfirmationCoordinator::on_client_linked(&txn, agreement_id, client_id).await?;

        txn.commit().await?;

        info!(
            "User {} linked client {} to agreement {}; {} amendment(s) affected",
            actor.user_id,
            client_id,
            agreement.forest_file_id,
            plans.len()
        );

        Ok(MembershipChange {
            agreement_id,
            client_id,
            plans,
        })
    }

    pub async fn unlink_client(
        &self,
        actor: &Actor,
        agreement_id: i32,
        client_id: i32,
    ) -> CoreResult<MembershipChange> {
        let txn = self.db.begin().await?;

        let agreement = load_agreement(&txn, agreement_id).await?;
        AccessGate::require_staff(&txn, actor, &agreement).await?;

        let membership = find_membership(&txn, agreement_id, client_id)
            .await?
            .ok_or(PlanError::MembershipNotFound {
                agreement_id,
                client_id,
            })?;

        client_memberships::Entity::delete_by_id(membership.id)
            .exec(&txn)
            .await?;

        let plans =
            ConfirmationCoordinator::on_client_unlinked(&txn, agreement_id, client_id).await?;

        txn.commit().await?;

        info!(
            "User {} unlinked client {} from agreement {}; {} amendment(s) affected",
            actor.user_id,
            client_id,
            agreement.forest_file_id,
            plans.len()
        );

        Ok(MembershipChange {
            agreement_id,
            client_id,
            plans,
        })
    }
}

async fn find_membership<C: ConnectionTrait>(
    conn: &C,
    agreement_id: i32,
    client_id: i32,
) -> CoreResult<Option<client_memberships::Model>> {
    Ok(client_memberships::Entity::find()
        .filter(client_memberships::Column::AgreementId.eq(agreement_id))
        .filter(client_memberships::Column::ClientId.eq(client_id))
        .one(conn)
        .await?)
}
