use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use super::actor::CurrentActor;
use super::error::ApiResult;
use crate::server::app::AppState;
use crate::services::membership_service::MembershipChange;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkClientRequest {
    pub client_id: i32,
    #[serde(default = "default_client_type")]
    pub client_type_id: i32,
}

fn default_client_type() -> i32 {
    1
}

pub async fn link_client(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(agreement_id): Path<i32>,
    Json(payload): Json<LinkClientRequest>,
) -> ApiResult<MembershipChange> {
    let change = state
        .ctx
        .memberships()
        .link_client(&actor, agreement_id, payload.client_id, payload.client_type_id)
        .await?;
    Ok(Json(change))
}

pub async fn unlink_client(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((agreement_id, client_id)): Path<(i32, i32)>,
) -> ApiResult<MembershipChange> {
    let change = state
        .ctx
        .memberships()
        .unlink_client(&actor, agreement_id, client_id)
        .await?;
    Ok(Json(change))
}
