use axum::{
    extract::{Path, Query, State},
    Json,
};
use serde::Deserialize;

use super::actor::CurrentActor;
use super::error::ApiResult;
use crate::server::app::AppState;
use crate::services::confirmation_coordinator::{ConfirmationOutcome, ConfirmationSummary};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmationQuery {
    #[serde(default)]
    pub is_minor_amendment: bool,
}

#[derive(Debug, Deserialize)]
pub struct ConfirmationRequest {
    pub confirmed: bool,
}

pub async fn list_confirmations(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
) -> ApiResult<ConfirmationSummary> {
    let summary = state.ctx.confirmations().list(&actor, plan_id).await?;
    Ok(Json(summary))
}

pub async fn update_confirmation(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((plan_id, confirmation_id)): Path<(i32, i32)>,
    Query(query): Query<ConfirmationQuery>,
    Json(payload): Json<ConfirmationRequest>,
) -> ApiResult<ConfirmationOutcome> {
    let outcome = state
        .ctx
        .confirmations()
        .confirm(
            &actor,
            plan_id,
            confirmation_id,
            payload.confirmed,
            query.is_minor_amendment,
        )
        .await?;
    Ok(Json(outcome))
}
