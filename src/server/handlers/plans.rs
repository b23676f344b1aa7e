use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::Value;

use super::actor::CurrentActor;
use super::error::ApiResult;
use crate::database::entities::{plan_status_history, plans};
use crate::server::app::AppState;
use crate::services::plan_service::{CreatePlanInput, CreatedPlan};
use crate::services::plan_state_machine::TransitionOutcome;
use crate::services::status_history_service::StatusRecordInput;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChangeRequest {
    #[serde(default)]
    pub status_id: Value,
    pub note: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmendmentRequest {
    pub amendment_type_id: i32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRecordRequest {
    pub from_plan_status_id: Option<i32>,
    pub to_plan_status_id: i32,
    pub note: Option<String>,
}

pub async fn create_plan(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Json(payload): Json<CreatePlanInput>,
) -> ApiResult<CreatedPlan> {
    let created = state.ctx.plan_service().create_plan(&actor, payload).await?;
    Ok(Json(created))
}

pub async fn get_plan(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
) -> ApiResult<plans::Model> {
    let plan = state.ctx.plan_service().get_plan(&actor, plan_id).await?;
    Ok(Json(plan))
}

pub async fn update_status(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
    Json(payload): Json<StatusChangeRequest>,
) -> ApiResult<TransitionOutcome> {
    let outcome = state
        .ctx
        .state_machine()
        .transition(&actor, plan_id, &payload.status_id, payload.note)
        .await?;
    Ok(Json(outcome))
}

pub async fn create_amendment(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
    Json(payload): Json<AmendmentRequest>,
) -> ApiResult<CreatedPlan> {
    let created = state
        .ctx
        .plan_service()
        .create_amendment(&actor, plan_id, payload.amendment_type_id)
        .await?;
    Ok(Json(created))
}

pub async fn create_status_record(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
    Json(payload): Json<StatusRecordRequest>,
) -> ApiResult<plan_status_history::Model> {
    let input = StatusRecordInput {
        from_plan_status_id: payload.from_plan_status_id,
        to_plan_status_id: payload.to_plan_status_id,
        note: payload.note,
    };
    let record = state.ctx.history().record(&actor, plan_id, input).await?;
    Ok(Json(record))
}

pub async fn list_status_records(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
) -> ApiResult<Vec<plan_status_history::Model>> {
    let records = state.ctx.history().list(&actor, plan_id).await?;
    Ok(Json(records))
}
