use axum::{
    extract::{Path, State},
    Json,
};

use super::actor::CurrentActor;
use super::error::ApiResult;
use crate::database::entities::plan_snapshots;
use crate::server::app::AppState;
use crate::services::plan_report_service::{SnapshotReport, SnapshotView};

pub async fn snapshot_report(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path(plan_id): Path<i32>,
) -> ApiResult<SnapshotReport> {
    let report = state.ctx.reports().snapshot_report(&actor, plan_id).await?;
    Ok(Json(report))
}

pub async fn get_snapshot(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((plan_id, snapshot_id)): Path<(i32, i32)>,
) -> ApiResult<SnapshotView> {
    let view = state
        .ctx
        .reports()
        .snapshot_for_viewer(&actor, plan_id, snapshot_id)
        .await?;
    Ok(Json(view))
}

pub async fn discard_snapshot(
    State(state): State<AppState>,
    CurrentActor(actor): CurrentActor,
    Path((plan_id, snapshot_id)): Path<(i32, i32)>,
) -> ApiResult<plan_snapshots::Model> {
    let snapshot = state
        .ctx
        .snapshots()
        .discard(&actor, plan_id, snapshot_id)
        .await?;
    Ok(Json(snapshot))
}
