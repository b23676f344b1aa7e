use axum::{extract::State, http::StatusCode, response::Json};
use sea_orm::ConnectionTrait;
use serde_json::{json, Value};

use crate::server::app::AppState;

pub async fn health_check(State(state): State<AppState>) -> Result<Json<Value>, StatusCode> {
    let database = match state.ctx.db().execute_unprepared("SELECT 1").await {
        Ok(_) => "ok",
        Err(_) => return Err(StatusCode::SERVICE_UNAVAILABLE),
    };

    Ok(Json(json!({
        "status": "healthy",
        "service": "range-plan",
        "version": env!("CARGO_PKG_VERSION"),
        "database": database
    })))
}
