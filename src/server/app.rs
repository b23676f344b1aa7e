use anyhow::{Context, Result};
use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use sea_orm::DatabaseConnection;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{confirmations, health, memberships, plans, snapshots};
use crate::app_context::AppContext;

#[derive(Clone)]
pub struct AppState {
    pub ctx: AppContext,
}

pub async fn create_app(db: DatabaseConnection, cors_origin: Option<&str>) -> Result<Router> {
    let state = AppState {
        ctx: AppContext::new(db),
    };

    let cors = match cors_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(
                origin
                    .parse::<HeaderValue>()
                    .with_context(|| format!("Invalid CORS origin: {}", origin))?,
            )
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    };

    let app = Router::new()
        .route("/health", get(health::health_check))
        .merge(plan_routes())
        .merge(agreement_routes())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state);

    Ok(app)
}

fn plan_routes() -> Router<AppState> {
    Router::new()
        .route("/plan", post(plans::create_plan))
        .route("/plan/:id", get(plans::get_plan))
        .route("/plan/:id/status", put(plans::update_status))
        .route("/plan/:id/amendment", post(plans::create_amendment))
        .route(
            "/plan/:id/status-record",
            get(plans::list_status_records).post(plans::create_status_record),
        )
        .route(
            "/plan/:id/confirmations",
            get(confirmations::list_confirmations),
        )
        .route(
            "/plan/:id/confirmation/:confirmation_id",
            put(confirmations::update_confirmation),
        )
        .route("/plan/:id/snapshots", get(snapshots::snapshot_report))
        .route(
            "/plan/:id/snapshots/:snapshot_id",
            get(snapshots::get_snapshot),
        )
        .route(
            "/plan/:id/snapshots/:snapshot_id/discard",
            put(snapshots::discard_snapshot),
        )
}

fn agreement_routes() -> Router<AppState> {
    Router::new()
        .route("/agreement/:id/client", post(memberships::link_client))
        .route(
            "/agreement/:id/client/:client_id",
            delete(memberships::unlink_client),
        )
}
