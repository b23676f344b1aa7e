use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::error::ApiError;
use crate::auth::Actor;
use crate::errors::CoreError;
use crate::server::app::AppState;

/// Header carrying the user id established by the upstream credential layer.
pub const USER_ID_HEADER: &str = "x-user-id";

pub struct CurrentActor(pub Actor);

#[async_trait]
impl FromRequestParts<AppState> for CurrentActor {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user_id = parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<i32>().ok())
            .ok_or_else(|| CoreError::unauthorized("Missing or invalid x-user-id header"))?;

        let actor = state.ctx.access_gate().resolve_actor(user_id).await?;
        Ok(CurrentActor(actor))
    }
}
