use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::error;

use crate::errors::{CoreError, CoreErrorKind, PlanError};

/// Renders a [`CoreError`] as `{"error": {"code", "message", "fields"}}`.
#[derive(Debug)]
pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        Self(err)
    }
}

impl From<PlanError> for ApiError {
    fn from(err: PlanError) -> Self {
        Self(err.into())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = StatusCode::from_u16(kind.http_status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if kind == CoreErrorKind::Internal {
            error!("Request failed: {}", self.0);
        }

        let body = serde_json::json!({
            "error": {
                "code": kind.code(),
                "message": self.0.message(),
                "fields": self.0.fields(),
            }
        });

        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<Json<T>, ApiError>;
