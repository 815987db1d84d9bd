use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use tracing::warn;

use crate::service::FacadeError;

impl FacadeError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            FacadeError::NotFound(_) => StatusCode::NOT_FOUND,
            FacadeError::StillProcessing(_) => StatusCode::ACCEPTED,
            FacadeError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            },
            FacadeError::Transport(_) => StatusCode::BAD_GATEWAY,
            FacadeError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            FacadeError::InvalidParameter { .. } => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    fn detail(&self) -> String {
        match self {
            FacadeError::Upstream { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for FacadeError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            warn!(status = %status, error = %self, "Request failed");
        }

        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}
