use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use easytalk_core::EasytalkError;
use tracing::{error, warn};

/// Error response: `{"error": <message>, "retryable": <bool>}`.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub retryable: bool,
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
            retryable: false,
        }
    }
}

/// HTTP status for each error kind.
pub fn status_for(err: &EasytalkError) -> StatusCode {
    match err {
        EasytalkError::MissingInput(_) | EasytalkError::InvalidProfile(_) => {
            StatusCode::BAD_REQUEST
        }
        EasytalkError::ProfileNotFound(_) | EasytalkError::SessionNotFound(_) => {
            StatusCode::NOT_FOUND
        }
        EasytalkError::GenerationFailed(_) | EasytalkError::SynthesisFailed(_) => {
            StatusCode::BAD_GATEWAY
        }
        EasytalkError::PersistenceFailed(_)
        | EasytalkError::Config(_)
        | EasytalkError::Json(_)
        | EasytalkError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

impl From<EasytalkError> for ApiError {
    fn from(err: EasytalkError) -> Self {
        let status = status_for(&err);
        if status.is_server_error() {
            error!(status = status.as_u16(), error = %err, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %err, "Request rejected");
        }
        Self {
            status,
            message: err.to_string(),
            retryable: err.is_retryable(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
            retryable: false,
        }
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({
            "error": self.message,
            "retryable": self.retryable,
        });
        (self.status, Json(body)).into_response()
    }
}
