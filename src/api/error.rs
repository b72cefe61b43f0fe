//! Failure responses shared by every endpoint

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::Error;

/// Body returned for every failed request
#[derive(Debug, Serialize)]
pub struct FailureBody {
    pub success: bool,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Error wrapper converted into a failure body at the handler boundary
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        Self(e)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self(Error::InvalidInput(rejection.body_text()))
    }
}

impl ApiError {
    fn parts(self) -> (StatusCode, String, Option<String>) {
        match self.0 {
            Error::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg, None),
            Error::NotFound(what) => (StatusCode::NOT_FOUND, format!("{what} not found"), None),
            Error::CollaboratorFailure { message, details } => {
                (StatusCode::INTERNAL_SERVER_ERROR, message, Some(details))
            }
            Error::Http(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "upstream request failed".to_string(),
                Some(e.to_string()),
            ),
            Error::Config(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg, None),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal error".to_string(),
                Some(other.to_string()),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = self.parts();

        if status.is_server_error() {
            tracing::error!(
                status = status.as_u16(),
                error = %error,
                details = ?details,
                "request failed"
            );
        } else {
            tracing::debug!(status = status.as_u16(), error = %error, "request rejected");
        }

        (
            status,
            Json(FailureBody {
                success: false,
                error,
                details,
            }),
        )
            .into_response()
    }
}
