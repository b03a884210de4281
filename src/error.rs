use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Directory(#[from] DirectoryError),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Why a location could not be obtained from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,

    #[error("position unavailable")]
    PositionUnavailable,

    #[error("timed out waiting for a location fix")]
    Timeout,
}

impl LocationError {
    /// Maps a W3C geolocation error code.
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            1 => Some(LocationError::PermissionDenied),
            2 => Some(LocationError::PositionUnavailable),
            3 => Some(LocationError::Timeout),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LocationError::PermissionDenied => "permission_denied",
            LocationError::PositionUnavailable => "position_unavailable",
            LocationError::Timeout => "timeout",
        }
    }
}

#[derive(Debug, Error)]
pub enum DirectoryError {
    #[error("garage directory query failed: {0}")]
    QueryFailed(String),

    #[error("malformed garage record {id}: {reason}")]
    MalformedRecord { id: String, reason: &'static str },
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::Directory(err) => (StatusCode::BAD_GATEWAY, err.to_string()),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
        };

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}
