use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::scoreboard::ScoreError;
use crate::session::SessionError;

/// Errors surfaced by the scoreboard API
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Score(#[from] ScoreError),

    #[error(transparent)]
    Session(#[from] SessionError),

    #[error("amount must be a positive integer: {0}")]
    MalformedAmount(String),

    #[error("malformed request body: {0}")]
    MalformedBody(String),
}

/// Error response body for JSON responses
#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl ApiError {
    fn status_and_label(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::Score(ScoreError::InvalidSubtraction { .. }) => {
                (StatusCode::CONFLICT, "Invalid subtraction")
            }
            ApiError::Score(ScoreError::InvalidAmount { .. }) => {
                (StatusCode::BAD_REQUEST, "Invalid amount")
            }
            ApiError::Score(ScoreError::UnknownTeam(_)) => (StatusCode::BAD_REQUEST, "Unknown team"),
            ApiError::Score(ScoreError::ScoreOverflow { .. }) => {
                (StatusCode::UNPROCESSABLE_ENTITY, "Score overflow")
            }
            ApiError::Session(SessionError::UnknownSession(_)) => {
                (StatusCode::NOT_FOUND, "Unknown session")
            }
            ApiError::Session(SessionError::SessionLimit(_)) => {
                (StatusCode::SERVICE_UNAVAILABLE, "Too many sessions")
            }
            ApiError::MalformedAmount(_) => (StatusCode::BAD_REQUEST, "Invalid amount"),
            ApiError::MalformedBody(_) => (StatusCode::BAD_REQUEST, "Invalid request"),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error) = self.status_and_label();
        if status.is_server_error() {
            tracing::warn!("{}: {}", error, self);
        }
        let body = ErrorResponse {
            error,
            details: Some(self.to_string()),
        };
        (status, Json(body)).into_response()
    }
}
