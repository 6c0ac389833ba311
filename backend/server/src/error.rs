use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use book::{ParseIdError, ValidationError};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Malformed payload")]
    MalformedPayload,

    #[error(transparent)]
    MalformedId(#[from] ParseIdError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The caller gave no acting identity at all.
    #[error("Missing actor identity")]
    MissingActor,

    #[error("Not found")]
    NotFound,

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::MalformedPayload
            | AppError::MalformedId { .. }
            | AppError::Validation { .. } => StatusCode::BAD_REQUEST,
            AppError::MissingActor => StatusCode::UNAUTHORIZED,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict { .. } => StatusCode::CONFLICT,
            AppError::Store { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!("{self}");
            return (status, Json(json!({ "error": "Internal error" }))).into_response();
        }

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
