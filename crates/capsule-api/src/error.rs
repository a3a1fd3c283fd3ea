use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tracing::error;

use capsule_core::CapsuleError;
use capsule_types::api::ErrorResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Missing request body")]
    MissingBody,

    #[error("Invalid request payload")]
    InvalidPayload(serde_json::Value),

    #[error("We can't send time capsules in the past (yet)!")]
    TooEarly,

    #[error("Invalid capsule id")]
    InvalidId,

    #[error("Time capsule not found")]
    NotFound,

    #[error("Internal server error")]
    Internal,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::MissingBody | Self::InvalidPayload(_) | Self::TooEarly | Self::InvalidId => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = match self {
            Self::InvalidPayload(details) => {
                ErrorResponse::with_details("Invalid request payload", details)
            }
            other => ErrorResponse::new(other.to_string()),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CapsuleError> for ApiError {
    fn from(err: CapsuleError) -> Self {
        match err {
            CapsuleError::TooEarlyToSchedule { .. } => Self::TooEarly,
            other => {
                error!("Error creating time capsule: {:#}", other);
                Self::Internal
            }
        }
    }
}
