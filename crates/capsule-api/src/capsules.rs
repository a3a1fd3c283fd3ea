use axum::{
    Json,
    body::Bytes,
    extract::{Path, State, rejection::PathRejection},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::json;
use tracing::error;
use uuid::Uuid;

use capsule_types::TimeCapsule;
use capsule_types::api::CreateCapsuleRequest;

use crate::AppState;
use crate::error::ApiError;
use crate::validation::validate_create;

/// POST /capsules: validates the payload, schedules the capsule and
/// returns it with status 201.
pub async fn create_capsule(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    if body.trim_ascii().is_empty() {
        return Err(ApiError::MissingBody);
    }
    let req: CreateCapsuleRequest = serde_json::from_slice(&body)
        .map_err(|e| ApiError::InvalidPayload(json!({ "body": e.to_string() })))?;

    let input = validate_create(req)?;
    let capsule = state.create.execute(input).await?;

    Ok((StatusCode::CREATED, Json(capsule)))
}

/// GET /capsules/{id}
pub async fn get_capsule(
    State(state): State<AppState>,
    id: Result<Path<Uuid>, PathRejection>,
) -> Result<Json<TimeCapsule>, ApiError> {
    let Path(id) = id.map_err(|_| ApiError::InvalidId)?;

    let capsule = state
        .repository
        .get_by_id(id)
        .await
        .map_err(|e| {
            error!("Error loading time capsule {}: {:#}", id, e);
            ApiError::Internal
        })?
        .ok_or(ApiError::NotFound)?;

    Ok(Json(capsule))
}
