pub mod capsules;
pub mod error;
pub mod validation;

use std::sync::Arc;

use axum::{
    Json, Router,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use capsule_core::{CreateTimeCapsule, TimeCapsuleRepository};
use capsule_types::api::HealthResponse;

pub type AppState = Arc<AppStateInner>;

pub struct AppStateInner {
    pub create: CreateTimeCapsule,
    /// Read side for capsule lookups. Writes go through the use cases.
    pub repository: Arc<dyn TimeCapsuleRepository>,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/capsules", post(capsules::create_capsule))
        .route("/capsules/{id}", get(capsules::get_capsule))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".into(),
    })
}
