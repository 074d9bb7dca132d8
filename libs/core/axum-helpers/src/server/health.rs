use axum::{Router, extract::State, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::envelope::ApiResponse;

#[derive(Clone, Copy, Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub name: &'static str,
    pub version: &'static str,
}

async fn health_handler(State(health): State<HealthResponse>) -> impl IntoResponse {
    ApiResponse::success(health)
}

/// Creates a router with the `/health` liveness endpoint.
///
/// Always answers 200 while the process is serving.
pub fn health_router(name: &'static str, version: &'static str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .with_state(HealthResponse {
            status: "healthy",
            name,
            version,
        })
}
