use axum::http::Method;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};

/// Creates the CORS layer applied to the `/api` tree.
///
/// - Any origin and any request header
/// - Methods GET, POST, PUT, DELETE, OPTIONS
/// - 1 hour max age
///
/// Credentials are not allowed, since tower-http rejects them combined with a
/// wildcard origin.
pub fn create_api_cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(3600))
}
