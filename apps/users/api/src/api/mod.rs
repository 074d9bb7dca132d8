use axum::{Router, middleware};
use axum_helpers::{AuditState, create_api_cors_layer, request_audit};

use crate::state::Storage;

pub mod hello;
pub mod users;

/// Creates the API routes without the `/api` prefix.
/// The `/api` prefix will be added by the `create_router` helper.
///
/// Every route below is audited and CORS-enabled.
pub fn routes(storage: &Storage, audit: AuditState) -> Router {
    Router::new()
        .nest("/users", users::router(storage))
        .merge(hello::router())
        .layer(middleware::from_fn_with_state(audit, request_audit))
        .layer(create_api_cors_layer())
}
