use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::envelope::ApiResponse;

/// Fallback handler for unmatched routes.
pub async fn not_found() -> Response {
    ApiResponse::<()>::error_with(
        StatusCode::NOT_FOUND,
        "The requested resource was not found",
    )
    .into_response()
}
