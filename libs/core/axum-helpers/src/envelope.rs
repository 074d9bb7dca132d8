//! Uniform response envelope.
//!
//! Every API response, success or failure, is shaped as
//!
//! ```json
//! { "code": 200, "message": "Operation succeeded", "data": { ... }, "timestamp": 1733900000000 }
//! ```
//!
//! The HTTP status line mirrors `code`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const DEFAULT_SUCCESS_MESSAGE: &str = "Operation succeeded";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    /// Status code, identical to the HTTP status of the response
    pub code: u16,
    /// Human-readable outcome
    pub message: String,
    /// Payload, `null` on failures
    pub data: Option<T>,
    /// Creation time in epoch milliseconds
    pub timestamp: i64,
}

impl<T> ApiResponse<T> {
    fn build(code: StatusCode, message: impl Into<String>, data: Option<T>) -> Self {
        Self {
            code: code.as_u16(),
            message: message.into(),
            data,
            timestamp: Utc::now().timestamp_millis(),
        }
    }

    pub fn success(data: T) -> Self {
        Self::build(StatusCode::OK, DEFAULT_SUCCESS_MESSAGE, Some(data))
    }

    pub fn success_with(message: impl Into<String>, data: T) -> Self {
        Self::build(StatusCode::OK, message, Some(data))
    }

    /// Generic failure (500)
    pub fn error(message: impl Into<String>) -> Self {
        Self::build(StatusCode::INTERNAL_SERVER_ERROR, message, None)
    }

    pub fn error_with(code: StatusCode, message: impl Into<String>) -> Self {
        Self::build(code, message, None)
    }

    /// Attach a payload to a failure envelope (e.g. field-level validation errors)
    pub fn with_data(mut self, data: T) -> Self {
        self.data = Some(data);
        self
    }

    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    pub fn is_success(&self) -> bool {
        self.status().is_success()
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status(), Json(self)).into_response()
    }
}
