use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum UserError {
    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Username '{0}' already exists")]
    DuplicateUsername(String),

    #[error("Email '{0}' already exists")]
    DuplicateEmail(String),

    #[error("User not found: {0}")]
    NotFound(i64),

    #[error("Persistence error: {0}")]
    Persistence(String),
}

pub type UserResult<T> = Result<T, UserError>;

impl UserError {
    /// Uniqueness violation on username or email
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            UserError::DuplicateUsername(_) | UserError::DuplicateEmail(_)
        )
    }
}

impl From<sea_orm::DbErr> for UserError {
    fn from(err: sea_orm::DbErr) -> Self {
        UserError::Persistence(format!("Database error: {}", err))
    }
}

impl From<UserError> for AppError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(msg) => AppError::BadRequest(msg),
            e @ (UserError::DuplicateUsername(_) | UserError::DuplicateEmail(_)) => {
                AppError::Conflict(e.to_string())
            }
            UserError::NotFound(_) => AppError::NotFound("User not found".to_string()),
            UserError::Persistence(msg) => {
                tracing::error!("Persistence error: {}", msg);
                AppError::InternalServerError("User operation failed".to_string())
            }
        }
    }
}

impl IntoResponse for UserError {
    fn into_response(self) -> Response {
        AppError::from(self).into_response()
    }
}
