use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Session not found")]
    SessionNotFound,

    #[error("Session expired")]
    SessionExpired,

    #[error("Invalid session: {0}")]
    InvalidSession(String),

    #[error("Invalid session data: {0}")]
    InvalidSessionData(String),

    #[error("Invalid login or password")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("User with this login or email already exists")]
    UserAlreadyExists,

    #[error("Failed to publish user event: {0}")]
    EventPublish(anyhow::Error),

    #[error("Cache error: {0}")]
    Cache(anyhow::Error),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::SessionNotFound => {
                AppError::NotFound(anyhow::anyhow!("Session not found"))
            }
            ServiceError::SessionExpired => {
                AppError::Unauthorized(anyhow::anyhow!("Session expired"))
            }
            ServiceError::InvalidSession(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::InvalidSessionData(msg) => {
                AppError::InternalError(anyhow::anyhow!("Invalid session data: {}", msg))
            }
            ServiceError::InvalidCredentials => {
                AppError::AuthError(anyhow::anyhow!("Invalid login or password"))
            }
            ServiceError::UserNotFound => AppError::NotFound(anyhow::anyhow!("User not found")),
            ServiceError::UserAlreadyExists => AppError::Conflict(anyhow::anyhow!(
                "User with this login or email already exists"
            )),
            ServiceError::EventPublish(e) => {
                AppError::InternalError(e.context("User created event not delivered"))
            }
            ServiceError::Cache(e) => AppError::InternalError(e.context("Session cache failure")),
            ServiceError::Database(e) => AppError::DatabaseError(anyhow::Error::new(e)),
            ServiceError::Internal(e) => AppError::InternalError(e),
        }
    }
}

/// SQLSTATE of a database-reported error, if any.
pub(crate) fn sqlstate(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|e| e.code())
        .map(|code| code.into_owned())
}

pub(crate) const UNIQUE_VIOLATION: &str = "23505";

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::{http::StatusCode, response::IntoResponse};

    #[test]
    fn test_session_errors_map_to_taxonomy() {
        let not_found = AppError::from(ServiceError::SessionNotFound).into_response();
        assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

        let expired = AppError::from(ServiceError::SessionExpired).into_response();
        assert_eq!(expired.status(), StatusCode::UNAUTHORIZED);

        let bad = AppError::from(ServiceError::InvalidCredentials).into_response();
        assert_eq!(bad.status(), StatusCode::UNAUTHORIZED);

        let taken = AppError::from(ServiceError::UserAlreadyExists).into_response();
        assert_eq!(taken.status(), StatusCode::CONFLICT);
    }
}
