use service_core::error::AppError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Role not found")]
    RoleNotFound,

    #[error("Role with this name already exists")]
    RoleAlreadyExists,

    #[error("Permission not found")]
    PermissionNotFound,

    #[error("Permission already assigned to role")]
    PermissionAlreadyAssigned,

    #[error("Permission not assigned to role")]
    PermissionNotAssigned,

    #[error("Role already assigned to user")]
    RoleAlreadyAssigned,

    #[error("Role not assigned to user")]
    RoleNotAssigned,

    #[error("Permission denied")]
    PermissionDenied,

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::RoleNotFound | ServiceError::PermissionNotFound => {
                AppError::NotFound(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::RoleAlreadyExists
            | ServiceError::PermissionAlreadyAssigned
            | ServiceError::RoleAlreadyAssigned => {
                AppError::Conflict(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::PermissionNotAssigned | ServiceError::RoleNotAssigned => {
                AppError::FailedPrecondition(anyhow::anyhow!(err.to_string()))
            }
            ServiceError::PermissionDenied => AppError::Forbidden(anyhow::anyhow!("Permission denied")),
            ServiceError::InvalidInput(msg) => AppError::BadRequest(anyhow::anyhow!(msg)),
            ServiceError::Validation(e) => AppError::ValidationError(e),
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
pub(crate) const FOREIGN_KEY_VIOLATION: &str = "23503";

#[cfg(test)]
mod tests {
    use super::*;
    use service_core::axum::{http::StatusCode, response::IntoResponse};

    fn status(err: ServiceError) -> StatusCode {
        AppError::from(err).into_response().status()
    }

    #[test]
    fn test_domain_errors_map_to_taxonomy() {
        assert_eq!(status(ServiceError::RoleNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status(ServiceError::RoleAlreadyAssigned), StatusCode::CONFLICT);
        assert_eq!(
            status(ServiceError::PermissionNotAssigned),
            StatusCode::PRECONDITION_FAILED
        );
        assert_eq!(status(ServiceError::PermissionDenied), StatusCode::FORBIDDEN);
        assert_eq!(
            status(ServiceError::InvalidInput("empty".to_string())),
            StatusCode::BAD_REQUEST
        );
    }
}
