use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::ValidatedJson;
use uuid::Uuid;

use crate::dtos::{GetUserRequest, GetUserResponse, RegisterRequest, RegisterResponse};
use crate::utils::Password;
use crate::AppState;

/// `POST /auth.v1.UserService/Register`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RegisterRequest>,
) -> Result<Json<RegisterResponse>, AppError> {
    let profile = state
        .users
        .register(&req.login, &req.email, Password::new(req.password))
        .await?;

    Ok(Json(RegisterResponse {
        user_id: profile.id,
    }))
}

/// `POST /auth.v1.UserService/GetUser`
pub async fn get_user(
    State(state): State<AppState>,
    Json(req): Json<GetUserRequest>,
) -> Result<Json<GetUserResponse>, AppError> {
    let user_id = Uuid::parse_str(req.user_id.trim())
        .map_err(|_| AppError::BadRequest(anyhow::anyhow!("Invalid user id")))?;

    let user = state.users.get_user(user_id).await?;
    Ok(Json(GetUserResponse { user }))
}
