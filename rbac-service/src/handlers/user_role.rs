use axum::{extract::State, Extension, Json};
use service_core::authz::CallerContext;
use service_core::error::AppError;

use crate::dtos::{
    AssignRoleRequest, Empty, GetRoleUsersRequest, GetUserRolesRequest, GetUserRolesResponse,
    RevokeRoleRequest,
};
use crate::models::RoleUsersPage;
use crate::AppState;

/// `POST /rbac.v1.UserRoleService/GetUserRoles`
pub async fn get_user_roles(
    State(state): State<AppState>,
    Json(req): Json<GetUserRolesRequest>,
) -> Result<Json<GetUserRolesResponse>, AppError> {
    let roles = state.user_roles.get_user_roles(req.user_id).await?;
    Ok(Json(GetUserRolesResponse { roles }))
}

/// The caller is recorded as the assigner unless the request names one.
pub async fn assign_role(
    State(state): State<AppState>,
    caller: Option<Extension<CallerContext>>,
    Json(req): Json<AssignRoleRequest>,
) -> Result<Json<Empty>, AppError> {
    let assigned_by = req
        .assigned_by
        .or_else(|| caller.map(|Extension(c)| c.user_id));

    state
        .user_roles
        .assign(req.user_id, &req.role, assigned_by)
        .await?;
    Ok(Json(Empty::default()))
}

pub async fn revoke_role(
    State(state): State<AppState>,
    Json(req): Json<RevokeRoleRequest>,
) -> Result<Json<Empty>, AppError> {
    state.user_roles.revoke(req.user_id, &req.role).await?;
    Ok(Json(Empty::default()))
}

pub async fn get_role_users(
    State(state): State<AppState>,
    Json(req): Json<GetRoleUsersRequest>,
) -> Result<Json<RoleUsersPage>, AppError> {
    let page = state
        .user_roles
        .role_users(&req.role_id, req.page_size, req.cursor)
        .await?;
    Ok(Json(page))
}
