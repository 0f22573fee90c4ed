use axum::{extract::State, Extension, Json};
use service_core::authz::CallerContext;
use service_core::error::AppError;

use crate::dtos::{
    CheckPermissionRequest, CheckPermissionResponse, Empty, GetPermissionRequest,
    ListPermissionsRequest, PermissionResponse, PermissionsResponse, RolePermissionRequest,
    RoleRequest,
};
use crate::AppState;

pub async fn get_permission(
    State(state): State<AppState>,
    Json(req): Json<GetPermissionRequest>,
) -> Result<Json<PermissionResponse>, AppError> {
    let permission = state.permissions.get(&req.value).await?;
    Ok(Json(PermissionResponse { permission }))
}

pub async fn list_permissions(
    State(state): State<AppState>,
    Json(req): Json<ListPermissionsRequest>,
) -> Result<Json<PermissionsResponse>, AppError> {
    let permissions = state.permissions.list(req.into()).await?;
    Ok(Json(PermissionsResponse { permissions }))
}

pub async fn list_permissions_by_role(
    State(state): State<AppState>,
    Json(req): Json<RoleRequest>,
) -> Result<Json<PermissionsResponse>, AppError> {
    let permissions = state.permissions.list_by_role(&req.role).await?;
    Ok(Json(PermissionsResponse { permissions }))
}

pub async fn assign_permission(
    State(state): State<AppState>,
    Json(req): Json<RolePermissionRequest>,
) -> Result<Json<Empty>, AppError> {
    state
        .permissions
        .assign_to_role(&req.role, req.permission_id)
        .await?;
    Ok(Json(Empty::default()))
}

pub async fn revoke_permission(
    State(state): State<AppState>,
    Json(req): Json<RolePermissionRequest>,
) -> Result<Json<Empty>, AppError> {
    state
        .permissions
        .revoke_from_role(&req.role, req.permission_id)
        .await?;
    Ok(Json(Empty::default()))
}

/// `POST /rbac.v1.PermissionService/CheckPermission`
///
/// Without an explicit `user_id` the caller's own grants are checked. A
/// missing grant is reported as 403.
pub async fn check_permission(
    State(state): State<AppState>,
    caller: Option<Extension<CallerContext>>,
    Json(req): Json<CheckPermissionRequest>,
) -> Result<Json<CheckPermissionResponse>, AppError> {
    let user_id = req
        .user_id
        .or_else(|| caller.map(|Extension(c)| c.user_id))
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("Missing user id")))?;

    state
        .permissions
        .check(user_id, &req.resource, &req.action)
        .await?;
    Ok(Json(CheckPermissionResponse { allowed: true }))
}
