use axum::{extract::State, Json};
use service_core::error::AppError;
use service_core::extract::ValidatedJson;

use crate::dtos::{
    CreateRoleRequest, DeleteRoleRequest, Empty, GetRoleRequest, ListRolesRequest,
    ListRolesResponse, RoleResponse, UpdateRoleRequest,
};
use crate::models::EnrichedRole;
use crate::AppState;

/// `POST /rbac.v1.RoleService/GetRole`
pub async fn get_role(
    State(state): State<AppState>,
    Json(req): Json<GetRoleRequest>,
) -> Result<Json<EnrichedRole>, AppError> {
    Ok(Json(state.roles.get(&req.value).await?))
}

pub async fn list_roles(
    State(state): State<AppState>,
    Json(req): Json<ListRolesRequest>,
) -> Result<Json<ListRolesResponse>, AppError> {
    let roles = state.roles.list(req.into()).await?;
    Ok(Json(ListRolesResponse { roles }))
}

pub async fn create_role(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<CreateRoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let role = state.roles.create(req.into()).await?;
    Ok(Json(RoleResponse { role }))
}

pub async fn update_role(
    State(state): State<AppState>,
    Json(req): Json<UpdateRoleRequest>,
) -> Result<Json<RoleResponse>, AppError> {
    let role = state.roles.update(req.into()).await?;
    Ok(Json(RoleResponse { role }))
}

pub async fn delete_role(
    State(state): State<AppState>,
    Json(req): Json<DeleteRoleRequest>,
) -> Result<Json<Empty>, AppError> {
    state.roles.delete(req.id).await?;
    Ok(Json(Empty::default()))
}
