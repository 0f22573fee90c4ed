use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::EnrichedRole;

#[derive(Debug, Deserialize)]
pub struct GetUserRolesRequest {
    pub user_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct GetUserRolesResponse {
    pub roles: Vec<EnrichedRole>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRoleRequest {
    pub user_id: Uuid,
    pub role: String,
    #[serde(default)]
    pub assigned_by: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct RevokeRoleRequest {
    pub user_id: Uuid,
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct GetRoleUsersRequest {
    pub role_id: String,
    #[serde(default)]
    pub page_size: u32,
    #[serde(default)]
    pub cursor: Option<Uuid>,
}
