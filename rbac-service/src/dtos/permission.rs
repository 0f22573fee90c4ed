use serde::{Deserialize, Serialize};
use service_core::authz::Permission;
use uuid::Uuid;

use crate::models::PermissionFilter;

#[derive(Debug, Default, Deserialize)]
pub struct ListPermissionsRequest {
    #[serde(default)]
    pub role_id: Option<Uuid>,
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

impl From<ListPermissionsRequest> for PermissionFilter {
    fn from(req: ListPermissionsRequest) -> Self {
        PermissionFilter {
            role_id: req.role_id,
            resource: req.resource,
            action: req.action,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GetPermissionRequest {
    /// Permission id or `resource:action` key.
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionResponse {
    pub permission: Permission,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct PermissionsResponse {
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Deserialize)]
pub struct RoleRequest {
    /// Role id or role name.
    pub role: String,
}

#[derive(Debug, Deserialize)]
pub struct RolePermissionRequest {
    pub role: String,
    pub permission_id: Uuid,
}

/// `user_id` defaults to the caller.
#[derive(Debug, Deserialize)]
pub struct CheckPermissionRequest {
    #[serde(default)]
    pub user_id: Option<Uuid>,
    pub resource: String,
    pub action: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CheckPermissionResponse {
    pub allowed: bool,
}
