use serde::{Deserialize, Serialize};
use service_core::authz::Role;
use uuid::Uuid;
use validator::Validate;

use crate::models::{CreateRole, RoleFilter, UpdateRole};

#[derive(Debug, Deserialize)]
pub struct GetRoleRequest {
    /// Role id or role name.
    pub value: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListRolesRequest {
    #[serde(default)]
    pub name_filter: Option<String>,
}

impl From<ListRolesRequest> for RoleFilter {
    fn from(req: ListRolesRequest) -> Self {
        RoleFilter {
            name: req.name_filter,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListRolesResponse {
    pub roles: Vec<Role>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateRoleRequest {
    #[validate(length(min = 2, max = 50, message = "Role name must be 2 to 50 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(length(max = 500, message = "Description must be at most 500 characters"))]
    pub description: String,
}

impl From<CreateRoleRequest> for CreateRole {
    fn from(req: CreateRoleRequest) -> Self {
        CreateRole {
            name: req.name.trim().to_string(),
            description: req.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateRoleRequest {
    pub id: Uuid,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<UpdateRoleRequest> for UpdateRole {
    fn from(req: UpdateRoleRequest) -> Self {
        UpdateRole {
            id: req.id,
            name: req.name.map(|n| n.trim().to_string()),
            description: req.description,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RoleResponse {
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct DeleteRoleRequest {
    pub id: Uuid,
}

/// `{}` acknowledgement for mutations without a payload.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct Empty {}
