pub mod permission;
pub mod role;
pub mod user_role;

pub use permission::{
    CheckPermissionRequest, CheckPermissionResponse, GetPermissionRequest, ListPermissionsRequest,
    PermissionResponse, PermissionsResponse, RolePermissionRequest, RoleRequest,
};
pub use role::{
    CreateRoleRequest, DeleteRoleRequest, Empty, GetRoleRequest, ListRolesRequest,
    ListRolesResponse, RoleResponse, UpdateRoleRequest,
};
pub use user_role::{
    AssignRoleRequest, GetRoleUsersRequest, GetUserRolesRequest, GetUserRolesResponse,
    RevokeRoleRequest,
};
