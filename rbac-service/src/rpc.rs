//! Method table for `rbac.v1`.

use service_core::grpc::MethodRule;

pub const GET_ROLE: &str = "/rbac.v1.RoleService/GetRole";
pub const LIST_ROLES: &str = "/rbac.v1.RoleService/ListRoles";
pub const CREATE_ROLE: &str = "/rbac.v1.RoleService/CreateRole";
pub const UPDATE_ROLE: &str = "/rbac.v1.RoleService/UpdateRole";
pub const DELETE_ROLE: &str = "/rbac.v1.RoleService/DeleteRole";

pub const GET_PERMISSION: &str = "/rbac.v1.PermissionService/GetPermission";
pub const LIST_PERMISSIONS: &str = "/rbac.v1.PermissionService/ListPermissions";
pub const LIST_PERMISSIONS_BY_ROLE: &str = "/rbac.v1.PermissionService/ListPermissionsByRole";
pub const ASSIGN_PERMISSION: &str = "/rbac.v1.PermissionService/AssignPermissionToRole";
pub const REVOKE_PERMISSION: &str = "/rbac.v1.PermissionService/RevokePermissionFromRole";
pub const CHECK_PERMISSION: &str = "/rbac.v1.PermissionService/CheckPermission";

pub const GET_USER_ROLES: &str = "/rbac.v1.UserRoleService/GetUserRoles";
pub const ASSIGN_ROLE: &str = "/rbac.v1.UserRoleService/AssignRoleToUser";
pub const REVOKE_ROLE: &str = "/rbac.v1.UserRoleService/RevokeRoleFromUser";
pub const GET_ROLE_USERS: &str = "/rbac.v1.UserRoleService/GetRoleUsers";

pub const METHODS: &[MethodRule] = &[
    MethodRule::requires(GET_ROLE, "roles:read"),
    MethodRule::requires(LIST_ROLES, "roles:read"),
    MethodRule::requires(CREATE_ROLE, "roles:create"),
    MethodRule::requires(UPDATE_ROLE, "roles:update"),
    MethodRule::requires(DELETE_ROLE, "roles:delete"),
    MethodRule::requires(GET_PERMISSION, "permissions:read"),
    MethodRule::authenticated(LIST_PERMISSIONS),
    MethodRule::requires(LIST_PERMISSIONS_BY_ROLE, "permissions:read"),
    MethodRule::requires(ASSIGN_PERMISSION, "permissions:assign"),
    MethodRule::requires(REVOKE_PERMISSION, "permissions:revoke"),
    MethodRule::authenticated(CHECK_PERMISSION),
    // Called by the identity service while resolving a session, before any
    // caller identity exists.
    MethodRule::public(GET_USER_ROLES),
    MethodRule::requires(ASSIGN_ROLE, "user_roles:assign"),
    MethodRule::requires(REVOKE_ROLE, "user_roles:revoke"),
    MethodRule::requires(GET_ROLE_USERS, "user_roles:read"),
];
