//! Header and cookie names exchanged between the edge proxy, the identity
//! service and the services behind it.

use std::collections::HashSet;

use super::model::RoleWithPermissions;

/// Cookie carrying the opaque session id.
pub const SESSION_COOKIE_NAME: &str = "X-Session-Uuid";

/// Request header carrying the session id; wins over the cookie.
pub const SESSION_ID_HEADER: &str = "sid";

pub const USER_UUID_HEADER: &str = "X-User-UUID";
pub const USER_LOGIN_HEADER: &str = "X-User-Login";
pub const USER_ROLES_HEADER: &str = "X-User-Roles";
pub const USER_PERMISSIONS_HEADER: &str = "X-User-Permissions";

pub const COOKIE_HEADER: &str = "cookie";
pub const AUTHORIZATION_HEADER: &str = "authorization";
pub const CONTENT_TYPE_HEADER: &str = "content-type";
pub const AUTH_STATUS_HEADER: &str = "X-Auth-Status";

pub const CONTENT_TYPE_JSON: &str = "application/json";
pub const AUTH_STATUS_DENIED: &str = "denied";

/// Comma-joined role names in resolution order.
pub fn join_role_names(roles: &[RoleWithPermissions]) -> String {
    roles
        .iter()
        .map(|r| r.role.name.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// Comma-joined union of `resource:action` keys, first occurrence wins.
pub fn join_permissions(roles: &[RoleWithPermissions]) -> String {
    let mut seen = HashSet::new();
    roles
        .iter()
        .flat_map(|r| r.permissions.iter())
        .map(|p| p.key())
        .filter(|key| seen.insert(key.clone()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split a comma-joined header value, dropping blanks.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
