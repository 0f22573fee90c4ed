use std::collections::HashSet;

use axum::http::HeaderMap;
use uuid::Uuid;

use super::headers::{
    USER_LOGIN_HEADER, USER_PERMISSIONS_HEADER, USER_ROLES_HEADER, USER_UUID_HEADER, split_list,
};
use super::model::{Permission, RoleWithPermissions};

/// Authorization context of the authenticated caller for a single call.
///
/// Attached to request extensions by the trusted-identity middleware and read
/// by the permission enforcement point and by handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub login: String,
    pub roles: Vec<String>,
    pub permissions: HashSet<String>,
}

impl CallerContext {
    pub fn from_roles(user_id: Uuid, login: impl Into<String>, roles: &[RoleWithPermissions]) -> Self {
        Self {
            user_id,
            login: login.into(),
            roles: roles.iter().map(|r| r.role.name.clone()).collect(),
            permissions: roles
                .iter()
                .flat_map(|r| r.permissions.iter().map(Permission::key))
                .collect(),
        }
    }

    /// Build the context from the identity headers injected at the edge.
    ///
    /// Returns `None` when `X-User-UUID` is absent or not a UUID. Malformed
    /// permission entries are skipped.
    pub fn from_headers(headers: &HeaderMap) -> Option<Self> {
        let user_id = header_str(headers, USER_UUID_HEADER)
            .and_then(|v| Uuid::parse_str(v.trim()).ok())?;

        let login = header_str(headers, USER_LOGIN_HEADER)
            .unwrap_or_default()
            .to_string();
        let roles = header_str(headers, USER_ROLES_HEADER)
            .map(split_list)
            .unwrap_or_default();
        let permissions = header_str(headers, USER_PERMISSIONS_HEADER)
            .map(split_list)
            .unwrap_or_default()
            .into_iter()
            .filter(|p| Permission::parse_key(p).is_some())
            .collect();

        Some(Self {
            user_id,
            login,
            roles,
            permissions,
        })
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers.get(name).and_then(|v| v.to_str().ok())
}
