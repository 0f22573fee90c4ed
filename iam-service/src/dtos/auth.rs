use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use service_core::authz::RoleWithPermissions;
use uuid::Uuid;
use validator::Validate;

use crate::models::{Identity, Session, UserProfile};

#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 3, max = 50, message = "Login must be 3 to 50 characters"))]
    pub login: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Session comes from the body when present, otherwise from the request.
#[derive(Debug, Default, Deserialize)]
pub struct LogoutRequest {
    #[serde(default)]
    pub session_id: Option<Uuid>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LogoutResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct WhoamiRequest {
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WhoamiResponse {
    pub session: Session,
    pub user: UserProfile,
    pub roles_with_permissions: Vec<RoleWithPermissions>,
}

impl From<Identity> for WhoamiResponse {
    fn from(identity: Identity) -> Self {
        Self {
            session: identity.session,
            user: identity.user,
            roles_with_permissions: identity.roles_with_permissions,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_request_debug_hides_password() {
        let req: LoginRequest =
            serde_json::from_str(r#"{"login":"alice","password":"hunter22"}"#).unwrap();

        let printed = format!("{:?}", req);
        assert!(printed.contains("alice"));
        assert!(!printed.contains("hunter22"));
    }
}
