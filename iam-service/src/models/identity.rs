use serde::Serialize;
use service_core::authz::RoleWithPermissions;

use super::{Session, UserProfile};

/// Result of resolving a session: who the caller is and what their roles grant.
#[derive(Debug, Clone, Serialize)]
pub struct Identity {
    pub session: Session,
    pub user: UserProfile,
    pub roles_with_permissions: Vec<RoleWithPermissions>,
}
