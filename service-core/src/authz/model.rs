//! Role and permission types shared by the identity and RBAC services.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single `resource:action` grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Permission {
    pub id: Uuid,
    pub resource: String,
    pub action: String,
}

impl Permission {
    /// Canonical `resource:action` form used in headers and RPC rules.
    pub fn key(&self) -> String {
        format!("{}:{}", self.resource, self.action)
    }

    /// Parse a `resource:action` string. Anything without exactly one `:` is rejected.
    pub fn parse_key(value: &str) -> Option<(String, String)> {
        let mut parts = value.split(':');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(resource), Some(action), None) if !resource.is_empty() && !action.is_empty() => {
                Some((resource.to_string(), action.to_string()))
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

/// A role together with every permission it grants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleWithPermissions {
    pub role: Role,
    #[serde(default)]
    pub permissions: Vec<Permission>,
}

impl RoleWithPermissions {
    pub fn grants(&self, resource: &str, action: &str) -> bool {
        self.permissions
            .iter()
            .any(|p| p.resource == resource && p.action == action)
    }
}
