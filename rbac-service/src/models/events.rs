use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

/// Published by the identity side when a user account is created.
#[derive(Debug, Clone, Deserialize)]
pub struct UserCreated {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub login: String,
    #[serde(default)]
    pub email: String,
    /// Role to grant; empty or absent means the configured default.
    #[serde(default)]
    pub role_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserCreated {
    pub fn requested_role(&self) -> Option<&str> {
        self.role_id
            .as_deref()
            .map(str::trim)
            .filter(|r| !r.is_empty())
    }
}
