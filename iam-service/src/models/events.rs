use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::User;

/// Emitted once per registered account. The role service grants the initial
/// role from it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserCreated {
    pub event_id: Uuid,
    pub user_id: Uuid,
    pub login: String,
    pub email: String,
    /// `None` lets the consumer pick its default role.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserCreated {
    pub fn for_user(user: &User, role_id: Option<String>) -> Self {
        Self {
            event_id: Uuid::new_v4(),
            user_id: user.id,
            login: user.login.clone(),
            email: user.email.clone(),
            role_id,
            created_at: user.created_at,
        }
    }
}
