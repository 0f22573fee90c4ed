use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::{NotificationMethod, UserProfile};
use crate::utils::PasswordHashString;

/// User row as stored in the directory. Never serialized: it carries the hash.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: Uuid,
    pub login: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn into_profile(self, notification_methods: Vec<NotificationMethod>) -> UserProfile {
        UserProfile {
            id: self.id,
            login: self.login,
            email: self.email,
            notification_methods,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

/// Account to insert. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub login: String,
    pub email: String,
    pub password_hash: PasswordHashString,
}
