use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::error::ServiceError;
use super::events::UserEventPublisher;
use super::users::UserRepository;
use crate::models::{NewUser, UserCreated, UserProfile};
use crate::utils::{hash_password, Password};

/// Account registration and profile lookup.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
    events: Arc<dyn UserEventPublisher>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>, events: Arc<dyn UserEventPublisher>) -> Self {
        Self { users, events }
    }

    /// Create the account and announce it. If the announcement cannot be
    /// delivered the account is removed again, so no user exists without
    /// an initial role grant on the way.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        login: &str,
        email: &str,
        password: Password,
    ) -> Result<UserProfile, ServiceError> {
        let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password hashing aborted: {}", e)))??;

        let user = self
            .users
            .create(&NewUser {
                login: login.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await?;

        let event = UserCreated::for_user(&user, None);
        if let Err(e) = self.events.publish_user_created(&event).await {
            tracing::error!(user_id = %user.id, error = %e, "UserCreated not published, rolling back");
            if let Err(rollback) = self.users.delete(user.id).await {
                tracing::error!(user_id = %user.id, error = %rollback, "Rollback of new user failed");
            }
            return Err(ServiceError::EventPublish(e));
        }

        tracing::info!(user_id = %user.id, event_id = %event.event_id, "User registered");
        Ok(user.into_profile(Vec::new()))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: Uuid) -> Result<UserProfile, ServiceError> {
        let user = self
            .users
            .find_by_id(id)
            .await?
            .ok_or(ServiceError::UserNotFound)?;
        let methods = self.users.notification_methods(user.id).await?;
        Ok(user.into_profile(methods))
    }
}
