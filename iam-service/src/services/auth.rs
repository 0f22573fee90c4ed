use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::instrument;
use uuid::Uuid;

use super::error::ServiceError;
use super::session::SessionStore;
use super::users::UserRepository;
use crate::utils::{verify_password, Password, PasswordHashString};

#[derive(Debug, Clone, Serialize)]
pub struct LoginOutcome {
    pub session_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// Login and logout on top of the user directory and the session store.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    sessions: SessionStore,
    session_ttl: chrono::Duration,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        sessions: SessionStore,
        session_ttl: chrono::Duration,
    ) -> Self {
        Self {
            users,
            sessions,
            session_ttl,
        }
    }

    /// Unknown users and wrong passwords are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn login(&self, login: &str, password: Password) -> Result<LoginOutcome, ServiceError> {
        let Some(user) = self.users.find_by_login(login).await? else {
            tracing::info!("Login failed: unknown user");
            return Err(ServiceError::InvalidCredentials);
        };

        let hash = PasswordHashString::new(user.password_hash.clone());
        let matches = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
            .await
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Password check aborted: {}", e)))??;

        if !matches {
            tracing::info!(user_id = %user.id, "Login failed: wrong password");
            return Err(ServiceError::InvalidCredentials);
        }

        let methods = self.users.notification_methods(user.id).await?;
        let profile = user.into_profile(methods);
        let expires_at = Utc::now() + self.session_ttl;
        let session_id = self.sessions.create(&profile, expires_at).await?;

        tracing::info!(user_id = %profile.id, %session_id, "User logged in");
        Ok(LoginOutcome {
            session_id,
            expires_at,
        })
    }

    #[instrument(skip(self))]
    pub async fn logout(&self, session_id: Uuid) -> Result<(), ServiceError> {
        self.sessions.delete(session_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::users::MockUserRepository;
    use service_core::cache::InMemoryCache;

    fn service(users: Arc<MockUserRepository>) -> (AuthService, SessionStore) {
        let sessions = SessionStore::new(Arc::new(InMemoryCache::new()));
        let auth = AuthService::new(users, sessions.clone(), chrono::Duration::hours(1));
        (auth, sessions)
    }

    #[tokio::test]
    async fn test_login_creates_session() {
        let users = Arc::new(MockUserRepository::new());
        let user = users.add_user("alice", "alice@example.com", "secret1").unwrap();
        let (auth, sessions) = service(users);

        let outcome = auth
            .login("alice@example.com", Password::new("secret1".to_string()))
            .await
            .unwrap();
        let (session, profile) = sessions.get(outcome.session_id).await.unwrap();

        assert_eq!(profile.id, user.id);
        assert_eq!(session.expires_at, outcome.expires_at);
        assert_ne!(outcome.session_id, user.id);
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_look_the_same() {
        let users = Arc::new(MockUserRepository::new());
        users.add_user("alice", "alice@example.com", "secret1").unwrap();
        let (auth, _) = service(users);

        let wrong = auth.login("alice", Password::new("nope123".to_string())).await;
        let unknown = auth.login("bob", Password::new("secret1".to_string())).await;

        assert!(matches!(wrong, Err(ServiceError::InvalidCredentials)));
        assert!(matches!(unknown, Err(ServiceError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let users = Arc::new(MockUserRepository::new());
        users.add_user("alice", "alice@example.com", "secret1").unwrap();
        let (auth, sessions) = service(users);

        let outcome = auth
            .login("alice", Password::new("secret1".to_string()))
            .await
            .unwrap();
        auth.logout(outcome.session_id).await.unwrap();
        auth.logout(outcome.session_id).await.unwrap();

        assert!(matches!(
            sessions.get(outcome.session_id).await,
            Err(ServiceError::SessionNotFound)
        ));
    }
}
