//! User directory: lookups for login and account creation for registration.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgPool;
use tracing::instrument;
use uuid::Uuid;

use super::error::{sqlstate, ServiceError, UNIQUE_VIOLATION};
use crate::models::{NewUser, NotificationMethod, User};
use crate::utils::{hash_password, Password};

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Look a user up by id, login or email.
    async fn find_by_login(&self, value: &str) -> Result<Option<User>, ServiceError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError>;

    /// Fails with `UserAlreadyExists` when the login or email is taken.
    async fn create(&self, user: &NewUser) -> Result<User, ServiceError>;

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError>;

    async fn notification_methods(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationMethod>, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}

#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    #[instrument(skip(self))]
    async fn find_by_login(&self, value: &str) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, email, password_hash, created_at, updated_at
            FROM users
            WHERE id::text = $1 OR login = $1 OR email = $1
            LIMIT 1
            "#,
        )
        .bind(value)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, login, email, password_hash, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self, user), fields(login = %user.login))]
    async fn create(&self, user: &NewUser) -> Result<User, ServiceError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, login, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING id, login, email, password_hash, created_at, updated_at
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(&user.login)
        .bind(&user.email)
        .bind(user.password_hash.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if sqlstate(&e).as_deref() == Some(UNIQUE_VIOLATION) {
                ServiceError::UserAlreadyExists
            } else {
                ServiceError::Database(e)
            }
        })
    }

    #[instrument(skip(self))]
    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::UserNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn notification_methods(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationMethod>, ServiceError> {
        let methods = sqlx::query_as::<_, NotificationMethod>(
            r#"
            SELECT provider_name, target
            FROM notification_methods
            WHERE user_id = $1
            ORDER BY provider_name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(methods)
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            ServiceError::Database(e)
        })?;
        Ok(())
    }
}

/// In-memory directory for tests.
#[derive(Default)]
pub struct MockUserRepository {
    users: Mutex<Vec<User>>,
    methods: Mutex<HashMap<Uuid, Vec<NotificationMethod>>>,
}

impl MockUserRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a user whose stored hash is derived from `password`.
    pub fn add_user(&self, login: &str, email: &str, password: &str) -> Result<User, anyhow::Error> {
        let hash = hash_password(&Password::new(password.to_string()))?;
        let user = User {
            id: Uuid::new_v4(),
            login: login.to_string(),
            email: email.to_string(),
            password_hash: hash.into_string(),
            created_at: Utc::now(),
            updated_at: None,
        };

        self.users
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock repository mutex poisoned: {}", e))?
            .push(user.clone());
        Ok(user)
    }

    fn lock_users(&self) -> Result<MutexGuard<'_, Vec<User>>, ServiceError> {
        self.users
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("mutex poisoned: {}", e)))
    }

    pub fn add_notification_method(
        &self,
        user_id: Uuid,
        method: NotificationMethod,
    ) -> Result<(), anyhow::Error> {
        self.methods
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock repository mutex poisoned: {}", e))?
            .entry(user_id)
            .or_default()
            .push(method);
        Ok(())
    }
}

#[async_trait]
impl UserRepository for MockUserRepository {
    async fn find_by_login(&self, value: &str) -> Result<Option<User>, ServiceError> {
        let users = self.lock_users()?;

        Ok(users
            .iter()
            .find(|u| u.id.to_string() == value || u.login == value || u.email == value)
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, ServiceError> {
        Ok(self.lock_users()?.iter().find(|u| u.id == id).cloned())
    }

    async fn create(&self, user: &NewUser) -> Result<User, ServiceError> {
        let mut users = self.lock_users()?;
        if users
            .iter()
            .any(|u| u.login == user.login || u.email == user.email)
        {
            return Err(ServiceError::UserAlreadyExists);
        }

        let created = User {
            id: Uuid::new_v4(),
            login: user.login.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.as_str().to_string(),
            created_at: Utc::now(),
            updated_at: None,
        };
        users.push(created.clone());
        Ok(created)
    }

    async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut users = self.lock_users()?;
        let before = users.len();
        users.retain(|u| u.id != id);
        if users.len() == before {
            return Err(ServiceError::UserNotFound);
        }
        Ok(())
    }

    async fn notification_methods(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<NotificationMethod>, ServiceError> {
        let methods = self
            .methods
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("mutex poisoned: {}", e)))?;

        Ok(methods.get(&user_id).cloned().unwrap_or_default())
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
