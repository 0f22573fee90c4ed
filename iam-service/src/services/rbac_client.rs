//! Client side of the RBAC service's `GetUserRoles` RPC.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use service_core::authz::RoleWithPermissions;
use service_core::observability::outbound_headers;
use tracing::instrument;
use uuid::Uuid;

use crate::config::RbacConfig;

const GET_USER_ROLES_PATH: &str = "/rbac.v1.UserRoleService/GetUserRoles";

/// Source of a user's roles and their permissions.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    async fn get_user_roles(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RoleWithPermissions>, anyhow::Error>;
}

#[derive(Serialize)]
struct GetUserRolesRequest {
    user_id: Uuid,
}

#[derive(Deserialize)]
struct GetUserRolesResponse {
    #[serde(default)]
    roles: Vec<RoleWithPermissions>,
}

#[derive(Clone)]
pub struct RbacClient {
    http: reqwest::Client,
    base_url: String,
}

impl RbacClient {
    pub fn new(config: &RbacConfig) -> Result<Self, anyhow::Error> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()?;

        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl RoleDirectory for RbacClient {
    #[instrument(skip(self))]
    async fn get_user_roles(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RoleWithPermissions>, anyhow::Error> {
        let response = self
            .http
            .post(format!("{}{}", self.base_url, GET_USER_ROLES_PATH))
            .headers(outbound_headers())
            .json(&GetUserRolesRequest { user_id })
            .send()
            .await
            .map_err(|e| anyhow::anyhow!("RBAC request failed: {}", e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!(
                "RBAC service returned {}: {}",
                status,
                body
            ));
        }

        let body: GetUserRolesResponse = response
            .json()
            .await
            .map_err(|e| anyhow::anyhow!("Invalid RBAC response: {}", e))?;

        Ok(body.roles)
    }
}

/// Scriptable [`RoleDirectory`] for tests.
#[derive(Default)]
pub struct MockRoleDirectory {
    roles: Mutex<HashMap<Uuid, Vec<RoleWithPermissions>>>,
    failure: Mutex<Option<String>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl MockRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_roles(&self, user_id: Uuid, roles: Vec<RoleWithPermissions>) {
        if let Ok(mut map) = self.roles.lock() {
            map.insert(user_id, roles);
        }
    }

    /// Make every subsequent call fail with `message`.
    pub fn fail_with(&self, message: &str) {
        if let Ok(mut failure) = self.failure.lock() {
            *failure = Some(message.to_string());
        }
    }

    /// Delay every subsequent call by `delay`.
    pub fn delay_by(&self, delay: Duration) {
        if let Ok(mut slot) = self.delay.lock() {
            *slot = Some(delay);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoleDirectory for MockRoleDirectory {
    async fn get_user_roles(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<RoleWithPermissions>, anyhow::Error> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let delay = *self
            .delay
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock directory mutex poisoned: {}", e))?;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(message) = self
            .failure
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock directory mutex poisoned: {}", e))?
            .clone()
        {
            return Err(anyhow::anyhow!(message));
        }

        let roles = self
            .roles
            .lock()
            .map_err(|e| anyhow::anyhow!("Mock directory mutex poisoned: {}", e))?
            .get(&user_id)
            .cloned()
            .unwrap_or_default();
        Ok(roles)
    }
}
