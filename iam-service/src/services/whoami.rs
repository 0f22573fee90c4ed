use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use metrics::counter;
use tracing::instrument;
use uuid::Uuid;

use super::error::ServiceError;
use super::rbac_client::RoleDirectory;
use super::session::SessionStore;
use crate::models::Identity;

/// Resolves a session id into the caller's full identity.
///
/// Session failures are fatal. Role lookup failures are not: the identity is
/// returned with no roles and the failure is logged.
#[derive(Clone)]
pub struct IdentityResolver {
    sessions: SessionStore,
    roles: Arc<dyn RoleDirectory>,
    role_timeout: Duration,
}

impl IdentityResolver {
    pub fn new(sessions: SessionStore, roles: Arc<dyn RoleDirectory>, role_timeout: Duration) -> Self {
        Self {
            sessions,
            roles,
            role_timeout,
        }
    }

    #[instrument(skip(self))]
    pub async fn resolve(&self, session_id: Uuid) -> Result<Identity, ServiceError> {
        let (session, user) = self.sessions.get(session_id).await?;

        if session.is_expired_at(Utc::now()) {
            tracing::info!(user_id = %user.id, expires_at = %session.expires_at, "Session expired");
            return Err(ServiceError::SessionExpired);
        }

        let roles_with_permissions =
            match tokio::time::timeout(self.role_timeout, self.roles.get_user_roles(user.id)).await
            {
                Ok(Ok(roles)) => roles,
                Ok(Err(e)) => {
                    tracing::warn!(user_id = %user.id, error = %e, "Role lookup failed, continuing without roles");
                    counter!("whoami_role_lookup_failures_total", "reason" => "error").increment(1);
                    Vec::new()
                }
                Err(_) => {
                    tracing::warn!(
                        user_id = %user.id,
                        timeout_ms = self.role_timeout.as_millis() as u64,
                        "Role lookup timed out, continuing without roles"
                    );
                    counter!("whoami_role_lookup_failures_total", "reason" => "timeout").increment(1);
                    Vec::new()
                }
            };

        Ok(Identity {
            session,
            user,
            roles_with_permissions,
        })
    }
}
