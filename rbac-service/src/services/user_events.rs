//! Reaction to user-created events: every new user gets a starting role.

use tracing::instrument;

use super::error::ServiceError;
use super::user_role::UserRoleService;
use crate::models::UserCreated;

#[derive(Clone)]
pub struct UserEventHandler {
    user_roles: UserRoleService,
    default_role: Option<String>,
}

impl UserEventHandler {
    pub fn new(user_roles: UserRoleService, default_role: Option<String>) -> Self {
        Self {
            user_roles,
            default_role,
        }
    }

    /// Decode a raw `UserCreated` payload and handle it.
    pub async fn handle_payload(&self, payload: &[u8]) -> Result<(), ServiceError> {
        let event: UserCreated = serde_json::from_slice(payload).map_err(|e| {
            tracing::error!(error = %e, "Undecodable UserCreated payload");
            ServiceError::InvalidInput(format!("Invalid UserCreated payload: {}", e))
        })?;
        self.handle(event).await
    }

    #[instrument(skip(self, event), fields(event_id = %event.event_id, user_id = %event.user_id))]
    pub async fn handle(&self, event: UserCreated) -> Result<(), ServiceError> {
        let role = event
            .requested_role()
            .or(self.default_role.as_deref())
            .ok_or_else(|| {
                ServiceError::InvalidInput("Event names no role and no default is set".to_string())
            })?;

        tracing::info!(login = %event.login, role = %role, "Assigning initial role");
        self.user_roles.assign(event.user_id, role, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateRole;
    use crate::repository::{MemoryPermissionGraph, PermissionGraph};
    use crate::services::EnrichedRoleCache;
    use service_core::cache::InMemoryCache;
    use std::sync::Arc;
    use std::time::Duration;
    use uuid::Uuid;

    async fn handler(default_role: Option<&str>) -> (UserEventHandler, UserRoleService) {
        let graph = Arc::new(MemoryPermissionGraph::new());
        for name in ["user", "auditor"] {
            graph
                .create_role(&CreateRole {
                    name: name.to_string(),
                    description: String::new(),
                })
                .await
                .unwrap();
        }
        let enriched = EnrichedRoleCache::new(
            Arc::new(InMemoryCache::new()),
            graph.clone(),
            Duration::from_secs(60),
        );
        let user_roles = UserRoleService::new(graph, enriched);
        (
            UserEventHandler::new(user_roles.clone(), default_role.map(str::to_string)),
            user_roles,
        )
    }

    fn payload(user_id: Uuid, role_id: Option<&str>) -> Vec<u8> {
        serde_json::json!({
            "event_id": Uuid::new_v4(),
            "user_id": user_id,
            "login": "alice",
            "email": "alice@example.com",
            "role_id": role_id,
            "created_at": "2024-01-01T00:00:00Z",
        })
        .to_string()
        .into_bytes()
    }

    async fn role_names(user_roles: &UserRoleService, user: Uuid) -> Vec<String> {
        user_roles
            .get_user_roles(user)
            .await
            .unwrap()
            .into_iter()
            .map(|r| r.role.name)
            .collect()
    }

    #[tokio::test]
    async fn test_requested_role_is_assigned() {
        let (handler, user_roles) = handler(Some("user")).await;
        let user = Uuid::new_v4();

        handler.handle_payload(&payload(user, Some("auditor"))).await.unwrap();
        assert_eq!(role_names(&user_roles, user).await, vec!["auditor"]);
    }

    #[tokio::test]
    async fn test_default_role_when_none_requested() {
        let (handler, user_roles) = handler(Some("user")).await;
        let user = Uuid::new_v4();

        handler.handle_payload(&payload(user, Some(" "))).await.unwrap();
        assert_eq!(role_names(&user_roles, user).await, vec!["user"]);
    }

    #[tokio::test]
    async fn test_rejects_bad_payload_and_missing_role() {
        let (handler, _) = handler(None).await;
        assert!(matches!(
            handler.handle_payload(b"{not json").await,
            Err(ServiceError::InvalidInput(_))
        ));
        assert!(matches!(
            handler.handle_payload(&payload(Uuid::new_v4(), None)).await,
            Err(ServiceError::InvalidInput(_))
        ));
    }
}
