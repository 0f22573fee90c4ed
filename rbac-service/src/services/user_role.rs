use std::sync::Arc;

use tracing::instrument;
use uuid::Uuid;

use super::enriched_role::EnrichedRoleCache;
use super::error::ServiceError;
use super::role::role_ref;
use crate::models::{EnrichedRole, PageRequest, RoleUsersPage};
use crate::repository::PermissionGraph;

#[derive(Clone)]
pub struct UserRoleService {
    graph: Arc<dyn PermissionGraph>,
    enriched: EnrichedRoleCache,
}

impl UserRoleService {
    pub fn new(graph: Arc<dyn PermissionGraph>, enriched: EnrichedRoleCache) -> Self {
        Self { graph, enriched }
    }

    async fn resolve_role(&self, value: &str) -> Result<Uuid, ServiceError> {
        let role = role_ref(value)?;
        self.graph
            .find_role(&role)
            .await?
            .map(|r| r.id)
            .ok_or(ServiceError::RoleNotFound)
    }

    /// Every role the user holds, each with its permissions.
    #[instrument(skip(self))]
    pub async fn get_user_roles(&self, user_id: Uuid) -> Result<Vec<EnrichedRole>, ServiceError> {
        let role_ids = self.graph.user_role_ids(user_id).await?;
        self.enriched.get_many(role_ids).await.map_err(|e| {
            tracing::error!(%user_id, error = %e, "Failed to enrich user roles");
            e
        })
    }

    #[instrument(skip(self))]
    pub async fn assign(
        &self,
        user_id: Uuid,
        role: &str,
        assigned_by: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let role_id = self.resolve_role(role).await?;
        self.graph.assign_role(user_id, role_id, assigned_by).await?;
        tracing::info!(%user_id, %role_id, "Role assigned to user");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn revoke(&self, user_id: Uuid, role: &str) -> Result<(), ServiceError> {
        let role_id = self.resolve_role(role).await?;
        self.graph.revoke_role(user_id, role_id).await?;
        tracing::info!(%user_id, %role_id, "Role revoked from user");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn role_users(
        &self,
        role: &str,
        page_size: u32,
        cursor: Option<Uuid>,
    ) -> Result<RoleUsersPage, ServiceError> {
        let page = PageRequest::new(page_size, cursor).ok_or_else(|| {
            ServiceError::InvalidInput("Page size must be between 1 and 100".to_string())
        })?;
        let role_id = self.resolve_role(role).await?;
        self.graph.role_users(role_id, page).await
    }
}
