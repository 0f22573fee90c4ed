use std::sync::Arc;

use service_core::authz::Role;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::enriched_role::EnrichedRoleCache;
use super::error::ServiceError;
use crate::models::{CreateRole, EnrichedRole, RoleFilter, RoleRef, UpdateRole};
use crate::repository::PermissionGraph;

/// Parse a caller-supplied role reference, rejecting blanks.
pub(crate) fn role_ref(value: &str) -> Result<RoleRef, ServiceError> {
    RoleRef::parse(value)
        .ok_or_else(|| ServiceError::InvalidInput("Role id or name is required".to_string()))
}

#[derive(Clone)]
pub struct RoleService {
    graph: Arc<dyn PermissionGraph>,
    enriched: EnrichedRoleCache,
}

impl RoleService {
    pub fn new(graph: Arc<dyn PermissionGraph>, enriched: EnrichedRoleCache) -> Self {
        Self { graph, enriched }
    }

    /// `value` is a role id or a role name.
    #[instrument(skip(self))]
    pub async fn get(&self, value: &str) -> Result<EnrichedRole, ServiceError> {
        self.enriched.get(&role_ref(value)?).await
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: RoleFilter) -> Result<Vec<Role>, ServiceError> {
        self.graph.list_roles(&filter).await
    }

    #[instrument(skip(self))]
    pub async fn create(&self, input: CreateRole) -> Result<Role, ServiceError> {
        input.validate()?;
        let role = self.graph.create_role(&input).await?;
        tracing::info!(role_id = %role.id, name = %role.name, "Role created");
        Ok(role)
    }

    #[instrument(skip(self))]
    pub async fn update(&self, input: UpdateRole) -> Result<Role, ServiceError> {
        if input.is_empty() {
            return Err(ServiceError::InvalidInput("Nothing to update".to_string()));
        }
        input.validate()?;
        let role = self.graph.update_role(&input).await?;
        tracing::info!(role_id = %role.id, "Role updated");
        Ok(role)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> Result<(), ServiceError> {
        self.graph.delete_role(id).await?;
        tracing::info!(role_id = %id, "Role deleted");
        Ok(())
    }
}
