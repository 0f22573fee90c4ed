use std::sync::Arc;

use service_core::authz::Permission;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use super::enriched_role::EnrichedRoleCache;
use super::error::ServiceError;
use super::role::role_ref;
use crate::models::{PermissionFilter, PermissionRef};
use crate::repository::PermissionGraph;

#[derive(Clone)]
pub struct PermissionService {
    graph: Arc<dyn PermissionGraph>,
    enriched: EnrichedRoleCache,
}

impl PermissionService {
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

    /// Look a permission up by id or by `resource:action`.
    #[instrument(skip(self))]
    pub async fn get(&self, value: &str) -> Result<Permission, ServiceError> {
        let permission = PermissionRef::parse(value).ok_or_else(|| {
            ServiceError::InvalidInput(
                "Permission must be an id or a resource:action key".to_string(),
            )
        })?;
        self.graph
            .find_permission(&permission)
            .await?
            .ok_or(ServiceError::PermissionNotFound)
    }

    #[instrument(skip(self))]
    pub async fn list(&self, filter: PermissionFilter) -> Result<Vec<Permission>, ServiceError> {
        filter.validate()?;
        self.graph.list_permissions(&filter).await
    }

    #[instrument(skip(self))]
    pub async fn list_by_role(&self, role: &str) -> Result<Vec<Permission>, ServiceError> {
        let role_id = self.resolve_role(role).await?;
        self.graph.role_permissions(role_id).await
    }

    #[instrument(skip(self))]
    pub async fn assign_to_role(&self, role: &str, permission_id: Uuid) -> Result<(), ServiceError> {
        let role_id = self.resolve_role(role).await?;
        self.graph.assign_permission(role_id, permission_id).await?;
        tracing::info!(%role_id, %permission_id, "Permission assigned to role");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn revoke_from_role(
        &self,
        role: &str,
        permission_id: Uuid,
    ) -> Result<(), ServiceError> {
        let role_id = self.resolve_role(role).await?;
        self.graph.revoke_permission(role_id, permission_id).await?;
        tracing::info!(%role_id, %permission_id, "Permission revoked from role");
        Ok(())
    }

    /// Succeeds when any of the user's roles grants `resource:action`.
    #[instrument(skip(self))]
    pub async fn check(&self, user_id: Uuid, resource: &str, action: &str) -> Result<(), ServiceError> {
        if resource.trim().is_empty() || action.trim().is_empty() {
            return Err(ServiceError::InvalidInput(
                "Resource and action are required".to_string(),
            ));
        }

        let role_ids = self.graph.user_role_ids(user_id).await?;
        let roles = self.enriched.get_many(role_ids).await?;

        if roles.iter().any(|r| r.grants(resource, action)) {
            Ok(())
        } else {
            Err(ServiceError::PermissionDenied)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CreateRole;
    use crate::repository::MemoryPermissionGraph;
    use service_core::cache::InMemoryCache;
    use std::time::Duration;

    struct Fixture {
        graph: Arc<MemoryPermissionGraph>,
        permissions: PermissionService,
        role_id: Uuid,
        read: Permission,
    }

    async fn fixture() -> Fixture {
        let graph = Arc::new(MemoryPermissionGraph::new());
        let enriched = EnrichedRoleCache::new(
            Arc::new(InMemoryCache::new()),
            graph.clone(),
            Duration::from_secs(60),
        );
        let role = graph
            .create_role(&CreateRole {
                name: "viewer".to_string(),
                description: String::new(),
            })
            .await
            .unwrap();
        let read = graph.add_permission("roles", "read").unwrap();

        Fixture {
            permissions: PermissionService::new(graph.clone(), enriched),
            graph,
            role_id: role.id,
            read,
        }
    }

    #[tokio::test]
    async fn test_assign_and_revoke_by_name() {
        let f = fixture().await;

        f.permissions.assign_to_role("viewer", f.read.id).await.unwrap();
        assert!(matches!(
            f.permissions.assign_to_role("viewer", f.read.id).await,
            Err(ServiceError::PermissionAlreadyAssigned)
        ));
        assert_eq!(
            f.permissions.list_by_role(&f.role_id.to_string()).await.unwrap(),
            vec![f.read.clone()]
        );

        f.permissions.revoke_from_role("viewer", f.read.id).await.unwrap();
        assert!(matches!(
            f.permissions.revoke_from_role("viewer", f.read.id).await,
            Err(ServiceError::PermissionNotAssigned)
        ));
    }

    #[tokio::test]
    async fn test_get_by_id_or_key() {
        let f = fixture().await;

        assert_eq!(f.permissions.get(&f.read.id.to_string()).await.unwrap(), f.read);
        assert_eq!(f.permissions.get(" roles:read ").await.unwrap(), f.read);
        assert!(matches!(
            f.permissions.get("roles:purge").await,
            Err(ServiceError::PermissionNotFound)
        ));
        assert!(matches!(
            f.permissions.get(&Uuid::new_v4().to_string()).await,
            Err(ServiceError::PermissionNotFound)
        ));
        assert!(matches!(
            f.permissions.get("roles").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_assign_unknown_targets() {
        let f = fixture().await;
        assert!(matches!(
            f.permissions.assign_to_role("ghost", f.read.id).await,
            Err(ServiceError::RoleNotFound)
        ));
        assert!(matches!(
            f.permissions.assign_to_role("viewer", Uuid::new_v4()).await,
            Err(ServiceError::PermissionNotFound)
        ));
    }

    #[tokio::test]
    async fn test_check_walks_user_roles() {
        let f = fixture().await;
        let user = Uuid::new_v4();
        f.graph.assign_permission(f.role_id, f.read.id).await.unwrap();

        assert!(matches!(
            f.permissions.check(user, "roles", "read").await,
            Err(ServiceError::PermissionDenied)
        ));

        f.graph.assign_role(user, f.role_id, None).await.unwrap();
        f.permissions.check(user, "roles", "read").await.unwrap();
        assert!(matches!(
            f.permissions.check(user, "roles", "delete").await,
            Err(ServiceError::PermissionDenied)
        ));
        assert!(matches!(
            f.permissions.check(user, "", "read").await,
            Err(ServiceError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn test_list_rejects_oversized_filter() {
        let f = fixture().await;
        let filter = PermissionFilter {
            action: Some("a".repeat(51)),
            ..Default::default()
        };
        assert!(matches!(
            f.permissions.list(filter).await,
            Err(ServiceError::Validation(_))
        ));
    }
}
