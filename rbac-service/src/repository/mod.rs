//! Storage of roles, permissions and the assignments between them and users.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use service_core::authz::{Permission, Role};
use uuid::Uuid;

use crate::models::{
    CreateRole, PageRequest, PermissionFilter, PermissionRef, RoleFilter, RoleRef, RoleUsersPage,
    UpdateRole,
};
use crate::services::ServiceError;

pub use memory::MemoryPermissionGraph;
pub use postgres::PgPermissionGraph;

/// Deleted roles are invisible to every operation.
#[async_trait]
pub trait PermissionGraph: Send + Sync {
    async fn find_role(&self, role: &RoleRef) -> Result<Option<Role>, ServiceError>;

    /// Ordered by name.
    async fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, ServiceError>;

    async fn create_role(&self, input: &CreateRole) -> Result<Role, ServiceError>;

    async fn update_role(&self, input: &UpdateRole) -> Result<Role, ServiceError>;

    async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError>;

    /// Ordered by resource, then action.
    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, ServiceError>;

    async fn find_permission(
        &self,
        permission: &PermissionRef,
    ) -> Result<Option<Permission>, ServiceError>;

    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> Result<Vec<Permission>, ServiceError>;

    async fn assign_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<(), ServiceError>;

    async fn revoke_permission(&self, role_id: Uuid, permission_id: Uuid)
        -> Result<(), ServiceError>;

    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError>;

    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), ServiceError>;

    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError>;

    async fn role_users(
        &self,
        role_id: Uuid,
        page: PageRequest,
    ) -> Result<RoleUsersPage, ServiceError>;

    async fn health_check(&self) -> Result<(), ServiceError>;
}
