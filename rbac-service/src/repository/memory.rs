use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use service_core::authz::{Permission, Role};
use uuid::Uuid;

use super::PermissionGraph;
use crate::models::{
    CreateRole, PageRequest, PermissionFilter, PermissionRef, RoleFilter, RoleRef, RoleUsersPage,
    UpdateRole,
};
use crate::services::ServiceError;

#[derive(Default)]
struct GraphState {
    roles: BTreeMap<Uuid, Role>,
    permissions: BTreeMap<Uuid, Permission>,
    role_permissions: BTreeSet<(Uuid, Uuid)>,
    /// (user, role) -> assigned by
    user_roles: BTreeMap<(Uuid, Uuid), Option<Uuid>>,
}

impl GraphState {
    fn live_role(&self, id: Uuid) -> Option<&Role> {
        self.roles.get(&id).filter(|r| r.deleted_at.is_none())
    }

    fn name_taken(&self, name: &str, except: Option<Uuid>) -> bool {
        self.roles
            .values()
            .any(|r| r.deleted_at.is_none() && r.name == name && Some(r.id) != except)
    }
}

/// Process-local graph with the same semantics as the Postgres one.
///
/// Counts role and permission reads so tests can observe cache behaviour.
#[derive(Default)]
pub struct MemoryPermissionGraph {
    state: Mutex<GraphState>,
    role_reads: AtomicUsize,
    permission_reads: AtomicUsize,
}

impl MemoryPermissionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> Result<MutexGuard<'_, GraphState>, ServiceError> {
        self.state
            .lock()
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!("Graph mutex poisoned: {}", e)))
    }

    /// Number of `find_role` calls served so far.
    pub fn role_reads(&self) -> usize {
        self.role_reads.load(Ordering::SeqCst)
    }

    /// Number of `role_permissions` calls served so far.
    pub fn permission_reads(&self) -> usize {
        self.permission_reads.load(Ordering::SeqCst)
    }

    /// Register a permission, returning the existing one for a known pair.
    pub fn add_permission(&self, resource: &str, action: &str) -> Result<Permission, ServiceError> {
        let mut state = self.state()?;
        if let Some(existing) = state
            .permissions
            .values()
            .find(|p| p.resource == resource && p.action == action)
        {
            return Ok(existing.clone());
        }

        let permission = Permission {
            id: Uuid::new_v4(),
            resource: resource.to_string(),
            action: action.to_string(),
        };
        state.permissions.insert(permission.id, permission.clone());
        Ok(permission)
    }

    /// Who assigned the named live role to `user_id`; `None` when not assigned.
    pub fn assigned_by(&self, user_id: Uuid, role_name: &str) -> Option<Option<Uuid>> {
        let state = self.state().ok()?;
        let role = state
            .roles
            .values()
            .find(|r| r.deleted_at.is_none() && r.name == role_name)?;
        state.user_roles.get(&(user_id, role.id)).copied()
    }
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(needle)
}

#[async_trait]
impl PermissionGraph for MemoryPermissionGraph {
    async fn find_role(&self, role: &RoleRef) -> Result<Option<Role>, ServiceError> {
        self.role_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state()?;
        Ok(match role {
            RoleRef::Id(id) => state.live_role(*id).cloned(),
            RoleRef::Name(name) => state
                .roles
                .values()
                .find(|r| r.deleted_at.is_none() && &r.name == name)
                .cloned(),
        })
    }

    async fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, ServiceError> {
        let pattern = filter.name_pattern();
        let state = self.state()?;
        let mut roles: Vec<Role> = state
            .roles
            .values()
            .filter(|r| r.deleted_at.is_none())
            .filter(|r| pattern.as_deref().map_or(true, |p| contains_ci(&r.name, p)))
            .cloned()
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles)
    }

    async fn create_role(&self, input: &CreateRole) -> Result<Role, ServiceError> {
        let mut state = self.state()?;
        if state.name_taken(&input.name, None) {
            return Err(ServiceError::RoleAlreadyExists);
        }

        let role = Role {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            description: input.description.clone(),
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        };
        state.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn update_role(&self, input: &UpdateRole) -> Result<Role, ServiceError> {
        let mut state = self.state()?;
        if state.live_role(input.id).is_none() {
            return Err(ServiceError::RoleNotFound);
        }
        if let Some(name) = &input.name {
            if state.name_taken(name, Some(input.id)) {
                return Err(ServiceError::RoleAlreadyExists);
            }
        }

        let role = state
            .roles
            .get_mut(&input.id)
            .ok_or(ServiceError::RoleNotFound)?;
        if let Some(name) = &input.name {
            role.name = name.clone();
        }
        if let Some(description) = &input.description {
            role.description = description.clone();
        }
        role.updated_at = Some(Utc::now());
        Ok(role.clone())
    }

    async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        let role = state
            .roles
            .get_mut(&id)
            .filter(|r| r.deleted_at.is_none())
            .ok_or(ServiceError::RoleNotFound)?;
        let now = Utc::now();
        role.deleted_at = Some(now);
        role.updated_at = Some(now);
        Ok(())
    }

    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
        self.permission_reads.fetch_add(1, Ordering::SeqCst);
        let state = self.state()?;
        let mut permissions: Vec<Permission> = state
            .role_permissions
            .iter()
            .filter(|(role, _)| *role == role_id)
            .filter_map(|(_, permission)| state.permissions.get(permission).cloned())
            .collect();
        permissions.sort_by(|a, b| (&a.resource, &a.action).cmp(&(&b.resource, &b.action)));
        Ok(permissions)
    }

    async fn find_permission(
        &self,
        permission: &PermissionRef,
    ) -> Result<Option<Permission>, ServiceError> {
        let state = self.state()?;
        Ok(match permission {
            PermissionRef::Id(id) => state.permissions.get(id).cloned(),
            PermissionRef::Key { resource, action } => state
                .permissions
                .values()
                .find(|p| &p.resource == resource && &p.action == action)
                .cloned(),
        })
    }

    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> Result<Vec<Permission>, ServiceError> {
        let resource = filter.resource_pattern();
        let action = filter.action_pattern();
        let state = self.state()?;

        let mut permissions: Vec<Permission> = state
            .permissions
            .values()
            .filter(|p| {
                filter
                    .role_id
                    .map_or(true, |role| state.role_permissions.contains(&(role, p.id)))
            })
            .filter(|p| resource.as_deref().map_or(true, |r| contains_ci(&p.resource, r)))
            .filter(|p| action.as_deref().map_or(true, |a| contains_ci(&p.action, a)))
            .cloned()
            .collect();
        permissions.sort_by(|a, b| (&a.resource, &a.action).cmp(&(&b.resource, &b.action)));
        Ok(permissions)
    }

    async fn assign_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        if !state.roles.contains_key(&role_id) {
            return Err(ServiceError::RoleNotFound);
        }
        if !state.permissions.contains_key(&permission_id) {
            return Err(ServiceError::PermissionNotFound);
        }
        if !state.role_permissions.insert((role_id, permission_id)) {
            return Err(ServiceError::PermissionAlreadyAssigned);
        }
        Ok(())
    }

    async fn revoke_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        if !state.role_permissions.remove(&(role_id, permission_id)) {
            return Err(ServiceError::PermissionNotAssigned);
        }
        Ok(())
    }

    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let state = self.state()?;
        let mut roles: Vec<&Role> = state
            .user_roles
            .keys()
            .filter(|(user, _)| *user == user_id)
            .filter_map(|(_, role)| state.live_role(*role))
            .collect();
        roles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(roles.into_iter().map(|r| r.id).collect())
    }

    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        if !state.roles.contains_key(&role_id) {
            return Err(ServiceError::RoleNotFound);
        }
        if state.user_roles.contains_key(&(user_id, role_id)) {
            return Err(ServiceError::RoleAlreadyAssigned);
        }
        state.user_roles.insert((user_id, role_id), assigned_by);
        Ok(())
    }

    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError> {
        let mut state = self.state()?;
        if state.user_roles.remove(&(user_id, role_id)).is_none() {
            return Err(ServiceError::RoleNotAssigned);
        }
        Ok(())
    }

    async fn role_users(
        &self,
        role_id: Uuid,
        page: PageRequest,
    ) -> Result<RoleUsersPage, ServiceError> {
        let state = self.state()?;
        let mut members: Vec<Uuid> = state
            .user_roles
            .keys()
            .filter(|(_, role)| *role == role_id)
            .map(|(user, _)| *user)
            .collect();
        members.sort();

        let total_count = members.len() as i64;
        let probe: Vec<Uuid> = members
            .into_iter()
            .filter(|user| page.cursor.map_or(true, |cursor| *user > cursor))
            .take(page.limit as usize + 1)
            .collect();

        Ok(RoleUsersPage::from_probe(probe, page.limit, total_count))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        Ok(())
    }
}
