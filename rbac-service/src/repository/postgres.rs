use async_trait::async_trait;
use chrono::{DateTime, Utc};
use service_core::authz::{Permission, Role};
use sqlx::postgres::PgPool;
use sqlx::{FromRow, Postgres, QueryBuilder};
use tracing::instrument;
use uuid::Uuid;

use super::PermissionGraph;
use crate::models::{
    CreateRole, PageRequest, PermissionFilter, PermissionRef, RoleFilter, RoleRef, RoleUsersPage,
    UpdateRole,
};
use crate::services::error::{sqlstate, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION};
use crate::services::ServiceError;

const ROLE_COLUMNS: &str = "id, name, description, created_at, updated_at, deleted_at";

/// `ILIKE` operand matching `needle` as a literal substring. Pair with `ESCAPE '\'`.
fn contains_pattern(needle: &str) -> String {
    let mut escaped = String::with_capacity(needle.len() + 2);
    escaped.push('%');
    for c in needle.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

#[derive(FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: Option<DateTime<Utc>>,
    deleted_at: Option<DateTime<Utc>>,
}

impl From<RoleRow> for Role {
    fn from(row: RoleRow) -> Self {
        Role {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
            deleted_at: row.deleted_at,
        }
    }
}

#[derive(FromRow)]
struct PermissionRow {
    id: Uuid,
    resource: String,
    action: String,
}

impl From<PermissionRow> for Permission {
    fn from(row: PermissionRow) -> Self {
        Permission {
            id: row.id,
            resource: row.resource,
            action: row.action,
        }
    }
}

fn is_violation(err: &sqlx::Error, code: &str) -> bool {
    sqlstate(err).as_deref() == Some(code)
}

#[derive(Clone)]
pub struct PgPermissionGraph {
    pool: PgPool,
}

impl PgPermissionGraph {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PermissionGraph for PgPermissionGraph {
    #[instrument(skip(self))]
    async fn find_role(&self, role: &RoleRef) -> Result<Option<Role>, ServiceError> {
        let query = format!(
            "SELECT {} FROM roles WHERE deleted_at IS NULL AND {}",
            ROLE_COLUMNS,
            match role {
                RoleRef::Id(_) => "id = $1",
                RoleRef::Name(_) => "name = $1",
            }
        );

        let row = match role {
            RoleRef::Id(id) => {
                sqlx::query_as::<_, RoleRow>(&query)
                    .bind(id)
                    .fetch_optional(&self.pool)
                    .await?
            }
            RoleRef::Name(name) => {
                sqlx::query_as::<_, RoleRow>(&query)
                    .bind(name)
                    .fetch_optional(&self.pool)
                    .await?
            }
        };

        Ok(row.map(Role::from))
    }

    #[instrument(skip(self))]
    async fn list_roles(&self, filter: &RoleFilter) -> Result<Vec<Role>, ServiceError> {
        let mut query: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {} FROM roles WHERE deleted_at IS NULL",
            ROLE_COLUMNS
        ));
        if let Some(pattern) = filter.name_pattern() {
            query
                .push(" AND name ILIKE ")
                .push_bind(contains_pattern(&pattern))
                .push(" ESCAPE '\\'");
        }
        query.push(" ORDER BY name ASC");

        let rows = query
            .build_query_as::<RoleRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Role::from).collect())
    }

    #[instrument(skip(self))]
    async fn create_role(&self, input: &CreateRole) -> Result<Role, ServiceError> {
        let query = format!(
            "INSERT INTO roles (id, name, description) VALUES ($1, $2, $3) RETURNING {}",
            ROLE_COLUMNS
        );

        sqlx::query_as::<_, RoleRow>(&query)
            .bind(Uuid::new_v4())
            .bind(&input.name)
            .bind(&input.description)
            .fetch_one(&self.pool)
            .await
            .map(Role::from)
            .map_err(|e| {
                if is_violation(&e, UNIQUE_VIOLATION) {
                    ServiceError::RoleAlreadyExists
                } else {
                    ServiceError::Database(e)
                }
            })
    }

    #[instrument(skip(self))]
    async fn update_role(&self, input: &UpdateRole) -> Result<Role, ServiceError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("UPDATE roles SET updated_at = NOW()");
        if let Some(name) = &input.name {
            query.push(", name = ").push_bind(name);
        }
        if let Some(description) = &input.description {
            query.push(", description = ").push_bind(description);
        }
        query
            .push(" WHERE deleted_at IS NULL AND id = ")
            .push_bind(input.id)
            .push(format!(" RETURNING {}", ROLE_COLUMNS));

        let row = query
            .build_query_as::<RoleRow>()
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_violation(&e, UNIQUE_VIOLATION) {
                    ServiceError::RoleAlreadyExists
                } else {
                    ServiceError::Database(e)
                }
            })?;

        row.map(Role::from).ok_or(ServiceError::RoleNotFound)
    }

    #[instrument(skip(self))]
    async fn delete_role(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query(
            "UPDATE roles SET deleted_at = NOW(), updated_at = NOW() WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::RoleNotFound);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn role_permissions(&self, role_id: Uuid) -> Result<Vec<Permission>, ServiceError> {
        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT p.id, p.resource, p.action
            FROM permissions p
            JOIN role_permissions rp ON p.id = rp.permission_id
            WHERE rp.role_id = $1
            ORDER BY p.resource, p.action
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    #[instrument(skip(self))]
    async fn find_permission(
        &self,
        permission: &PermissionRef,
    ) -> Result<Option<Permission>, ServiceError> {
        let row = match permission {
            PermissionRef::Id(id) => {
                sqlx::query_as::<_, PermissionRow>(
                    "SELECT id, resource, action FROM permissions WHERE id = $1",
                )
                .bind(id)
                .fetch_optional(&self.pool)
                .await?
            }
            PermissionRef::Key { resource, action } => {
                sqlx::query_as::<_, PermissionRow>(
                    "SELECT id, resource, action FROM permissions WHERE resource = $1 AND action = $2",
                )
                .bind(resource)
                .bind(action)
                .fetch_optional(&self.pool)
                .await?
            }
        };

        Ok(row.map(Permission::from))
    }

    #[instrument(skip(self))]
    async fn list_permissions(
        &self,
        filter: &PermissionFilter,
    ) -> Result<Vec<Permission>, ServiceError> {
        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT DISTINCT p.id, p.resource, p.action FROM permissions p");
        if filter.role_id.is_some() {
            query.push(" JOIN role_permissions rp ON p.id = rp.permission_id");
        }
        query.push(" WHERE TRUE");
        if let Some(role_id) = filter.role_id {
            query.push(" AND rp.role_id = ").push_bind(role_id);
        }
        if let Some(resource) = filter.resource_pattern() {
            query
                .push(" AND p.resource ILIKE ")
                .push_bind(contains_pattern(&resource))
                .push(" ESCAPE '\\'");
        }
        if let Some(action) = filter.action_pattern() {
            query
                .push(" AND p.action ILIKE ")
                .push_bind(contains_pattern(&action))
                .push(" ESCAPE '\\'");
        }
        query.push(" ORDER BY p.resource, p.action");

        let rows = query
            .build_query_as::<PermissionRow>()
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Permission::from).collect())
    }

    #[instrument(skip(self))]
    async fn assign_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO role_permissions (role_id, permission_id) VALUES ($1, $2)")
            .bind(role_id)
            .bind(permission_id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_violation(&e, UNIQUE_VIOLATION) {
                    ServiceError::PermissionAlreadyAssigned
                } else if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                    ServiceError::PermissionNotFound
                } else {
                    ServiceError::Database(e)
                }
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_permission(
        &self,
        role_id: Uuid,
        permission_id: Uuid,
    ) -> Result<(), ServiceError> {
        let result =
            sqlx::query("DELETE FROM role_permissions WHERE role_id = $1 AND permission_id = $2")
                .bind(role_id)
                .bind(permission_id)
                .execute(&self.pool)
                .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::PermissionNotAssigned);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn user_role_ids(&self, user_id: Uuid) -> Result<Vec<Uuid>, ServiceError> {
        let ids = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT r.id
            FROM roles r
            JOIN user_roles ur ON r.id = ur.role_id
            WHERE ur.user_id = $1 AND r.deleted_at IS NULL
            ORDER BY r.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(ids)
    }

    #[instrument(skip(self))]
    async fn assign_role(
        &self,
        user_id: Uuid,
        role_id: Uuid,
        assigned_by: Option<Uuid>,
    ) -> Result<(), ServiceError> {
        sqlx::query("INSERT INTO user_roles (user_id, role_id, assigned_by) VALUES ($1, $2, $3)")
            .bind(user_id)
            .bind(role_id)
            .bind(assigned_by)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_violation(&e, UNIQUE_VIOLATION) {
                    ServiceError::RoleAlreadyAssigned
                } else if is_violation(&e, FOREIGN_KEY_VIOLATION) {
                    ServiceError::RoleNotFound
                } else {
                    ServiceError::Database(e)
                }
            })?;
        Ok(())
    }

    #[instrument(skip(self))]
    async fn revoke_role(&self, user_id: Uuid, role_id: Uuid) -> Result<(), ServiceError> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(ServiceError::RoleNotAssigned);
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn role_users(
        &self,
        role_id: Uuid,
        page: PageRequest,
    ) -> Result<RoleUsersPage, ServiceError> {
        let total_count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM user_roles WHERE role_id = $1")
                .bind(role_id)
                .fetch_one(&self.pool)
                .await?;

        let mut query: QueryBuilder<Postgres> =
            QueryBuilder::new("SELECT user_id FROM user_roles WHERE role_id = ");
        query.push_bind(role_id);
        if let Some(cursor) = page.cursor {
            query.push(" AND user_id > ").push_bind(cursor);
        }
        query
            .push(" ORDER BY user_id LIMIT ")
            .push_bind(i64::from(page.limit) + 1);

        let user_ids = query
            .build_query_scalar::<Uuid>()
            .fetch_all(&self.pool)
            .await?;

        Ok(RoleUsersPage::from_probe(user_ids, page.limit, total_count))
    }

    async fn health_check(&self) -> Result<(), ServiceError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            ServiceError::Database(e)
        })?;
        Ok(())
    }
}
