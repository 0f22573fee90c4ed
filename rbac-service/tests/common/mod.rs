#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use http_body_util::BodyExt;
use rbac_service::{
    build_router,
    config::{DatabaseConfig, RbacConfig, RedisConfig},
    repository::MemoryPermissionGraph,
    AppState,
};
use service_core::authz::Permission;
use service_core::cache::InMemoryCache;
use service_core::config::{Config, Environment};
use uuid::Uuid;

/// Every `resource:action` pair the service guards.
pub const MANAGED_PERMISSIONS: &[(&str, &str)] = &[
    ("roles", "read"),
    ("roles", "create"),
    ("roles", "update"),
    ("roles", "delete"),
    ("permissions", "read"),
    ("permissions", "assign"),
    ("permissions", "revoke"),
    ("user_roles", "read"),
    ("user_roles", "assign"),
    ("user_roles", "revoke"),
];

pub fn test_config() -> RbacConfig {
    RbacConfig {
        common: Config { port: 8081 },
        environment: Environment::Dev,
        service_name: "rbac-service".to_string(),
        service_version: "test".to_string(),
        log_level: "debug".to_string(),
        otlp_endpoint: None,
        grpc_health_port: 0,
        request_timeout_ms: 2_000,
        database: DatabaseConfig {
            url: "postgres://unused".to_string(),
            max_connections: 1,
            min_connections: 0,
        },
        redis: RedisConfig {
            url: "redis://unused".to_string(),
        },
        enriched_role_ttl_seconds: 300,
        default_role: Some("user".to_string()),
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub cache: Arc<InMemoryCache>,
    pub graph: Arc<MemoryPermissionGraph>,
    pub permissions: HashMap<String, Permission>,
}

impl TestApp {
    pub fn new() -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let graph = Arc::new(MemoryPermissionGraph::new());
        let permissions = MANAGED_PERMISSIONS
            .iter()
            .map(|(resource, action)| {
                let permission = graph.add_permission(resource, action).unwrap();
                (permission.key(), permission)
            })
            .collect();
        let state = AppState::new(test_config(), cache.clone(), graph.clone());

        Self {
            router: build_router(state.clone()),
            state,
            cache,
            graph,
            permissions,
        }
    }

    pub fn permission(&self, key: &str) -> &Permission {
        &self.permissions[key]
    }
}

/// Identity as the edge would inject it.
pub struct Caller {
    pub user_id: Uuid,
    pub permissions: Vec<String>,
}

impl Caller {
    pub fn with(permissions: &[&str]) -> Self {
        Self {
            user_id: Uuid::new_v4(),
            permissions: permissions.iter().map(|p| p.to_string()).collect(),
        }
    }

    pub fn admin() -> Self {
        let all: Vec<String> = MANAGED_PERMISSIONS
            .iter()
            .map(|(resource, action)| format!("{}:{}", resource, action))
            .collect();
        Self {
            user_id: Uuid::new_v4(),
            permissions: all,
        }
    }
}

pub fn call(method: &str, body: serde_json::Value, caller: Option<&Caller>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(method)
        .header("content-type", "application/json");
    if let Some(caller) = caller {
        builder = builder
            .header("x-user-uuid", caller.user_id.to_string())
            .header("x-user-login", "tester")
            .header("x-user-roles", "tester")
            .header("x-user-permissions", caller.permissions.join(","));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
