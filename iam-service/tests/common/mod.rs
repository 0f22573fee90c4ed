#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, Response},
    Router,
};
use chrono::{Duration, Utc};
use http_body_util::BodyExt;
use iam_service::{
    build_router,
    config::{
        DatabaseConfig, IamConfig, RateLimitConfig, RbacConfig, RedisConfig, SessionConfig,
    },
    models::{NotificationMethod, UserProfile},
    services::{MockEventPublisher, MockRoleDirectory, MockUserRepository, SessionStore},
    AppState,
};
use service_core::authz::{Permission, Role, RoleWithPermissions};
use service_core::cache::InMemoryCache;
use service_core::config::{Config, Environment};
use uuid::Uuid;

pub const PASSWORD: &str = "correct-horse";

pub fn test_config() -> IamConfig {
    IamConfig {
        common: Config { port: 8080 },
        environment: Environment::Dev,
        service_name: "iam-service".to_string(),
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
        session: SessionConfig {
            ttl_seconds: 3600,
            secure_cookie: false,
        },
        rbac: RbacConfig {
            url: "http://unused".to_string(),
            timeout_ms: 500,
        },
        rate_limit: RateLimitConfig {
            login_attempts: 100,
            login_window_seconds: 60,
        },
        allowed_origins: vec!["http://localhost:3000".to_string()],
    }
}

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub cache: Arc<InMemoryCache>,
    pub users: Arc<MockUserRepository>,
    pub roles: Arc<MockRoleDirectory>,
    pub events: Arc<MockEventPublisher>,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: IamConfig) -> Self {
        let cache = Arc::new(InMemoryCache::new());
        let users = Arc::new(MockUserRepository::new());
        let roles = Arc::new(MockRoleDirectory::new());
        let events = Arc::new(MockEventPublisher::new());
        let state = AppState::new(
            config,
            cache.clone(),
            users.clone(),
            roles.clone(),
            events.clone(),
        );

        Self {
            router: build_router(state.clone()),
            state,
            cache,
            users,
            roles,
            events,
        }
    }

    pub fn sessions(&self) -> SessionStore {
        SessionStore::new(self.cache.clone())
    }
}

pub fn profile(login: &str) -> UserProfile {
    UserProfile {
        id: Uuid::new_v4(),
        login: login.to_string(),
        email: format!("{}@example.com", login),
        notification_methods: vec![NotificationMethod {
            provider_name: "email".to_string(),
            target: format!("{}@example.com", login),
        }],
        created_at: Utc::now() - Duration::days(30),
        updated_at: None,
    }
}

pub fn role(name: &str, permissions: &[(&str, &str)]) -> RoleWithPermissions {
    RoleWithPermissions {
        role: Role {
            id: Uuid::new_v4(),
            name: name.to_string(),
            description: String::new(),
            created_at: Utc::now(),
            updated_at: None,
            deleted_at: None,
        },
        permissions: permissions
            .iter()
            .map(|(resource, action)| Permission {
                id: Uuid::new_v4(),
                resource: resource.to_string(),
                action: action.to_string(),
            })
            .collect(),
    }
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn header<'a>(response: &'a Response<Body>, name: &str) -> Option<&'a str> {
    response.headers().get(name).and_then(|v| v.to_str().ok())
}
