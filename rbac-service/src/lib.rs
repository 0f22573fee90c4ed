pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod rpc;
pub mod services;

use std::sync::Arc;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
    Router,
};
use service_core::cache::CacheClient;
use service_core::grpc::PermissionPolicy;
use service_core::middleware::{
    identity::trusted_identity_middleware, metrics::metrics_middleware,
    permission::permission_middleware, security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::observability::extract_request_id;
use service_core::middleware::recovery::panic_response;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::RbacConfig;
use crate::repository::PermissionGraph;
use crate::services::{
    EnrichedRoleCache, PermissionService, RoleService, UserEventHandler, UserRoleService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RbacConfig>,
    pub cache: Arc<dyn CacheClient>,
    pub graph: Arc<dyn PermissionGraph>,
    pub roles: RoleService,
    pub permissions: PermissionService,
    pub user_roles: UserRoleService,
    pub user_events: UserEventHandler,
    pub policy: Arc<PermissionPolicy>,
}

impl AppState {
    pub fn new(
        config: RbacConfig,
        cache: Arc<dyn CacheClient>,
        graph: Arc<dyn PermissionGraph>,
    ) -> Self {
        let enriched =
            EnrichedRoleCache::new(cache.clone(), graph.clone(), config.enriched_role_ttl());
        let user_roles = UserRoleService::new(graph.clone(), enriched.clone());

        Self {
            roles: RoleService::new(graph.clone(), enriched.clone()),
            permissions: PermissionService::new(graph.clone(), enriched),
            user_events: UserEventHandler::new(user_roles.clone(), config.default_role.clone()),
            user_roles,
            policy: Arc::new(PermissionPolicy::from_rules(rpc::METHODS)),
            config: Arc::new(config),
            cache,
            graph,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let rpc_routes = Router::new()
        .route(rpc::GET_ROLE, post(handlers::role::get_role))
        .route(rpc::LIST_ROLES, post(handlers::role::list_roles))
        .route(rpc::CREATE_ROLE, post(handlers::role::create_role))
        .route(rpc::UPDATE_ROLE, post(handlers::role::update_role))
        .route(rpc::DELETE_ROLE, post(handlers::role::delete_role))
        .route(rpc::GET_PERMISSION, post(handlers::permission::get_permission))
        .route(
            rpc::LIST_PERMISSIONS,
            post(handlers::permission::list_permissions),
        )
        .route(
            rpc::LIST_PERMISSIONS_BY_ROLE,
            post(handlers::permission::list_permissions_by_role),
        )
        .route(
            rpc::ASSIGN_PERMISSION,
            post(handlers::permission::assign_permission),
        )
        .route(
            rpc::REVOKE_PERMISSION,
            post(handlers::permission::revoke_permission),
        )
        .route(
            rpc::CHECK_PERMISSION,
            post(handlers::permission::check_permission),
        )
        .route(rpc::GET_USER_ROLES, post(handlers::user_role::get_user_roles))
        .route(rpc::ASSIGN_ROLE, post(handlers::user_role::assign_role))
        .route(rpc::REVOKE_ROLE, post(handlers::user_role::revoke_role))
        .route(rpc::GET_ROLE_USERS, post(handlers::user_role::get_role_users))
        .layer(from_fn_with_state(state.policy.clone(), permission_middleware))
        .layer(from_fn(trusted_identity_middleware));

    let origins: Vec<HeaderValue> = state
        .config
        .allowed_origins
        .iter()
        .filter_map(|o| match o.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::error!("Invalid CORS origin '{}': {}. Skipping.", o, e);
                None
            }
        })
        .collect();

    let request_timeout = state.config.request_timeout();

    Router::new()
        .route("/health", get(handlers::health::health_check))
        .route("/metrics", get(handlers::health::metrics))
        .merge(rpc_routes)
        .with_state(state)
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(request_timeout))
        .layer(from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http().make_span_with(
            |request: &service_core::axum::http::Request<_>| {
                let request_id =
                    extract_request_id(request.headers()).unwrap_or_else(|| "-".to_string());

                tracing::info_span!(
                    "http_request",
                    request_id = %request_id,
                    method = %request.method(),
                    uri = %request.uri(),
                    version = ?request.version(),
                )
            },
        ))
        .layer(from_fn(request_id_middleware))
        .layer(from_fn(security_headers_middleware))
        .layer(
            CorsLayer::new()
                .allow_origin(origins)
                .allow_methods([Method::POST, Method::GET, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        )
}
