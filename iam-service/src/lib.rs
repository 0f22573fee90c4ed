pub mod config;
pub mod db;
pub mod dtos;
pub mod handlers;
pub mod models;
pub mod rpc;
pub mod services;
pub mod utils;

use std::sync::Arc;

use service_core::axum::{
    http::{header, HeaderValue, Method},
    middleware::{from_fn, from_fn_with_state},
    routing::{any, get, post},
    Router,
};
use service_core::cache::CacheClient;
use service_core::grpc::PermissionPolicy;
use service_core::middleware::{
    identity::trusted_identity_middleware,
    metrics::metrics_middleware,
    permission::permission_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware, IpRateLimiter},
    security_headers::security_headers_middleware,
    tracing::request_id_middleware,
};
use service_core::observability::extract_request_id;
use service_core::middleware::recovery::panic_response;
use tower_http::{
    catch_panic::CatchPanicLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};

use crate::config::IamConfig;
use crate::services::{
    AuthService, ExtAuthzService, IdentityResolver, RoleDirectory, SessionStore,
    UserEventPublisher, UserRepository, UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<IamConfig>,
    pub cache: Arc<dyn CacheClient>,
    pub directory: Arc<dyn UserRepository>,
    pub auth: AuthService,
    pub users: UserService,
    pub resolver: IdentityResolver,
    pub ext_authz: ExtAuthzService,
    pub policy: Arc<PermissionPolicy>,
    pub login_rate_limiter: IpRateLimiter,
}

impl AppState {
    pub fn new(
        config: IamConfig,
        cache: Arc<dyn CacheClient>,
        directory: Arc<dyn UserRepository>,
        roles: Arc<dyn RoleDirectory>,
        events: Arc<dyn UserEventPublisher>,
    ) -> Self {
        let sessions = SessionStore::new(cache.clone());
        let resolver = IdentityResolver::new(sessions.clone(), roles, config.rbac.timeout());
        let auth = AuthService::new(directory.clone(), sessions, config.session.ttl());
        let users = UserService::new(directory.clone(), events);
        let login_rate_limiter = create_ip_rate_limiter(
            config.rate_limit.login_attempts,
            config.rate_limit.login_window_seconds,
        );

        Self {
            config: Arc::new(config),
            cache,
            directory,
            auth,
            users,
            ext_authz: ExtAuthzService::new(resolver.clone()),
            resolver,
            policy: Arc::new(PermissionPolicy::from_rules(rpc::METHODS)),
            login_rate_limiter,
        }
    }
}

pub fn build_router(state: AppState) -> Router {
    let login_route = Router::new()
        .route(rpc::LOGIN, post(handlers::auth::login))
        .layer(from_fn_with_state(
            state.login_rate_limiter.clone(),
            ip_rate_limit_middleware,
        ));

    let rpc_routes = Router::new()
        .route(rpc::LOGOUT, post(handlers::auth::logout))
        .route(rpc::WHOAMI, post(handlers::auth::whoami))
        .route(rpc::REGISTER, post(handlers::user::register))
        .route(rpc::GET_USER, post(handlers::user::get_user))
        .merge(login_route)
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
        .route("/ext_authz", any(handlers::ext_authz::http_check))
        .route("/ext_authz/*path", any(handlers::ext_authz::http_check))
        .route(rpc::EXT_AUTHZ_CHECK, post(handlers::ext_authz::json_check))
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
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
                .allow_credentials(true),
        )
}
