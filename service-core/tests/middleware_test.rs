use std::sync::Arc;
use std::time::Duration;

use axum::{
    Extension, Router,
    body::Body,
    http::{Request, StatusCode},
    middleware::{from_fn, from_fn_with_state},
    routing::post,
};
use http_body_util::BodyExt;
use service_core::authz::CallerContext;
use service_core::grpc::{MethodRule, PermissionPolicy};
use service_core::middleware::{
    identity::trusted_identity_middleware,
    permission::permission_middleware,
    rate_limit::{create_ip_rate_limiter, ip_rate_limit_middleware},
    recovery::panic_response,
    tracing::request_id_middleware,
};
use tower::ServiceExt;
use tower_http::{catch_panic::CatchPanicLayer, timeout::TimeoutLayer};
use uuid::Uuid;

const RULES: &[MethodRule] = &[
    MethodRule::requires("/users.v1.UserService/GetUser", "users:read"),
    MethodRule::authenticated("/users.v1.UserService/Ping"),
    MethodRule::public("/auth.v1.AuthService/Login"),
];

async fn whoami(Extension(caller): Extension<CallerContext>) -> String {
    caller.login
}

fn app() -> Router {
    let policy = Arc::new(PermissionPolicy::from_rules(RULES));

    Router::new()
        .route("/users.v1.UserService/GetUser", post(whoami))
        .route("/users.v1.UserService/Ping", post(|| async { "pong" }))
        .route("/auth.v1.AuthService/Login", post(|| async { "login" }))
        .layer(from_fn_with_state(policy, permission_middleware))
        .layer(from_fn(trusted_identity_middleware))
}

fn call(method: &str, permissions: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(method);
    if let Some(permissions) = permissions {
        builder = builder
            .header("X-User-UUID", Uuid::new_v4().to_string())
            .header("X-User-Login", "alice")
            .header("X-User-Roles", "member")
            .header("X-User-Permissions", permissions);
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_string(response: axum::response::Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn test_caller_without_permission_is_forbidden() {
    let response = app()
        .oneshot(call("/users.v1.UserService/GetUser", Some("users:write")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_caller_with_permission_reaches_handler() {
    let response = app()
        .oneshot(call(
            "/users.v1.UserService/GetUser",
            Some("roles:read,users:read"),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "alice");
}

#[tokio::test]
async fn test_anonymous_caller_is_unauthenticated() {
    let response = app()
        .oneshot(call("/users.v1.UserService/GetUser", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unannotated_method_accepts_any_identity() {
    let response = app()
        .oneshot(call("/users.v1.UserService/Ping", Some("")))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_string(response).await, "pong");
}

#[tokio::test]
async fn test_public_method_needs_no_identity() {
    let response = app()
        .oneshot(call("/auth.v1.AuthService/Login", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_ip_rate_limit_rejects_after_burst() {
    let limiter = create_ip_rate_limiter(2, 60);
    let app = Router::new()
        .route("/auth.v1.AuthService/Login", post(|| async { "login" }))
        .layer(from_fn_with_state(limiter, ip_rate_limit_middleware));

    let request = || {
        Request::builder()
            .method("POST")
            .uri("/auth.v1.AuthService/Login")
            .header("x-forwarded-for", "203.0.113.7")
            .body(Body::empty())
            .unwrap()
    };

    for _ in 0..2 {
        let response = app.clone().oneshot(request()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    let response = app.oneshot(request()).await.unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert!(response.headers().contains_key("retry-after"));
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    let app = Router::new()
        .route("/ping", post(|| async { "pong" }))
        .layer(from_fn(request_id_middleware));

    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ping")
                .header("x-request-id", "req-1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers().get("x-request-id").unwrap(), "req-1");

    let response = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/ping")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let minted = response.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert!(Uuid::parse_str(minted).is_ok());
}

async fn stalled() -> &'static str {
    tokio::time::sleep(Duration::from_secs(3600)).await;
    "late"
}

async fn explode() -> &'static str {
    panic!("invariant broken")
}

fn guarded() -> Router {
    Router::new()
        .route("/stalled", post(stalled))
        .route("/explode", post(explode))
        .route("/ping", post(|| async { "pong" }))
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(TimeoutLayer::new(Duration::from_secs(2)))
}

fn post_to(uri: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_stalled_handler_hits_request_deadline() {
    let response = guarded().oneshot(post_to("/stalled")).await.unwrap();
    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);

    let response = guarded().oneshot(post_to("/ping")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_handler_panic_becomes_internal_error() {
    let response = guarded().oneshot(post_to("/explode")).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: serde_json::Value =
        serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["error"], "Internal server error");
    assert!(!body.to_string().contains("invariant broken"));
}
