mod common;

use axum::http::{Request, StatusCode};
use axum::body::Body;
use chrono::Utc;
use common::{body_json, header, post_json, profile, role, test_config, TestApp, PASSWORD};
use serde_json::json;
use tower::ServiceExt;

async fn login(app: &TestApp, login: &str, password: &str) -> axum::http::Response<Body> {
    app.router
        .clone()
        .oneshot(post_json(
            "/auth.v1.AuthService/Login",
            json!({ "login": login, "password": password }),
        ))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_login_sets_session_cookie() {
    let app = TestApp::new();
    app.users
        .add_user("alice", "alice@example.com", PASSWORD)
        .unwrap();

    let response = login(&app, "alice", PASSWORD).await;
    assert_eq!(response.status(), StatusCode::OK);

    let cookie = header(&response, "set-cookie").unwrap().to_string();
    let body = body_json(response).await;
    let session_id = body["session_id"].as_str().unwrap();

    assert!(cookie.starts_with(&format!("X-Session-Uuid={}", session_id)));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
}

#[tokio::test]
async fn test_login_rejects_bad_credentials_uniformly() {
    let app = TestApp::new();
    app.users
        .add_user("alice", "alice@example.com", PASSWORD)
        .unwrap();

    let wrong_password = login(&app, "alice", "not-the-password").await;
    let unknown_user = login(&app, "mallory", PASSWORD).await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn test_login_validates_input() {
    let app = TestApp::new();

    let short_password = login(&app, "alice", "12345").await;
    assert_eq!(short_password.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let short_login = login(&app, "al", PASSWORD).await;
    assert_eq!(short_login.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_whoami_returns_identity_with_roles() {
    let app = TestApp::new();
    let user = app
        .users
        .add_user("alice", "alice@example.com", PASSWORD)
        .unwrap();
    app.roles
        .set_roles(user.id, vec![role("editor", &[("documents", "write")])]);

    let body = body_json(login(&app, "alice", PASSWORD).await).await;
    let session_id = body["session_id"].as_str().unwrap();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/auth.v1.AuthService/Whoami",
            json!({ "session_id": session_id }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let identity = body_json(response).await;
    assert_eq!(identity["user"]["login"], "alice");
    assert_eq!(identity["session"]["id"], session_id);
    assert_eq!(identity["roles_with_permissions"][0]["role"]["name"], "editor");
}

#[tokio::test]
async fn test_whoami_unknown_session_is_not_found() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/auth.v1.AuthService/Whoami",
            json!({ "session_id": uuid::Uuid::new_v4() }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_with_cookie_ends_session() {
    let app = TestApp::new();
    app.users
        .add_user("alice", "alice@example.com", PASSWORD)
        .unwrap();

    let body = body_json(login(&app, "alice", PASSWORD).await).await;
    let session_id = body["session_id"].as_str().unwrap().to_string();

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/auth.v1.AuthService/Logout")
                .header("cookie", format!("X-Session-Uuid={}", session_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(header(&response, "set-cookie")
        .unwrap()
        .starts_with("X-Session-Uuid="));

    let whoami = app
        .router
        .clone()
        .oneshot(post_json(
            "/auth.v1.AuthService/Whoami",
            json!({ "session_id": session_id }),
        ))
        .await
        .unwrap();
    assert_eq!(whoami.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_logout_without_session_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .router
        .clone()
        .oneshot(post_json("/auth.v1.AuthService/Logout", json!({})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn test_stalled_request_hits_deadline() {
    let mut config = test_config();
    config.request_timeout_ms = 1_000;
    config.rbac.timeout_ms = 60_000;
    let app = TestApp::with_config(config);

    let user = profile("alice");
    let session_id = app
        .sessions()
        .create(&user, Utc::now() + chrono::Duration::hours(1))
        .await
        .unwrap();
    app.roles.delay_by(std::time::Duration::from_secs(30));

    let response = app
        .router
        .clone()
        .oneshot(post_json(
            "/auth.v1.AuthService/Whoami",
            json!({ "session_id": session_id }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::REQUEST_TIMEOUT);
    assert_eq!(app.roles.calls(), 1);
}
