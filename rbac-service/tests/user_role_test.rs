mod common;

use axum::http::StatusCode;
use common::{body_json, call, Caller, TestApp};
use rbac_service::models::CreateRole;
use rbac_service::repository::PermissionGraph;
use rbac_service::rpc;
use serde_json::json;
use tower::ServiceExt;
use uuid::Uuid;

async fn seed_role(app: &TestApp, name: &str, permissions: &[&str]) -> Uuid {
    let role = app
        .graph
        .create_role(&CreateRole {
            name: name.to_string(),
            description: String::new(),
        })
        .await
        .unwrap();
    for key in permissions {
        app.graph
            .assign_permission(role.id, app.permission(key).id)
            .await
            .unwrap();
    }
    role.id
}

#[tokio::test]
async fn test_get_user_roles_is_public() {
    let app = TestApp::new();
    let role_id = seed_role(&app, "auditor", &["roles:read", "user_roles:read"]).await;
    let user = Uuid::new_v4();
    app.graph.assign_role(user, role_id, None).await.unwrap();

    let response = app
        .router
        .oneshot(call(rpc::GET_USER_ROLES, json!({ "user_id": user }), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let roles = body["roles"].as_array().unwrap();
    assert_eq!(roles.len(), 1);
    assert_eq!(roles[0]["role"]["name"], "auditor");
    assert_eq!(roles[0]["permissions"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn test_user_roles_are_served_from_cache() {
    let app = TestApp::new();
    let role_id = seed_role(&app, "auditor", &["roles:read"]).await;
    let user = Uuid::new_v4();
    app.graph.assign_role(user, role_id, None).await.unwrap();

    for _ in 0..3 {
        let response = app
            .router
            .clone()
            .oneshot(call(rpc::GET_USER_ROLES, json!({ "user_id": user }), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(app.graph.permission_reads(), 1);
}

#[tokio::test]
async fn test_assign_records_caller_and_conflicts_on_repeat() {
    let app = TestApp::new();
    seed_role(&app, "auditor", &[]).await;
    let admin = Caller::admin();
    let user = Uuid::new_v4();

    for expected in [StatusCode::OK, StatusCode::CONFLICT] {
        let response = app
            .router
            .clone()
            .oneshot(call(
                rpc::ASSIGN_ROLE,
                json!({ "user_id": user, "role": "auditor" }),
                Some(&admin),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), expected);
    }

    assert_eq!(app.graph.assigned_by(user, "auditor"), Some(Some(admin.user_id)));
}

#[tokio::test]
async fn test_assign_requires_permission() {
    let app = TestApp::new();
    seed_role(&app, "admin", &[]).await;
    let caller = Caller::with(&["user_roles:read"]);

    let response = app
        .router
        .oneshot(call(
            rpc::ASSIGN_ROLE,
            json!({ "user_id": caller.user_id, "role": "admin" }),
            Some(&caller),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_revoke_unassigned_is_precondition_failed() {
    let app = TestApp::new();
    seed_role(&app, "auditor", &[]).await;

    let response = app
        .router
        .oneshot(call(
            rpc::REVOKE_ROLE,
            json!({ "user_id": Uuid::new_v4(), "role": "auditor" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_role_users_pagination() {
    let app = TestApp::new();
    let role_id = seed_role(&app, "user", &[]).await;
    let mut users: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
    for user in &users {
        app.graph.assign_role(*user, role_id, None).await.unwrap();
    }
    users.sort();
    let reader = Caller::with(&["user_roles:read"]);

    let response = app
        .router
        .clone()
        .oneshot(call(
            rpc::GET_ROLE_USERS,
            json!({ "role_id": role_id, "page_size": 2 }),
            Some(&reader),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let first = body_json(response).await;
    assert_eq!(first["user_ids"], json!([users[0], users[1]]));
    assert_eq!(first["next_cursor"], json!(users[1]));
    assert_eq!(first["total_count"], 3);

    let response = app
        .router
        .clone()
        .oneshot(call(
            rpc::GET_ROLE_USERS,
            json!({ "role_id": role_id, "page_size": 2, "cursor": first["next_cursor"] }),
            Some(&reader),
        ))
        .await
        .unwrap();
    let second = body_json(response).await;
    assert_eq!(second["user_ids"], json!([users[2]]));
    assert!(second.get("next_cursor").is_none());

    let response = app
        .router
        .oneshot(call(
            rpc::GET_ROLE_USERS,
            json!({ "role_id": role_id, "page_size": 500 }),
            Some(&reader),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_user_created_event_assigns_default_role() {
    let app = TestApp::new();
    seed_role(&app, "user", &[]).await;
    let user = Uuid::new_v4();

    let payload = json!({
        "event_id": Uuid::new_v4(),
        "user_id": user,
        "login": "new-user",
        "created_at": "2024-06-01T12:00:00Z",
    });
    app.state
        .user_events
        .handle_payload(payload.to_string().as_bytes())
        .await
        .unwrap();

    let response = app
        .router
        .oneshot(call(rpc::GET_USER_ROLES, json!({ "user_id": user }), None))
        .await
        .unwrap();
    let body = body_json(response).await;
    assert_eq!(body["roles"][0]["role"]["name"], "user");
}
