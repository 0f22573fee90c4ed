mod common;

use axum::http::StatusCode;
use common::{body_json, call, Caller, TestApp};
use rbac_service::repository::PermissionGraph;
use rbac_service::rpc;
use serde_json::json;
use tower::ServiceExt;

async fn create_role(app: &TestApp, name: &str) -> serde_json::Value {
    let response = app
        .router
        .clone()
        .oneshot(call(
            rpc::CREATE_ROLE,
            json!({ "name": name, "description": "created in test" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["role"].clone()
}

#[tokio::test]
async fn test_guarded_method_without_identity_is_unauthenticated() {
    let app = TestApp::new();

    let response = app
        .router
        .oneshot(call(rpc::LIST_ROLES, json!({}), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_permission_is_forbidden() {
    let app = TestApp::new();

    let response = app
        .router
        .oneshot(call(
            rpc::CREATE_ROLE,
            json!({ "name": "auditor" }),
            Some(&Caller::with(&["roles:read"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(app.graph.list_roles(&Default::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_then_get_by_id_and_name() {
    let app = TestApp::new();
    let role = create_role(&app, "auditor").await;
    let reader = Caller::with(&["roles:read"]);

    for value in [role["id"].as_str().unwrap(), "auditor"] {
        let response = app
            .router
            .clone()
            .oneshot(call(rpc::GET_ROLE, json!({ "value": value }), Some(&reader)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["role"]["id"], role["id"]);
        assert_eq!(body["permissions"], json!([]));
    }
}

#[tokio::test]
async fn test_duplicate_name_conflicts() {
    let app = TestApp::new();
    create_role(&app, "auditor").await;

    let response = app
        .router
        .oneshot(call(
            rpc::CREATE_ROLE,
            json!({ "name": "auditor" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_invalid_name_is_rejected() {
    let app = TestApp::new();

    let response = app
        .router
        .oneshot(call(
            rpc::CREATE_ROLE,
            json!({ "name": "a" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn test_get_with_blank_value_is_bad_request() {
    let app = TestApp::new();

    let response = app
        .router
        .oneshot(call(
            rpc::GET_ROLE,
            json!({ "value": "  " }),
            Some(&Caller::with(&["roles:read"])),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_update_and_list() {
    let app = TestApp::new();
    let role = create_role(&app, "auditor").await;
    create_role(&app, "billing").await;

    let response = app
        .router
        .clone()
        .oneshot(call(
            rpc::UPDATE_ROLE,
            json!({ "id": role["id"], "name": "compliance" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let updated = body_json(response).await;
    assert_eq!(updated["role"]["name"], "compliance");
    assert!(updated["role"]["updated_at"].is_string());

    let response = app
        .router
        .oneshot(call(
            rpc::LIST_ROLES,
            json!({ "name_filter": "COMP" }),
            Some(&Caller::admin()),
        ))
        .await
        .unwrap();
    let roles = body_json(response).await["roles"].clone();
    assert_eq!(roles.as_array().unwrap().len(), 1);
    assert_eq!(roles[0]["name"], "compliance");
}

#[tokio::test]
async fn test_deleted_role_disappears() {
    let app = TestApp::new();
    let role = create_role(&app, "temporary").await;
    let admin = Caller::admin();

    let response = app
        .router
        .clone()
        .oneshot(call(rpc::DELETE_ROLE, json!({ "id": role["id"] }), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await, json!({}));

    let response = app
        .router
        .clone()
        .oneshot(call(rpc::DELETE_ROLE, json!({ "id": role["id"] }), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .router
        .oneshot(call(rpc::LIST_ROLES, json!({}), Some(&admin)))
        .await
        .unwrap();
    assert_eq!(body_json(response).await["roles"], json!([]));
}
