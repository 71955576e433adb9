mod common;

use axum::http::StatusCode;
use serde_json::{Value, json};
use tower::ServiceExt;

use common::{client_request, read_json, read_text, request, router};

#[tokio::test]
async fn test_show_replies_and_emits_event() {
    let router = router(false).await;
    let mut tap = router.events().tap();

    let response = router
        .app()
        .unwrap()
        .oneshot(request("GET", "/widgets/42?expand=parts", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["code"], 0);
    assert_eq!(body["response"], json!({ "id": "42", "name": "sprocket" }));

    let event = tap.try_recv().unwrap();
    assert_eq!(event.id.as_str(), "API.WIDGET.SHOW");
    assert_eq!(event.package.data["widgetId"], json!("42"));
    assert_eq!(event.package.data["response"]["status"], json!(200));
}

#[tokio::test]
async fn test_rejection_from_handler() {
    let router = router(false).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(request("GET", "/widgets/7", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = read_json(response).await;
    assert_eq!(body["code"], 2200);
    assert_eq!(body["response"], json!("Requested resource not found."));
}

#[tokio::test]
async fn test_protected_action_requires_client_headers() {
    let router = router(false).await;
    let mut tap = router.events().tap();

    let response = router
        .app()
        .unwrap()
        .oneshot(request("POST", "/widgets", Some(json!({ "name": "gear" }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        read_text(response).await,
        "Client did not send required x-paperframe-client / x-paperframe-client-version / \
         x-paperframe-client-api-version headers."
    );
    assert!(tap.try_recv().is_err());
}

#[tokio::test]
async fn test_before_hook_transforms_params() {
    let router = router(false).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(client_request("POST", "/widgets", Some(json!({ "name": "  gear  " }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = read_json(response).await;
    assert_eq!(body["response"], json!({ "id": "43", "name": "gear" }));
}

#[tokio::test]
async fn test_before_hook_rejection_skips_handler() {
    let router = router(false).await;
    let mut tap = router.events().tap();

    let response = router
        .app()
        .unwrap()
        .oneshot(client_request("POST", "/widgets", Some(json!({ "name": " " }))))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], 90);
    assert_eq!(body["response"], json!("name is required"));
    assert!(tap.try_recv().is_err());
}

#[tokio::test]
async fn test_handler_failure_is_internal_error() {
    let router = router(false).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(client_request("DELETE", "/widgets/42", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = read_json(response).await;
    assert_eq!(body["code"], 200);
}

#[tokio::test]
async fn test_malformed_json_body() {
    let router = router(false).await;

    let request = axum::http::Request::builder()
        .method("POST")
        .uri("/widgets")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{\"name\":"))
        .unwrap();
    let response = router.app().unwrap().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = read_json(response).await;
    assert_eq!(body["code"], 90);
}

#[tokio::test]
async fn test_unimplemented_action_is_not_routed() {
    let router = router(false).await;
    assert_eq!(router.route_table().unwrap().len(), 4);

    let response = router
        .app()
        .unwrap()
        .oneshot(client_request("PUT", "/widgets/42", Some(json!({}))))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_without_verifier_nothing_is_checked() {
    let router = router(false).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(request("GET", "/widgets", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["response"]["session"], Value::Null);
}

#[tokio::test]
async fn test_action_without_acl_entry_is_verified() {
    let router = router(true).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(request("GET", "/widgets", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = read_json(response).await;
    assert_eq!(body["code"], 10);
    assert_eq!(body["response"], json!("Invalid token"));
}

#[tokio::test]
async fn test_verified_request_carries_session() {
    let router = router(true).await;

    let request = axum::http::Request::builder()
        .method("GET")
        .uri("/widgets")
        .header("authorization", "Bearer s3cret")
        .body(axum::body::Body::empty())
        .unwrap();
    let response = router.app().unwrap().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = read_json(response).await;
    assert_eq!(body["response"]["session"], json!({ "sub": "tester" }));
}

#[tokio::test]
async fn test_explicitly_public_action_skips_verifier() {
    let router = router(true).await;

    let response = router
        .app()
        .unwrap()
        .oneshot(request("GET", "/widgets/42", None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_routes_acl_lists_declared_rules() {
    let router = router(true).await;

    let acl = router.routes_acl().unwrap();
    let widget = &acl["widget"];
    assert_eq!(widget.len(), 3);
    assert!(router.providers().unwrap().contains("database"));
}
