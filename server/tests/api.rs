//! Router-level tests. The state points both service clients at a discard
//! port, so any request that reached a collaborator would fail loudly —
//! which is the point: these paths must resolve before any outbound call.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use registro::{config::Config, routes::api_router, state::AppState};
use serde_json::Value;
use tower::ServiceExt;

fn test_router() -> Router {
    let state: Arc<AppState> = AppState::from_config(Config {
        port: 0,
        credential_url: "http://127.0.0.1:9".to_string(),
        credential_key: "test-key".to_string(),
        store_url: "http://127.0.0.1:9".to_string(),
        store_key: "test-key".to_string(),
        allowed_origins: Vec::new(),
    });

    api_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();

    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn ping_answers_pong() {
    let response = test_router()
        .oneshot(Request::get("/ping").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&bytes[..], b"pong");
}

#[tokio::test]
async fn root_reports_identity() {
    let response = test_router()
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["ok"], Value::Bool(true));
    assert_eq!(body["name"], "Registro API");
}

#[tokio::test]
async fn stats_without_token_is_401_and_reads_nothing() {
    let response = test_router()
        .oneshot(Request::get("/records/stats").body(Body::empty()).unwrap())
        .await
        .unwrap();

    // The store client points at a dead port, so a 401 (not a 500) proves
    // the request was rejected before any store read was attempted.
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(false));
}

#[tokio::test]
async fn stats_with_non_bearer_scheme_is_401() {
    let response = test_router()
        .oneshot(
            Request::get("/records/stats")
                .header(header::AUTHORIZATION, "Basic abc")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn record_submission_requires_token_before_validation() {
    let response = test_router()
        .oneshot(
            Request::post("/records")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn record_listing_requires_token() {
    let response = test_router()
        .oneshot(Request::get("/records").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn admin_routes_require_token() {
    let response = test_router()
        .oneshot(Request::get("/create_user").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = test_router()
        .oneshot(
            Request::delete("/create_user/u1")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_without_credentials_is_400() {
    let response = test_router()
        .oneshot(
            Request::post("/login_user")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(r#"{"email": "a@b.co"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], Value::Bool(false));
}

#[tokio::test]
async fn password_reset_without_email_is_400() {
    let response = test_router()
        .oneshot(
            Request::post("/password_reset")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unknown_route_is_404() {
    let response = test_router()
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn login_rejects_get() {
    let response = test_router()
        .oneshot(Request::get("/login_user").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}
