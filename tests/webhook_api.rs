//! Webhook contract tests: the router is exercised in-process with
//! `tower::ServiceExt::oneshot`, no listener required.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use circlekeeper::api::router::intake_router;
use circlekeeper::api::ApiContext;
use circlekeeper::db::open_memory_database;

fn router() -> axum::Router {
    let conn = open_memory_database().unwrap();
    intake_router(ApiContext::new(conn))
}

async fn post_referral(router: axum::Router, payload: Value) -> (StatusCode, Value) {
    let response = router
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/referrals")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    (status, body)
}

#[tokio::test]
async fn valid_submission_returns_201_with_referral_id() {
    let (status, body) = post_referral(
        router(),
        json!({
            "first_name": "Jordan",
            "last_name": "Reyes",
            "date_of_birth": "2009-04-12",
            "referrer_name": "Sam Okafor",
            "referrer_email": "sam@school.example.org",
            "urgency_level": "high"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["message"], json!("Referral created successfully"));
    assert!(uuid::Uuid::parse_str(body["referral_id"].as_str().unwrap()).is_ok());
}

#[tokio::test]
async fn missing_required_field_returns_400_naming_it() {
    let (status, body) = post_referral(
        router(),
        json!({
            "first_name": "Jordan",
            "last_name": "Reyes",
            "referrer_name": "Sam Okafor"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let error = body["error"].as_str().unwrap();
    assert!(error.contains("referrer_email"), "error was: {error}");
}

#[tokio::test]
async fn malformed_field_returns_400_naming_it() {
    let (status, body) = post_referral(
        router(),
        json!({
            "first_name": "Jordan",
            "last_name": "Reyes",
            "referrer_name": "Sam Okafor",
            "referrer_email": "not-an-email"
        }),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("referrer_email"));
}

#[tokio::test]
async fn unknown_fields_are_ignored() {
    let (status, _) = post_referral(
        router(),
        json!({
            "first_name": "Jordan",
            "last_name": "Reyes",
            "referrer_name": "Sam Okafor",
            "referrer_email": "sam@school.example.org",
            "free_lunch": "yes"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn health_reports_version() {
    let response = router()
        .oneshot(
            Request::builder()
                .uri("/api/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["version"], json!(env!("CARGO_PKG_VERSION")));
}
