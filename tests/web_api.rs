// HTTP API tests — drive the axum Router directly with tower's oneshot.
//
// Each test builds a fresh router over an in-memory store and the local
// HMAC identity provider, so tokens are minted in-process.

#![cfg(feature = "sqlite")]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use ingrow::identity::HmacIdentity;
use ingrow::pipeline::{ApprovalPipeline, RetryPolicy};
use ingrow::store::sqlite::SqliteStore;
use ingrow::store::KeyValueStore;
use ingrow::web::{build_router, AppState};

const SECRET: &str = "web-api-test-secret-0123456789";

fn app() -> Router {
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::in_memory().unwrap());
    let policy = RetryPolicy {
        max_retries: 3,
        base_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(4),
        op_timeout: Duration::from_millis(500),
    };
    let pipeline = ApprovalPipeline::new(store, policy);
    let identity = Arc::new(HmacIdentity::new(SECRET, 3600));
    build_router(AppState::new(pipeline, identity))
}

fn token(user_id: &str) -> String {
    HmacIdentity::new(SECRET, 3600).issue(user_id).unwrap()
}

fn request(method: Method, uri: &str, user: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(user) = user {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token(user)));
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

/// Send one request through a clone of the router; return status and JSON body.
async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

// ============================================================
// Auth
// ============================================================

#[tokio::test]
async fn health_needs_no_auth() {
    let (status, body) = send(&app(), request(Method::GET, "/health", None, None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert!(body["timestamp"].is_string());
}

#[tokio::test]
async fn missing_token_is_401() {
    let (status, body) = send(&app(), request(Method::GET, "/analytics/user", None, None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Authorization required");
}

#[tokio::test]
async fn forged_token_is_401() {
    let forged = HmacIdentity::new("some-other-secret-entirely", 3600)
        .issue("alice")
        .unwrap();
    let req = Request::builder()
        .uri("/analytics/user")
        .header(header::AUTHORIZATION, format!("Bearer {forged}"))
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "Invalid authorization");
}

// ============================================================
// Comments and analytics
// ============================================================

#[tokio::test]
async fn approve_then_read_analytics() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/comments/approve",
            Some("alice"),
            Some(json!({
                "postId": "post-1",
                "commentContent": "Love this framing.",
                "variantType": "insight",
                "wasEdited": true
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["approvalRecord"]["postId"], "post-1");
    assert_eq!(body["approvalRecord"]["variantType"], "insight");
    assert_eq!(body["approvalRecord"]["wasEdited"], true);
    assert_eq!(body["approvalRecord"]["userId"], "alice");

    let (status, body) = send(
        &app,
        request(Method::GET, "/analytics/user", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let analytics = &body["analytics"];
    assert_eq!(analytics["totalApprovedThisWeek"], 1);
    assert_eq!(analytics["weeklyGoal"], 35);
    assert_eq!(analytics["approvalRate"], 1.0);
    assert_eq!(analytics["weeklySeries"].as_array().unwrap().len(), 7);
    assert_eq!(analytics["typeDistribution"]["insight"], 100);
    assert_eq!(analytics["approvedToday"], 1);
    assert!(analytics["goalCompletion"].is_number());

    // Another user sees nothing of alice's activity.
    let (_, body) = send(&app, request(Method::GET, "/analytics/user", Some("bob"), None)).await;
    assert_eq!(body["analytics"]["totalApprovedThisWeek"], 0);
    assert_eq!(body["analytics"]["approvalRate"], 0.0);
}

#[tokio::test]
async fn approve_without_content_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/comments/approve",
            Some("alice"),
            Some(json!({ "postId": "post-1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Post ID and comment content required");
}

#[tokio::test]
async fn malformed_json_is_400_with_error_body() {
    let req = Request::builder()
        .method(Method::POST)
        .uri("/comments/approve")
        .header(header::AUTHORIZATION, format!("Bearer {}", token("alice")))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app(), req).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn skip_lowers_approval_rate() {
    let app = app();
    send(
        &app,
        request(
            Method::POST,
            "/comments/approve",
            Some("alice"),
            Some(json!({ "postId": "p1", "commentContent": "Nice", "variantType": "question" })),
        ),
    )
    .await;
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/comments/skip",
            Some("alice"),
            Some(json!({ "postId": "p2", "variantType": "insight" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (_, body) = send(&app, request(Method::GET, "/analytics/user", Some("alice"), None)).await;
    assert_eq!(body["analytics"]["approvalRate"], 0.5);
    assert_eq!(body["analytics"]["totalApprovedThisWeek"], 1);
}

#[tokio::test]
async fn generate_returns_three_variants() {
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/comments/generate",
            Some("alice"),
            Some(json!({
                "postId": "post-1",
                "postContent": "40% faster onboarding after the redesign",
                "authorName": "Sarah Chen"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let variants = body["variants"].as_array().unwrap();
    assert_eq!(variants.len(), 3);
    let types: Vec<&str> = variants.iter().map(|v| v["type"].as_str().unwrap()).collect();
    assert_eq!(types, vec!["insight", "question", "compliment"]);
}

#[tokio::test]
async fn generate_without_content_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/comments/generate",
            Some("alice"),
            Some(json!({ "postId": "post-1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Post ID and content required");
}

// ============================================================
// Settings
// ============================================================

#[tokio::test]
async fn preferences_roundtrip_and_apply() {
    let app = app();
    let (status, body) = send(
        &app,
        request(Method::GET, "/settings/preferences", Some("alice"), None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["preferences"]["dailyGoal"], 5);

    let (status, body) = send(
        &app,
        request(
            Method::PUT,
            "/settings/preferences",
            Some("alice"),
            Some(json!({ "preferences": { "dailyGoal": 2, "weeklyGoal": 10 } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["preferences"]["dailyGoal"], 2);
    assert_eq!(body["preferences"]["maxPushPerDay"], 2);

    let (_, body) = send(&app, request(Method::GET, "/analytics/user", Some("alice"), None)).await;
    assert_eq!(body["analytics"]["dailyGoal"], 2);
    assert_eq!(body["analytics"]["weeklyGoal"], 10);
    assert_eq!(body["analytics"]["weeklySeries"][6]["goalForDay"], 2);
}

#[tokio::test]
async fn zero_goal_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::PUT,
            "/settings/preferences",
            Some("alice"),
            Some(json!({ "preferences": { "dailyGoal": 0 } })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("dailyGoal"));
}

#[tokio::test]
async fn missing_preferences_object_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::PUT,
            "/settings/preferences",
            Some("alice"),
            Some(json!({})),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Preferences object required");
}

// ============================================================
// Feed and profiles
// ============================================================

#[tokio::test]
async fn feed_falls_back_to_sample() {
    let (status, body) = send(&app(), request(Method::GET, "/posts/feed", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["totalCount"], 2);
    assert_eq!(body["posts"][0]["author"]["name"], "Sarah Chen");
    assert_eq!(body["posts"][0]["priority"], "high");
}

#[tokio::test]
async fn analyze_returns_fast_lane_post() {
    let url = "https://www.linkedin.com/posts/jennifer-martinez_design-systems-activity-1";
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/posts/analyze",
            Some("alice"),
            Some(json!({ "url": url })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["post"]["author"]["name"], "Jennifer Martinez");
    assert_eq!(body["post"]["url"], url);
    assert_eq!(body["post"]["priority"], "high");
    assert!(body["post"]["id"].as_str().unwrap().starts_with("fastlane-"));
}

#[tokio::test]
async fn analyze_non_linkedin_url_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/posts/analyze",
            Some("alice"),
            Some(json!({ "url": "https://example.com/post/1" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Valid LinkedIn URL required");

    let (status, _) = send(
        &app(),
        request(Method::POST, "/posts/analyze", Some("alice"), Some(json!({}))),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn track_and_list_profiles() {
    let app = app();
    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/profiles/track",
            Some("alice"),
            Some(json!({ "profileUrl": "https://www.linkedin.com/in/jane-doe" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["profile"]["name"], "Jane Doe");
    assert_eq!(body["profile"]["initials"], "JD");

    let (status, body) = send(&app, request(Method::GET, "/profiles", Some("alice"), None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["profiles"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn non_linkedin_profile_is_400() {
    let (status, body) = send(
        &app(),
        request(
            Method::POST,
            "/profiles/track",
            Some("alice"),
            Some(json!({ "profileUrl": "https://example.com/jane" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Valid LinkedIn profile URL required");
}

#[tokio::test]
async fn unknown_route_is_404_json() {
    let (status, body) = send(&app(), request(Method::GET, "/nope", None, None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Not found");
}
