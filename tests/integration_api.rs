//! Integration tests for the HTTP API.
//!
//! Served over the in-memory store and producers, so these run without
//! Postgres or a broker.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::util::ServiceExt;

use following_service::api::{create_router, AppState};
use following_service::events::{MemoryProducer, Producer};
use following_service::service::{CommunityService, UserService};
use following_service::store::Store;

struct TestApp {
    router: Router,
    users: Arc<UserService>,
    communities: Arc<CommunityService>,
    user_followed: Arc<MemoryProducer>,
}

fn test_app() -> TestApp {
    let store = Store::in_memory();
    let user_followed = Arc::new(MemoryProducer::new());
    let users = Arc::new(UserService::new(
        Arc::clone(&store.users),
        Arc::clone(&user_followed) as Arc<dyn Producer>,
        Arc::new(MemoryProducer::new()),
    ));
    let communities = Arc::new(CommunityService::new(
        Arc::clone(&store.communities),
        Arc::new(MemoryProducer::new()),
        Arc::new(MemoryProducer::new()),
    ));

    let router = create_router(AppState {
        users: Arc::clone(&users),
        communities: Arc::clone(&communities),
    });

    TestApp {
        router,
        users,
        communities,
        user_followed,
    }
}

async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, Value) {
    let response = router
        .clone()
        .oneshot(
            Request::builder()
                .method(method)
                .uri(uri)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

#[tokio::test]
async fn test_health() {
    let app = test_app();
    let (status, body) = send(&app.router, "GET", "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!({"status": "ok"}));
}

#[tokio::test]
async fn test_follow_then_list_followers() {
    let app = test_app();
    app.users.create_user("u1").await.unwrap();
    app.users.create_user("u2").await.unwrap();

    // u2 follows u1
    let (status, _) = send(&app.router, "POST", "/api/users/u1/followers/u2").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, "GET", "/api/users/u1/followers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"followers": [{"external_id": "u2"}]})
    );

    // The committed edge was announced on the broker.
    let published = app.user_followed.published();
    assert_eq!(published.len(), 1);
    let event: Value = serde_json::from_slice(&published[0]).unwrap();
    assert_eq!(event["followee_id"], "u1");
    assert_eq!(event["follower_id"], "u2");
}

#[tokio::test]
async fn test_follow_unknown_user_is_404() {
    let app = test_app();
    app.users.create_user("u1").await.unwrap();

    let (status, body) = send(&app.router, "POST", "/api/users/u1/followers/ghost").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "user_not_found");
    assert_eq!(body["details"], "ghost");

    // Nothing was published for the failed request.
    assert!(app.user_followed.published().is_empty());
}

#[tokio::test]
async fn test_unfollow_then_list_followers() {
    let app = test_app();
    app.users.create_user("u1").await.unwrap();
    app.users.create_user("u2").await.unwrap();

    let (status, _) = send(&app.router, "POST", "/api/users/u1/followers/u2").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = send(&app.router, "DELETE", "/api/users/u1/followers/u2").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app.router, "GET", "/api/users/u1/followers").await;
    assert_eq!(body, serde_json::json!({"followers": []}));
}

#[tokio::test]
async fn test_community_follow_routes() {
    let app = test_app();
    app.users.create_user("u1").await.unwrap();
    app.communities.create_community("c1").await.unwrap();

    let (status, _) = send(&app.router, "POST", "/api/communities/c1/followers/u1").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = send(&app.router, "GET", "/api/communities/c1/followers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"followers": [{"external_id": "u1"}]})
    );

    let (status, body) = send(&app.router, "GET", "/api/users/u1/communities").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        serde_json::json!({"communities": [{"external_id": "c1"}]})
    );

    let (status, _) = send(&app.router, "DELETE", "/api/communities/c1/followers/u1").await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (_, body) = send(&app.router, "GET", "/api/communities/c1/followers").await;
    assert_eq!(body, serde_json::json!({"followers": []}));
}

#[tokio::test]
async fn test_unknown_community_is_404() {
    let app = test_app();
    app.users.create_user("u1").await.unwrap();

    let (status, body) = send(&app.router, "POST", "/api/communities/ghost/followers/u1").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error_code"], "community_not_found");
}
