//! End-to-end scenarios against the full router.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use chrono::Duration;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::api::build_router;
use crate::auth::GateStrategy;
use crate::config::AuthConfig;
use crate::storage::{CatalogStore, JsonFileStore, MemoryStore};
use crate::AppState;

fn auth_config(strategy: GateStrategy) -> AuthConfig {
    AuthConfig {
        strategy,
        admin_secret: "admin-test-secret".to_string(),
        user_secret: "user-test-secret".to_string(),
        issuer: "course-market".to_string(),
        hash_cost: 4,
    }
}

fn test_state(strategy: GateStrategy) -> AppState {
    crate::logging::init_test();
    let store: Arc<dyn CatalogStore> = Arc::new(MemoryStore::new());
    AppState::new(&auth_config(strategy), store)
}

fn test_app() -> Router {
    build_router(test_state(GateStrategy::SignedToken))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: Method, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn authed(method: Method, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

fn header_login(uri: &str, username: &str, password: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("username", username)
        .header("password", password)
        .body(Body::empty())
        .unwrap()
}

/// Sign up and log in, returning the token.
async fn account(app: &Router, prefix: &str, username: &str, password: &str) -> String {
    let (status, _) = send(
        app,
        json_request(
            Method::POST,
            &format!("/{}/signup", prefix),
            None,
            json!({"username": username, "password": password}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        app,
        header_login(&format!("/{}/login", prefix), username, password),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    body["token"].as_str().unwrap().to_string()
}

async fn create_course(app: &Router, token: &str, title: &str) -> String {
    let (status, body) = send(
        app,
        json_request(
            Method::POST,
            "/admin/courses",
            Some(token),
            json!({"title": title, "description": "intro", "price": 10, "image_link": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["course_id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_admin_publishes_course() {
    let app = test_app();
    let token = account(&app, "admin", "alice", "pw1").await;
    let course_id = create_course(&app, &token, "Go").await;

    let (status, body) = send(
        &app,
        authed(
            Method::PUT,
            &format!("/admin/courses/{}/publish", course_id),
            &token,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["published"], true);

    let (status, body) = send(&app, authed(Method::GET, "/admin/courses", &token)).await;
    assert_eq!(status, StatusCode::OK);
    let courses = body["courses"].as_array().unwrap();
    assert_eq!(courses.len(), 1);
    assert_eq!(courses[0]["title"], "Go");
    assert_eq!(courses[0]["published"], true);
    assert_eq!(courses[0]["author"], "alice");
}

#[tokio::test]
async fn test_signup_validation_and_conflict() {
    let app = test_app();
    let signup = |body: Value| json_request(Method::POST, "/users/signup", None, body);

    let (status, _) = send(&app, signup(json!({"username": "bob", "password": "pw"}))).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(&app, signup(json!({"username": "bob", "password": "other"}))).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let (status, body) = send(&app, signup(json!({"username": "carol"}))).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    // Admin namespace is independent.
    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/signup",
            None,
            json!({"username": "bob", "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_unreadable_bodies_are_validation_errors() {
    let app = test_app();

    let empty = Request::builder()
        .method(Method::POST)
        .uri("/admin/signup")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/users/signup",
            None,
            json!({"username": 5, "password": "pw"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let token = account(&app, "admin", "alice", "pw1").await;
    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/courses",
            Some(&token),
            json!({"title": "Go", "description": "intro", "price": "10", "image_link": "x"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");

    let course_id = create_course(&app, &token, "Go").await;
    let (status, body) = send(
        &app,
        json_request(
            Method::PUT,
            &format!("/admin/courses/{}", course_id),
            Some(&token),
            json!({"published": "yes"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_login_failures() {
    let app = test_app();
    account(&app, "admin", "alice", "pw1").await;

    let (status, body) = send(&app, header_login("/admin/login", "alice", "wrong")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIAL");

    let (status, _) = send(&app, header_login("/users/login", "alice", "pw1")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let empty = Request::builder()
        .method(Method::POST)
        .uri("/admin/login")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, empty).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_accepts_json_body() {
    let app = test_app();
    account(&app, "users", "bob", "pw2").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/users/login",
            None,
            json!({"username": "bob", "password": "pw2"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expires_in"], 3600);
    assert!(body["token"].as_str().is_some());
}

#[tokio::test]
async fn test_gate_rejection_codes() {
    let state = test_state(GateStrategy::SignedToken);
    let expired = state
        .admin_gate
        .tokens()
        .issue_with_lifetime("alice", Duration::seconds(-5))
        .unwrap();
    let app = build_router(state);

    let missing = Request::builder()
        .uri("/admin/courses")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(&app, missing).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "MISSING_CREDENTIAL");

    let malformed = Request::builder()
        .uri("/admin/courses")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (_, body) = send(&app, malformed).await;
    assert_eq!(body["code"], "MALFORMED_CREDENTIAL");

    let (_, body) = send(&app, authed(Method::GET, "/admin/courses", "not-a-jwt")).await;
    assert_eq!(body["code"], "INVALID_CREDENTIAL");

    let (status, body) = send(&app, authed(Method::GET, "/admin/courses", &expired)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "EXPIRED_CREDENTIAL");
}

#[tokio::test]
async fn test_role_separation() {
    let app = test_app();
    let admin_token = account(&app, "admin", "alice", "pw1").await;
    let user_token = account(&app, "users", "bob", "pw2").await;

    let (status, body) = send(&app, authed(Method::GET, "/users/courses", &admin_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIAL");

    let (status, body) = send(&app, authed(Method::GET, "/admin/courses", &user_token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIAL");

    let (status, _) = send(&app, authed(Method::GET, "/users/courses", &user_token)).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_purchase_is_idempotent() {
    let app = test_app();
    let admin_token = account(&app, "admin", "alice", "pw1").await;
    let user_token = account(&app, "users", "bob", "pw2").await;
    let course_id = create_course(&app, &admin_token, "Go").await;
    let purchase_uri = format!("/users/courses/{}", course_id);

    let (status, body) = send(&app, authed(Method::POST, &purchase_uri, &user_token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["course_id"], course_id.as_str());

    let (status, body) = send(&app, authed(Method::POST, &purchase_uri, &user_token)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "DUPLICATE_PURCHASE");

    let (status, body) = send(
        &app,
        authed(Method::GET, "/users/purchasedCourses", &user_token),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let purchased = body["purchased_courses"].as_array().unwrap();
    assert_eq!(purchased.len(), 1);
    assert_eq!(purchased[0]["id"], course_id.as_str());

    let unknown = format!("/users/courses/{}", uuid::Uuid::new_v4());
    let (status, body) = send(&app, authed(Method::POST, &unknown, &user_token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_partial_update_and_ownership() {
    let app = test_app();
    let alice = account(&app, "admin", "alice", "pw1").await;
    let mallory = account(&app, "admin", "mallory", "pw3").await;
    let course_id = create_course(&app, &alice, "Go").await;
    let uri = format!("/admin/courses/{}", course_id);

    let (status, body) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&alice), json!({"price": 25})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["price"], 25.0);
    assert_eq!(body["title"], "Go");
    assert_eq!(body["description"], "intro");

    let (status, _) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&alice), json!({"price": -1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &app,
        json_request(Method::PUT, &uri, Some(&mallory), json!({"title": "Mine"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = send(&app, authed(Method::GET, "/admin/courses", &mallory)).await;
    assert!(body["courses"].as_array().unwrap().is_empty());

    let missing = format!("/admin/courses/{}/publish", uuid::Uuid::new_v4());
    let (status, _) = send(&app, authed(Method::PUT, &missing, &alice)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_course_requires_fields() {
    let app = test_app();
    let token = account(&app, "admin", "alice", "pw1").await;

    let (status, body) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/courses",
            Some(&token),
            json!({"title": "Go", "price": 10}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_users_see_every_course() {
    let app = test_app();
    let alice = account(&app, "admin", "alice", "pw1").await;
    let dave = account(&app, "admin", "dave", "pw4").await;
    let bob = account(&app, "users", "bob", "pw2").await;
    create_course(&app, &alice, "Go").await;
    create_course(&app, &dave, "Rust").await;

    let (status, body) = send(&app, authed(Method::GET, "/users/courses", &bob)).await;
    assert_eq!(status, StatusCode::OK);
    let titles: Vec<_> = body["courses"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["title"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(titles, vec!["Go", "Rust"]);
}

#[tokio::test]
async fn test_direct_lookup_strategy() {
    let app = build_router(test_state(GateStrategy::DirectLookup));

    let (status, _) = send(
        &app,
        json_request(
            Method::POST,
            "/admin/signup",
            None,
            json!({"username": "alice", "password": "pw1"}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let with_pair = |password: &str| {
        Request::builder()
            .method(Method::GET)
            .uri("/admin/courses")
            .header("username", "alice")
            .header("password", password)
            .body(Body::empty())
            .unwrap()
    };

    let (status, body) = send(&app, with_pair("pw1")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["courses"].as_array().unwrap().is_empty());

    let (status, body) = send(&app, with_pair("nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "INVALID_CREDENTIAL");
}

#[tokio::test]
async fn test_json_file_backend_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let store: Arc<dyn CatalogStore> = Arc::new(JsonFileStore::open(dir.path()).await.unwrap());
    let app = build_router(AppState::new(&auth_config(GateStrategy::SignedToken), store));

    let admin = account(&app, "admin", "alice", "pw1").await;
    let user = account(&app, "users", "bob", "pw2").await;
    let course_id = create_course(&app, &admin, "Go").await;

    let (status, _) = send(
        &app,
        authed(Method::POST, &format!("/users/courses/{}", course_id), &user),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let raw = std::fs::read_to_string(dir.path().join("users.json")).unwrap();
    assert!(raw.contains(&course_id));
    assert!(!raw.contains("pw2"));
}

#[tokio::test]
async fn test_health_and_docs() {
    let app = test_app();

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/health")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["storage"], "memory");

    let (status, body) = send(
        &app,
        Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["paths"]["/users/purchasedCourses"].is_object());
}
