//! Request gate tests.
//!
//! The gate is exercised as a layer over a small page router, the way the
//! deployment wires it over the whole application.

mod common;

use axum::http::{HeaderValue, StatusCode, header};
use axum::{Router, middleware, routing::get};
use axum_test::TestServer;
use common::*;
use upkeep_gateway::gate::require_session_gate;
use wiremock::MockServer;

fn gated_app(resources: upkeep_gateway::AuthResources) -> Router {
    Router::new()
        .route("/", get(|| async { "home" }))
        .route("/login", get(|| async { "login page" }))
        .route("/work-orders", get(|| async { "work orders" }))
        .route("/assets/app.css", get(|| async { "body {}" }))
        .layer(middleware::from_fn_with_state(
            resources,
            require_session_gate,
        ))
}

fn cookie_header(token: &str) -> HeaderValue {
    HeaderValue::from_str(&format!("id_token={token}")).expect("valid header value")
}

#[tokio::test]
async fn public_paths_pass_without_cookie() {
    let server = MockServer::start().await;
    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();

    app.get("/").await.assert_status_ok();
    app.get("/login").await.assert_status_ok();
    app.get("/assets/app.css").await.assert_status_ok();
}

#[tokio::test]
async fn protected_path_without_cookie_redirects_to_login() {
    let server = MockServer::start().await;
    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();

    let response = app.get("/work-orders").await;

    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Fwork-orders");
}

#[tokio::test]
async fn redirect_preserves_query_string() {
    let server = MockServer::start().await;
    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();

    let response = app
        .get("/work-orders")
        .add_query_param("id", "5")
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Fwork-orders%3Fid%3D5");
}

#[tokio::test]
async fn protected_path_with_valid_cookie_passes() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();
    let token = valid_identity_token(&server);

    let response = app
        .get("/work-orders")
        .add_header(header::COOKIE, cookie_header(&token))
        .await;

    response.assert_status_ok();
    response.assert_text("work orders");
}

#[tokio::test]
async fn expired_cookie_behaves_like_no_cookie() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();
    let token = make_identity_token(&issuer(&server.uri()), CLIENT_ID, "user-123", -3600);

    let response = app
        .get("/work-orders")
        .add_header(header::COOKIE, cookie_header(&token))
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Fwork-orders");
}

#[tokio::test]
async fn garbage_cookie_behaves_like_no_cookie() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();

    let response = app
        .get("/work-orders")
        .add_header(header::COOKIE, cookie_header("not-a-jwt"))
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn unrouted_protected_path_is_still_gated() {
    let server = MockServer::start().await;
    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();

    // No route matches, but the gate layer wraps the fallback too.
    let response = app.get("/reports/monthly").await;

    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Freports%2Fmonthly");
}

#[tokio::test]
async fn tampered_cookie_is_rejected_by_the_gate() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = TestServer::new(gated_app(test_resources(&server.uri()))).unwrap();
    let token = tamper_signature(&valid_identity_token(&server));

    let response = app
        .get("/work-orders")
        .add_header(header::COOKIE, cookie_header(&token))
        .await;

    response.assert_status(StatusCode::SEE_OTHER);
}

// =============================================================================
// Session extractors
// =============================================================================

async fn profile(upkeep_gateway::auth::RequireSession(session): upkeep_gateway::auth::RequireSession) -> String {
    format!("profile of {}", session.subject())
}

async fn greeting(
    upkeep_gateway::auth::OptionalSession(session): upkeep_gateway::auth::OptionalSession,
) -> String {
    match session {
        Some(session) => format!("hello {}", session.subject()),
        None => "hello anonymous".to_string(),
    }
}

#[tokio::test]
async fn require_session_extractor_redirects_without_cookie() {
    let server = MockServer::start().await;
    let app = Router::new()
        .route("/profile", get(profile))
        .with_state(test_resources(&server.uri()));
    let app = TestServer::new(app).unwrap();

    let response = app.get("/profile").await;

    response.assert_status(StatusCode::SEE_OTHER);
    let location = response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap();
    assert_eq!(location, "/api/auth/login?next=%2Fprofile");
}

#[tokio::test]
async fn require_session_extractor_passes_with_valid_cookie() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = Router::new()
        .route("/profile", get(profile))
        .with_state(test_resources(&server.uri()));
    let app = TestServer::new(app).unwrap();
    let token = valid_identity_token(&server);

    let response = app
        .get("/profile")
        .add_header(header::COOKIE, cookie_header(&token))
        .await;

    response.assert_status_ok();
    response.assert_text("profile of user-123");
}

#[tokio::test]
async fn optional_session_extractor_never_rejects() {
    let server = MockServer::start().await;
    mount_discovery(&server).await;
    mount_jwks(&server).await;

    let app = Router::new()
        .route("/greeting", get(greeting))
        .with_state(test_resources(&server.uri()));
    let app = TestServer::new(app).unwrap();

    let anonymous = app.get("/greeting").await;
    anonymous.assert_status_ok();
    anonymous.assert_text("hello anonymous");

    let token = valid_identity_token(&server);
    let known = app
        .get("/greeting")
        .add_header(header::COOKIE, cookie_header(&token))
        .await;
    known.assert_status_ok();
    known.assert_text("hello user-123");
}
