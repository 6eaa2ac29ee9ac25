//! End-to-end tests for the federated login flow, driven through the router
//! against a local fake of Google's token and tokeninfo endpoints.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use reqwest::{Client, Url};
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

use super::login_state::LOGIN_COOKIE_NAME;
use super::models::Role;
use crate::build_router;
use crate::common::migrations::test_support::setup_test_db;
use crate::common::state::test_support::test_state;
use crate::common::{AppConfig, AppState};
use crate::services::google::fake_provider;

struct Started {
    cookie: String,
    state: String,
    nonce: String,
}

async fn harness() -> (Router, Arc<AppState>) {
    let provider = fake_provider::spawn().await;
    let state = test_state(&provider).await;
    (build_router(state.clone()), state)
}

async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response {
    let mut builder = Request::builder().method(Method::GET).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, format!("{}={}", LOGIN_COOKIE_NAME, cookie));
    }
    app.clone()
        .oneshot(builder.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(response: &Response) -> String {
    response
        .headers()
        .get(header::LOCATION)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

fn set_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string()
}

async fn json_body(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

async fn start_login(app: &Router) -> Started {
    let response = get(app, "/auth/login-start", None).await;
    assert!(response.status().is_redirection());

    let cookie_header = set_cookie(&response);
    let cookie = cookie_header
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix(&format!("{}=", LOGIN_COOKIE_NAME)))
        .unwrap()
        .to_string();

    let url = Url::parse(&location(&response)).unwrap();
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
            .unwrap()
    };

    Started {
        cookie,
        state: param("state"),
        nonce: param("nonce"),
    }
}

fn callback_uri(code: &str, state: &str) -> String {
    format!(
        "/auth/login-callback?code={}&state={}",
        urlencoding::encode(code),
        urlencoding::encode(state)
    )
}

async fn account_count(state: &AppState) -> i64 {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
        .fetch_one(&state.db)
        .await
        .unwrap();
    count
}

/// Extract the credential from `{frontend}/auth/callback?token=<credential>`
fn token_from_redirect(target: &str) -> String {
    let url = Url::parse(target).unwrap();
    assert_eq!(url.path(), "/auth/callback");
    url.query_pairs()
        .find(|(k, _)| k == "token")
        .map(|(_, v)| v.into_owned())
        .unwrap()
}

#[tokio::test]
async fn test_login_start_redirects_with_state_and_cookie() {
    let (app, _) = harness().await;
    let response = get(&app, "/auth/login-start", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with(&format!("{}=", LOGIN_COOKIE_NAME)));
    assert!(cookie.contains("HttpOnly"));

    let target = Url::parse(&location(&response)).unwrap();
    assert_eq!(target.path(), "/auth");
    let params: Vec<(String, String)> = target.query_pairs().into_owned().collect();
    let has = |k: &str| params.iter().any(|(key, v)| key == k && !v.is_empty());
    assert!(has("state"));
    assert!(has("nonce"));
    assert!(params.contains(&("client_id".to_string(), "test-client-id".to_string())));
    assert!(params.contains(&("response_type".to_string(), "code".to_string())));
}

#[tokio::test]
async fn test_successful_login_creates_editor_and_issues_credential() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-100", "writer@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    let target = location(&response);
    assert!(target.starts_with("http://localhost:3000/auth/callback?token="));

    let claims = state.credentials.verify(&token_from_redirect(&target)).unwrap();
    assert_eq!(claims.identity.sub, "g-100");
    assert_eq!(claims.identity.email, "writer@example.com");
    assert_eq!(claims.identity.role, Role::Editor);
    assert_eq!(claims.identity.name.as_deref(), Some("User g-100"));
    assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    assert_eq!(account_count(&state).await, 1);
}

#[tokio::test]
async fn test_allow_listed_email_becomes_admin() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-boss", "Boss@Example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;

    let claims = state
        .credentials
        .verify(&token_from_redirect(&location(&response)))
        .unwrap();
    assert_eq!(claims.identity.role, Role::Admin);
}

#[tokio::test]
async fn test_missing_name_falls_back_to_email() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-200", "noname@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;

    let claims = state
        .credentials
        .verify(&token_from_redirect(&location(&response)))
        .unwrap();
    assert_eq!(claims.identity.name.as_deref(), Some("noname@example.com"));
}

#[tokio::test]
async fn test_state_mismatch_is_rejected_without_side_effects() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-300", "x@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, "forged-state"), Some(&started.cookie)).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_callback_without_cookie_is_rejected() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-301", "x@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), None).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_missing_code_is_rejected() {
    let (app, _) = harness().await;
    let started = start_login(&app).await;

    let uri = format!("/auth/login-callback?state={}", started.state);
    let response = get(&app, &uri, Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_provider_error_is_rejected() {
    let (app, _) = harness().await;
    let started = start_login(&app).await;

    let uri = format!(
        "/auth/login-callback?error=access_denied&state={}",
        started.state
    );
    let response = get(&app, &uri, Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_login_transaction_cannot_be_replayed() {
    let (app, _) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-400", "replay@example.com", &started.nonce);
    let uri = callback_uri(&code, &started.state);

    let first = get(&app, &uri, Some(&started.cookie)).await;
    assert_eq!(first.status(), StatusCode::SEE_OTHER);

    let second = get(&app, &uri, Some(&started.cookie)).await;
    assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(second).await["code"], "INVALID_STATE");
}

#[tokio::test]
async fn test_failed_exchange_creates_no_account() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let response = get(&app, &callback_uri("bad", &started.state), Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["code"], "EXCHANGE_FAILED");
    assert_eq!(body["error"], "token_exchange_failed");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_missing_id_token_creates_no_account() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let response = get(
        &app,
        &callback_uri("no-id-token", &started.state),
        Some(&started.cookie),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "missing_id_token");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_nonce_mismatch_is_identity_token_invalid() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("g-500", "n@example.com", "some-other-nonce");
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["error"], "id_token_invalid");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_foreign_audience_is_identity_token_invalid() {
    let (app, state) = harness().await;
    let started = start_login(&app).await;

    let code = fake_provider::code_for("wrong-aud", "aud@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(json_body(response).await["code"], "IDENTITY_TOKEN_INVALID");
    assert_eq!(account_count(&state).await, 0);
}

#[tokio::test]
async fn test_repeat_login_reuses_account() {
    let (app, state) = harness().await;

    for _ in 0..2 {
        let started = start_login(&app).await;
        let code = fake_provider::code_for("g-600", "again@example.com", &started.nonce);
        let response =
            get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
    }

    assert_eq!(account_count(&state).await, 1);
}

#[tokio::test]
async fn test_session_reports_credential_status() {
    let (app, state) = harness().await;

    let response = get(&app, "/api/session", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["authenticated"], false);

    let started = start_login(&app).await;
    let code = fake_provider::code_for("g-700", "me@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;
    let token = token_from_redirect(&location(&response));

    let request = Request::builder()
        .uri("/api/me")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let body = json_body(response).await;
    assert_eq!(body["authenticated"], true);
    assert_eq!(body["user"]["email"], "me@example.com");
    assert_eq!(body["user"]["role"], "editor");
    assert!(state.credentials.verify(&token).is_ok());

    let request = Request::builder()
        .uri("/api/session")
        .header(header::AUTHORIZATION, "Bearer garbage")
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await["authenticated"], false);
}

#[tokio::test]
async fn test_logout_clears_pending_login() {
    let (app, _) = harness().await;
    let started = start_login(&app).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/auth/logout")
        .header(
            header::COOKIE,
            format!("{}={}", LOGIN_COOKIE_NAME, started.cookie),
        )
        .body(Body::empty())
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(set_cookie(&response).contains("Max-Age=0"));
    assert_eq!(json_body(response).await["ok"], true);

    let code = fake_provider::code_for("g-800", "gone@example.com", &started.nonce);
    let response = get(&app, &callback_uri(&code, &started.state), Some(&started.cookie)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_login_without_provider_credentials_is_not_configured() {
    let mut config = AppConfig::for_tests("http://127.0.0.1:9");
    config.google.client_id = None;
    let state = Arc::new(AppState::new(setup_test_db().await, config, Client::new()));
    let app = build_router(state);

    let response = get(&app, "/auth/login-start", None).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json_body(response).await["code"], "NOT_CONFIGURED");
}
