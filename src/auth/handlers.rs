//! Authentication handlers

use axum::{
    extract::{Extension, Json, Query},
    http::{header::SET_COOKIE, HeaderMap},
    response::{IntoResponse, Redirect, Response},
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::directory::AccountDirectory;
use super::extractors::bearer_token;
use super::login_state::{
    clear_login_cookie, extract_login_cookie, login_cookie, LoginTransactions,
};
use super::models::{CallbackParams, SessionResponse};
use crate::common::{safe_email_log, safe_token_log, ApiError, AppState};
use crate::services::google::GoogleError;

/// GET /auth/login-start
/// Starts a federated login: stores a fresh state/nonce pair and redirects
/// the browser to the provider's authorization page.
pub async fn login_start(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if !state.google_service.is_configured() {
        warn!("Login attempted without Google OAuth credentials configured");
        return Err(GoogleError::NotConfigured.into());
    }

    let ttl = state.config.login_transaction_ttl;
    let transactions = LoginTransactions::new(state.db.clone());

    // A new attempt from the same browser supersedes the previous one
    if let Some(previous) = extract_login_cookie(&headers) {
        transactions.discard(&previous).await?;
    }
    if let Err(e) = transactions.purge_expired(ttl).await {
        warn!(error = %e, "Failed to purge expired login transactions");
    }

    let transaction = transactions.begin().await?;
    let auth_url = state
        .google_service
        .authorization_url(&transaction.state, &transaction.nonce)?;
    let cookie = login_cookie(&transaction.id, ttl, state.config.cookie_secure)?;

    debug!("Redirecting to Google authorization endpoint");
    Ok(([(SET_COOKIE, cookie)], Redirect::to(&auth_url)).into_response())
}

/// GET /auth/login-callback?code=&state=
/// On success redirects to `{frontend}/auth/callback?token=<credential>`;
/// on failure returns a JSON error. The login transaction cookie is cleared
/// either way.
pub async fn login_callback(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Query(params): Query<CallbackParams>,
) -> Response {
    let clear_cookie = [(SET_COOKIE, clear_login_cookie(state.config.cookie_secure))];

    match complete_login(&state, &headers, params).await {
        Ok(token) => {
            let target = format!(
                "{}/auth/callback?token={}",
                state.config.frontend_origin.trim_end_matches('/'),
                urlencoding::encode(&token)
            );
            (clear_cookie, Redirect::to(&target)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "Login callback failed");
            (clear_cookie, e).into_response()
        }
    }
}

async fn complete_login(
    state: &AppState,
    headers: &HeaderMap,
    params: CallbackParams,
) -> Result<String, ApiError> {
    // Consume the transaction before anything else so it can never be replayed
    let transactions = LoginTransactions::new(state.db.clone());
    let stored = match extract_login_cookie(headers) {
        Some(id) => transactions.take(&id, state.config.login_transaction_ttl).await?,
        None => None,
    };

    if let Some(error) = params.error.as_deref() {
        warn!(oauth_error = %error, "Google OAuth returned error");
        return Err(ApiError::InvalidState(
            "Authorization was not granted".to_string(),
        ));
    }

    let code = params.code.as_deref().filter(|c| !c.is_empty());
    let returned_state = params.state.as_deref().filter(|s| !s.is_empty());
    let (code, returned_state, stored) = match (code, returned_state, stored) {
        (Some(code), Some(returned), Some(stored)) if stored.state == returned => {
            (code, returned, stored)
        }
        _ => {
            warn!("Login callback state mismatch or missing code/state");
            return Err(ApiError::InvalidState("Invalid state or code".to_string()));
        }
    };
    debug!(state = %safe_token_log(returned_state), "Login callback state verified");

    let id_token = state.google_service.exchange_code(code).await?;
    let identity = state
        .google_service
        .verify_id_token(&id_token, &stored.nonce)
        .await?;

    let directory = AccountDirectory::new(state.db.clone(), state.config.clone());
    let account = directory.upsert(&identity).await?;
    let token = state.credentials.issue(&account.identity_claims())?;

    info!(
        user_id = %account.id,
        email = %safe_email_log(&account.email),
        role = %account.role,
        provider = "google",
        "User authentication successful via Google OAuth"
    );

    Ok(token)
}

/// GET /api/session (alias GET /api/me)
/// Reports whether the caller holds a valid credential. Never fails.
pub async fn session(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Json<SessionResponse> {
    let claims = bearer_token(&headers)
        .ok()
        .and_then(|token| state.credentials.verify(token).ok());

    Json(SessionResponse {
        authenticated: claims.is_some(),
        user: claims,
    })
}

/// POST /auth/logout
/// Credentials are stateless, so logout only drops any pending login
/// transaction; the client discards its token.
pub async fn logout(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    if let Some(id) = extract_login_cookie(&headers) {
        LoginTransactions::new(state.db.clone()).discard(&id).await?;
    }

    let clear_cookie = [(SET_COOKIE, clear_login_cookie(state.config.cookie_secure))];
    Ok((clear_cookie, Json(serde_json::json!({ "ok": true }))).into_response())
}
