//! Authentication routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers;

/// Creates and returns the authentication router
///
/// # Routes
/// - `GET /auth/login-start` - Redirect to Google (alias `/auth/google`)
/// - `GET /auth/login-callback` - OAuth callback (alias `/auth/google/callback`)
/// - `POST /auth/logout` - Drop pending login state
/// - `GET /api/session` - Credential status (alias `/api/me`)
pub fn auth_routes() -> Router {
    Router::new()
        .route("/auth/login-start", get(handlers::login_start))
        .route("/auth/google", get(handlers::login_start))
        .route("/auth/login-callback", get(handlers::login_callback))
        .route("/auth/google/callback", get(handlers::login_callback))
        .route("/auth/logout", post(handlers::logout))
        .route("/api/session", get(handlers::session))
        .route("/api/me", get(handlers::session))
}
