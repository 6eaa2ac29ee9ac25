// src/common/config.rs
//! Process configuration
//!
//! Built once at startup from the environment and shared read-only
//! through `AppState`.

use chrono::Duration;
use std::collections::HashSet;
use std::env;
use tracing::warn;

const DEFAULT_JWT_SECRET: &str = "dev-jwt-secret";

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_TOKENINFO_URL: &str = "https://www.googleapis.com/oauth2/v3/tokeninfo";

/// Identity provider client settings
#[derive(Debug, Clone)]
pub struct GoogleConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub redirect_uri: String,
    pub auth_url: String,
    pub token_url: String,
    pub tokeninfo_url: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub credential_ttl: Duration,
    pub frontend_origin: String,
    pub admin_emails: HashSet<String>,
    pub google: GoogleConfig,
    pub login_transaction_ttl: Duration,
    pub cookie_secure: bool,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(4000);

        let jwt_secret = env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using development secret");
            DEFAULT_JWT_SECRET.to_string()
        });

        let credential_ttl_minutes = env::var("CREDENTIAL_TTL_MINUTES")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(60 * 24);

        let login_transaction_ttl_seconds = env::var("LOGIN_TRANSACTION_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .filter(|v| *v > 0)
            .unwrap_or(600);

        let google = GoogleConfig {
            client_id: non_empty_var("GOOGLE_CLIENT_ID"),
            client_secret: non_empty_var("GOOGLE_CLIENT_SECRET"),
            redirect_uri: env::var("GOOGLE_REDIRECT_URI")
                .unwrap_or_else(|_| format!("http://localhost:{}/auth/google/callback", port)),
            auth_url: env::var("GOOGLE_AUTH_URL").unwrap_or_else(|_| GOOGLE_AUTH_URL.to_string()),
            token_url: env::var("GOOGLE_TOKEN_URL")
                .unwrap_or_else(|_| GOOGLE_TOKEN_URL.to_string()),
            tokeninfo_url: env::var("GOOGLE_TOKENINFO_URL")
                .unwrap_or_else(|_| GOOGLE_TOKENINFO_URL.to_string()),
        };

        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://blog_api.db".to_string()),
            port,
            jwt_secret,
            credential_ttl: Duration::minutes(credential_ttl_minutes),
            frontend_origin: env::var("FRONTEND_ORIGIN")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            admin_emails: parse_admin_emails(&env::var("ADMIN_EMAILS").unwrap_or_default()),
            google,
            login_transaction_ttl: Duration::seconds(login_transaction_ttl_seconds),
            cookie_secure: env::var("COOKIE_SECURE")
                .map(|v| v.eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        }
    }

    /// Case-insensitive membership test against the admin allow-list
    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails.contains(&email.trim().to_lowercase())
    }
}

/// Parse admin emails from a comma-separated list
pub fn parse_admin_emails(raw: &str) -> HashSet<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
impl AppConfig {
    /// Configuration for tests; provider endpoints point at `provider_base`.
    pub fn for_tests(provider_base: &str) -> Self {
        Self {
            database_url: "sqlite::memory:".to_string(),
            port: 4000,
            jwt_secret: "test_secret_key".to_string(),
            credential_ttl: Duration::hours(24),
            frontend_origin: "http://localhost:3000".to_string(),
            admin_emails: parse_admin_emails("boss@example.com"),
            google: GoogleConfig {
                client_id: Some("test-client-id".to_string()),
                client_secret: Some("test-client-secret".to_string()),
                redirect_uri: "http://localhost:4000/auth/google/callback".to_string(),
                auth_url: format!("{}/auth", provider_base),
                token_url: format!("{}/token", provider_base),
                tokeninfo_url: format!("{}/tokeninfo", provider_base),
            },
            login_transaction_ttl: Duration::seconds(600),
            cookie_secure: false,
        }
    }
}
