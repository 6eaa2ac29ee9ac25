// Application state shared across all modules

use reqwest::Client;
use sqlx::SqlitePool;
use std::sync::Arc;

use super::config::AppConfig;
use crate::auth::credentials::CredentialCodec;
use crate::services::GoogleService;

/// Database pool, services and configuration, built once in `main`
#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub credentials: CredentialCodec,
    pub google_service: GoogleService,
}

impl AppState {
    pub fn new(db: SqlitePool, config: AppConfig, http: Client) -> Self {
        let credentials = CredentialCodec::new(&config.jwt_secret, config.credential_ttl);
        let google_service = GoogleService::new(config.google.clone(), http);
        Self {
            db,
            config: Arc::new(config),
            credentials,
            google_service,
        }
    }
}

#[cfg(test)]
pub mod test_support {
    use super::*;
    use crate::common::migrations::test_support::setup_test_db;

    /// State over a fresh in-memory database, with provider endpoints at `provider_base`
    pub async fn test_state(provider_base: &str) -> Arc<AppState> {
        let db = setup_test_db().await;
        Arc::new(AppState::new(
            db,
            AppConfig::for_tests(provider_base),
            Client::new(),
        ))
    }
}
