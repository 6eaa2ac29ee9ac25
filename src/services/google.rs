// src/services/google.rs
//! Google OAuth2 / OpenID Connect client used by the login flow

use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::auth::models::VerifiedIdentity;
use crate::common::config::GoogleConfig;
use crate::common::ApiError;

/// Upper bound for every outbound provider call
pub const PROVIDER_TIMEOUT: Duration = Duration::from_secs(10);

const SCOPES: &str = "openid email profile";

#[derive(Debug, Error)]
pub enum GoogleError {
    #[error("Google OAuth not configured")]
    NotConfigured,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Token response did not include an id_token")]
    MissingIdToken,

    #[error("ID token invalid: {0}")]
    IdTokenInvalid(String),
}

impl From<GoogleError> for ApiError {
    fn from(e: GoogleError) -> Self {
        match e {
            GoogleError::NotConfigured => {
                ApiError::NotConfigured("Missing GOOGLE_CLIENT_ID/SECRET".to_string())
            }
            GoogleError::ExchangeFailed(detail) => ApiError::ExchangeFailed(detail),
            GoogleError::MissingIdToken => ApiError::MissingIdentityToken,
            GoogleError::IdTokenInvalid(detail) => ApiError::IdentityTokenInvalid(detail),
        }
    }
}

/// Token endpoint response; the other fields Google returns are ignored
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub id_token: Option<String>,
}

/// Claims returned by the tokeninfo endpoint
#[derive(Debug, Deserialize)]
pub struct TokenInfo {
    pub sub: Option<String>,
    pub email: Option<String>,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub aud: Option<String>,
    pub nonce: Option<String>,
}

#[derive(Debug, Clone)]
pub struct GoogleService {
    config: GoogleConfig,
    client: Client,
    timeout: Duration,
}

impl GoogleService {
    pub fn new(config: GoogleConfig, client: Client) -> Self {
        Self {
            config,
            client,
            timeout: PROVIDER_TIMEOUT,
        }
    }

    #[cfg(test)]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn credentials(&self) -> Result<(&str, &str), GoogleError> {
        match (&self.config.client_id, &self.config.client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(GoogleError::NotConfigured),
        }
    }

    pub fn is_configured(&self) -> bool {
        self.credentials().is_ok()
    }

    /// Authorization URL for the browser redirect
    pub fn authorization_url(&self, state: &str, nonce: &str) -> Result<String, GoogleError> {
        let (client_id, _) = self.credentials()?;

        let params = [
            ("client_id", client_id),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("response_type", "code"),
            ("scope", SCOPES),
            ("access_type", "offline"),
            ("include_granted_scopes", "true"),
            ("state", state),
            ("nonce", nonce),
            ("prompt", "consent"),
        ];

        let query = params
            .iter()
            .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{}?{}", self.config.auth_url, query))
    }

    /// Exchange an authorization code for the provider's ID token
    pub async fn exchange_code(&self, code: &str) -> Result<String, GoogleError> {
        let (client_id, client_secret) = self.credentials()?;

        let params = [
            ("code", code),
            ("client_id", client_id),
            ("client_secret", client_secret),
            ("redirect_uri", self.config.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        debug!("Exchanging authorization code for tokens");

        let response = self
            .client
            .post(&self.config.token_url)
            .form(&params)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GoogleError::ExchangeFailed(describe_request_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, error = %error_text, "Token exchange failed");
            return Err(GoogleError::ExchangeFailed(error_text));
        }

        let tokens = response.json::<TokenResponse>().await.map_err(|e| {
            error!(error = %e, "Malformed token endpoint response");
            GoogleError::ExchangeFailed("malformed token response".to_string())
        })?;

        tokens
            .id_token
            .filter(|t| !t.is_empty())
            .ok_or(GoogleError::MissingIdToken)
    }

    /// Validate an ID token with the tokeninfo endpoint and extract the identity
    pub async fn verify_id_token(
        &self,
        id_token: &str,
        expected_nonce: &str,
    ) -> Result<VerifiedIdentity, GoogleError> {
        let (client_id, _) = self.credentials()?;

        let response = self
            .client
            .get(&self.config.tokeninfo_url)
            .query(&[("id_token", id_token)])
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| GoogleError::IdTokenInvalid(describe_request_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            warn!(status = %status, error = %error_text, "Google tokeninfo rejected id_token");
            return Err(GoogleError::IdTokenInvalid(error_text));
        }

        let info = response.json::<TokenInfo>().await.map_err(|e| {
            error!(error = %e, "Malformed tokeninfo response");
            GoogleError::IdTokenInvalid("malformed tokeninfo response".to_string())
        })?;

        identity_from_token_info(info, client_id, expected_nonce)
    }
}

/// Apply audience/nonce checks and normalize the profile fields
pub fn identity_from_token_info(
    info: TokenInfo,
    client_id: &str,
    expected_nonce: &str,
) -> Result<VerifiedIdentity, GoogleError> {
    if info.aud.as_deref() != Some(client_id) {
        warn!(token_audience = ?info.aud, "Google token audience mismatch");
        return Err(GoogleError::IdTokenInvalid("audience mismatch".to_string()));
    }

    if let Some(nonce) = &info.nonce {
        if nonce != expected_nonce {
            warn!("Google token nonce mismatch");
            return Err(GoogleError::IdTokenInvalid("nonce mismatch".to_string()));
        }
    }

    let subject = info
        .sub
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GoogleError::IdTokenInvalid("missing subject".to_string()))?;
    let email = info
        .email
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GoogleError::IdTokenInvalid("missing email".to_string()))?;
    let name = info
        .name
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| email.clone());

    Ok(VerifiedIdentity {
        subject,
        email,
        name,
        picture: info.picture.filter(|s| !s.is_empty()),
    })
}

/// Request errors without the URL, which may carry the id_token
fn describe_request_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "request to identity provider timed out".to_string()
    } else {
        e.without_url().to_string()
    }
}
