//! Bearer credential codec
//!
//! Credentials are HS256 JWTs signed with the process-wide `JWT_SECRET`.
//! They are self-contained: verification never consults the account store,
//! and expiry is the only way a credential stops being accepted.

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use tracing::{debug, error};

use super::models::{Claims, IdentityClaims};
use crate::common::ApiError;

#[derive(Clone)]
pub struct CredentialCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    lifetime: Duration,
}

impl CredentialCodec {
    pub fn new(secret: &str, lifetime: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            lifetime,
        }
    }

    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a credential valid for the configured lifetime
    pub fn issue(&self, identity: &IdentityClaims) -> Result<String, ApiError> {
        self.issue_with_lifetime(identity, self.lifetime)
    }

    pub fn issue_with_lifetime(
        &self,
        identity: &IdentityClaims,
        lifetime: Duration,
    ) -> Result<String, ApiError> {
        let now = Utc::now();
        let claims = Claims {
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            identity: identity.clone(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, user_id = %identity.uid, "JWT encoding error");
            ApiError::InternalServer("jwt error".to_string())
        })
    }

    /// Check signature, structure and expiry; returns the embedded claims
    pub fn verify(&self, token: &str) -> Result<Claims, ApiError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        let decoded = decode::<Claims>(token, &self.decoding_key, &validation).map_err(|e| {
            debug!(error = %e, "JWT token validation failed");
            ApiError::InvalidCredential(e.to_string())
        })?;

        // A credential is dead at its expiry second, not one second later.
        if decoded.claims.exp <= Utc::now().timestamp() {
            debug!(exp = decoded.claims.exp, "JWT token reached expiry");
            return Err(ApiError::InvalidCredential("ExpiredSignature".to_string()));
        }

        Ok(decoded.claims)
    }
}
