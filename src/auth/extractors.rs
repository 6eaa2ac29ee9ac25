//! Access control guard and authenticated-user extractor
//!
//! `require_credential` is an axum middleware that wraps protected routes:
//! it reads the bearer credential, verifies it, checks the route's allowed
//! roles and attaches the claims to the request before the handler runs.
//! Authorization is purely claims-based; the account table is not consulted.

use async_trait::async_trait;
use axum::{
    extract::{Extension, FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

use super::credentials::CredentialCodec;
use super::models::{Claims, Role};
use crate::common::{safe_email_log, ApiError, AppState};

/// Roles allowed through a guarded route; `None` admits any valid credential
#[derive(Debug, Clone, Default)]
pub struct AccessPolicy {
    allowed_roles: Option<Vec<Role>>,
}

impl AccessPolicy {
    pub fn authenticated() -> Self {
        Self {
            allowed_roles: None,
        }
    }

    pub fn roles(roles: &[Role]) -> Self {
        Self {
            allowed_roles: Some(roles.to_vec()),
        }
    }

    pub fn admits(&self, role: Role) -> bool {
        self.allowed_roles
            .as_ref()
            .map_or(true, |roles| roles.contains(&role))
    }
}

/// Extract the token from `Authorization: Bearer <token>`
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, ApiError> {
    let header = headers
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| ApiError::Unauthenticated("Unauthorized".to_string()))?;

    header
        .strip_prefix("Bearer ")
        .ok_or_else(|| ApiError::Unauthenticated("Unauthorized".to_string()))
}

/// Verify the request's credential and apply `policy`
pub fn authorize(
    headers: &HeaderMap,
    codec: &CredentialCodec,
    policy: &AccessPolicy,
) -> Result<Claims, ApiError> {
    let token = bearer_token(headers)?;
    let claims = codec.verify(token)?;

    if !policy.admits(claims.identity.role) {
        warn!(
            user_id = %claims.identity.uid,
            role = %claims.identity.role,
            "Role not permitted for this operation"
        );
        return Err(ApiError::Forbidden("Forbidden".to_string()));
    }

    Ok(claims)
}

/// Guard middleware; use with `middleware::from_fn_with_state(policy, require_credential)`
pub async fn require_credential(
    State(policy): State<AccessPolicy>,
    Extension(state): Extension<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims = authorize(request.headers(), &state.credentials, &policy)?;

    debug!(
        user_id = %claims.identity.uid,
        email = %safe_email_log(&claims.identity.email),
        role = %claims.identity.role,
        "Request authorized"
    );

    request.extensions_mut().insert(AuthedUser { claims });
    Ok(next.run(request).await)
}

/// Verified caller identity for handlers behind `require_credential`
#[derive(Debug, Clone)]
pub struct AuthedUser {
    pub claims: Claims,
}

impl AuthedUser {
    pub fn id(&self) -> &str {
        &self.claims.identity.uid
    }

    pub fn role(&self) -> Role {
        self.claims.identity.role
    }

    pub fn is_admin(&self) -> bool {
        self.role() == Role::Admin
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthedUser>() {
            return Ok(user.clone());
        }

        // Not behind the guard: verify here with no role restriction
        let Extension(app_state): Extension<Arc<AppState>> =
            Extension::from_request_parts(parts, state)
                .await
                .map_err(|_| ApiError::InternalServer("missing app state".to_string()))?;

        let claims = authorize(
            &parts.headers,
            &app_state.credentials,
            &AccessPolicy::authenticated(),
        )?;
        Ok(AuthedUser { claims })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::models::IdentityClaims;
    use axum::http::HeaderValue;
    use chrono::Duration;

    fn codec() -> CredentialCodec {
        CredentialCodec::new("test_secret_key", Duration::hours(1))
    }

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_str(value).unwrap());
        headers
    }

    fn token_for(role: Role) -> String {
        codec()
            .issue(&IdentityClaims {
                sub: "g-1".to_string(),
                uid: "U_GUARD001".to_string(),
                email: "guard@example.com".to_string(),
                name: None,
                picture: None,
                role,
            })
            .unwrap()
    }

    #[test]
    fn test_missing_header_is_unauthenticated() {
        let result = authorize(&HeaderMap::new(), &codec(), &AccessPolicy::authenticated());
        assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
    }

    #[test]
    fn test_non_bearer_scheme_is_unauthenticated() {
        let token = token_for(Role::Admin);
        for value in [token.clone(), format!("Basic {}", token), format!("bearer {}", token)] {
            let result = authorize(&headers_with(&value), &codec(), &AccessPolicy::authenticated());
            assert!(matches!(result, Err(ApiError::Unauthenticated(_))));
        }
    }

    #[test]
    fn test_bad_signature_is_invalid_credential() {
        let result = authorize(
            &headers_with("Bearer abc.def.ghi"),
            &codec(),
            &AccessPolicy::authenticated(),
        );
        assert!(matches!(result, Err(ApiError::InvalidCredential(_))));
    }

    #[test]
    fn test_role_outside_policy_is_forbidden() {
        let headers = headers_with(&format!("Bearer {}", token_for(Role::Editor)));
        let result = authorize(&headers, &codec(), &AccessPolicy::roles(&[Role::Admin]));
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[test]
    fn test_role_inside_policy_passes_claims_through() {
        let headers = headers_with(&format!("Bearer {}", token_for(Role::Editor)));
        let claims = authorize(
            &headers,
            &codec(),
            &AccessPolicy::roles(&[Role::Admin, Role::Editor]),
        )
        .unwrap();
        assert_eq!(claims.identity.uid, "U_GUARD001");
        assert_eq!(claims.identity.role, Role::Editor);
    }
}
