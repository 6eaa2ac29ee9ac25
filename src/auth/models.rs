//! Authentication data models

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// Account role; only `Admin` may delete posts or edit other authors' posts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Editor => "editor",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity claims carried by a bearer credential
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct IdentityClaims {
    /// External identity id assigned by the provider
    pub sub: String,
    /// Local account id
    pub uid: String,
    pub email: String,
    pub name: Option<String>,
    pub picture: Option<String>,
    pub role: Role,
}

/// Full credential payload: identity claims plus validity window (epoch seconds)
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Claims {
    pub iat: i64,
    pub exp: i64,
    #[serde(flatten)]
    pub identity: IdentityClaims,
}

/// Account database model
#[derive(FromRow, Serialize, Deserialize, Debug, Clone)]
pub struct Account {
    pub id: String,
    pub provider_id: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl Account {
    pub fn identity_claims(&self) -> IdentityClaims {
        IdentityClaims {
            sub: self.provider_id.clone(),
            uid: self.id.clone(),
            email: self.email.clone(),
            name: self.name.clone(),
            picture: self.avatar.clone(),
            role: self.role,
        }
    }
}

/// Identity asserted by the provider after token verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    pub subject: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
}

/// Query parameters delivered to the login callback
#[derive(Deserialize, Debug, Default)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// `GET /api/session` response
#[derive(Serialize, Debug)]
pub struct SessionResponse {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<Claims>,
}
