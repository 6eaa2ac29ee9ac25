//! Login transaction state (state/nonce pair) for the federated login flow.
//!
//! Each `login-start` stores a fresh row keyed by an opaque transaction id
//! that travels in an `HttpOnly` cookie. The callback consumes the row with
//! a single `DELETE … RETURNING`, so a transaction is usable at most once.

use axum::http::{header::COOKIE, HeaderMap, HeaderValue};
use chrono::{Duration, Utc};
use sqlx::{FromRow, SqlitePool};
use tracing::{debug, error};

use crate::common::{random_url_token, ApiError};

pub const LOGIN_COOKIE_NAME: &str = "blog_login_txn";

#[derive(Debug, Clone, FromRow)]
pub struct LoginTransaction {
    pub id: String,
    pub state: String,
    pub nonce: String,
    pub created_at: i64,
}

pub struct LoginTransactions {
    db: SqlitePool,
}

impl LoginTransactions {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Generate and persist a new state/nonce pair
    pub async fn begin(&self) -> Result<LoginTransaction, ApiError> {
        let transaction = LoginTransaction {
            id: random_url_token(32),
            state: random_url_token(16),
            nonce: random_url_token(16),
            created_at: Utc::now().timestamp(),
        };

        sqlx::query(
            "INSERT INTO login_transactions (id, state, nonce, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(&transaction.id)
        .bind(&transaction.state)
        .bind(&transaction.nonce)
        .bind(transaction.created_at)
        .execute(&self.db)
        .await?;

        Ok(transaction)
    }

    /// Remove and return the transaction. Expired rows are removed but not returned.
    pub async fn take(
        &self,
        id: &str,
        ttl: Duration,
    ) -> Result<Option<LoginTransaction>, ApiError> {
        let transaction = sqlx::query_as::<_, LoginTransaction>(
            "DELETE FROM login_transactions WHERE id = ? RETURNING id, state, nonce, created_at",
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;

        Ok(transaction.filter(|t| {
            let alive = t.created_at + ttl.num_seconds() > Utc::now().timestamp();
            if !alive {
                debug!("Login transaction expired before callback");
            }
            alive
        }))
    }

    pub async fn discard(&self, id: &str) -> Result<(), ApiError> {
        sqlx::query("DELETE FROM login_transactions WHERE id = ?")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    /// Drop abandoned transactions older than `ttl`
    pub async fn purge_expired(&self, ttl: Duration) -> Result<u64, ApiError> {
        let cutoff = Utc::now().timestamp() - ttl.num_seconds();
        let result = sqlx::query("DELETE FROM login_transactions WHERE created_at <= ?")
            .bind(cutoff)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

/// `HttpOnly` cookie carrying the transaction id for the duration of the login
pub fn login_cookie(id: &str, ttl: Duration, secure: bool) -> Result<HeaderValue, ApiError> {
    let mut cookie = format!(
        "{LOGIN_COOKIE_NAME}={id}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        ttl.num_seconds()
    );
    if secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie).map_err(|e| {
        error!(error = %e, "Failed to build login cookie");
        ApiError::InternalServer("invalid cookie value".to_string())
    })
}

pub fn clear_login_cookie(secure: bool) -> HeaderValue {
    let cookie = if secure {
        format!("{LOGIN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0; Secure")
    } else {
        format!("{LOGIN_COOKIE_NAME}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
    };
    HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static(""))
}

/// Read the transaction id from the `Cookie` header(s)
pub fn extract_login_cookie(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, value)| *key == LOGIN_COOKIE_NAME && !value.is_empty())
        .map(|(_, value)| value.to_string())
}
