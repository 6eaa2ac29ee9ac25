//! Account directory: maps a provider identity onto a local account

use chrono::Utc;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::models::{Account, Role, VerifiedIdentity};
use crate::common::{generate_user_id, is_unique_violation, safe_email_log, ApiError, AppConfig};

/// Lookup-then-insert rounds before giving up on a contended identity
const MAX_UPSERT_ATTEMPTS: usize = 3;

pub struct AccountDirectory {
    db: SqlitePool,
    config: Arc<AppConfig>,
}

impl AccountDirectory {
    pub fn new(db: SqlitePool, config: Arc<AppConfig>) -> Self {
        Self { db, config }
    }

    /// Create the account on first login, refresh its profile afterwards.
    ///
    /// The UNIQUE constraints on `provider_id` and `email` arbitrate
    /// concurrent first logins: the loser's insert is rejected and it
    /// retries through the refresh path.
    pub async fn upsert(&self, identity: &VerifiedIdentity) -> Result<Account, ApiError> {
        for attempt in 1..=MAX_UPSERT_ATTEMPTS {
            if let Some(existing) = self.find_by_provider_id(&identity.subject).await? {
                if let Some(account) = self.refresh(&existing.id, identity).await? {
                    debug!(user_id = %account.id, "Refreshed existing account");
                    return Ok(account);
                }
                continue;
            }

            if let Some(account) = self.try_insert(identity).await? {
                info!(
                    user_id = %account.id,
                    email = %safe_email_log(&account.email),
                    role = %account.role,
                    "Created account on first login"
                );
                return Ok(account);
            }

            debug!(
                attempt,
                provider_id = %identity.subject,
                "Account insert lost a uniqueness race, retrying as update"
            );
        }

        warn!(
            provider_id = %identity.subject,
            email = %safe_email_log(&identity.email),
            "Could not resolve account; email is linked to a different identity"
        );
        Err(ApiError::Conflict(
            "email already linked to another account".to_string(),
        ))
    }

    pub async fn find_by_provider_id(
        &self,
        provider_id: &str,
    ) -> Result<Option<Account>, ApiError> {
        let account = sqlx::query_as::<_, Account>("SELECT * FROM users WHERE provider_id = ?")
            .bind(provider_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    fn initial_role(&self, email: &str) -> Role {
        if self.config.is_admin_email(email) {
            Role::Admin
        } else {
            Role::Editor
        }
    }

    /// Insert a new account; `Ok(None)` when a UNIQUE constraint rejected it
    pub(crate) async fn try_insert(
        &self,
        identity: &VerifiedIdentity,
    ) -> Result<Option<Account>, ApiError> {
        let result = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (id, provider_id, email, name, avatar, role, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(generate_user_id())
        .bind(&identity.subject)
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(identity.picture.as_deref())
        .bind(self.initial_role(&identity.email))
        .bind(Utc::now().to_rfc3339())
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(account) => Ok(Some(account)),
            Err(e) if is_unique_violation(&e) => Ok(None),
            Err(e) => Err(ApiError::DatabaseError(e)),
        }
    }

    /// Overwrite profile fields with non-empty values; role, identity id and
    /// creation time are left alone
    async fn refresh(
        &self,
        account_id: &str,
        identity: &VerifiedIdentity,
    ) -> Result<Option<Account>, ApiError> {
        let result = sqlx::query_as::<_, Account>(
            r#"
            UPDATE users SET
                email = COALESCE(NULLIF(?, ''), email),
                name = COALESCE(NULLIF(?, ''), name),
                avatar = COALESCE(NULLIF(?, ''), avatar)
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&identity.email)
        .bind(&identity.name)
        .bind(identity.picture.as_deref())
        .bind(account_id)
        .fetch_optional(&self.db)
        .await;

        match result {
            Ok(account) => Ok(account),
            Err(e) if is_unique_violation(&e) => Err(ApiError::Conflict(
                "email already linked to another account".to_string(),
            )),
            Err(e) => Err(ApiError::DatabaseError(e)),
        }
    }
}
