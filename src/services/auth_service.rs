use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::PgPool;

use crate::auth::{self, Claims};
use crate::config;
use crate::database::models::user::User;
use crate::error::ApiError;
use crate::services::user_service;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub access_token: String,
    pub refresh_token: String,
    pub user: User,
}

/// Authenticate a user and issue a token pair.
///
/// Consecutive failed attempts are tracked on the user row; reaching the
/// configured maximum opens a lockout window during which every attempt -
/// correct password included - is rejected with ACCOUNT_LOCKED.
pub async fn login(pool: &PgPool, email: &str, password: &str) -> Result<LoginOutcome, ApiError> {
    let user = user_service::find_by_email(pool, email)
        .await?
        .ok_or_else(ApiError::invalid_credentials)?;

    let now = Utc::now();
    if user.is_locked(now) {
        return Err(ApiError::account_locked());
    }
    if !user.is_active {
        return Err(ApiError::access_denied("Account is disabled"));
    }

    if !auth::verify_password(password, &user.password_hash) {
        let (attempts, locked_until) = next_lockout_state(user.failed_login_attempts, now);
        sqlx::query(
            "UPDATE users SET failed_login_attempts = $2, locked_until = $3, updated_at = now()
             WHERE id = $1",
        )
        .bind(user.id)
        .bind(attempts)
        .bind(locked_until)
        .execute(pool)
        .await?;

        if locked_until.is_some() {
            tracing::warn!(user = %user.email, "account locked after repeated failed logins");
        }
        return Err(ApiError::invalid_credentials());
    }

    // Success clears the failure counter and any stale lock
    sqlx::query(
        "UPDATE users SET failed_login_attempts = 0, locked_until = NULL, updated_at = now()
         WHERE id = $1",
    )
    .bind(user.id)
    .execute(pool)
    .await?;

    let access_token = auth::generate_token(&Claims::access(user.id, &user.email, &user.role))?;
    let refresh_token = auth::generate_token(&Claims::refresh(user.id, &user.email, &user.role))?;

    Ok(LoginOutcome {
        access_token,
        refresh_token,
        user,
    })
}

/// Exchange a refresh token for a fresh access token. The account state is
/// re-checked so a disabled or locked user cannot keep minting tokens.
pub async fn refresh(pool: &PgPool, refresh_token: &str) -> Result<String, ApiError> {
    let claims = auth::decode_token(refresh_token)?;
    if !claims.is_refresh() {
        return Err(ApiError::token_invalid(
            "An access token cannot be used to refresh",
        ));
    }

    let user = user_service::find_by_id(pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::access_denied("Account no longer exists"))?;

    if !user.is_active {
        return Err(ApiError::access_denied("Account is disabled"));
    }
    if user.is_locked(Utc::now()) {
        return Err(ApiError::account_locked());
    }

    let access_token = auth::generate_token(&Claims::access(user.id, &user.email, &user.role))?;
    Ok(access_token)
}

/// Failure-counter transition: increments the attempt count and, at the
/// configured threshold, opens the lockout window.
fn next_lockout_state(failed_attempts: i32, now: DateTime<Utc>) -> (i32, Option<DateTime<Utc>>) {
    let security = &config::config().security;
    let attempts = failed_attempts + 1;

    if attempts >= security.lockout_max_attempts {
        let locked_until = now + Duration::minutes(security.lockout_window_minutes);
        (attempts, Some(locked_until))
    } else {
        (attempts, None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn five_failures_open_the_lock() {
        let now = Utc::now();

        // Attempts 1-4 only count up
        for prior in 0..3 {
            let (attempts, locked) = next_lockout_state(prior, now);
            assert_eq!(attempts, prior + 1);
            assert!(locked.is_none());
        }

        // The 5th failure locks for the configured window
        let (attempts, locked) = next_lockout_state(4, now);
        assert_eq!(attempts, 5);
        let until = locked.expect("lock should be set");
        assert_eq!(until, now + Duration::minutes(15));
    }

    #[test]
    fn lock_window_keeps_rejecting_until_elapsed() {
        let now = Utc::now();
        let (_, locked) = next_lockout_state(4, now);
        let until = locked.unwrap();

        let mut user = sample_user();
        user.locked_until = Some(until);

        // Just inside the window: still locked, even with the right password
        assert!(user.is_locked(now + Duration::minutes(14)));
        // Window elapsed: lock no longer applies
        assert!(!user.is_locked(now + Duration::minutes(16)));
    }

    fn sample_user() -> User {
        User {
            id: uuid::Uuid::new_v4(),
            email: "agent@agency.test".to_string(),
            password_hash: String::new(),
            name: "Agent".to_string(),
            role: "agent".to_string(),
            is_active: true,
            manager_id: None,
            failed_login_attempts: 0,
            locked_until: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deleted_at: None,
        }
    }
}
