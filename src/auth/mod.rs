use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::error::ApiError;

pub const TOKEN_TYPE_ACCESS: &str = "access";
pub const TOKEN_TYPE_REFRESH: &str = "refresh";

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub role: String,
    pub token_type: String,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn access(user_id: Uuid, email: &str, role: &str) -> Self {
        let expiry_hours = config::config().security.jwt_expiry_hours;
        Self::with_expiry(user_id, email, role, TOKEN_TYPE_ACCESS, expiry_hours)
    }

    pub fn refresh(user_id: Uuid, email: &str, role: &str) -> Self {
        let expiry_hours = config::config().security.refresh_expiry_hours;
        Self::with_expiry(user_id, email, role, TOKEN_TYPE_REFRESH, expiry_hours)
    }

    fn with_expiry(
        user_id: Uuid,
        email: &str,
        role: &str,
        token_type: &str,
        expiry_hours: u64,
    ) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            sub: user_id,
            email: email.to_string(),
            role: role.to_string(),
            token_type: token_type.to_string(),
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn is_refresh(&self) -> bool {
        self.token_type == TOKEN_TYPE_REFRESH
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

pub fn generate_token(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

/// Validate a token and extract its claims. Expired tokens map to a
/// distinct error code so clients know to refresh.
pub fn decode_token(token: &str) -> Result<Claims, ApiError> {
    let secret = &config::config().security.jwt_secret;

    if secret.is_empty() {
        return Err(ApiError::internal("JWT secret not configured"));
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let validation = Validation::default();

    decode::<Claims>(token, &decoding_key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => ApiError::token_expired(),
            _ => ApiError::token_invalid(format!("Invalid token: {}", e)),
        })
}

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            tracing::error!("Password hashing failed: {}", e);
            ApiError::internal("Failed to hash password")
        })
}

pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            // A malformed stored hash is a data problem, not a caller problem
            tracing::error!("Stored password hash is malformed: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn password_hash_round_trips() {
        let hash = hash_password("s3cret-passphrase").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("s3cret-passphrase", &hash));
        assert!(!verify_password("wrong", &hash));
    }

    #[test]
    fn malformed_hash_never_verifies() {
        assert!(!verify_password("anything", "not-a-phc-string"));
    }

    #[test]
    fn token_round_trips_with_claims() {
        let id = Uuid::new_v4();
        let claims = Claims::access(id, "agent@agency.test", "agent");
        let token = generate_token(&claims).unwrap();

        let decoded = decode_token(&token).unwrap();
        assert_eq!(decoded.sub, id);
        assert_eq!(decoded.role, "agent");
        assert_eq!(decoded.token_type, TOKEN_TYPE_ACCESS);
        assert!(!decoded.is_refresh());
    }

    #[test]
    fn expired_token_reports_expired() {
        let mut claims = Claims::access(Uuid::new_v4(), "agent@agency.test", "agent");
        // Well past the default validation leeway
        claims.exp = (Utc::now() - Duration::hours(2)).timestamp();
        let token = generate_token(&claims).unwrap();

        let err = decode_token(&token).unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_EXPIRED");
    }

    #[test]
    fn refresh_claims_are_marked() {
        let claims = Claims::refresh(Uuid::new_v4(), "agent@agency.test", "agent");
        assert!(claims.is_refresh());
    }
}
