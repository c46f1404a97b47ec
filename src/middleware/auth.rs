use axum::{
    extract::Request,
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::auth::{self, Claims};
use crate::database::manager::DatabaseManager;
use crate::error::ApiError;
use crate::services::user_service;
use crate::types::Role;
use uuid::Uuid;

/// Authenticated user context extracted from the JWT and the users table
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

/// JWT authentication middleware.
///
/// Validates the bearer token, then loads the user row so that disabled,
/// deleted and currently-locked accounts are rejected even while holding a
/// token that has not yet expired.
pub async fn jwt_auth_middleware(
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_bearer_token(&headers)?;
    let claims = auth::decode_token(&token)?;

    // Refresh tokens only buy new access tokens, never API access
    if claims.is_refresh() {
        return Err(ApiError::token_invalid(
            "Refresh tokens cannot be used for API requests",
        ));
    }

    let auth_user = load_and_check_user(&claims).await?;
    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

fn extract_bearer_token(headers: &HeaderMap) -> Result<String, ApiError> {
    let auth_header = headers
        .get("authorization")
        .or_else(|| headers.get("Authorization"))
        .ok_or_else(ApiError::token_missing)?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| ApiError::token_invalid("Invalid Authorization header format"))?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.to_string()),
        Some(_) => Err(ApiError::token_invalid("Empty bearer token")),
        None => Err(ApiError::token_invalid(
            "Authorization header must use Bearer token format",
        )),
    }
}

async fn load_and_check_user(claims: &Claims) -> Result<AuthUser, ApiError> {
    let pool = DatabaseManager::pool().await?;
    let user = user_service::find_by_id(&pool, claims.sub)
        .await?
        .ok_or_else(|| ApiError::access_denied("Account no longer exists"))?;

    if !user.is_active {
        return Err(ApiError::access_denied("Account is disabled"));
    }
    if user.is_locked(Utc::now()) {
        return Err(ApiError::account_locked());
    }

    Ok(AuthUser {
        id: user.id,
        email: user.email,
        role: Role::parse(&user.role)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers_with(value: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("authorization", value.parse().unwrap());
        headers
    }

    #[test]
    fn missing_header_is_token_missing() {
        let err = extract_bearer_token(&HeaderMap::new()).unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_MISSING");
    }

    #[test]
    fn non_bearer_scheme_is_rejected() {
        let err = extract_bearer_token(&headers_with("Basic abc123")).unwrap_err();
        assert_eq!(err.error_code(), "TOKEN_INVALID");
    }

    #[test]
    fn bearer_token_is_extracted() {
        let token = extract_bearer_token(&headers_with("Bearer ey.abc.123")).unwrap();
        assert_eq!(token, "ey.abc.123");
    }

    #[test]
    fn empty_bearer_is_rejected() {
        assert!(extract_bearer_token(&headers_with("Bearer   ")).is_err());
    }
}
