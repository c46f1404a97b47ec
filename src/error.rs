// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

/// HTTP API error with stable machine-readable codes.
///
/// Every failure surfaces synchronously to the caller as
/// `{error: true, code, message}`; nothing partially succeeds.
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    Validation {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),
    UnknownMetricType(String),

    // 401 Unauthorized
    Unauthorized {
        code: &'static str,
        message: String,
    },

    // 403 Forbidden
    Forbidden {
        code: &'static str,
        message: String,
    },

    // 404 Not Found
    NotFound {
        code: &'static str,
        message: String,
    },

    // 409 Conflict
    Conflict {
        code: &'static str,
        message: String,
    },

    // 423 Locked (account lockout)
    Locked(String),

    // 500 Internal Server Error
    Internal {
        code: &'static str,
        message: String,
        detail: Option<String>,
    },
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::Validation { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::UnknownMetricType(_) => 400,
            ApiError::Unauthorized { .. } => 401,
            ApiError::Forbidden { .. } => 403,
            ApiError::NotFound { .. } => 404,
            ApiError::Conflict { .. } => 409,
            ApiError::Locked(_) => 423,
            ApiError::Internal { .. } => 500,
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::UnknownMetricType(_) => "UNKNOWN_METRIC_TYPE",
            ApiError::Unauthorized { code, .. } => code,
            ApiError::Forbidden { code, .. } => code,
            ApiError::NotFound { code, .. } => code,
            ApiError::Conflict { code, .. } => code,
            ApiError::Locked(_) => "ACCOUNT_LOCKED",
            ApiError::Internal { code, .. } => code,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> String {
        match self {
            ApiError::Validation { message, .. } => message.clone(),
            ApiError::InvalidJson(msg) => msg.clone(),
            ApiError::UnknownMetricType(metric) => {
                format!("Unknown goal metric type: {}", metric)
            }
            ApiError::Unauthorized { message, .. } => message.clone(),
            ApiError::Forbidden { message, .. } => message.clone(),
            ApiError::NotFound { message, .. } => message.clone(),
            ApiError::Conflict { message, .. } => message.clone(),
            ApiError::Locked(msg) => msg.clone(),
            ApiError::Internal { message, .. } => message.clone(),
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        let mut body = json!({
            "error": true,
            "code": self.error_code(),
            "message": self.message(),
        });

        if let ApiError::Validation {
            field_errors: Some(field_errors),
            ..
        } = self
        {
            body["fieldErrors"] = json!(field_errors);
        }

        // Driver/internal detail only leaves the process in development
        if let ApiError::Internal {
            detail: Some(detail),
            ..
        } = self
        {
            if crate::is_development!() {
                body["detail"] = json!(detail);
            }
        }

        body
    }
}

// Static constructor methods used throughout handlers and services
impl ApiError {
    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unknown_metric_type(metric: impl Into<String>) -> Self {
        ApiError::UnknownMetricType(metric.into())
    }

    pub fn invalid_credentials() -> Self {
        ApiError::Unauthorized {
            code: "AUTH_INVALID_CREDENTIALS",
            message: "Invalid email or password".to_string(),
        }
    }

    pub fn token_missing() -> Self {
        ApiError::Unauthorized {
            code: "TOKEN_MISSING",
            message: "Missing Authorization bearer token".to_string(),
        }
    }

    pub fn token_invalid(message: impl Into<String>) -> Self {
        ApiError::Unauthorized {
            code: "TOKEN_INVALID",
            message: message.into(),
        }
    }

    pub fn token_expired() -> Self {
        ApiError::Unauthorized {
            code: "TOKEN_EXPIRED",
            message: "Token has expired".to_string(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code: "ACCESS_DENIED",
            message: message.into(),
        }
    }

    pub fn insufficient_permissions(message: impl Into<String>) -> Self {
        ApiError::Forbidden {
            code: "INSUFFICIENT_PERMISSIONS",
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        ApiError::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn account_locked() -> Self {
        ApiError::Locked("Account is temporarily locked due to repeated failed logins".to_string())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal {
            code: "INTERNAL_ERROR",
            message: message.into(),
            detail: None,
        }
    }

    pub fn db_error(detail: impl Into<String>) -> Self {
        ApiError::Internal {
            code: "DB_QUERY_ERROR",
            message: "An error occurred while processing your request".to_string(),
            detail: Some(detail.into()),
        }
    }
}

// Database errors are logged in full; clients get a generic message
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {}", err);
        ApiError::db_error(err.to_string())
    }
}

impl From<crate::database::manager::DatabaseError> for ApiError {
    fn from(err: crate::database::manager::DatabaseError) -> Self {
        tracing::error!("Database manager error: {}", err);
        ApiError::db_error(err.to_string())
    }
}

impl From<crate::auth::JwtError> for ApiError {
    fn from(err: crate::auth::JwtError) -> Self {
        tracing::error!("JWT error: {}", err);
        ApiError::internal("Failed to issue token")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(ApiError::validation_error("bad", None).status_code(), 400);
        assert_eq!(ApiError::invalid_credentials().status_code(), 401);
        assert_eq!(ApiError::access_denied("no").status_code(), 403);
        assert_eq!(
            ApiError::not_found("GOAL_NOT_FOUND", "Goal not found").status_code(),
            404
        );
        assert_eq!(
            ApiError::conflict("LAST_MANAGER", "cannot remove").status_code(),
            409
        );
        assert_eq!(ApiError::account_locked().status_code(), 423);
        assert_eq!(ApiError::db_error("boom").status_code(), 500);
    }

    #[test]
    fn codes_are_stable() {
        assert_eq!(ApiError::account_locked().error_code(), "ACCOUNT_LOCKED");
        assert_eq!(
            ApiError::insufficient_permissions("no").error_code(),
            "INSUFFICIENT_PERMISSIONS"
        );
        assert_eq!(
            ApiError::unknown_metric_type("velocity").error_code(),
            "UNKNOWN_METRIC_TYPE"
        );
        assert_eq!(ApiError::db_error("boom").error_code(), "DB_QUERY_ERROR");
    }

    #[test]
    fn body_carries_code_and_flag() {
        let body = ApiError::invalid_credentials().to_json();
        assert_eq!(body["error"], true);
        assert_eq!(body["code"], "AUTH_INVALID_CREDENTIALS");
    }

    #[test]
    fn field_errors_ride_along() {
        let mut fields = HashMap::new();
        fields.insert("email".to_string(), "This field is required".to_string());
        let body = ApiError::validation_error("Missing required fields", Some(fields)).to_json();
        assert_eq!(body["fieldErrors"]["email"], "This field is required");
    }
}
