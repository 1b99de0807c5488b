use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{json, Value};
use std::fmt;

/// API error taxonomy
///
/// Every failure the service can surface maps to exactly one of these kinds.
/// Anything foreign (database, hashing, outbound HTTP) is coerced to
/// `Internal` at the conversion boundary.
#[derive(Debug, Clone)]
pub enum ApiError {
    NotFound(String),
    Unauthorized(String),
    Forbidden(String),
    BadRequest(String),
    Validation {
        message: String,
        details: Value,
    },
    Conflict(String),
    RateLimitExceeded {
        message: String,
        retry_after: u64,
    },
    UpgradeRequired(String),
    Internal(String),
}

impl ApiError {
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn unauthorized(msg: impl Into<String>) -> Self {
        Self::Unauthorized(msg.into())
    }

    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn upgrade_required(msg: impl Into<String>) -> Self {
        Self::UpgradeRequired(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Validation error with per-field details
    pub fn validation(message: impl Into<String>, details: Value) -> Self {
        Self::Validation {
            message: message.into(),
            details,
        }
    }

    pub fn rate_limited(retry_after: u64) -> Self {
        Self::RateLimitExceeded {
            message: "Too many requests. Please try again later.".to_string(),
            retry_after,
        }
    }

    /// Machine-readable error code for the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Unauthorized(_) => "UNAUTHORIZED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Conflict(_) => "CONFLICT",
            Self::RateLimitExceeded { .. } => "RATE_LIMIT_EXCEEDED",
            Self::UpgradeRequired(_) => "UPGRADE_REQUIRED",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::BadRequest(_) | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::RateLimitExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            Self::UpgradeRequired(_) => StatusCode::PAYMENT_REQUIRED,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound(m)
            | Self::Unauthorized(m)
            | Self::Forbidden(m)
            | Self::BadRequest(m)
            | Self::Conflict(m)
            | Self::UpgradeRequired(m)
            | Self::Internal(m) => m,
            Self::Validation { message, .. } => message,
            Self::RateLimitExceeded { message, .. } => message,
        }
    }

    /// Build the envelope body for this error with request context attached
    pub fn to_body(&self, path: &str, request_id: &str) -> ErrorBody {
        let (details, retry_after) = match self {
            Self::Validation { details, .. } => (Some(details.clone()), None),
            Self::RateLimitExceeded { retry_after, .. } => (None, Some(*retry_after)),
            _ => (None, None),
        };

        // Clients never see internal failure details
        let message = match self {
            Self::Internal(_) => "Internal server error".to_string(),
            _ => self.message().to_string(),
        };

        ErrorBody {
            code: self.code().to_string(),
            message,
            details,
            path: path.to_string(),
            request_id: request_id.to_string(),
            timestamp: Utc::now(),
            retry_after,
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code(), self.message())
    }
}

impl std::error::Error for ApiError {}

/// Error section of the response envelope
#[derive(Debug, Clone, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub path: String,
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

impl ErrorBody {
    pub fn into_envelope(self) -> Value {
        json!({
            "success": false,
            "error": self,
        })
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Internal(ref msg) = self {
            tracing::error!(error = %msg, "internal error");
        }

        let status = self.status();
        // Path and request id are unknown here; the envelope middleware
        // rewrites the body from the extension with both filled in.
        let body = self.to_body("", "").into_envelope();
        let mut response = (status, Json(body)).into_response();
        response.extensions_mut().insert(self);
        response
    }
}

/// Pagination metadata for list responses
#[derive(Debug, Clone, Serialize)]
pub struct PageMeta {
    pub page: i64,
    pub per_page: i64,
    pub total: i64,
    pub total_pages: i64,
}

impl PageMeta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        let total_pages = if per_page > 0 {
            (total + per_page - 1) / per_page
        } else {
            0
        };
        Self {
            page,
            per_page,
            total,
            total_pages,
        }
    }
}

/// Wrapper for successful responses that adds the `{success, data, meta}`
/// envelope
#[derive(Debug)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub status: StatusCode,
    pub meta: Option<PageMeta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            meta: None,
        }
    }

    pub fn created(data: T) -> Self {
        Self {
            data,
            status: StatusCode::CREATED,
            meta: None,
        }
    }

    pub fn with_meta(data: T, meta: PageMeta) -> Self {
        Self {
            data,
            status: StatusCode::OK,
            meta: Some(meta),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let mut envelope = json!({
            "success": true,
            "data": self.data,
        });
        if let Some(meta) = self.meta {
            envelope["meta"] = json!(meta);
        }
        (self.status, Json(envelope)).into_response()
    }
}

// From implementations for common error types
impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Internal(format!("database error: {}", err))
    }
}

impl From<bcrypt::BcryptError> for ApiError {
    fn from(err: bcrypt::BcryptError) -> Self {
        ApiError::Internal(format!("password hashing error: {}", err))
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        ApiError::Internal(format!("upstream request failed: {}", err))
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errs: validator::ValidationErrors) -> Self {
        let mut details = serde_json::Map::new();
        for (field, errors) in errs.field_errors() {
            let messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("invalid {}", field))
                })
                .collect();
            details.insert(field.to_string(), json!(messages.join("; ")));
        }
        ApiError::Validation {
            message: "Validation failed".to_string(),
            details: Value::Object(details),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ApiError::not_found("x").status(), StatusCode::NOT_FOUND);
        assert_eq!(
            ApiError::unauthorized("invalid_token").status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(ApiError::forbidden("x").status(), StatusCode::FORBIDDEN);
        assert_eq!(
            ApiError::upgrade_required("x").status(),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            ApiError::rate_limited(30).status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            ApiError::internal("boom").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_body_carries_request_context() {
        let err = ApiError::rate_limited(42);
        let body = err.to_body("/api/v1/auth/login", "req-1");
        assert_eq!(body.code, "RATE_LIMIT_EXCEEDED");
        assert_eq!(body.path, "/api/v1/auth/login");
        assert_eq!(body.request_id, "req-1");
        assert_eq!(body.retry_after, Some(42));
    }

    #[test]
    fn test_internal_message_not_leaked() {
        let err = ApiError::internal("connection refused to 10.0.0.3");
        let body = err.to_body("/", "r");
        assert_eq!(body.message, "Internal server error");
    }

    #[test]
    fn test_validation_details_in_envelope() {
        let err = ApiError::validation(
            "Password does not meet requirements",
            json!({"password": "at least 12 characters"}),
        );
        let envelope = err.to_body("/api/v1/auth/register", "r").into_envelope();
        assert_eq!(envelope["success"], json!(false));
        assert_eq!(
            envelope["error"]["details"]["password"],
            json!("at least 12 characters")
        );
    }

    #[test]
    fn test_page_meta_rounding() {
        let meta = PageMeta::new(1, 20, 41);
        assert_eq!(meta.total_pages, 3);
        let meta = PageMeta::new(1, 20, 40);
        assert_eq!(meta.total_pages, 2);
    }
}
