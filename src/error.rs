// HTTP API Error Types
use axum::{
    extract::{Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::str::FromStr;

use crate::auth::TokenError;
use crate::database::StoreError;

/// Message returned for every authorization denial, whatever the reason.
pub const PERMISSION_DENIED: &str = "permission denied";

/// HTTP API error. Every variant renders as `{"error": "<message>"}`.
#[derive(Debug)]
pub enum ApiError {
    /// Malformed request body
    Decode(String),
    /// Bad path identifier or field value
    Validation(String),
    NotFound(String),
    /// Persistence failure; the message is already client-safe
    Store(String),
    PermissionDenied,
    MethodNotAllowed(Method),
    /// Token could not be issued
    Token(String),
}

/// How error variants map onto HTTP status codes.
///
/// `Flat` answers every failure with 400, which is what existing clients of
/// this API expect. `Distinct` gives each kind its conventional status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorStatusPolicy {
    #[default]
    Flat,
    Distinct,
}

impl FromStr for ErrorStatusPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(ErrorStatusPolicy::Flat),
            "distinct" => Ok(ErrorStatusPolicy::Distinct),
            other => Err(format!("unknown error status policy '{}'", other)),
        }
    }
}

/// Marker left in the extensions of every error response so the status
/// policy layer can recognise it.
#[derive(Debug, Clone, Copy)]
pub struct ErrorResponseMarker;

impl ApiError {
    /// Status used under `ErrorStatusPolicy::Distinct`
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Decode(_) | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::MethodNotAllowed(_) => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Store(_) | ApiError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn status_for(&self, policy: ErrorStatusPolicy) -> StatusCode {
        match policy {
            ErrorStatusPolicy::Flat => StatusCode::BAD_REQUEST,
            ErrorStatusPolicy::Distinct => self.status_code(),
        }
    }

    pub fn message(&self) -> String {
        match self {
            ApiError::Decode(msg)
            | ApiError::Validation(msg)
            | ApiError::NotFound(msg)
            | ApiError::Store(msg)
            | ApiError::Token(msg) => msg.clone(),
            ApiError::PermissionDenied => PERMISSION_DENIED.to_string(),
            ApiError::MethodNotAllowed(method) => format!("method not allowed, {}", method),
        }
    }

    pub fn to_json(&self) -> Value {
        json!({ "error": self.message() })
    }
}

impl ApiError {
    pub fn decode(message: impl Into<String>) -> Self {
        ApiError::Decode(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation(message.into())
    }

    pub fn invalid_id(raw: &str) -> Self {
        ApiError::Validation(format!("invalid id provided: '{}'", raw))
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => ApiError::NotFound(format!("account with id {} not found", id)),
            StoreError::Conflict(msg) => ApiError::Store(msg),
            StoreError::Timeout(_) => {
                tracing::error!("Store timeout: {}", err);
                ApiError::Store("Database request timed out".to_string())
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::Store("Database error occurred".to_string())
            }
        }
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::InvalidSecret | TokenError::Signing(_) => {
                tracing::error!("Token issuance failed: {}", err);
                ApiError::Token("Failed to issue account token".to_string())
            }
            // Validation failures surface only as a denial
            TokenError::InvalidToken(_) | TokenError::InvalidSignatureMethod(_) => ApiError::PermissionDenied,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Responses carry the distinct status; the policy layer flattens it when configured
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status_code(), Json(self.to_json())).into_response();
        response.extensions_mut().insert(ErrorResponseMarker);
        response
    }
}

/// Rewrites the status of error responses according to the configured policy.
pub async fn apply_error_status_policy(
    State(policy): State<ErrorStatusPolicy>,
    request: Request,
    next: Next,
) -> Response {
    let mut response = next.run(request).await;
    if policy == ErrorStatusPolicy::Flat && response.extensions().get::<ErrorResponseMarker>().is_some() {
        *response.status_mut() = StatusCode::BAD_REQUEST;
    }
    response
}
