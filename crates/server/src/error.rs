//! Error types for the authentication core.
//!
//! `AuthError` is the internal taxonomy; `ApiError` is the JSON body every
//! HTTP-level failure is rendered as. Token verification failures are
//! deliberately collapsed into a single `InvalidToken` variant so that an
//! unauthenticated caller cannot distinguish a bad signature from an expired
//! token.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The identity provider declined the code exchange (bad code, redirect
    /// URI mismatch, revoked consent).
    #[error("identity provider rejected the code exchange: {0}")]
    ProviderRejected(String),
    /// The provider answered 2xx but the token response is missing a field
    /// the flow cannot proceed without.
    #[error("token response missing required field: {0}")]
    IncompleteToken(&'static str),
    /// Signature, audience, issuer, or expiry check failed. Carries no
    /// detail on purpose.
    #[error("identity token failed verification")]
    InvalidToken,
    /// The provider's discovery document or signing-key set could not be
    /// fetched. Never surfaced to unauthenticated callers directly.
    #[error("signing key fetch failed: {0}")]
    KeyFetch(String),
    /// Transport-level failure talking to the provider.
    #[error("provider request failed: {0}")]
    Http(String),
}

/// JSON error body returned by the auth endpoints.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiError {
    /// Error code (e.g., "invalid_token", "provider_rejected")
    pub error: String,
    /// Human-readable error description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_description: Option<String>,
}

impl ApiError {
    pub fn invalid_request(description: impl Into<String>) -> Self {
        Self {
            error: "invalid_request".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn invalid_token(description: impl Into<String>) -> Self {
        Self {
            error: "invalid_token".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn provider_rejected(description: impl Into<String>) -> Self {
        Self {
            error: "provider_rejected".to_string(),
            error_description: Some(description.into()),
        }
    }

    pub fn incomplete_token(field: &str) -> Self {
        Self {
            error: "incomplete_token".to_string(),
            error_description: Some(format!("Token response missing '{field}'")),
        }
    }

    pub fn server_error() -> Self {
        Self {
            error: "server_error".to_string(),
            error_description: None,
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::ProviderRejected(msg) => ApiError::provider_rejected(msg),
            AuthError::IncompleteToken(field) => ApiError::incomplete_token(field),
            AuthError::InvalidToken => ApiError::invalid_token("Identity token failed verification"),
            AuthError::KeyFetch(_) | AuthError::Http(_) => ApiError::server_error(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.as_str() {
            "invalid_request" => StatusCode::BAD_REQUEST,
            "invalid_token" | "provider_rejected" | "incomplete_token" => StatusCode::UNAUTHORIZED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_status_codes() {
        let response = ApiError::invalid_request("test").into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = ApiError::invalid_token("test").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::provider_rejected("test").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::incomplete_token("id_token").into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = ApiError::server_error().into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_auth_error_conversion_hides_internal_detail() {
        let api: ApiError = AuthError::KeyFetch("network down".into()).into();
        assert_eq!(api.error, "server_error");
        assert!(api.error_description.is_none());

        let api: ApiError = AuthError::InvalidToken.into();
        assert_eq!(api.error, "invalid_token");
    }
}
