use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ErrorResponse;

// Use anyhow::Result for startup and configuration plumbing
// Use thiserror for errors that map onto an HTTP status

/// Failures raised at the provider strategy boundary.
///
/// The `provider` field carries the human-readable provider name
/// ("OpenAI", "Anthropic", "OpenRouter") so that messages read the same
/// regardless of which upstream produced them.
#[derive(Error, Debug)]
pub enum ProviderError {
    /// The provider's API key is unset or empty.
    #[error("{provider} API key not configured")]
    MissingCredential { provider: &'static str },

    /// Network failure, timeout or a non-2xx status from the upstream.
    #[error("{provider} API error: {message}")]
    Transport {
        provider: &'static str,
        message: String,
    },

    /// The upstream answered 2xx but the reply could not be found in the body.
    #[error("{provider} API error: {message}")]
    ResponseShape {
        provider: &'static str,
        message: String,
    },
}

impl ProviderError {
    pub fn transport(provider: &'static str, message: impl Into<String>) -> Self {
        Self::Transport {
            provider,
            message: message.into(),
        }
    }

    pub fn response_shape(provider: &'static str, message: impl Into<String>) -> Self {
        Self::ResponseShape {
            provider,
            message: message.into(),
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. })
    }
}

/// Errors surfaced by the HTTP handlers
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Invalid API provider configured: {0}")]
    InvalidProvider(String),

    /// A strategy failed; `provider` is the configured provider id.
    #[error("{source}")]
    Provider {
        provider: String,
        #[source]
        source: ProviderError,
    },

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Payload too large: {0}")]
    PayloadTooLarge(String),

    #[error("Internal server error: {0}")]
    InternalServerError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn provider(provider: impl Into<String>, source: ProviderError) -> Self {
        Self::Provider {
            provider: provider.into(),
            source,
        }
    }

    /// Status code and client-facing envelope for this error.
    ///
    /// Transport failures are reported with a generic message and without the
    /// provider name; every other provider failure exposes its message along
    /// with the provider id.
    pub fn to_status_and_body(&self) -> (StatusCode, ErrorResponse) {
        match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg.clone())),
            AppError::InvalidProvider(_) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("Invalid API provider configured"),
            ),
            AppError::Provider { source, .. } if source.is_transport() => (
                StatusCode::BAD_GATEWAY,
                ErrorResponse::new("Service request failed"),
            ),
            AppError::Provider { provider, source } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(source.to_string()).with_provider(provider.clone()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg.clone())),
            AppError::PayloadTooLarge(msg) => (StatusCode::PAYLOAD_TOO_LARGE, ErrorResponse::new(msg.clone())),
            AppError::InternalServerError(msg) | AppError::ConfigError(msg) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorResponse::new(msg.clone()),
            ),
        }
    }
}

/// Convert AppError to HTTP response
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.to_status_and_body();
        (status, Json(body)).into_response()
    }
}

/// Configuration loading reports through anyhow; keep the whole context chain
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::ConfigError(format!("{:#}", err))
    }
}

/// Helper type for results that use AppError
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_error_hides_detail() {
        let error = AppError::provider(
            "openai",
            ProviderError::transport("OpenAI", "connection refused (os error 111)"),
        );
        let (status, body) = error.to_status_and_body();

        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(body.error, "Service request failed");
        assert!(body.provider.is_none());
    }

    #[test]
    fn test_shape_error_exposes_detail_and_provider() {
        let error = AppError::provider(
            "anthropic",
            ProviderError::response_shape("Anthropic", "no content blocks in response"),
        );
        let (status, body) = error.to_status_and_body();

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error, "Anthropic API error: no content blocks in response");
        assert_eq!(body.provider.as_deref(), Some("anthropic"));
    }

    #[test]
    fn test_missing_credential_message() {
        let error = ProviderError::MissingCredential { provider: "OpenRouter" };
        assert_eq!(error.to_string(), "OpenRouter API key not configured");
        assert!(!error.is_transport());
    }
}
