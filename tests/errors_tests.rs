use chat_relay::errors::*;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::Value;

async fn response_json(error: AppError) -> (StatusCode, Value) {
    let response = error.into_response();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&body).unwrap())
}

#[test]
fn test_error_display() {
    let error = AppError::bad_request("Message cannot be empty");
    assert_eq!(error.to_string(), "Bad request: Message cannot be empty");

    let error = AppError::provider("openai", ProviderError::transport("OpenAI", "HTTP 503"));
    assert_eq!(error.to_string(), "OpenAI API error: HTTP 503");

    let error = AppError::InvalidProvider("gemini".to_string());
    assert_eq!(error.to_string(), "Invalid API provider configured: gemini");
}

#[tokio::test]
async fn test_bad_request_envelope() {
    let (status, json) = response_json(AppError::bad_request("Request must be JSON")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Request must be JSON");
    assert_eq!(json["status"], "error");
    assert!(json["timestamp"].is_string());
    assert!(json.get("provider").is_none());
}

#[tokio::test]
async fn test_invalid_provider_envelope() {
    let (status, json) = response_json(AppError::InvalidProvider("gemini".to_string())).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"], "Invalid API provider configured");
}

#[tokio::test]
async fn test_transport_envelope_is_generic() {
    let error = AppError::provider(
        "openrouter",
        ProviderError::transport("OpenRouter", "request timed out: operation timed out"),
    );
    let (status, json) = response_json(error).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(json["error"], "Service request failed");
    assert!(json.get("provider").is_none());
    assert!(!json.to_string().contains("timed out"));
}

#[tokio::test]
async fn test_provider_failure_envelope_carries_provider() {
    let error = AppError::provider("openai", ProviderError::MissingCredential { provider: "OpenAI" });
    let (status, json) = response_json(error).await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "OpenAI API key not configured");
    assert_eq!(json["provider"], "openai");
    assert_eq!(json["status"], "error");
}

#[tokio::test]
async fn test_other_statuses() {
    let (status, _) = response_json(AppError::NotFound("Not found".to_string())).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = response_json(AppError::PayloadTooLarge("too big".to_string())).await;
    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);

    let (status, json) = response_json(AppError::InternalServerError("boom".to_string())).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(json["error"], "boom");
}

#[test]
fn test_anyhow_conversion_keeps_context_chain() {
    use anyhow::Context;

    let result: anyhow::Result<()> = Err(anyhow::anyhow!("API timeout must be greater than 0"))
        .context("Configuration validation failed");
    let error: AppError = result.unwrap_err().into();

    assert!(matches!(
        error,
        AppError::ConfigError(ref msg)
            if msg == "Configuration validation failed: API timeout must be greater than 0"
    ));
}

#[test]
fn test_config_error_propagates_with_question_mark() {
    fn load() -> Result<chat_relay::Config, AppError> {
        Ok(chat_relay::load_config("missing.toml")?)
    }

    figment::Jail::expect_with(|jail| {
        jail.set_env("API_TIMEOUT", "0");

        let error = load().unwrap_err();
        assert!(matches!(error, AppError::ConfigError(_)));
        assert!(error.to_string().contains("API timeout must be greater than 0"));

        Ok(())
    });
}
