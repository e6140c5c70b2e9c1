//! Request plumbing shared by every provider.

use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

use crate::errors::ProviderError;

/// Send `request` and decode a successful JSON body into `T`.
///
/// Connection failures, timeouts, non-2xx statuses and unreadable bodies are
/// transport errors. A 2xx body that does not decode into `T` is a response
/// shape error.
pub async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, ProviderError> {
    let response = request
        .send()
        .await
        .map_err(|e| ProviderError::transport(provider, describe(&e)))?;

    let body = read_success_body(provider, response).await?;

    serde_json::from_slice(&body)
        .map_err(|e| ProviderError::response_shape(provider, format!("unexpected response body: {}", e)))
}

async fn read_success_body(
    provider: &'static str,
    response: Response,
) -> Result<Vec<u8>, ProviderError> {
    let status = response.status();

    if !status.is_success() {
        let error_body = response.text().await.unwrap_or_default();
        return Err(ProviderError::transport(
            provider,
            format!("HTTP {}: {}", status, error_body),
        ));
    }

    response
        .bytes()
        .await
        .map(|bytes| bytes.to_vec())
        .map_err(|e| ProviderError::transport(provider, describe(&e)))
}

fn describe(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        format!("request timed out: {}", error)
    } else if error.is_connect() {
        format!("connection failed: {}", error)
    } else {
        error.to_string()
    }
}
