// Anthropic Provider Implementation
use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::ProviderDetail,
    errors::ProviderError,
    providers::{
        ChatProvider, ProviderKind, http,
        anthropic::{MessagesRequest, MessagesResponse},
    },
};

const API_VERSION: &str = "2023-06-01";
/// Output cap sent with every request; the API requires one
const MAX_TOKENS: u32 = 1000;

/// Anthropic provider implementation
///
/// Authenticates with the `x-api-key` header rather than a bearer token and
/// pins the API version through `anthropic-version`.
pub struct AnthropicProvider {
    config: ProviderDetail,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: ProviderDetail, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Anthropic
    }

    async fn send(&self, message: &str) -> Result<String, ProviderError> {
        let name = self.kind().display_name();
        let api_key = self
            .config
            .api_key()
            .ok_or(ProviderError::MissingCredential { provider: name })?;

        let body = MessagesRequest::single(&self.config.model, MAX_TOKENS, message);

        let request = self
            .client
            .post(self.config.endpoint("messages"))
            .header("x-api-key", api_key)
            .header("anthropic-version", API_VERSION)
            .json(&body);

        let response: MessagesResponse = http::send_json(name, request).await?;

        response
            .into_reply()
            .map_err(|reason| ProviderError::response_shape(name, reason))
    }
}
