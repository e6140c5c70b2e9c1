use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::ProviderDetail,
    errors::ProviderError,
    providers::{
        ChatProvider, ProviderKind, http,
        openai::{ChatCompletionRequest, ChatCompletionResponse},
    },
};

/// Sampling temperature sent with every OpenAI request
const TEMPERATURE: f32 = 0.7;

/// OpenAI provider implementation
pub struct OpenAIProvider {
    config: ProviderDetail,
    client: Client,
}

impl OpenAIProvider {
    pub fn new(config: ProviderDetail, client: Client) -> Self {
        Self { config, client }
    }
}

#[async_trait]
impl ChatProvider for OpenAIProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenAI
    }

    async fn send(&self, message: &str) -> Result<String, ProviderError> {
        let name = self.kind().display_name();
        let api_key = self
            .config
            .api_key()
            .ok_or(ProviderError::MissingCredential { provider: name })?;

        let body = ChatCompletionRequest::single(&self.config.model, message)
            .with_temperature(TEMPERATURE);

        let request = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .json(&body);

        let response: ChatCompletionResponse = http::send_json(name, request).await?;

        response
            .into_reply()
            .map_err(|reason| ProviderError::response_shape(name, reason))
    }
}
