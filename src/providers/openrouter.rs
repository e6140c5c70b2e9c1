//! OpenRouter, which speaks the OpenAI chat-completions format.

use async_trait::async_trait;
use reqwest::Client;

use crate::{
    config::{AppInfo, ProviderDetail},
    errors::ProviderError,
    providers::{
        ChatProvider, ProviderKind, http,
        openai::{ChatCompletionRequest, ChatCompletionResponse},
    },
};

/// OpenRouter provider implementation
///
/// OpenRouter attributes traffic to the calling application through the
/// `HTTP-Referer` and `X-Title` headers, filled from [`AppInfo`].
pub struct OpenRouterProvider {
    config: ProviderDetail,
    app: AppInfo,
    client: Client,
}

impl OpenRouterProvider {
    pub fn new(config: ProviderDetail, app: AppInfo, client: Client) -> Self {
        Self { config, app, client }
    }
}

#[async_trait]
impl ChatProvider for OpenRouterProvider {
    fn kind(&self) -> ProviderKind {
        ProviderKind::OpenRouter
    }

    async fn send(&self, message: &str) -> Result<String, ProviderError> {
        let name = self.kind().display_name();
        let api_key = self
            .config
            .api_key()
            .ok_or(ProviderError::MissingCredential { provider: name })?;

        let body = ChatCompletionRequest::single(&self.config.model, message);

        let request = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(api_key)
            .header("HTTP-Referer", &self.app.url)
            .header("X-Title", &self.app.name)
            .json(&body);

        let response: ChatCompletionResponse = http::send_json(name, request).await?;

        response
            .into_reply()
            .map_err(|reason| ProviderError::response_shape(name, reason))
    }
}
