use serde::{Deserialize, Serialize};

use crate::providers::USER_ROLE;

// Chat-completions wire format, shared by OpenAI and OpenRouter
#[derive(Serialize, Debug)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<ChatMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl ChatCompletionRequest {
    /// Request carrying a single user message
    pub fn single(model: impl Into<String>, message: &str) -> Self {
        Self {
            model: model.into(),
            messages: vec![ChatMessage {
                role: USER_ROLE.to_string(),
                content: Some(message.to_string()),
            }],
            temperature: None,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChatMessage {
    pub role: String,
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatChoice>,
}

#[derive(Deserialize, Debug)]
pub struct ChatChoice {
    pub message: ChatMessage,
}

impl ChatCompletionResponse {
    /// Text of the first choice, `choices[0].message.content`
    pub fn into_reply(self) -> Result<String, &'static str> {
        let choice = self
            .choices
            .into_iter()
            .next()
            .ok_or("no choices in response")?;

        choice.message.content.ok_or("first choice has no message content")
    }
}
