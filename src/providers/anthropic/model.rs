use serde::{Deserialize, Serialize};

use crate::providers::USER_ROLE;

/// Messages API request body
#[derive(Serialize, Debug)]
pub struct MessagesRequest {
    pub model: String,
    pub max_tokens: u32,
    pub messages: Vec<Message>,
}

impl MessagesRequest {
    /// Request carrying a single user message
    pub fn single(model: impl Into<String>, max_tokens: u32, message: &str) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            messages: vec![Message {
                role: USER_ROLE.to_string(),
                content: message.to_string(),
            }],
        }
    }
}

/// Message structure for chat conversations
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct Message {
    pub role: String, // "user" or "assistant"
    pub content: String,
}

/// Messages API response body; only the content blocks are read
#[derive(Deserialize, Debug)]
pub struct MessagesResponse {
    pub content: Vec<ContentBlock>,
}

/// Content block within a response
#[derive(Deserialize, Debug, Clone)]
pub struct ContentBlock {
    #[serde(default)]
    pub text: Option<String>,
}

impl MessagesResponse {
    /// Text of the first content block, `content[0].text`
    pub fn into_reply(self) -> Result<String, &'static str> {
        let block = self
            .content
            .into_iter()
            .next()
            .ok_or("no content blocks in response")?;

        block.text.ok_or("first content block has no text")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_shape() {
        let value = serde_json::to_value(MessagesRequest::single("claude-3-haiku-20240307", 1000, "Hi")).unwrap();
        assert_eq!(
            value,
            json!({
                "model": "claude-3-haiku-20240307",
                "max_tokens": 1000,
                "messages": [{"role": "user", "content": "Hi"}]
            })
        );
    }

    #[test]
    fn test_reply_extraction() {
        let response: MessagesResponse = serde_json::from_value(json!({
            "id": "msg_1",
            "type": "message",
            "role": "assistant",
            "content": [{"type": "text", "text": "Hello!"}],
            "usage": {"input_tokens": 3, "output_tokens": 2}
        }))
        .unwrap();
        assert_eq!(response.into_reply().unwrap(), "Hello!");

        let response: MessagesResponse = serde_json::from_value(json!({"content": []})).unwrap();
        assert_eq!(response.into_reply().unwrap_err(), "no content blocks in response");

        let response: MessagesResponse = serde_json::from_value(json!({
            "content": [{"type": "tool_use", "id": "toolu_1", "name": "lookup", "input": {}}]
        }))
        .unwrap();
        assert_eq!(response.into_reply().unwrap_err(), "first content block has no text");
    }
}
