use serde::{Deserialize, Serialize};

/// Inbound body of `POST /api/chat`
///
/// Only `message` is recognized; unknown fields are ignored.
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ChatRequest {
    #[serde(default)]
    pub message: Option<String>,
}

impl ChatRequest {
    /// The message with surrounding whitespace removed, or `None` when it is
    /// absent or blank.
    pub fn trimmed_message(&self) -> Option<&str> {
        self.message
            .as_deref()
            .map(str::trim)
            .filter(|m| !m.is_empty())
    }
}

/// Successful chat reply envelope
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChatResponse {
    pub reply: String,
    pub provider: String,
    pub status: String,
    pub timestamp: String,
}

impl ChatResponse {
    pub fn new(reply: String, provider: impl Into<String>) -> Self {
        Self {
            reply,
            provider: provider.into(),
            status: "success".to_string(),
            timestamp: timestamp(),
        }
    }
}

/// Error envelope returned for every failed request
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub status: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            provider: None,
            status: "error".to_string(),
            timestamp: timestamp(),
        }
    }

    pub fn with_provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }
}

/// Body of `GET /health`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HealthResponse {
    pub status: String,
    pub provider: String,
    pub timestamp: String,
}

impl HealthResponse {
    pub fn healthy(provider: impl Into<String>) -> Self {
        Self {
            status: "healthy".to_string(),
            provider: provider.into(),
            timestamp: timestamp(),
        }
    }
}

/// Current UTC time as an RFC 3339 string
pub fn timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// First `max_chars` characters of a message, for log previews
pub fn preview(message: &str, max_chars: usize) -> &str {
    match message.char_indices().nth(max_chars) {
        Some((idx, _)) => &message[..idx],
        None => message,
    }
}
