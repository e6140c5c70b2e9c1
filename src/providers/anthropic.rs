//! Anthropic messages API.

pub mod model;
mod provider;

pub use model::{ContentBlock, MessagesRequest, MessagesResponse};
pub use provider::AnthropicProvider;
