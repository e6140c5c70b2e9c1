//! OpenAI chat completions.

pub mod model;
mod provider;

pub use model::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
pub use provider::OpenAIProvider;
