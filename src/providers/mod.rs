pub mod anthropic;
pub mod http;
pub mod openai;
pub mod openrouter;
pub mod registry;

use std::{fmt, str::FromStr};

use async_trait::async_trait;

use crate::errors::ProviderError;

// Re-export registry for easier access
pub use registry::ProviderRegistry;

/// Role tag used for the single message sent upstream
pub const USER_ROLE: &str = "user";

/// Compiled-in providers, used as the registry key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderKind {
    OpenAI,
    Anthropic,
    OpenRouter,
}

impl ProviderKind {
    pub const ALL: [ProviderKind; 3] = [
        ProviderKind::OpenAI,
        ProviderKind::Anthropic,
        ProviderKind::OpenRouter,
    ];

    /// Identifier used in configuration and in responses
    pub fn id(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "openai",
            ProviderKind::Anthropic => "anthropic",
            ProviderKind::OpenRouter => "openrouter",
        }
    }

    /// Name used in error messages
    pub fn display_name(self) -> &'static str {
        match self {
            ProviderKind::OpenAI => "OpenAI",
            ProviderKind::Anthropic => "Anthropic",
            ProviderKind::OpenRouter => "OpenRouter",
        }
    }
}

impl fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

impl FromStr for ProviderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim();
        ProviderKind::ALL
            .into_iter()
            .find(|kind| kind.id().eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("unknown provider '{}'", name))
    }
}

/// Core chat capability every provider implements
///
/// One call sends one user message upstream and returns the plain-text reply.
/// Credentials, model and endpoint are fixed when the provider is built.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Which provider this is
    fn kind(&self) -> ProviderKind;

    /// Send `message` upstream and return the reply text
    ///
    /// Performs exactly one outbound request and never retries.
    async fn send(&self, message: &str) -> Result<String, ProviderError>;
}
