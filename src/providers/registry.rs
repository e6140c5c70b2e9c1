use std::collections::HashMap;
use std::sync::Arc;
use reqwest::Client;

use crate::{
    config::Config,
    providers::{ChatProvider, ProviderKind},
};
use super::{
    anthropic::AnthropicProvider,
    openai::OpenAIProvider,
    openrouter::OpenRouterProvider,
};

/// Provider registry mapping a provider identifier to its strategy
///
/// Built once at startup and read-only afterwards, so it is shared behind an
/// `Arc` without any locking.
pub struct ProviderRegistry {
    providers: HashMap<ProviderKind, Arc<dyn ChatProvider>>,
}

impl ProviderRegistry {
    /// 从配置创建新的提供商注册表
    ///
    /// ## 功能说明
    /// Instantiates every compiled-in provider with its own settings and the
    /// shared HTTP client. Providers without an API key are still registered;
    /// the missing key is reported when a request reaches them.
    ///
    /// ## 参数说明
    /// - `config`: 应用程序配置
    /// - `http_client`: 共享的HTTP客户端，超时已在客户端上配置
    ///
    /// ## 执行例子
    /// ```rust
    /// # use chat_relay::{Config, providers::ProviderRegistry};
    /// let registry = ProviderRegistry::new(&Config::default(), reqwest::Client::new());
    /// assert_eq!(registry.provider_names(), vec!["openai", "anthropic", "openrouter"]);
    /// ```
    pub fn new(config: &Config, http_client: Client) -> Self {
        let providers = &config.providers;
        let mut registry = Self::new_empty();

        registry.register(Arc::new(OpenAIProvider::new(
            providers.openai.clone(),
            http_client.clone(),
        )));
        registry.register(Arc::new(AnthropicProvider::new(
            providers.anthropic.clone(),
            http_client.clone(),
        )));
        registry.register(Arc::new(OpenRouterProvider::new(
            providers.openrouter.clone(),
            config.app.clone(),
            http_client,
        )));

        registry
    }

    /// Create an empty provider registry, mainly for tests
    pub fn new_empty() -> Self {
        Self {
            providers: HashMap::new(),
        }
    }

    /// Add or replace the strategy registered under `provider.kind()`
    pub fn register(&mut self, provider: Arc<dyn ChatProvider>) {
        self.providers.insert(provider.kind(), provider);
    }

    /// 根据提供商名称查找对应的策略
    ///
    /// ## 功能说明
    /// Case-insensitive lookup by provider identifier. An unknown name is not
    /// an error here; the caller decides how to report it.
    ///
    /// ## 执行例子
    /// ```rust
    /// # use chat_relay::{Config, providers::ProviderRegistry};
    /// let registry = ProviderRegistry::new(&Config::default(), reqwest::Client::new());
    /// assert!(registry.lookup("Anthropic").is_some());
    /// assert!(registry.lookup("gemini").is_none());
    /// ```
    ///
    /// ## 返回值
    /// - `Some(Arc<dyn ChatProvider>)`: 找到的提供商实例
    /// - `None`: 名称未知或该提供商未注册
    pub fn lookup(&self, name: &str) -> Option<Arc<dyn ChatProvider>> {
        let kind = name.parse::<ProviderKind>().ok()?;
        self.get(kind)
    }

    /// Strategy registered for `kind`
    pub fn get(&self, kind: ProviderKind) -> Option<Arc<dyn ChatProvider>> {
        self.providers.get(&kind).cloned()
    }

    /// Identifiers of the registered providers, in a stable order
    pub fn provider_names(&self) -> Vec<&'static str> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.providers.contains_key(kind))
            .map(ProviderKind::id)
            .collect()
    }
}
