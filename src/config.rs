use std::path::Path;

use anyhow::{Context, Result};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{
    Deserialize, Deserializer, Serialize,
    de::{self, Unexpected},
};

/// Default configuration file, looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "config.toml";

/// 主配置结构体
///
/// Everything the relay needs, assembled once at startup from defaults, an
/// optional TOML file and environment variables. Immutable afterwards.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Config {
    /// Identifier of the provider every chat request is dispatched to
    #[serde(default = "default_provider", deserialize_with = "string_from_scalar")]
    pub provider: String,
    /// Bound on each outbound provider call
    #[serde(default = "default_api_timeout")]
    pub api_timeout_seconds: u64,
    #[serde(default)]
    pub server: ServerConfig,
    /// Identity sent to providers that ask for it (OpenRouter)
    #[serde(default)]
    pub app: AppInfo,
    #[serde(default)]
    pub providers: ProvidersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub security: SecurityConfig,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host", deserialize_with = "string_from_scalar")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Production mode switches the default log format to JSON
    #[serde(default, deserialize_with = "bool_from_flag")]
    pub production: bool,
    #[serde(default = "default_max_request_size")]
    pub max_request_size_bytes: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct AppInfo {
    #[serde(default = "default_app_name", deserialize_with = "string_from_scalar")]
    pub name: String,
    #[serde(default = "default_app_url", deserialize_with = "string_from_scalar")]
    pub url: String,
}

/// Settings for every compiled-in provider, whichever one is selected
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProvidersConfig {
    #[serde(default = "ProviderDetail::openai")]
    pub openai: ProviderDetail,
    #[serde(default = "ProviderDetail::anthropic")]
    pub anthropic: ProviderDetail,
    #[serde(default = "ProviderDetail::openrouter")]
    pub openrouter: ProviderDetail,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ProviderDetail {
    /// Checked at request time; a missing key is a request failure, not a
    /// startup failure.
    #[serde(
        default,
        deserialize_with = "opt_string_from_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub api_key: Option<String>,
    #[serde(deserialize_with = "string_from_scalar")]
    pub model: String,
    #[serde(deserialize_with = "string_from_scalar")]
    pub api_base: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level", deserialize_with = "string_from_scalar")]
    pub level: String,
    /// `json`, `pretty` or `compact`; follows the serving mode when unset
    #[serde(
        default,
        deserialize_with = "opt_string_from_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    pub format: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SecurityConfig {
    #[serde(default = "default_cors_enabled")]
    pub cors_enabled: bool,
    /// Empty means any origin
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

// Default value functions
fn default_provider() -> String { "openai".to_string() }
fn default_api_timeout() -> u64 { 30 }
fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 5000 }
fn default_max_request_size() -> usize { 1024 * 1024 } // 1MB
fn default_app_name() -> String { "AI Chatbot".to_string() }
fn default_app_url() -> String { "http://localhost:5000".to_string() }
fn default_log_level() -> String { "info".to_string() }
fn default_cors_enabled() -> bool { true }

impl Default for Config {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            api_timeout_seconds: default_api_timeout(),
            server: ServerConfig::default(),
            app: AppInfo::default(),
            providers: ProvidersConfig::default(),
            logging: LoggingConfig::default(),
            security: SecurityConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            production: false,
            max_request_size_bytes: default_max_request_size(),
        }
    }
}

impl Default for AppInfo {
    fn default() -> Self {
        Self {
            name: default_app_name(),
            url: default_app_url(),
        }
    }
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai: ProviderDetail::openai(),
            anthropic: ProviderDetail::anthropic(),
            openrouter: ProviderDetail::openrouter(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: None,
        }
    }
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            cors_enabled: default_cors_enabled(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ProviderDetail {
    fn openai() -> Self {
        Self {
            api_key: None,
            model: "gpt-3.5-turbo".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
        }
    }

    fn anthropic() -> Self {
        Self {
            api_key: None,
            model: "claude-3-haiku-20240307".to_string(),
            api_base: "https://api.anthropic.com/v1".to_string(),
        }
    }

    fn openrouter() -> Self {
        Self {
            api_key: None,
            model: "openai/gpt-3.5-turbo".to_string(),
            api_base: "https://openrouter.ai/api/v1".to_string(),
        }
    }

    /// The API key, treating an empty value as unset
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }

    /// Full URL for `path` under this provider's API base
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_base.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

/// Environment values are parsed before deserialization, so a key, model or
/// name made only of digits arrives as a number. Take any scalar as text.
struct ScalarText;

impl<'de> de::Visitor<'de> for ScalarText {
    type Value = Option<String>;

    fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("a string or another scalar value")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_char<E: de::Error>(self, v: char) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f32<E: de::Error>(self, v: f32) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, de: D) -> Result<Self::Value, D::Error> {
        de.deserialize_any(self)
    }
}

fn string_from_scalar<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    de.deserialize_any(ScalarText)?
        .ok_or_else(|| de::Error::invalid_type(Unexpected::Unit, &"a string"))
}

fn opt_string_from_scalar<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    de.deserialize_any(ScalarText)
}

/// `true` in any letter case turns the flag on; any other word turns it off
fn bool_from_flag<'de, D: Deserializer<'de>>(de: D) -> Result<bool, D::Error> {
    struct Flag;

    impl<'de> de::Visitor<'de> for Flag {
        type Value = bool;

        fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("a boolean flag")
        }

        fn visit_bool<E: de::Error>(self, v: bool) -> Result<bool, E> {
            Ok(v)
        }

        fn visit_str<E: de::Error>(self, v: &str) -> Result<bool, E> {
            Ok(v.trim().eq_ignore_ascii_case("true"))
        }

        fn visit_i64<E: de::Error>(self, v: i64) -> Result<bool, E> {
            Ok(v == 1)
        }

        fn visit_u64<E: de::Error>(self, v: u64) -> Result<bool, E> {
            Ok(v == 1)
        }
    }

    de.deserialize_any(Flag)
}

/// `FLASK_PORT`, still set by older deployment files; `PORT` wins over it
fn legacy_port_env() -> Env {
    Env::raw().only(&["FLASK_PORT"]).map(|_| "server.port".into())
}

/// Flat environment variables, named the way deployment `.env` files name them
fn flat_env() -> Env {
    Env::raw().filter_map(|key| {
        let mapped = match key.as_str().to_ascii_uppercase().as_str() {
            "API_PROVIDER" => "provider",
            "API_TIMEOUT" => "api_timeout_seconds",
            "PORT" => "server.port",
            "PRODUCTION" => "server.production",
            "APP_NAME" => "app.name",
            "APP_URL" => "app.url",
            "OPENAI_API_KEY" => "providers.openai.api_key",
            "OPENAI_MODEL" => "providers.openai.model",
            "ANTHROPIC_API_KEY" => "providers.anthropic.api_key",
            "ANTHROPIC_MODEL" => "providers.anthropic.model",
            "OPENROUTER_API_KEY" => "providers.openrouter.api_key",
            "OPENROUTER_MODEL" => "providers.openrouter.model",
            "LOG_LEVEL" => "logging.level",
            "LOG_FORMAT" => "logging.format",
            _ => return None,
        };
        Some(mapped.into())
    })
}

impl Config {
    /// Layered configuration sources, lowest priority first
    ///
    /// 1. built-in defaults
    /// 2. the TOML file at `path` (skipped when missing)
    /// 3. flat variables such as `API_PROVIDER` or `OPENAI_API_KEY`
    /// 4. nested variables such as `CHAT_RELAY_PROVIDERS__OPENAI__API_BASE`
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(legacy_port_env())
            .merge(flat_env())
            .merge(Env::prefixed("CHAT_RELAY_").split("__"))
    }

    /// Extract and validate a configuration from `figment`
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let mut config: Config = figment
            .extract()
            .context("Failed to load configuration from file or environment variables")?;

        config.provider = config.provider.trim().to_ascii_lowercase();

        config.validate().context("Configuration validation failed")?;

        Ok(config)
    }

    /// 验证整个配置的有效性
    ///
    /// The selected provider name and the presence of API keys are left to
    /// request time, where they map onto client-visible errors.
    pub fn validate(&self) -> Result<()> {
        if self.api_timeout_seconds == 0 {
            return Err(anyhow::anyhow!("API timeout must be greater than 0"));
        }

        if self.api_timeout_seconds > 300 {
            return Err(anyhow::anyhow!("API timeout cannot exceed 300 seconds"));
        }

        self.server.validate()
            .context("Server configuration validation failed")?;

        for (name, provider) in self.providers.iter() {
            provider.validate()
                .with_context(|| format!("Provider '{}' configuration validation failed", name))?;
        }

        self.logging.validate()
            .context("Logging configuration validation failed")?;

        self.security.validate()
            .context("Security configuration validation failed")?;

        Ok(())
    }

    /// Log format to use, derived from the serving mode unless set explicitly
    pub fn log_format(&self) -> &str {
        match &self.logging.format {
            Some(format) => format.as_str(),
            None if self.server.production => "json",
            None => "pretty",
        }
    }
}

/// 加载配置文件和环境变量
///
/// ## 执行例子
/// ```no_run
/// let config = chat_relay::load_config("config.toml")?;
/// println!("Relaying to {} on port {}", config.provider, config.server.port);
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    Config::from_figment(Config::figment(path))
}

impl ServerConfig {
    pub fn validate(&self) -> Result<()> {
        if self.host.is_empty() {
            return Err(anyhow::anyhow!("Server host cannot be empty"));
        }

        if self.port == 0 {
            return Err(anyhow::anyhow!("Server port cannot be 0"));
        }

        if self.max_request_size_bytes == 0 {
            return Err(anyhow::anyhow!("Max request size must be greater than 0"));
        }

        // 100MB
        if self.max_request_size_bytes > 100 * 1024 * 1024 {
            return Err(anyhow::anyhow!("Max request size cannot exceed 100MB"));
        }

        Ok(())
    }
}

impl ProvidersConfig {
    /// Provider settings paired with their identifiers
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &ProviderDetail)> {
        [
            ("openai", &self.openai),
            ("anthropic", &self.anthropic),
            ("openrouter", &self.openrouter),
        ]
        .into_iter()
    }
}

impl ProviderDetail {
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(anyhow::anyhow!("Provider model cannot be empty"));
        }

        if !self.api_base.starts_with("http://") && !self.api_base.starts_with("https://") {
            return Err(anyhow::anyhow!("Provider API base URL must start with http:// or https://"));
        }

        Ok(())
    }
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.level.as_str()) {
            return Err(anyhow::anyhow!(
                "Invalid log level '{}': must be one of {:?}",
                self.level, valid_levels
            ));
        }

        if let Some(format) = &self.format {
            let valid_formats = ["json", "pretty", "compact"];
            if !valid_formats.contains(&format.as_str()) {
                return Err(anyhow::anyhow!(
                    "Invalid log format '{}': must be one of {:?}",
                    format, valid_formats
                ));
            }
        }

        Ok(())
    }
}

impl SecurityConfig {
    pub fn validate(&self) -> Result<()> {
        if self.cors_enabled {
            for origin in &self.allowed_origins {
                if origin != "*" && !origin.starts_with("http://") && !origin.starts_with("https://") {
                    return Err(anyhow::anyhow!(
                        "Allowed origin '{}' must be '*' or start with http:// or https://",
                        origin
                    ));
                }
            }
        }

        Ok(())
    }
}
