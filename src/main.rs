use std::path::PathBuf;

use chat_relay::{config::DEFAULT_CONFIG_FILE, start_server, AppError, Config};
use clap::Parser;
use tracing_subscriber::{
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// HTTP relay that forwards chat messages to a configured LLM provider
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Path to the TOML configuration file (optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Port to listen on, overriding configuration and environment
    #[arg(short, long)]
    port: Option<u16>,
}

/// 主函数 - 服务入口点
///
/// Loads `.env`, configuration and logging, then serves until shutdown.
#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    // A missing .env file is fine; variables may come from the environment
    let _ = dotenvy::dotenv();

    let mut figment = Config::figment(&cli.config);
    if let Some(port) = cli.port {
        figment = figment.merge(("server.port", port));
    }

    let config = Config::from_figment(figment)?;

    init_tracing(&config)?;

    tracing::info!(
        provider = %config.provider,
        host = %config.server.host,
        port = config.server.port,
        production = config.server.production,
        timeout_seconds = config.api_timeout_seconds,
        "Configuration loaded successfully"
    );

    warn_on_unusable_provider(&config);

    start_server(config).await?;

    Ok(())
}

/// 初始化结构化日志系统
///
/// `RUST_LOG` takes precedence over the configured level. The output format
/// follows [`Config::log_format`].
fn init_tracing(config: &Config) -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "chat_relay={level},tower_http={level}",
            level = config.logging.level
        ))
    });

    let fmt_layer = match config.log_format() {
        "json" => fmt::layer()
            .with_target(true)
            .with_file(true)
            .with_line_number(true)
            .json()
            .boxed(),
        "compact" => fmt::layer().with_target(false).compact().boxed(),
        _ => fmt::layer().with_target(true).pretty().boxed(),
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .try_init()
        .map_err(|e| AppError::ConfigError(format!("Failed to initialize tracing: {}", e)))?;

    Ok(())
}

/// The relay still starts with an unknown provider or a missing key; requests
/// report the problem. Flag it early so operators see it in the startup log.
fn warn_on_unusable_provider(config: &Config) {
    match config.providers.iter().find(|(id, _)| *id == config.provider) {
        None => tracing::warn!(
            provider = %config.provider,
            "Configured provider is not supported; chat requests will be rejected"
        ),
        Some((id, detail)) if detail.api_key().is_none() => tracing::warn!(
            provider = id,
            "No API key configured for the selected provider"
        ),
        Some(_) => {}
    }
}
