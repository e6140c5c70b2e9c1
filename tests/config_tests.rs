use chat_relay::config::*;
use figment::Jail;

// Helper function to create a valid config for testing
fn create_valid_config() -> Config {
    let mut config = Config::default();
    config.providers.openai.api_key = Some("sk-test-1234567890".to_string());
    config
}

#[test]
fn test_defaults() {
    let config = Config::default();

    assert_eq!(config.provider, "openai");
    assert_eq!(config.api_timeout_seconds, 30);
    assert_eq!(config.server.port, 5000);
    assert!(!config.server.production);
    assert_eq!(config.app.name, "AI Chatbot");
    assert_eq!(config.app.url, "http://localhost:5000");
    assert_eq!(config.providers.openai.model, "gpt-3.5-turbo");
    assert_eq!(config.providers.anthropic.model, "claude-3-haiku-20240307");
    assert_eq!(config.providers.openrouter.model, "openai/gpt-3.5-turbo");
    assert!(config.security.cors_enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_valid() {
    assert!(create_valid_config().validate().is_ok());
}

#[test]
fn test_unknown_provider_and_missing_key_are_not_startup_errors() {
    let mut config = Config::default();
    config.provider = "gemini".to_string();
    config.providers.openai.api_key = None;
    assert!(config.validate().is_ok());
}

#[test]
fn test_timeout_bounds() {
    let mut config = create_valid_config();

    config.api_timeout_seconds = 0;
    let result = config.validate();
    assert!(result.is_err());
    assert!(result.unwrap_err().to_string().contains("API timeout must be greater than 0"));

    config.api_timeout_seconds = 301;
    assert!(config.validate().is_err());

    config.api_timeout_seconds = 300;
    assert!(config.validate().is_ok());
}

#[test]
fn test_server_config_validation() {
    let mut server = ServerConfig::default();
    assert!(server.validate().is_ok());

    server.port = 0;
    assert!(server.validate().unwrap_err().to_string().contains("port cannot be 0"));

    let mut server = ServerConfig::default();
    server.host = String::new();
    assert!(server.validate().is_err());

    let mut server = ServerConfig::default();
    server.max_request_size_bytes = 0;
    assert!(server.validate().is_err());
}

#[test]
fn test_provider_detail_validation() {
    let mut config = create_valid_config();
    config.providers.anthropic.api_base = "ftp://api.anthropic.com".to_string();
    let error = config.validate().unwrap_err();
    assert!(format!("{:#}", error).contains("Provider 'anthropic' configuration validation failed"));

    let mut config = create_valid_config();
    config.providers.openrouter.model = "  ".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_provider_detail_helpers() {
    let detail = ProviderDetail {
        api_key: Some("".to_string()),
        model: "gpt-4".to_string(),
        api_base: "https://api.openai.com/v1/".to_string(),
    };

    assert_eq!(detail.api_key(), None);
    assert_eq!(detail.endpoint("chat/completions"), "https://api.openai.com/v1/chat/completions");
    assert_eq!(detail.endpoint("/messages"), "https://api.openai.com/v1/messages");
}

#[test]
fn test_logging_validation_and_format() {
    let mut config = create_valid_config();
    assert_eq!(config.log_format(), "pretty");

    config.server.production = true;
    assert_eq!(config.log_format(), "json");

    config.logging.format = Some("compact".to_string());
    assert_eq!(config.log_format(), "compact");

    config.logging.format = Some("xml".to_string());
    assert!(config.validate().is_err());

    config.logging.format = None;
    config.logging.level = "verbose".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_security_validation() {
    let mut security = SecurityConfig::default();
    security.allowed_origins = vec!["*".to_string(), "https://example.com".to_string()];
    assert!(security.validate().is_ok());

    security.allowed_origins = vec!["example.com".to_string()];
    assert!(security.validate().is_err());

    security.cors_enabled = false;
    assert!(security.validate().is_ok());
}

#[test]
fn test_load_from_flat_environment() {
    Jail::expect_with(|jail| {
        jail.set_env("API_PROVIDER", "Anthropic");
        jail.set_env("API_TIMEOUT", "45");
        jail.set_env("ANTHROPIC_API_KEY", "sk-ant-test");
        jail.set_env("ANTHROPIC_MODEL", "claude-3-5-haiku-latest");
        jail.set_env("APP_NAME", "Relay Test");
        jail.set_env("PORT", "8081");
        jail.set_env("PRODUCTION", "true");

        let config = load_config("missing.toml").map_err(|e| e.to_string())?;

        assert_eq!(config.provider, "anthropic");
        assert_eq!(config.api_timeout_seconds, 45);
        assert_eq!(config.providers.anthropic.api_key(), Some("sk-ant-test"));
        assert_eq!(config.providers.anthropic.model, "claude-3-5-haiku-latest");
        assert_eq!(config.app.name, "Relay Test");
        assert_eq!(config.server.port, 8081);
        assert!(config.server.production);
        // Untouched defaults survive the merge
        assert_eq!(config.providers.anthropic.api_base, "https://api.anthropic.com/v1");
        assert_eq!(config.app.url, "http://localhost:5000");

        Ok(())
    });
}

#[test]
fn test_load_from_toml_file_with_env_override() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "relay.toml",
            r#"
                provider = "openrouter"
                api_timeout_seconds = 10

                [server]
                host = "127.0.0.1"
                port = 9000

                [providers.openrouter]
                api_key = "sk-or-file"
                model = "anthropic/claude-3-haiku"
                api_base = "https://openrouter.ai/api/v1"

                [security]
                allowed_origins = ["https://chat.example.com"]
            "#,
        )?;
        jail.set_env("OPENROUTER_API_KEY", "sk-or-env");
        jail.set_env("CHAT_RELAY_SERVER__PORT", "9100");

        let config = load_config("relay.toml").map_err(|e| e.to_string())?;

        assert_eq!(config.provider, "openrouter");
        assert_eq!(config.api_timeout_seconds, 10);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.providers.openrouter.api_key(), Some("sk-or-env"));
        assert_eq!(config.providers.openrouter.model, "anthropic/claude-3-haiku");
        assert_eq!(config.security.allowed_origins, vec!["https://chat.example.com"]);
        assert_eq!(config.providers.openai.model, "gpt-3.5-turbo");

        Ok(())
    });
}

#[test]
fn test_load_rejects_invalid_values() {
    Jail::expect_with(|jail| {
        jail.set_env("API_TIMEOUT", "0");

        let error = load_config("missing.toml").unwrap_err();
        assert!(format!("{:#}", error).contains("API timeout must be greater than 0"));

        Ok(())
    });
}

#[test]
fn test_cli_style_override_wins() {
    Jail::expect_with(|jail| {
        jail.set_env("PORT", "8081");

        let figment = Config::figment("missing.toml").merge(("server.port", 7000));
        let config = Config::from_figment(figment).map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 7000);

        Ok(())
    });
}

#[test]
fn test_production_flag_is_lenient() {
    Jail::expect_with(|jail| {
        jail.set_env("PRODUCTION", "True");
        let config = load_config("missing.toml").map_err(|e| e.to_string())?;
        assert!(config.server.production);

        jail.set_env("PRODUCTION", "no");
        let config = load_config("missing.toml").map_err(|e| e.to_string())?;
        assert!(!config.server.production);

        jail.set_env("PRODUCTION", "FALSE");
        let config = load_config("missing.toml").map_err(|e| e.to_string())?;
        assert!(!config.server.production);

        Ok(())
    });
}

#[test]
fn test_numeric_looking_text_values_are_kept_as_text() {
    Jail::expect_with(|jail| {
        jail.set_env("APP_NAME", "2024");
        jail.set_env("OPENAI_API_KEY", "1234567890");
        jail.set_env("OPENROUTER_MODEL", "42");
        jail.set_env("CHAT_RELAY_APP__URL", "true");

        let config = load_config("missing.toml").map_err(|e| e.to_string())?;

        assert_eq!(config.app.name, "2024");
        assert_eq!(config.providers.openai.api_key(), Some("1234567890"));
        assert_eq!(config.providers.openrouter.model, "42");
        assert_eq!(config.app.url, "true");

        Ok(())
    });
}

#[test]
fn test_flask_port_alias() {
    Jail::expect_with(|jail| {
        jail.set_env("FLASK_PORT", "8200");
        let config = load_config("missing.toml").map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 8200);

        jail.set_env("PORT", "8300");
        let config = load_config("missing.toml").map_err(|e| e.to_string())?;
        assert_eq!(config.server.port, 8300);

        Ok(())
    });
}
