use std::sync::Arc;
use std::time::Duration;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, DefaultBodyLimit, State},
    http::{header, HeaderMap, HeaderValue, Method, StatusCode},
    middleware,
    response::Json,
    routing::{get, post},
    Router,
};
use reqwest::Client;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{
    config::{Config, SecurityConfig},
    errors::{AppError, AppResult},
    middleware::request_context_middleware,
    models::{ChatRequest, ChatResponse, HealthResponse, preview},
    providers::ProviderRegistry,
};

/// Characters of the inbound message included in the receipt log line
const LOG_PREVIEW_CHARS: usize = 50;

/// 应用程序状态 - 在所有请求处理器之间共享
///
/// Both fields are read-only after startup.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registry: Arc<ProviderRegistry>,
}

impl AppState {
    /// Create new application state from configuration
    pub fn new(config: Config) -> AppResult<Self> {
        // One pooled client for all providers; its timeout bounds every upstream call
        let http_client = Client::builder()
            .timeout(Duration::from_secs(config.api_timeout_seconds))
            .pool_max_idle_per_host(10)
            .pool_idle_timeout(Duration::from_secs(90))
            .build()
            .map_err(|e| AppError::ConfigError(format!("Failed to create HTTP client: {}", e)))?;

        let registry = ProviderRegistry::new(&config, http_client);

        Ok(Self::with_registry(config, registry))
    }

    /// State around an existing registry
    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Self {
        Self {
            config: Arc::new(config),
            registry: Arc::new(registry),
        }
    }
}

/// Create the main application router with all routes and middleware
pub fn create_app(state: AppState) -> Router {
    let body_limit = state.config.server.max_request_size_bytes;
    let cors = cors_layer(&state.config.security);

    Router::new()
        .route("/api/chat", post(chat_handler))
        .route("/health", get(health_handler))
        .fallback(not_found_handler)
        .with_state(state)
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_context_middleware))
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
}

/// CORS policy from the security settings
///
/// Any origin is allowed unless `allowed_origins` lists specific ones. When
/// CORS is disabled the layer allows nothing and adds no headers.
pub fn cors_layer(security: &SecurityConfig) -> CorsLayer {
    if !security.cors_enabled {
        return CorsLayer::new();
    }

    if security.allowed_origins.is_empty() || security.allowed_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = security
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> AppResult<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let mode = if config.server.production { "production" } else { "development" };

    let app_state = AppState::new(config)?;
    let app = create_app(app_state);

    let listener = TcpListener::bind(&addr).await
        .map_err(|e| AppError::ConfigError(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!(mode, "Chat relay starting on {}", addr);
    tracing::info!("Available endpoints:");
    tracing::info!("  POST /api/chat - Relay a message to the configured provider");
    tracing::info!("  GET  /health - Health check");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalServerError(format!("Server error: {}", e)))?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for ctrl-c");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}

// Request Handlers

/// Handle chat relay requests
///
/// Validation and provider resolution happen before any upstream call.
/// Every failure is logged with its full detail here, even when the
/// client-facing message is generic.
async fn chat_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<Json<ChatResponse>> {
    relay_chat(&state, &headers, body)
        .await
        .map(Json)
        .inspect_err(|e| {
            tracing::error!(provider = %state.config.provider, error = %e, "Error processing chat request");
        })
}

async fn relay_chat(
    state: &AppState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> AppResult<ChatResponse> {
    if !is_json_content_type(headers) {
        return Err(AppError::bad_request("Request must be JSON"));
    }

    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            AppError::PayloadTooLarge("Request body exceeds the configured size limit".to_string())
        } else {
            AppError::bad_request(rejection.body_text())
        }
    })?;

    let request: ChatRequest = serde_json::from_slice(&body)
        .map_err(|e| AppError::bad_request(format!("Invalid JSON body: {}", e)))?;

    let message = request
        .trimmed_message()
        .ok_or_else(|| AppError::bad_request("Message cannot be empty"))?;

    tracing::info!("Received message: {}...", preview(message, LOG_PREVIEW_CHARS));

    let provider_id = state.config.provider.as_str();
    let provider = state
        .registry
        .lookup(provider_id)
        .ok_or_else(|| AppError::InvalidProvider(provider_id.to_string()))?;

    let reply = provider
        .send(message)
        .await
        .map_err(|e| AppError::provider(provider_id, e))?;

    tracing::info!(provider = provider_id, "Reply successfully generated");

    Ok(ChatResponse::new(reply, provider_id))
}

/// `application/json` or any `application/*+json` media type
fn is_json_content_type(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };

    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    mime == "application/json" || (mime.starts_with("application/") && mime.ends_with("+json"))
}

/// Handle system health check; never contacts a provider
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse::healthy(state.config.provider.as_str()))
}

async fn not_found_handler() -> AppError {
    AppError::NotFound("Not found".to_string())
}
