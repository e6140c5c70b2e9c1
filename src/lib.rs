pub mod config;
pub mod errors;
pub mod middleware;
pub mod models;
pub mod providers;
pub mod server;

// Re-export commonly used types for easier access
pub use config::{Config, load_config};
pub use errors::{AppError, AppResult, ProviderError};
pub use server::{AppState, create_app, start_server};
