pub mod api;
pub mod config;
pub mod core_state;
pub mod form;
pub mod models;
pub mod pipeline;
pub mod prediction_service;
pub mod results;
pub mod session_bridge;

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::config::AppConfig;
use crate::core_state::CoreState;

#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Startup error: {0}")]
    Core(#[from] core_state::CoreError),
    #[error("Server error: {0}")]
    Server(#[from] api::ServerError),
    #[error("Signal handler error: {0}")]
    Signal(#[from] std::io::Error),
}

/// Run the service until Ctrl-C.
pub async fn run() -> Result<(), RunError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    let config = AppConfig::from_env()?;
    tracing::info!(
        backend = %config.backend.base_url,
        bind = %config.bind_addr,
        store = ?config.store,
        "Configuration loaded"
    );

    let bind_addr = config.bind_addr;
    let core = Arc::new(CoreState::from_config(config)?);

    // Backend may come up later; the status is re-probed on every health call
    let status = core.refresh_api_status().await;
    tracing::info!(%status, "Prediction backend probed");

    let server = api::start_server(core, bind_addr).await?;
    tracing::info!(addr = %server.addr, "Listening, press Ctrl-C to stop");

    let signal = tokio::signal::ctrl_c().await;
    server.stop().await;
    signal?;

    tracing::info!("{} stopped", config::APP_NAME);
    Ok(())
}
