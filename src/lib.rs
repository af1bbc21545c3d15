pub mod api;
pub mod config;
pub mod core_state;
pub mod db;
pub mod models;
pub mod patient;
pub mod pipeline;
pub mod queue;
pub mod triage;

use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::{ConfigError, Settings};
use crate::core_state::{CoreError, CoreState};

/// Errors that stop the service before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Core(#[from] CoreError),
    #[error("Failed to start async runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error("{0}")]
    Server(String),
}

pub fn run() -> Result<(), StartupError> {
    // Loads `.env` first so RUST_LOG from it applies to the subscriber.
    let settings = Settings::from_env()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);

    // Blocking HTTP clients must be built outside the async runtime.
    let core = Arc::new(CoreState::from_settings(&settings)?);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    let result = runtime.block_on(api::serve(
        Arc::clone(&core),
        settings.bind_addr,
        shutdown_signal(),
    ));

    // The runtime goes first: the analyzer's blocking client owns its own
    // runtime, which must not be dropped from async context.
    drop(runtime);
    drop(core);

    result.map_err(StartupError::Server)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown requested");
}
