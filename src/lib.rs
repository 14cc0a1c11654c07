pub mod api; // HTTP surface
pub mod config;
pub mod pipeline; // Intake, jobs, batch, workflow
pub mod templates;

use tracing_subscriber::EnvFilter;

use crate::api::{start_api_server_on, ApiContext, ServerError};
use crate::config::{ConfigError, ServiceConfig};

#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Server(#[from] ServerError),
    #[error("Failed to listen for shutdown signal: {0}")]
    Signal(std::io::Error),
}

/// Initialize tracing. `RUST_LOG` overrides the default filter.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();
}

/// Load configuration, serve until Ctrl-C, then drain in-flight requests.
pub async fn run() -> Result<(), StartupError> {
    init_tracing();

    let config = ServiceConfig::from_env()?;
    tracing::info!(
        "{} starting v{}",
        config::APP_NAME,
        config::APP_VERSION
    );
    tracing::debug!(?config, "Loaded configuration");

    let ctx = ApiContext::simulated(config.clone());
    tracing::info!(backend = ctx.coordinator.backend_name(), "Extraction backend ready");

    let mut server = start_api_server_on(ctx, config.socket_addr()).await?;
    let base = display_url(&server.session.server_addr);
    tracing::info!("{} running on {base}", config::APP_NAME);
    tracing::info!("Health: {base}/api/health");

    let signal = tokio::signal::ctrl_c().await;
    server.shutdown();
    server.stopped().await;
    signal.map_err(StartupError::Signal)
}

/// Wildcard binds are shown as `localhost` so the printed URL is clickable.
fn display_url(addr: &std::net::SocketAddr) -> String {
    if addr.ip().is_unspecified() {
        format!("http://localhost:{}", addr.port())
    } else {
        format!("http://{addr}")
    }
}
