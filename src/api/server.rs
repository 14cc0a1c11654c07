//! API server lifecycle: starts/stops the axum HTTP server.
//!
//! bind → spawn background task → return handle with shutdown channel.

use std::net::SocketAddr;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use crate::api::router::api_router;
use crate::api::types::ApiContext;

// ═══════════════════════════════════════════════════════════
// Public types
// ═══════════════════════════════════════════════════════════

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Failed to bind API server on {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        source: std::io::Error,
    },
    #[error("Failed to get server address: {0}")]
    LocalAddr(std::io::Error),
}

/// Where a running API server listens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApiSession {
    pub server_addr: SocketAddr,
    pub port: u16,
}

/// Handle to a running API server.
pub struct ApiServer {
    pub session: ApiSession,
    shutdown_tx: Option<oneshot::Sender<()>>,
    task: JoinHandle<()>,
}

impl ApiServer {
    /// Signal graceful shutdown. Idempotent.
    pub fn shutdown(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
            tracing::info!("API server shutdown signal sent");
        }
    }

    /// Wait for the server task to finish (after `shutdown`, in-flight
    /// requests drain first).
    pub async fn stopped(self) {
        if let Err(e) = self.task.await {
            tracing::error!("API server task failed: {e}");
        }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.session.server_addr)
    }
}

// ═══════════════════════════════════════════════════════════
// Server lifecycle
// ═══════════════════════════════════════════════════════════

/// Start the API server on `addr` (port 0 picks an ephemeral port).
///
/// Builds the full `api_router` and spawns the axum server in a
/// background tokio task.
pub async fn start_api_server_on(
    ctx: ApiContext,
    addr: SocketAddr,
) -> Result<ApiServer, ServerError> {
    // 1. Bind
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind { addr, source })?;

    let addr = listener.local_addr().map_err(ServerError::LocalAddr)?;

    tracing::debug!(%addr, "API server bound");

    // 2. Build the router
    let app = api_router(ctx);

    // 3. Listening address
    let session = ApiSession {
        server_addr: addr,
        port: addr.port(),
    };

    // 4. Shutdown signal
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    // 5. Spawn server in background task
    let task = tokio::spawn(async move {
        let shutdown_signal = async move {
            let _ = shutdown_rx.await;
            tracing::info!("API server received shutdown signal");
        };

        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal)
            .await
        {
            tracing::error!("API server error: {e}");
        }

        tracing::info!("API server stopped");
    });

    Ok(ApiServer {
        session,
        shutdown_tx: Some(shutdown_tx),
        task,
    })
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ServiceConfig;
    use std::net::{IpAddr, Ipv4Addr};
    use std::time::Duration;

    fn test_ctx() -> ApiContext {
        ApiContext::simulated(ServiceConfig {
            extract_delay: Duration::ZERO,
            ocr_delay: Duration::ZERO,
            ..ServiceConfig::default()
        })
    }

    fn localhost() -> SocketAddr {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
    }

    #[tokio::test]
    async fn start_serve_and_stop() {
        let mut server = start_api_server_on(test_ctx(), localhost())
            .await
            .expect("server should start");

        assert!(server.session.port > 0);
        assert_eq!(server.session.port, server.session.server_addr.port());

        let url = format!("{}/api/health", server.base_url());
        let resp = reqwest::get(&url).await.unwrap();
        assert!(resp.status().is_success());
        assert_eq!(
            resp.headers().get("cache-control").unwrap(),
            "no-store"
        );
        let json: serde_json::Value = resp.json().await.unwrap();
        assert_eq!(json["status"], "ok");

        server.shutdown();
        tokio::time::timeout(Duration::from_secs(5), server.stopped())
            .await
            .expect("server should stop after shutdown");
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let mut server = start_api_server_on(test_ctx(), localhost())
            .await
            .expect("server should start");

        server.shutdown();
        server.shutdown();
        tokio::time::timeout(Duration::from_secs(5), server.stopped())
            .await
            .expect("server should stop");
    }

    #[tokio::test]
    async fn bind_conflict_is_reported() {
        let holder = std::net::TcpListener::bind(localhost()).unwrap();
        let taken = holder.local_addr().unwrap();

        let result = start_api_server_on(test_ctx(), taken).await;
        assert!(matches!(result, Err(ServerError::Bind { .. })));
    }
}
