//! Dashboard HTTP server
//!
//! Serves the latest metrics snapshot at `/metrics` and the dashboard's
//! static assets everywhere else. The router is built per server instance
//! and owned by it; nothing is registered globally.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;
use log::{debug, info, warn};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::services::ServeDir;

use super::metrics::{evaluate_snapshot, now_ms, SnapshotStatus, EMPTY_METRICS};
use crate::domain::{DashboardSettings, PeepError, Result, STALE_AFTER};

/// What the `/metrics` handler needs on every request
#[derive(Debug, Clone)]
pub struct DashboardState {
    pub metrics_path: PathBuf,
    pub stale_after: Duration,
}

impl DashboardState {
    pub fn new(metrics_path: impl Into<PathBuf>) -> Self {
        Self { metrics_path: metrics_path.into(), stale_after: STALE_AFTER }
    }
}

pub fn build_router(state: Arc<DashboardState>, static_dir: &Path) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .fallback_service(ServeDir::new(static_dir))
        .with_state(state)
}

/// Forward the snapshot file, or `{}` when it is missing, unreadable or stale.
async fn metrics_handler(State(state): State<Arc<DashboardState>>) -> Response {
    let body = match tokio::fs::read(&state.metrics_path).await {
        Ok(bytes) => match evaluate_snapshot(&bytes, now_ms(), state.stale_after) {
            SnapshotStatus::Fresh(_) => bytes,
            SnapshotStatus::Stale { age_ms } => {
                debug!("Snapshot is {age_ms}ms old, serving empty metrics");
                EMPTY_METRICS.as_bytes().to_vec()
            }
            SnapshotStatus::Unreadable => EMPTY_METRICS.as_bytes().to_vec(),
        },
        Err(_) => EMPTY_METRICS.as_bytes().to_vec(),
    };
    ([(header::CONTENT_TYPE, "application/json")], body).into_response()
}

/// A running dashboard; stop it with [`DashboardServer::shutdown`].
#[derive(Debug)]
pub struct DashboardServer {
    addr: SocketAddr,
    shutdown_tx: oneshot::Sender<()>,
    task: JoinHandle<std::io::Result<()>>,
}

impl DashboardServer {
    /// Bind on all interfaces at `settings.port` and start serving.
    ///
    /// # Errors
    /// `DashboardBind` if the port cannot be bound.
    pub async fn start(settings: &DashboardSettings) -> Result<Self> {
        let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
        let listener = tokio::net::TcpListener::bind(addr)
            .await
            .map_err(|source| PeepError::DashboardBind { addr, source })?;
        let addr = listener.local_addr().map_err(|source| PeepError::DashboardBind { addr, source })?;

        let state = Arc::new(DashboardState::new(&settings.metrics_path));
        let app = build_router(state, &settings.static_dir);
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        let task = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        info!("Dashboard server listening on {addr}");
        Ok(Self { addr, shutdown_tx, task })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Stop accepting connections and wait for in-flight requests, at most
    /// `timeout`; connections still open after that are dropped.
    pub async fn shutdown(self, timeout: Duration) {
        let Self { shutdown_tx, mut task, .. } = self;
        let _ = shutdown_tx.send(());
        match tokio::time::timeout(timeout, &mut task).await {
            Ok(Ok(Ok(()))) => info!("Dashboard server stopped"),
            Ok(Ok(Err(e))) => warn!("Dashboard server error: {e}"),
            Ok(Err(e)) => warn!("Dashboard server task failed: {e}"),
            Err(_) => {
                warn!("Dashboard shutdown exceeded {timeout:?}, dropping connections");
                task.abort();
            }
        }
    }
}
