//! # HTTP Server
//!
//! Metrics and probe endpoints:
//! - `/metrics` - Prometheus metrics in text format
//! - `/healthz` - Liveness probe (always returns 200)
//! - `/readyz` - Readiness probe: 200 once the server is listening and every
//!   registered controller is running, 503 naming what is still pending

use crate::observability::metrics::REGISTRY;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Router,
};
use prometheus::{Encoder, TextEncoder};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::net::TcpListener;
use tracing::{error, info};

/// Readiness of the server socket and of each controller
#[derive(Debug, Default)]
pub struct ServerState {
    listening: AtomicBool,
    controllers: Mutex<BTreeMap<&'static str, bool>>,
}

impl ServerState {
    /// State expecting the named controllers, none of them running yet
    #[must_use]
    pub fn new(controllers: &[&'static str]) -> Self {
        Self {
            listening: AtomicBool::new(false),
            controllers: Mutex::new(controllers.iter().map(|name| (*name, false)).collect()),
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }

    pub fn set_listening(&self, listening: bool) {
        self.listening.store(listening, Ordering::Relaxed);
    }

    /// Record that `controller` started or stopped watching
    pub fn set_controller_running(&self, controller: &'static str, running: bool) {
        self.controllers().insert(controller, running);
    }

    /// Controllers registered but not running, in name order
    pub fn pending_controllers(&self) -> Vec<&'static str> {
        self.controllers()
            .iter()
            .filter(|(_, running)| !**running)
            .map(|(name, _)| *name)
            .collect()
    }

    pub fn is_ready(&self) -> bool {
        self.is_listening() && self.pending_controllers().is_empty()
    }

    fn controllers(&self) -> MutexGuard<'_, BTreeMap<&'static str, bool>> {
        self.controllers.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/metrics", get(metrics_handler))
        .route("/healthz", get(healthz_handler))
        .route("/readyz", get(readyz_handler))
        .with_state(state)
}

/// Serve until the process exits, marking the state listening once bound
pub async fn start_server(port: u16, state: Arc<ServerState>) -> Result<(), anyhow::Error> {
    let addr = format!("0.0.0.0:{port}");
    let listener = TcpListener::bind(&addr).await?;

    info!("HTTP server listening on {}", addr);
    state.set_listening(true);

    axum::serve(listener, router(state)).await?;

    Ok(())
}

async fn metrics_handler() -> impl IntoResponse {
    let mut buffer = Vec::new();
    if let Err(e) = TextEncoder::new().encode(&REGISTRY.gather(), &mut buffer) {
        error!("Failed to encode metrics: {}", e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        );
    }

    (
        StatusCode::OK,
        [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
        buffer,
    )
}

async fn healthz_handler() -> impl IntoResponse {
    StatusCode::OK
}

async fn readyz_handler(State(state): State<Arc<ServerState>>) -> impl IntoResponse {
    if !state.is_listening() {
        return (StatusCode::SERVICE_UNAVAILABLE, "server not listening".to_string());
    }
    let pending = state.pending_controllers();
    if pending.is_empty() {
        (StatusCode::OK, "ok".to_string())
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            format!("controllers not running: {}", pending.join(", ")),
        )
    }
}
