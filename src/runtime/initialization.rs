//! # Initialization
//!
//! Operator start-up: rustls, tracing, metrics, HTTP server and Kubernetes
//! client.

use crate::apply::KubeObjectStore;
use crate::config::ControllerConfig;
use crate::controller::server::{start_server, ServerState};
use crate::controller::{address_pool, metallb, Context};
use crate::observability;
use anyhow::{Context as _, Result};
use kube::Client;
use std::sync::Arc;
use tracing::{error, info};

/// Everything the controllers need to run
pub struct InitializationResult {
    pub context: Arc<Context>,
    /// Server state for health checks, readiness reported by the controllers
    pub server_state: Arc<ServerState>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult")
            .field("server_ready", &self.server_state.is_ready())
            .finish_non_exhaustive()
    }
}

/// Install the ring crypto provider for rustls. Must run before any client
/// is created.
pub fn install_crypto_provider() {
    // Fails only if a provider is already installed
    let _ = rustls::crypto::ring::default_provider().install_default();
}

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "metallb_operator=info".into()),
        )
        .init();
}

pub async fn initialize(config: ControllerConfig) -> Result<InitializationResult> {
    install_crypto_provider();
    init_tracing();

    info!("Starting MetalLB operator");
    info!(
        "Build info: timestamp={}, datetime={}, git_hash={}",
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_DATETIME"),
        env!("BUILD_GIT_HASH")
    );
    info!(
        "Installing into namespace {} (controller image {}, speaker image {})",
        config.namespace, config.controller_image, config.speaker_image
    );

    observability::metrics::register_metrics()?;

    let server_state = Arc::new(ServerState::new(&[
        metallb::CONTROLLER_NAME,
        address_pool::CONTROLLER_NAME,
    ]));

    let server_state_clone = server_state.clone();
    let port = config.metrics_port;
    let server_handle = tokio::spawn(async move {
        if let Err(e) = start_server(port, server_state_clone).await {
            error!("HTTP server error: {}", e);
        }
    });
    wait_for_server_ready(&server_state, &server_handle, &config).await?;

    let client = Client::try_default()
        .await
        .context("Failed to create Kubernetes client")?;

    let context = Arc::new(Context {
        store: Arc::new(KubeObjectStore::new(client.clone())),
        client,
        config,
    });

    Ok(InitializationResult {
        context,
        server_state,
    })
}

async fn wait_for_server_ready(
    server_state: &Arc<ServerState>,
    server_handle: &tokio::task::JoinHandle<()>,
    config: &ControllerConfig,
) -> Result<()> {
    let startup_timeout = config.startup_timeout();
    let poll_interval = config.poll_interval();
    let start_time = std::time::Instant::now();

    loop {
        if server_handle.is_finished() {
            return Err(anyhow::anyhow!("HTTP server failed to start"));
        }

        if server_state.is_listening() {
            info!("HTTP server is ready and accepting connections");
            return Ok(());
        }

        if start_time.elapsed() > startup_timeout {
            return Err(anyhow::anyhow!(
                "HTTP server failed to become ready within {} seconds",
                startup_timeout.as_secs()
            ));
        }

        tokio::time::sleep(poll_interval).await;
    }
}
