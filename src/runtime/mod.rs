//! # Runtime
//!
//! - `initialization`: start-up of logging, metrics, server and client
//! - `error_policy`: retry decisions for failed reconciliations

pub mod error_policy;
pub mod initialization;

use crate::config::ControllerConfig;
use crate::controller::{run_address_pool_controller, run_metallb_controller};
use anyhow::Result;
use tracing::info;

/// Run both controllers until a shutdown signal
pub async fn run(config: ControllerConfig) -> Result<()> {
    let init = initialization::initialize(config).await?;

    tokio::join!(
        run_metallb_controller(init.context.clone(), init.server_state.clone()),
        run_address_pool_controller(init.context.clone(), init.server_state.clone()),
    );

    info!("Operator stopped");
    Ok(())
}
