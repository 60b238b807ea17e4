//! # Controller
//!
//! The operator's controllers and the HTTP server for metrics and probes.
//!
//! - `metallb`: installs MetalLB for `Metallb` resources
//! - `address_pool`: adds `AddressPool` resources to MetalLB's configuration
//! - `server`: HTTP server for metrics and health checks
//! - `types`: shared context and errors

pub mod address_pool;
pub mod metallb;
pub mod server;
pub mod types;

pub use types::{Context, ReconcilerError};

use crate::crd::{AddressPool, Metallb};
use crate::runtime::error_policy::handle_reconciliation_error;
use server::ServerState;
use futures::StreamExt;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment};
use kube::api::Api;
use kube_runtime::{watcher, Controller};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Watch `Metallb` resources, and the Deployments and DaemonSets they own,
/// in the operator namespace. Returns on shutdown signal.
///
/// The controller is reported running in `state` while it watches.
pub async fn run_metallb_controller(ctx: Arc<Context>, state: Arc<ServerState>) {
    let namespace = ctx.config.namespace.clone();
    let client = ctx.client.clone();
    info!("Starting Metallb controller in namespace {}", namespace);

    let controller = Controller::new(
        Api::<Metallb>::namespaced(client.clone(), &namespace),
        watcher::Config::default(),
    )
    .owns(
        Api::<Deployment>::namespaced(client.clone(), &namespace),
        watcher::Config::default(),
    )
    .owns(
        Api::<DaemonSet>::namespaced(client, &namespace),
        watcher::Config::default(),
    )
    .shutdown_on_signal();

    state.set_controller_running(metallb::CONTROLLER_NAME, true);
    controller
        .run(
            metallb::reconcile,
            |obj, error, ctx| handle_reconciliation_error(obj, error, ctx, metallb::CONTROLLER_NAME),
            ctx,
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!("Reconciled Metallb {}", obj.name),
                Err(e) => warn!("Metallb controller stream error: {}", e),
            }
        })
        .await;

    state.set_controller_running(metallb::CONTROLLER_NAME, false);
    info!("Metallb controller stopped");
}

/// Watch `AddressPool` resources in the operator namespace. Returns on
/// shutdown signal.
pub async fn run_address_pool_controller(ctx: Arc<Context>, state: Arc<ServerState>) {
    let namespace = ctx.config.namespace.clone();
    info!("Starting AddressPool controller in namespace {}", namespace);

    let controller = Controller::new(
        Api::<AddressPool>::namespaced(ctx.client.clone(), &namespace),
        watcher::Config::default(),
    )
    .shutdown_on_signal();

    state.set_controller_running(address_pool::CONTROLLER_NAME, true);
    controller
        .run(
            address_pool::reconcile,
            |obj, error, ctx| {
                handle_reconciliation_error(obj, error, ctx, address_pool::CONTROLLER_NAME)
            },
            ctx,
        )
        .for_each(|result| async move {
            match result {
                Ok((obj, _)) => debug!("Reconciled AddressPool {}", obj.name),
                Err(e) => warn!("AddressPool controller stream error: {}", e),
            }
        })
        .await;

    state.set_controller_running(address_pool::CONTROLLER_NAME, false);
    info!("AddressPool controller stopped");
}
