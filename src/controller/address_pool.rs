//! # AddressPool Reconciler
//!
//! Adds the pool of an `AddressPool` resource to MetalLB's configuration
//! ConfigMap. The ConfigMap merge appends rendered pools to the live ones,
//! so a pool already present in the live configuration is not applied again.

use super::types::{Context, ReconcilerError};
use crate::apply::object::{display_name, nested_string};
use crate::apply::{apply_object, ApplyError, ApplyOutcome, MergeError, ObjectStore};
use crate::constants::ADDRESS_POOL_CONFIG_KEY;
use crate::crd::{AddressPool, AddressPoolConfig, AddressPoolEntry};
use crate::observability::metrics;
use crate::render::render_address_pool_config_map;
use kube::api::DynamicObject;
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, info_span, Instrument};

pub const CONTROLLER_NAME: &str = "addresspool";

pub async fn reconcile(pool: Arc<AddressPool>, ctx: Arc<Context>) -> Result<Action, ReconcilerError> {
    let span = info_span!(
        "addresspool.reconcile",
        resource.name = %pool.name_any(),
        resource.namespace = %pool.namespace().unwrap_or_default(),
    );

    let start = Instant::now();
    metrics::increment_reconciliations(CONTROLLER_NAME);
    let result = configure_pool(&pool, &ctx).instrument(span).await;
    metrics::observe_reconciliation_duration(CONTROLLER_NAME, start.elapsed().as_secs_f64());
    result
}

async fn configure_pool(pool: &AddressPool, ctx: &Context) -> Result<Action, ReconcilerError> {
    let outcome = ensure_pool(ctx.store.as_ref(), pool, &ctx.config.namespace).await?;
    info!(
        "Address pool {} configured ({})",
        pool.name_any(),
        outcome.as_str()
    );
    Ok(Action::await_change())
}

/// Add `pool` to the configuration ConfigMap in `namespace`.
///
/// Returns [`ApplyOutcome::Unchanged`] without submitting anything when the
/// live configuration already holds an identical entry.
///
/// # Errors
///
/// Rendering, store and merge failures, or a live payload that does not parse.
pub async fn ensure_pool(
    store: &dyn ObjectStore,
    pool: &AddressPool,
    namespace: &str,
) -> Result<ApplyOutcome, ReconcilerError> {
    let config_map = render_address_pool_config_map(pool, namespace)?;

    if let Some(live) = store.get(&config_map).await? {
        if live_pools(&live)?.contains(&pool.to_entry()) {
            debug!("Address pool {} already configured", pool.name_any());
            return Ok(ApplyOutcome::Unchanged);
        }
    }

    Ok(apply_object(store, config_map).await?)
}

fn live_pools(live: &DynamicObject) -> Result<Vec<AddressPoolEntry>, ApplyError> {
    let merge_error = |source| ApplyError::Merge {
        object: display_name(live),
        source,
    };

    let payload = nested_string(&live.data, &["data", ADDRESS_POOL_CONFIG_KEY]).map_err(merge_error)?;
    let Some(payload) = payload else {
        return Ok(Vec::new());
    };
    AddressPoolConfig::from_yaml(&payload)
        .map(|config| config.address_pools)
        .map_err(|e| merge_error(MergeError::ParseConfig(e)))
}
