//! # Error Policy
//!
//! What the controllers do after a failed reconciliation.

use crate::controller::{Context, ReconcilerError};
use crate::observability;
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::error;

/// Log and count the error, then decide when to retry.
///
/// Permanent errors wait for the resource to change; everything else is
/// requeued after the configured error interval.
pub fn handle_reconciliation_error<K>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<Context>,
    controller: &'static str,
) -> Action
where
    K: Resource,
{
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_default();

    let error_span = tracing::error_span!(
        "controller.reconciliation_error",
        controller,
        resource.name = %name,
        resource.namespace = %namespace,
    );
    let _error_guard = error_span.enter();

    error!("Reconciliation error for {}/{}: {}", namespace, name, error);
    observability::metrics::increment_reconciliation_errors(controller);

    if error.is_permanent() {
        error!("Not retrying {}/{} until it changes", namespace, name);
        Action::await_change()
    } else {
        Action::requeue(ctx.config.reconciliation_error_requeue_duration())
    }
}
