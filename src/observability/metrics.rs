//! # Metrics
//!
//! Prometheus metrics for monitoring the operator.
//!
//! ## Metrics Exposed
//!
//! - `metallb_operator_reconciliations_total` - Reconciliations, by controller
//! - `metallb_operator_reconciliation_errors_total` - Failed reconciliations, by controller
//! - `metallb_operator_reconciliation_duration_seconds` - Reconciliation duration, by controller
//! - `metallb_operator_objects_applied_total` - Objects applied, by operation (create, update, unchanged)
//! - `metallb_operator_merge_errors_total` - Merge and admission failures, by category

use anyhow::Result;
use prometheus::{HistogramVec, IntCounterVec, Registry};
use std::sync::LazyLock;

pub(crate) static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

static RECONCILIATIONS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "metallb_operator_reconciliations_total",
            "Total number of reconciliations",
        ),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATIONS_TOTAL metric - this should never happen")
});

static RECONCILIATION_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "metallb_operator_reconciliation_errors_total",
            "Total number of reconciliation errors",
        ),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATION_ERRORS_TOTAL metric - this should never happen")
});

static RECONCILIATION_DURATION: LazyLock<HistogramVec> = LazyLock::new(|| {
    HistogramVec::new(
        prometheus::HistogramOpts::new(
            "metallb_operator_reconciliation_duration_seconds",
            "Duration of reconciliation in seconds",
        )
        .buckets(vec![0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0]),
        &["controller"],
    )
    .expect("Failed to create RECONCILIATION_DURATION metric - this should never happen")
});

static OBJECTS_APPLIED_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "metallb_operator_objects_applied_total",
            "Total number of objects applied to the cluster",
        ),
        &["operation"],
    )
    .expect("Failed to create OBJECTS_APPLIED_TOTAL metric - this should never happen")
});

static MERGE_ERRORS_TOTAL: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        prometheus::Opts::new(
            "metallb_operator_merge_errors_total",
            "Total number of objects rejected by admission validation or the merge",
        ),
        &["category"],
    )
    .expect("Failed to create MERGE_ERRORS_TOTAL metric - this should never happen")
});

pub fn register_metrics() -> Result<()> {
    REGISTRY.register(Box::new(RECONCILIATIONS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_ERRORS_TOTAL.clone()))?;
    REGISTRY.register(Box::new(RECONCILIATION_DURATION.clone()))?;
    REGISTRY.register(Box::new(OBJECTS_APPLIED_TOTAL.clone()))?;
    REGISTRY.register(Box::new(MERGE_ERRORS_TOTAL.clone()))?;

    Ok(())
}

pub fn increment_reconciliations(controller: &str) {
    RECONCILIATIONS_TOTAL.with_label_values(&[controller]).inc();
}

pub fn increment_reconciliation_errors(controller: &str) {
    RECONCILIATION_ERRORS_TOTAL
        .with_label_values(&[controller])
        .inc();
}

pub fn observe_reconciliation_duration(controller: &str, duration: f64) {
    RECONCILIATION_DURATION
        .with_label_values(&[controller])
        .observe(duration);
}

pub fn increment_objects_applied(operation: &str) {
    OBJECTS_APPLIED_TOTAL.with_label_values(&[operation]).inc();
}

pub fn increment_merge_errors(category: &str) {
    MERGE_ERRORS_TOTAL.with_label_values(&[category]).inc();
}
