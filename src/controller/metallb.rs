//! # Metallb Reconciler
//!
//! Installs MetalLB for a `Metallb` resource:
//!
//! 1. Render the manifest templates with the configured images and namespace.
//! 2. Make the `Metallb` resource the controller owner of every rendered object,
//!    so the installation is garbage collected with it.
//! 3. Apply each object (create, or merge and update).
//! 4. Report the result in the `Available` condition.
//!
//! Successful reconciliations are requeued after the reconcile interval so
//! drift in the installed objects is repaired.

use super::types::{Context, ReconcilerError};
use crate::apply::{apply_object, ApplyOutcome, ObjectStore};
use crate::config::ControllerConfig;
use crate::crd::{Condition, Metallb, MetallbStatus, CONDITION_AVAILABLE};
use crate::observability::metrics;
use crate::render::{render_dir, RenderData};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Api, Patch, PatchParams};
use kube::{Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde_json::json;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, info_span, warn, Instrument};

pub const CONTROLLER_NAME: &str = "metallb";

/// Outcome counts of one installation pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstallSummary {
    pub created: usize,
    pub updated: usize,
    pub unchanged: usize,
}

impl InstallSummary {
    fn record(&mut self, outcome: ApplyOutcome) {
        match outcome {
            ApplyOutcome::Created => self.created += 1,
            ApplyOutcome::Updated => self.updated += 1,
            ApplyOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

impl std::fmt::Display for InstallSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} created, {} updated, {} unchanged",
            self.created, self.updated, self.unchanged
        )
    }
}

/// Render the MetalLB manifests and apply them, owned by `owner`.
///
/// Objects are applied in render order and the first failure stops the pass.
pub async fn install_manifests(
    store: &dyn ObjectStore,
    config: &ControllerConfig,
    owner: &OwnerReference,
) -> Result<InstallSummary, ReconcilerError> {
    let objects = render_dir(&config.manifest_path, &RenderData::for_config(config))?;

    let mut summary = InstallSummary::default();
    for mut object in objects {
        object.metadata.owner_references = Some(vec![owner.clone()]);
        summary.record(apply_object(store, object).await?);
    }

    Ok(summary)
}

/// Conditions after observing `condition`.
///
/// The transition time of an existing condition is kept while its status
/// does not change.
#[must_use]
pub fn next_conditions(existing: Option<&MetallbStatus>, mut condition: Condition) -> Vec<Condition> {
    let mut conditions: Vec<Condition> = existing
        .map(|status| status.conditions.clone())
        .unwrap_or_default();

    if let Some(previous) = conditions.iter().find(|c| c.r#type == condition.r#type) {
        if previous.status == condition.status {
            condition
                .last_transition_time
                .clone_from(&previous.last_transition_time);
        }
    }

    conditions.retain(|c| c.r#type != condition.r#type);
    conditions.push(condition);
    conditions
}

async fn update_status(
    client: &kube::Client,
    metallb: &Metallb,
    condition: Condition,
) -> Result<(), ReconcilerError> {
    let namespace = metallb.namespace().unwrap_or_default();
    let api: Api<Metallb> = Api::namespaced(client.clone(), &namespace);

    let status = MetallbStatus {
        conditions: next_conditions(metallb.status.as_ref(), condition),
        observed_generation: metallb.metadata.generation,
    };
    let patch = json!({ "status": status });
    api.patch_status(&metallb.name_any(), &PatchParams::default(), &Patch::Merge(&patch))
        .await?;
    Ok(())
}

pub async fn reconcile(metallb: Arc<Metallb>, ctx: Arc<Context>) -> Result<Action, ReconcilerError> {
    let span = info_span!(
        "metallb.reconcile",
        resource.name = %metallb.name_any(),
        resource.namespace = %metallb.namespace().unwrap_or_default(),
    );

    let start = Instant::now();
    metrics::increment_reconciliations(CONTROLLER_NAME);
    let result = install_and_report(&metallb, &ctx).instrument(span).await;
    metrics::observe_reconciliation_duration(CONTROLLER_NAME, start.elapsed().as_secs_f64());
    result
}

async fn install_and_report(metallb: &Metallb, ctx: &Context) -> Result<Action, ReconcilerError> {
    let owner = metallb
        .controller_owner_ref(&())
        .ok_or_else(|| ReconcilerError::MissingOwnerReference(metallb.name_any()))?;

    let installed = install_manifests(ctx.store.as_ref(), &ctx.config, &owner).await;
    let condition = match &installed {
        Ok(summary) => Condition::available(
            true,
            "Installed",
            format!("MetalLB manifests applied ({summary})"),
        ),
        Err(e) => Condition::available(false, "InstallFailed", e.to_string()),
    };
    let status_updated = update_status(&ctx.client, metallb, condition).await;

    let summary = installed?;
    if let Err(e) = status_updated {
        warn!("Failed to update {} condition: {}", CONDITION_AVAILABLE, e);
        return Err(e);
    }

    info!("MetalLB installed: {}", summary);
    Ok(Action::requeue(ctx.config.reconcile_interval()))
}
