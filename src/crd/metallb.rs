//! # Metallb
//!
//! The `Metallb` resource. Creating one in the operator namespace installs the
//! MetalLB controller and speaker.

use super::status::Condition;
use serde::{Deserialize, Serialize};

/// Metallb Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: metallb.io/v1alpha1
/// kind: Metallb
/// metadata:
///   name: metallb
///   namespace: metallb-system
/// ```
#[derive(kube::CustomResource, Debug, Clone, Default, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "Metallb",
    group = "metallb.io",
    version = "v1alpha1",
    namespaced,
    status = "MetallbStatus",
    printcolumn = r#"{"name":"Available", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Available\")].status"}"#
)]
#[serde(rename_all = "camelCase")]
#[allow(
    clippy::empty_structs_with_brackets,
    reason = "CRD spec must serialize as an object"
)]
pub struct MetallbSpec {}

/// Status of the Metallb resource
#[derive(Debug, Clone, Deserialize, Serialize, Default, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct MetallbStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Generation of the Metallb resource the conditions refer to
    #[serde(default)]
    pub observed_generation: Option<i64>,
}
