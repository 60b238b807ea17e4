//! # Status
//!
//! Condition type shared by the operator's resources.

use serde::{Deserialize, Serialize};

/// Condition type reported once the MetalLB manifests are applied
pub const CONDITION_AVAILABLE: &str = "Available";

/// Condition represents a status condition for the resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of condition (True, False, Unknown)
    pub status: String,
    /// Last transition time (RFC3339)
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing condition
    #[serde(default)]
    pub message: Option<String>,
}

impl Condition {
    #[must_use]
    pub fn available(available: bool, reason: &str, message: impl Into<String>) -> Self {
        Self {
            r#type: CONDITION_AVAILABLE.to_string(),
            status: if available { "True" } else { "False" }.to_string(),
            last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
            reason: Some(reason.to_string()),
            message: Some(message.into()),
        }
    }
}
