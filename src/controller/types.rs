//! # Types
//!
//! Shared context and error type for the operator's controllers.

use crate::apply::{ApplyError, ObjectStore};
use crate::config::ControllerConfig;
use crate::render::RenderError;
use kube::Client;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error("failed to render manifests: {0}")]
    Render(#[from] RenderError),
    #[error("failed to apply manifests: {0}")]
    Apply(#[from] ApplyError),
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("{0} has no uid, cannot own the objects it installs")]
    MissingOwnerReference(String),
}

impl ReconcilerError {
    /// Permanent errors are not retried until the resource changes
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            ReconcilerError::Apply(e) => e.is_permanent(),
            ReconcilerError::Render(_)
            | ReconcilerError::Kube(_)
            | ReconcilerError::MissingOwnerReference(_) => false,
        }
    }
}

/// Context shared by every reconciliation
#[derive(Clone)]
pub struct Context {
    pub client: Client,
    /// Where rendered objects are applied
    pub store: Arc<dyn ObjectStore>,
    pub config: ControllerConfig,
}

impl std::fmt::Debug for Context {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Context")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apply::MergeError;

    #[test]
    fn test_unsupported_objects_are_permanent() {
        let err = ReconcilerError::from(ApplyError::Merge {
            object: "ServiceAccount metallb-system/speaker".to_string(),
            source: MergeError::Unsupported("secrets".to_string()),
        });
        assert!(err.is_permanent());
    }

    #[test]
    fn test_render_errors_are_retried() {
        let err = ReconcilerError::from(RenderError::MissingValue("SpeakerImage".to_string()));
        assert!(!err.is_permanent());
    }
}
