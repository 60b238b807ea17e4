//! # Apply Errors
//!
//! Error types for the merge engine and the apply path.

use thiserror::Error;

/// Errors raised while merging a desired object over a current one, or while
/// checking whether an object can be reconciled at all.
///
/// A merge that fails leaves the desired object untouched.
#[derive(Debug, Error)]
pub enum MergeError {
    /// A nested field exists but holds a value of the wrong type
    #[error("field {path} is of type {found}, expected {expected}")]
    FieldType {
        path: String,
        expected: &'static str,
        found: &'static str,
    },
    /// A nested path runs through a value that is not an object
    #[error("cannot access {path}: {segment} is of type {found}, expected object")]
    NotAnObject {
        path: String,
        segment: String,
        found: &'static str,
    },
    #[error("empty field path")]
    EmptyPath,
    #[error("failed to parse address pool configuration: {0}")]
    ParseConfig(#[source] serde_yaml::Error),
    #[error("failed to serialize address pool configuration: {0}")]
    SerializeConfig(#[source] serde_yaml::Error),
    /// The object is valid Kubernetes but cannot be reconciled by the operator.
    /// The input has to change; retrying as-is will fail the same way.
    #[error("unsupported object: {0}")]
    Unsupported(String),
}

impl MergeError {
    #[must_use]
    pub fn is_unsupported(&self) -> bool {
        matches!(self, MergeError::Unsupported(_))
    }

    /// Metric label for the error class
    #[must_use]
    pub fn category(&self) -> &'static str {
        match self {
            MergeError::FieldType { .. } | MergeError::NotAnObject { .. } | MergeError::EmptyPath => {
                "structural"
            }
            MergeError::ParseConfig(_) | MergeError::SerializeConfig(_) => "serialization",
            MergeError::Unsupported(_) => "unsupported",
        }
    }
}

#[derive(Debug, Error)]
pub enum ApplyError {
    #[error("object has no name")]
    MissingName,
    #[error("object {0} has no apiVersion or kind")]
    MissingTypeMeta(String),
    #[error("merge failed for {object}: {source}")]
    Merge {
        object: String,
        #[source]
        source: MergeError,
    },
    #[error("Kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
    #[error("failed to compare objects: {0}")]
    Compare(#[from] serde_json::Error),
}

impl ApplyError {
    /// Permanent errors need a changed input; requeueing the same object is pointless
    #[must_use]
    pub fn is_permanent(&self) -> bool {
        match self {
            ApplyError::MissingName | ApplyError::MissingTypeMeta(_) => true,
            ApplyError::Merge { source, .. } => source.is_unsupported(),
            ApplyError::Kube(_) | ApplyError::Compare(_) => false,
        }
    }
}
