//! # Admission Validation
//!
//! Rejects objects the operator cannot reconcile, before they are created
//! or updated.

use super::error::MergeError;
use super::object::{display_name, nested_slice, GroupKind};
use kube::api::DynamicObject;

/// Check that `obj` has a shape the operator supports.
///
/// Rendered ServiceAccounts must not carry `secrets`: the cluster owns that
/// list and the merge always keeps the live one.
///
/// # Errors
///
/// [`MergeError::Unsupported`] for rejected objects, or a structural error if
/// `secrets` is not a list.
pub fn is_object_supported(obj: &DynamicObject) -> Result<(), MergeError> {
    if GroupKind::of(obj).is("", "ServiceAccount") {
        let secrets = nested_slice(&obj.data, &["secrets"])?;
        if secrets.is_some_and(|secrets| !secrets.is_empty()) {
            return Err(MergeError::Unsupported(format!(
                "cannot create ServiceAccount {} with secrets",
                display_name(obj)
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: serde_json::Value) -> DynamicObject {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_service_account_with_secrets_rejected() {
        let sa = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "speaker", "namespace": "metallb-system"},
            "secrets": [{"name": "x"}]
        }));
        let err = is_object_supported(&sa).unwrap_err();
        assert!(err.is_unsupported());
        assert!(err.to_string().contains("metallb-system/speaker"));
    }

    #[test]
    fn test_service_account_with_empty_secrets_accepted() {
        let sa = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "speaker"},
            "secrets": []
        }));
        assert!(is_object_supported(&sa).is_ok());
    }

    #[test]
    fn test_service_account_with_malformed_secrets() {
        let sa = object(json!({
            "apiVersion": "v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "speaker"},
            "secrets": "tok-1"
        }));
        let err = is_object_supported(&sa).unwrap_err();
        assert!(!err.is_unsupported());
    }

    #[test]
    fn test_other_kinds_with_secrets_field_accepted() {
        let obj = object(json!({
            "apiVersion": "example.com/v1",
            "kind": "ServiceAccount",
            "metadata": {"name": "custom"},
            "secrets": [{"name": "x"}]
        }));
        assert!(is_object_supported(&obj).is_ok());
    }
}
