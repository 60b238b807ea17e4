//! # Merge
//!
//! Prepares a rendered ("desired") object to be submitted as an update over
//! the live ("current") object.
//!
//! Objects rendered from templates carry none of the fields the API server or
//! other controllers populate, so replacing the live object with them as-is
//! would wipe those fields. The merge copies them back in:
//!
//! 1. Kind-specific strategies, in fixed order: `Deployment`, `Service`,
//!    `ServiceAccount`, `ConfigMap`. A strategy only runs when the desired
//!    object's group and kind match it.
//! 2. Generic metadata merge, for every kind. It runs last so nothing a
//!    strategy does to the metadata can be undone afterwards.
//!
//! The merge reads nothing but its two arguments and is deterministic. It
//! works on a scratch copy of the desired object and only writes back on
//! success, so a failed merge leaves the caller's object untouched.

use super::error::MergeError;
use super::object::{
    nested_slice, nested_string, nested_string_slice, set_nested_field, GroupKind,
};
use crate::constants::{ADDRESS_POOL_CONFIG_KEY, DEPLOYMENT_REVISION_ANNOTATION};
use crate::crd::AddressPoolConfig;
use kube::api::DynamicObject;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

type MergeStrategy = fn(&DynamicObject, &mut DynamicObject) -> Result<(), MergeError>;

/// (group, kind, strategy), applied in this order
const STRATEGIES: &[(&str, &str, MergeStrategy)] = &[
    ("apps", "Deployment", merge_deployment),
    ("", "Service", merge_service),
    ("", "ServiceAccount", merge_service_account),
    ("", "ConfigMap", merge_config_map),
];

/// Merge `current` into `desired` so `desired` can be submitted as an update.
///
/// # Errors
///
/// Returns a [`MergeError`] if a nested field has an unexpected type or the
/// address pool configuration cannot be parsed or serialized. `desired` is
/// unchanged in that case.
pub fn merge_object_for_update(
    current: &DynamicObject,
    desired: &mut DynamicObject,
) -> Result<(), MergeError> {
    let group_kind = GroupKind::of(desired);
    let mut merged = desired.clone();

    for (group, kind, strategy) in STRATEGIES {
        if group_kind.is(group, kind) {
            strategy(current, &mut merged)?;
        }
    }

    merge_metadata(current, &mut merged);

    *desired = merged;
    Ok(())
}

/// Copy server-owned bookkeeping from current and merge annotations and labels
fn merge_metadata(current: &DynamicObject, desired: &mut DynamicObject) {
    let live = &current.metadata;
    let meta = &mut desired.metadata;

    meta.creation_timestamp.clone_from(&live.creation_timestamp);
    meta.self_link.clone_from(&live.self_link);
    meta.generation = live.generation;
    meta.uid.clone_from(&live.uid);
    meta.resource_version.clone_from(&live.resource_version);
    meta.managed_fields.clone_from(&live.managed_fields);
    meta.finalizers.clone_from(&live.finalizers);

    meta.annotations = merge_string_maps(live.annotations.as_ref(), meta.annotations.take());
    meta.labels = merge_string_maps(live.labels.as_ref(), meta.labels.take());
}

/// Current's entries overlaid with desired's; desired wins on conflicts
fn merge_string_maps(
    current: Option<&BTreeMap<String, String>>,
    desired: Option<BTreeMap<String, String>>,
) -> Option<BTreeMap<String, String>> {
    let mut merged = current.cloned().unwrap_or_default();
    merged.extend(desired.unwrap_or_default());
    (!merged.is_empty()).then_some(merged)
}

/// Keep the revision annotation the Deployment controller maintains
fn merge_deployment(current: &DynamicObject, desired: &mut DynamicObject) -> Result<(), MergeError> {
    let annotations = desired.metadata.annotations.get_or_insert_with(BTreeMap::new);

    if let Some(revision) = current
        .metadata
        .annotations
        .as_ref()
        .and_then(|live| live.get(DEPLOYMENT_REVISION_ANNOTATION))
    {
        annotations.insert(DEPLOYMENT_REVISION_ANNOTATION.to_string(), revision.clone());
    }

    Ok(())
}

/// Never change the cluster-assigned IP and IP family settings of a Service
fn merge_service(current: &DynamicObject, desired: &mut DynamicObject) -> Result<(), MergeError> {
    const CLUSTER_IP: &[&str] = &["spec", "clusterIP"];
    const IP_FAMILY_POLICY: &[&str] = &["spec", "ipFamilyPolicy"];

    if let Some(cluster_ip) =
        nested_string(&current.data, CLUSTER_IP)?.filter(|ip| !ip.is_empty())
    {
        set_nested_field(&mut desired.data, Value::String(cluster_ip), CLUSTER_IP)?;
    }

    for path in [&["spec", "clusterIPs"], &["spec", "ipFamilies"]] {
        if let Some(values) = nested_string_slice(&current.data, path)? {
            set_nested_field(&mut desired.data, Value::from(values), path)?;
        }
    }

    // An explicit policy in the template is honoured
    let live_policy = nested_string(&current.data, IP_FAMILY_POLICY)?;
    let desired_policy = nested_string(&desired.data, IP_FAMILY_POLICY)?;
    if let (Some(policy), None) = (live_policy, desired_policy) {
        set_nested_field(&mut desired.data, Value::String(policy), IP_FAMILY_POLICY)?;
    }

    Ok(())
}

/// Keep the token secrets the cluster generated for the ServiceAccount
fn merge_service_account(
    current: &DynamicObject,
    desired: &mut DynamicObject,
) -> Result<(), MergeError> {
    for field in ["secrets", "imagePullSecrets"] {
        if let Some(items) = nested_slice(&current.data, &[field])? {
            set_nested_field(&mut desired.data, Value::Array(items), &[field])?;
        }
    }
    Ok(())
}

/// Append desired's address pools to the ones already configured.
///
/// Only runs when both sides carry the reserved key. The merged document
/// becomes the only entry of desired's `data`.
fn merge_config_map(current: &DynamicObject, desired: &mut DynamicObject) -> Result<(), MergeError> {
    let path = &["data", ADDRESS_POOL_CONFIG_KEY];

    let Some(live_payload) = nested_string(&current.data, path)? else {
        return Ok(());
    };
    let Some(desired_payload) = nested_string(&desired.data, path)? else {
        return Ok(());
    };

    let mut merged = AddressPoolConfig::from_yaml(&live_payload).map_err(MergeError::ParseConfig)?;
    let added = AddressPoolConfig::from_yaml(&desired_payload).map_err(MergeError::ParseConfig)?;
    merged.address_pools.extend(added.address_pools);

    let payload = merged.to_yaml().map_err(MergeError::SerializeConfig)?;
    let mut data = Map::new();
    data.insert(ADDRESS_POOL_CONFIG_KEY.to_string(), Value::String(payload));
    set_nested_field(&mut desired.data, Value::Object(data), &["data"])
}
