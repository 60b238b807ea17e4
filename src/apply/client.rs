//! # Apply
//!
//! Creates or updates rendered objects in the cluster.
//!
//! ## Flow
//!
//! 1. Reject objects without a name or type, and objects that fail
//!    admission validation. Nothing is submitted for them.
//! 2. Fetch the live object. When there is none, create the rendered one as-is.
//! 3. Otherwise merge the live object into the rendered one and replace it,
//!    unless the merged object is identical to the live one.
//!
//! Cluster access goes through [`ObjectStore`] so the flow can run against
//! any backend; [`KubeObjectStore`] is the API server implementation.

use super::error::ApplyError;
use super::merge::merge_object_for_update;
use super::object::{display_name, GroupKind};
use super::validate::is_object_supported;
use crate::observability::metrics;
use async_trait::async_trait;
use kube::api::{Api, DynamicObject, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{pinned_kind, Scope};
use kube::Client;
use tracing::{debug, info};

/// What `apply_object` did with an object
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Created,
    Updated,
    Unchanged,
}

impl ApplyOutcome {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            ApplyOutcome::Created => "create",
            ApplyOutcome::Updated => "update",
            ApplyOutcome::Unchanged => "unchanged",
        }
    }
}

/// Read/write access to cluster objects, addressed by the object itself
/// (apiVersion, kind, namespace, name)
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// The live object, or `None` if it does not exist
    async fn get(&self, obj: &DynamicObject) -> Result<Option<DynamicObject>, ApplyError>;
    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError>;
    async fn replace(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError>;
}

/// [`ObjectStore`] backed by the Kubernetes API server.
///
/// The API resource of each object is resolved through discovery, so any
/// kind the cluster serves can be applied.
#[derive(Clone)]
pub struct KubeObjectStore {
    client: Client,
}

impl std::fmt::Debug for KubeObjectStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeObjectStore").finish_non_exhaustive()
    }
}

impl KubeObjectStore {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn api_for(&self, obj: &DynamicObject) -> Result<Api<DynamicObject>, ApplyError> {
        let types = obj
            .types
            .as_ref()
            .ok_or_else(|| ApplyError::MissingTypeMeta(display_name(obj)))?;
        let (group, version) = types
            .api_version
            .split_once('/')
            .unwrap_or(("", types.api_version.as_str()));
        let gvk = GroupVersionKind::gvk(group, version, &types.kind);

        let (resource, capabilities) = pinned_kind(&self.client, &gvk).await?;

        Ok(match (capabilities.scope, obj.metadata.namespace.as_deref()) {
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
            (Scope::Namespaced, Some(namespace)) => {
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
            (Scope::Namespaced, None) => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
        })
    }
}

fn object_name(obj: &DynamicObject) -> Result<&str, ApplyError> {
    obj.metadata
        .name
        .as_deref()
        .filter(|name| !name.is_empty())
        .ok_or(ApplyError::MissingName)
}

#[async_trait]
impl ObjectStore for KubeObjectStore {
    async fn get(&self, obj: &DynamicObject) -> Result<Option<DynamicObject>, ApplyError> {
        let api = self.api_for(obj).await?;
        Ok(api.get_opt(object_name(obj)?).await?)
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let api = self.api_for(obj).await?;
        Ok(api.create(&PostParams::default(), obj).await?)
    }

    async fn replace(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let api = self.api_for(obj).await?;
        Ok(api
            .replace(object_name(obj)?, &PostParams::default(), obj)
            .await?)
    }
}

/// Create or update `desired` in the cluster.
///
/// # Errors
///
/// Returns an [`ApplyError`] if the object is nameless, untyped or
/// unsupported, if the merge fails, or if the API call fails. On merge or
/// validation errors nothing is submitted.
pub async fn apply_object(
    store: &dyn ObjectStore,
    mut desired: DynamicObject,
) -> Result<ApplyOutcome, ApplyError> {
    object_name(&desired)?;
    let group_kind = GroupKind::of(&desired);
    if group_kind.kind.is_empty() {
        return Err(ApplyError::MissingTypeMeta(display_name(&desired)));
    }
    let object = format!("{} {}", group_kind.kind, display_name(&desired));

    is_object_supported(&desired).map_err(|source| {
        metrics::increment_merge_errors(source.category());
        ApplyError::Merge {
            object: object.clone(),
            source,
        }
    })?;

    let outcome = match store.get(&desired).await? {
        None => {
            info!("Creating {}", object);
            store.create(&desired).await?;
            ApplyOutcome::Created
        }
        Some(current) => {
            merge_object_for_update(&current, &mut desired).map_err(|source| {
                metrics::increment_merge_errors(source.category());
                ApplyError::Merge {
                    object: object.clone(),
                    source,
                }
            })?;

            if serde_json::to_value(&current)? == serde_json::to_value(&desired)? {
                debug!("{} is up to date", object);
                ApplyOutcome::Unchanged
            } else {
                info!("Updating {}", object);
                store.replace(&desired).await?;
                ApplyOutcome::Updated
            }
        }
    };

    metrics::increment_objects_applied(outcome.as_str());
    Ok(outcome)
}
