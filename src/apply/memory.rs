//! In-memory [`ObjectStore`], used to exercise the apply flow without a cluster.
//!
//! Like the API server it assigns `uid`, `resourceVersion` and `generation`
//! on create, and bumps the latter two on replace.

use super::client::ObjectStore;
use super::error::ApplyError;
use async_trait::async_trait;
use kube::api::DynamicObject;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

type ObjectKey = (String, String, String, String);

#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    objects: Mutex<BTreeMap<ObjectKey, DynamicObject>>,
    versions: AtomicU64,
    replaces: AtomicU64,
}

fn key(obj: &DynamicObject) -> ObjectKey {
    let (api_version, kind) = obj
        .types
        .as_ref()
        .map(|types| (types.api_version.clone(), types.kind.clone()))
        .unwrap_or_default();
    (
        api_version,
        kind,
        obj.metadata.namespace.clone().unwrap_or_default(),
        obj.metadata.name.clone().unwrap_or_default(),
    )
}

impl MemoryObjectStore {
    /// Store `obj` as-is, as if something else had created it
    pub fn insert(&self, obj: DynamicObject) {
        self.lock().insert(key(&obj), obj);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of replace calls served so far
    #[must_use]
    pub fn replace_count(&self) -> u64 {
        self.replaces.load(Ordering::SeqCst)
    }

    /// All stored objects of the given kind
    #[must_use]
    pub fn objects_of_kind(&self, kind: &str) -> Vec<DynamicObject> {
        self.lock()
            .iter()
            .filter(|((_, k, _, _), _)| k == kind)
            .map(|(_, obj)| obj.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<ObjectKey, DynamicObject>> {
        // A poisoned map is still consistent: every write is a single insert
        self.objects
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    fn next_version(&self) -> String {
        (self.versions.fetch_add(1, Ordering::SeqCst) + 1).to_string()
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn get(&self, obj: &DynamicObject) -> Result<Option<DynamicObject>, ApplyError> {
        Ok(self.lock().get(&key(obj)).cloned())
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let mut created = obj.clone();
        let version = self.next_version();
        created.metadata.uid = Some(format!("uid-{version}"));
        created.metadata.resource_version = Some(version);
        created.metadata.generation = Some(1);
        self.lock().insert(key(&created), created.clone());
        Ok(created)
    }

    async fn replace(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        self.replaces.fetch_add(1, Ordering::SeqCst);
        let mut replaced = obj.clone();
        replaced.metadata.resource_version = Some(self.next_version());
        replaced.metadata.generation = Some(obj.metadata.generation.unwrap_or(0) + 1);
        self.lock().insert(key(&replaced), replaced.clone());
        Ok(replaced)
    }
}
