//! Rendering the shipped manifests and installing them into an in-memory store.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use metallb_operator::apply::{apply_object, ApplyOutcome, MemoryObjectStore, ObjectStore};
use metallb_operator::config::ControllerConfig;
use metallb_operator::controller::address_pool::ensure_pool;
use metallb_operator::controller::metallb::install_manifests;
use metallb_operator::controller::ReconcilerError;
use metallb_operator::render::{render_address_pool_config_map, render_dir, RenderData, RenderError};
use metallb_operator::crd::{AddressPool, AddressPoolConfig, AddressPoolSpec, Protocol};
use std::path::PathBuf;

fn manifest_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("bindata/deployment")
}

fn config() -> ControllerConfig {
    ControllerConfig {
        controller_image: "test-controller:latest".to_string(),
        speaker_image: "test-speaker:latest".to_string(),
        namespace: "metallb-test".to_string(),
        manifest_path: manifest_dir(),
        ..ControllerConfig::default()
    }
}

fn owner() -> OwnerReference {
    OwnerReference {
        api_version: "metallb.io/v1alpha1".to_string(),
        kind: "Metallb".to_string(),
        name: "metallb".to_string(),
        uid: "0b6a1f7e-metallb".to_string(),
        controller: Some(true),
        block_owner_deletion: Some(true),
    }
}

fn container_image(store: &MemoryObjectStore, kind: &str) -> String {
    let objects = store.objects_of_kind(kind);
    assert_eq!(objects.len(), 1, "expected one {kind}");
    objects[0].data["spec"]["template"]["spec"]["containers"][0]["image"]
        .as_str()
        .expect("image should be a string")
        .to_string()
}

fn pool(name: &str, addresses: &[&str]) -> AddressPool {
    AddressPool::new(
        name,
        AddressPoolSpec {
            protocol: Protocol::Layer2,
            addresses: addresses.iter().map(ToString::to_string).collect(),
            auto_assign: None,
            avoid_buggy_ips: None,
        },
    )
}

async fn pool_names(store: &MemoryObjectStore) -> Vec<String> {
    let config_map = render_address_pool_config_map(&pool("any", &[]), "metallb-test").expect("render");
    let live = store.get(&config_map).await.expect("get").expect("config map");
    let payload = live.data["data"]["config"].as_str().expect("payload");
    AddressPoolConfig::from_yaml(payload)
        .expect("parse")
        .address_pools
        .into_iter()
        .map(|pool| pool.name)
        .collect()
}

#[test]
fn test_shipped_manifests_render() {
    let objects = render_dir(&manifest_dir(), &RenderData::for_config(&config()))
        .expect("shipped manifests should render");

    let kinds: Vec<String> = objects
        .iter()
        .map(|obj| obj.types.as_ref().expect("types").kind.clone())
        .collect();
    assert_eq!(kinds, vec!["ServiceAccount", "ServiceAccount", "Deployment", "DaemonSet"]);
    assert!(objects
        .iter()
        .all(|obj| obj.metadata.namespace.as_deref() == Some("metallb-test")));
}

#[test]
fn test_render_dir_orders_files_and_skips_others() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("b.yaml"),
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: second\n",
    )
    .expect("write");
    std::fs::write(
        dir.path().join("a.yml"),
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {{.Name}}\n",
    )
    .expect("write");
    std::fs::write(dir.path().join("README.md"), "not a manifest {{.Unknown}}").expect("write");

    let objects = render_dir(dir.path(), &RenderData::new().with("Name", "first"))
        .expect("render should succeed");
    let names: Vec<_> = objects
        .iter()
        .map(|obj| obj.metadata.name.clone().unwrap_or_default())
        .collect();
    assert_eq!(names, vec!["first", "second"]);
}

#[test]
fn test_render_dir_missing_directory() {
    let err = render_dir(&PathBuf::from("/nonexistent/manifests"), &RenderData::new())
        .expect_err("missing directory should fail");
    assert!(matches!(err, RenderError::Io { .. }));
}

#[tokio::test]
async fn test_install_manifests_with_overridden_images() {
    let store = MemoryObjectStore::default();
    let summary = install_manifests(&store, &config(), &owner())
        .await
        .expect("install should succeed");

    assert_eq!(summary.created, 4);
    assert_eq!(container_image(&store, "Deployment"), "test-controller:latest");
    assert_eq!(container_image(&store, "DaemonSet"), "test-speaker:latest");

    let deployment = &store.objects_of_kind("Deployment")[0];
    let owners = deployment.metadata.owner_references.as_ref().expect("owner references");
    assert_eq!(owners, &vec![owner()]);
}

#[tokio::test]
async fn test_reinstall_keeps_cluster_state() {
    let store = MemoryObjectStore::default();
    install_manifests(&store, &config(), &owner())
        .await
        .expect("install should succeed");

    // The cluster populates token secrets and the revision after creation
    for mut sa in store.objects_of_kind("ServiceAccount") {
        sa.data["secrets"] = serde_json::json!([{"name": "tok-1"}]);
        store.insert(sa);
    }
    let mut deployment = store.objects_of_kind("Deployment").remove(0);
    deployment
        .metadata
        .annotations
        .get_or_insert_with(Default::default)
        .insert("deployment.kubernetes.io/revision".to_string(), "3".to_string());
    store.insert(deployment);

    let summary = install_manifests(&store, &config(), &owner())
        .await
        .expect("reinstall should succeed");
    assert_eq!(summary.created, 0);
    assert_eq!(summary.updated, 0);
    assert_eq!(summary.unchanged, 4);

    let upgraded = ControllerConfig {
        speaker_image: "test-speaker:v2".to_string(),
        ..config()
    };
    let summary = install_manifests(&store, &upgraded, &owner())
        .await
        .expect("upgrade should succeed");
    assert_eq!(summary.updated, 1);
    assert_eq!(container_image(&store, "DaemonSet"), "test-speaker:v2");

    for sa in store.objects_of_kind("ServiceAccount") {
        assert_eq!(sa.data["secrets"], serde_json::json!([{"name": "tok-1"}]));
    }
    let deployment = &store.objects_of_kind("Deployment")[0];
    assert_eq!(
        deployment.metadata.annotations.as_ref().expect("annotations")
            ["deployment.kubernetes.io/revision"],
        "3"
    );
}

#[tokio::test]
async fn test_install_fails_on_missing_template_value() {
    let dir = tempfile::tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("extra.yaml"),
        "apiVersion: v1\nkind: ConfigMap\nmetadata:\n  name: {{.Unknown}}\n",
    )
    .expect("write");
    let config = ControllerConfig {
        manifest_path: dir.path().to_path_buf(),
        ..config()
    };

    let store = MemoryObjectStore::default();
    let err = install_manifests(&store, &config, &owner())
        .await
        .expect_err("install should fail");
    assert!(matches!(err, ReconcilerError::Render(RenderError::MissingValue(_))));
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_address_pools_accumulate_in_config_map() {
    let store = MemoryObjectStore::default();

    let gold = render_address_pool_config_map(&pool("gold", &["10.0.0.0/24"]), "metallb-test")
        .expect("render");
    assert_eq!(
        apply_object(&store, gold).await.expect("apply"),
        ApplyOutcome::Created
    );

    let silver = render_address_pool_config_map(&pool("silver", &["10.1.0.0/24"]), "metallb-test")
        .expect("render");
    assert_eq!(
        apply_object(&store, silver).await.expect("apply"),
        ApplyOutcome::Updated
    );

    assert_eq!(pool_names(&store).await, vec!["gold", "silver"]);
}

#[tokio::test]
async fn test_configuring_the_same_pool_again_adds_no_entry() {
    let store = MemoryObjectStore::default();
    let gold = pool("gold", &["10.0.0.0/24"]);

    let first = ensure_pool(&store, &gold, "metallb-test").await.expect("configure");
    assert_eq!(first, ApplyOutcome::Created);

    // Controller restart: every pool is reconciled again
    let second = ensure_pool(&store, &gold, "metallb-test").await.expect("reconfigure");
    assert_eq!(second, ApplyOutcome::Unchanged);
    assert_eq!(store.replace_count(), 0);
    assert_eq!(pool_names(&store).await, vec!["gold"]);

    let silver = pool("silver", &["10.1.0.0/24"]);
    assert_eq!(
        ensure_pool(&store, &silver, "metallb-test").await.expect("configure"),
        ApplyOutcome::Updated
    );
    assert_eq!(
        ensure_pool(&store, &gold, "metallb-test").await.expect("reconfigure"),
        ApplyOutcome::Unchanged
    );
    assert_eq!(pool_names(&store).await, vec!["gold", "silver"]);
}
