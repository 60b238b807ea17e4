//! # AddressPool
//!
//! The `AddressPool` resource and the MetalLB configuration entry it renders to.
//!
//! MetalLB reads its pools from the `config` key of the `config` ConfigMap, a
//! YAML document with a top-level `address-pools` list:
//!
//! ```yaml
//! address-pools:
//! - name: default
//!   protocol: layer2
//!   addresses:
//!   - 192.168.10.0/24
//! ```

use kube::ResourceExt;
use serde::{Deserialize, Deserializer, Serialize};

/// AddressPool Custom Resource Definition
///
/// # Example
///
/// ```yaml
/// apiVersion: metallb.io/v1alpha1
/// kind: AddressPool
/// metadata:
///   name: gold
///   namespace: metallb-system
/// spec:
///   protocol: layer2
///   addresses:
///     - 172.18.0.100-172.18.0.255
///   autoAssign: false
/// ```
#[derive(kube::CustomResource, Debug, Clone, Deserialize, Serialize, schemars::JsonSchema)]
#[kube(
    kind = "AddressPool",
    group = "metallb.io",
    version = "v1alpha1",
    namespaced,
    printcolumn = r#"{"name":"Protocol", "type":"string", "jsonPath":".spec.protocol"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct AddressPoolSpec {
    /// How the addresses are announced
    pub protocol: Protocol,
    /// IP ranges (CIDR or `first-last`) MetalLB has authority over
    pub addresses: Vec<String>,
    /// When false, addresses are only handed out on explicit request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_assign: Option<bool>,
    /// Skip `.0` and `.255` addresses
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_buggy_ips: Option<bool>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, schemars::JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    Layer2,
    Bgp,
}

impl Protocol {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Protocol::Layer2 => "layer2",
            Protocol::Bgp => "bgp",
        }
    }
}

impl AddressPool {
    /// The ConfigMap entry for this pool, named after the resource
    #[must_use]
    pub fn to_entry(&self) -> AddressPoolEntry {
        AddressPoolEntry {
            name: self.name_any(),
            protocol: self.spec.protocol.as_str().to_string(),
            addresses: self.spec.addresses.clone(),
            auto_assign: self.spec.auto_assign,
            avoid_buggy_ips: self.spec.avoid_buggy_ips,
        }
    }
}

/// One named pool inside MetalLB's configuration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct AddressPoolEntry {
    #[serde(default)]
    pub name: String,
    /// Empty when a hand-written entry leaves it out
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub protocol: String,
    #[serde(default)]
    pub addresses: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auto_assign: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_buggy_ips: Option<bool>,
}

/// The document stored under the reserved ConfigMap key
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct AddressPoolConfig {
    #[serde(
        rename = "address-pools",
        default,
        deserialize_with = "null_as_empty"
    )]
    pub address_pools: Vec<AddressPoolEntry>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<Vec<AddressPoolEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<Vec<AddressPoolEntry>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

impl AddressPoolConfig {
    /// Parse the ConfigMap payload. An empty document holds no pools.
    pub fn from_yaml(payload: &str) -> Result<Self, serde_yaml::Error> {
        if payload.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(payload)
    }

    pub fn to_yaml(&self) -> Result<String, serde_yaml::Error> {
        serde_yaml::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_config_payload() {
        let payload = r"
address-pools:
- name: gold
  protocol: layer2
  addresses:
  - 172.18.0.100-172.18.0.255
  auto-assign: false
";
        let config = AddressPoolConfig::from_yaml(payload).unwrap();
        assert_eq!(config.address_pools.len(), 1);
        let pool = &config.address_pools[0];
        assert_eq!(pool.name, "gold");
        assert_eq!(pool.protocol, "layer2");
        assert_eq!(pool.addresses, vec!["172.18.0.100-172.18.0.255"]);
        assert_eq!(pool.auto_assign, Some(false));
        assert_eq!(pool.avoid_buggy_ips, None);
    }

    #[test]
    fn test_parse_empty_and_null_payloads() {
        assert!(AddressPoolConfig::from_yaml("").unwrap().address_pools.is_empty());
        assert!(AddressPoolConfig::from_yaml("  \n").unwrap().address_pools.is_empty());
        assert!(AddressPoolConfig::from_yaml("address-pools:\n")
            .unwrap()
            .address_pools
            .is_empty());
    }

    #[test]
    fn test_entry_without_protocol_round_trips() {
        let payload = "address-pools:\n- name: legacy\n  addresses:\n  - 10.9.0.0/24\n";
        let config = AddressPoolConfig::from_yaml(payload).unwrap();
        assert_eq!(config.address_pools[0].name, "legacy");
        assert_eq!(config.address_pools[0].protocol, "");

        let yaml = config.to_yaml().unwrap();
        assert!(!yaml.contains("protocol"));
        assert_eq!(AddressPoolConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_parse_rejects_wrong_shape() {
        assert!(AddressPoolConfig::from_yaml("address-pools: not-a-list").is_err());
        assert!(AddressPoolConfig::from_yaml("just a string").is_err());
    }

    #[test]
    fn test_serialized_keys_are_kebab_case() {
        let config = AddressPoolConfig {
            address_pools: vec![AddressPoolEntry {
                name: "silver".to_string(),
                protocol: "bgp".to_string(),
                addresses: vec!["10.0.0.0/24".to_string()],
                auto_assign: Some(true),
                avoid_buggy_ips: Some(true),
            }],
        };
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("address-pools:"));
        assert!(yaml.contains("auto-assign: true"));
        assert!(yaml.contains("avoid-buggy-ips: true"));
        assert_eq!(AddressPoolConfig::from_yaml(&yaml).unwrap(), config);
    }

    #[test]
    fn test_address_pool_resource_to_entry() {
        let pool = AddressPool::new(
            "gold",
            AddressPoolSpec {
                protocol: Protocol::Layer2,
                addresses: vec!["192.168.10.0/24".to_string()],
                auto_assign: None,
                avoid_buggy_ips: None,
            },
        );
        let entry = pool.to_entry();
        assert_eq!(entry.name, "gold");
        assert_eq!(entry.protocol, "layer2");
        assert_eq!(entry.addresses, vec!["192.168.10.0/24"]);
    }

    #[test]
    fn test_address_pool_spec_rejects_unknown_protocol() {
        let yaml = r"
apiVersion: metallb.io/v1alpha1
kind: AddressPool
metadata:
  name: bad
spec:
  protocol: ospf
  addresses: []
";
        assert!(serde_yaml::from_str::<AddressPool>(yaml).is_err());
    }
}
