//! # Custom Resource Definitions
//!
//! CRD types for the MetalLB Operator.
//!
//! ## Module Structure
//!
//! - `metallb.rs` - `Metallb` resource that triggers installation of MetalLB
//! - `address_pool.rs` - `AddressPool` resource and the ConfigMap entry it renders to
//! - `status.rs` - Status types for tracking reconciliation state

mod address_pool;
mod metallb;
mod status;

// Re-export all public types
pub use address_pool::{AddressPool, AddressPoolConfig, AddressPoolEntry, AddressPoolSpec, Protocol};
pub use metallb::{Metallb, MetallbSpec, MetallbStatus};
pub use status::{Condition, CONDITION_AVAILABLE};

use kube::CustomResourceExt;

/// YAML for every CRD the operator serves, as one multi-document stream
pub fn crd_manifests() -> Result<String, serde_yaml::Error> {
    let mut manifests = String::new();
    for crd in [Metallb::crd(), AddressPool::crd()] {
        manifests.push_str("---\n");
        manifests.push_str(&serde_yaml::to_string(&crd)?);
    }
    Ok(manifests)
}
