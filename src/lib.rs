//! MetalLB Operator Library
//!
//! Rendering and applying of the MetalLB manifests, the merge engine that
//! keeps cluster-populated fields intact across updates, and the controllers
//! for the `Metallb` and `AddressPool` resources.

pub mod apply;
pub mod config;
pub mod constants;
pub mod controller;
pub mod crd;
pub mod observability;
pub mod render;
pub mod runtime;
