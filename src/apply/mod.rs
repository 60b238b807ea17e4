//! # Apply
//!
//! Everything between a rendered object and the API server: admission
//! validation, the merge engine, and create-or-update against an
//! [`ObjectStore`].

pub mod client;
pub mod error;
pub mod memory;
pub mod merge;
pub mod object;
pub mod validate;

pub use client::{apply_object, ApplyOutcome, KubeObjectStore, ObjectStore};
pub use error::{ApplyError, MergeError};
pub use memory::MemoryObjectStore;
pub use merge::merge_object_for_update;
pub use validate::is_object_supported;
