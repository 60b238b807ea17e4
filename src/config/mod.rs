//! # Configuration
//!
//! - `controller`: operator settings from environment variables

pub mod controller;

pub use controller::ControllerConfig;
