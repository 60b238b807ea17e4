//! # Controller Configuration
//!
//! Operator settings loaded from environment variables.

use crate::constants::{
    DEFAULT_CONTROLLER_IMAGE, DEFAULT_MANIFEST_PATH, DEFAULT_METRICS_PORT, DEFAULT_NAMESPACE,
    DEFAULT_RECONCILE_INTERVAL_SECS, DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
    DEFAULT_SERVER_POLL_INTERVAL_MS, DEFAULT_SERVER_STARTUP_TIMEOUT_SECS, DEFAULT_SPEAKER_IMAGE,
};
use std::path::PathBuf;
use std::time::Duration;

/// Operator configuration
///
/// All settings have defaults and can be overridden via environment variables,
/// which the operator Deployment sets from its pod spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// MetalLB controller image (`CONTROLLER_IMAGE`)
    pub controller_image: String,
    /// MetalLB speaker image (`SPEAKER_IMAGE`)
    pub speaker_image: String,
    /// Namespace MetalLB is installed into and watched in
    /// (`WATCH_NAMESPACE`, falling back to `POD_NAMESPACE`)
    pub namespace: String,
    /// Directory holding the manifest templates (`MANIFEST_PATH`)
    pub manifest_path: PathBuf,
    /// Port for metrics and probes (`METRICS_PORT`)
    pub metrics_port: u16,
    /// How long to wait before retrying a failed reconciliation
    /// (`RECONCILIATION_ERROR_REQUEUE_SECS`)
    pub reconciliation_error_requeue_secs: u64,
    /// How often installed manifests are re-applied (`RECONCILE_INTERVAL_SECS`)
    pub reconcile_interval_secs: u64,
    /// How long to wait for the HTTP server to bind (`SERVER_STARTUP_TIMEOUT_SECS`)
    pub startup_timeout_secs: u64,
    /// `SERVER_POLL_INTERVAL_MS`
    pub poll_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            controller_image: DEFAULT_CONTROLLER_IMAGE.to_string(),
            speaker_image: DEFAULT_SPEAKER_IMAGE.to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            manifest_path: PathBuf::from(DEFAULT_MANIFEST_PATH),
            metrics_port: DEFAULT_METRICS_PORT,
            reconciliation_error_requeue_secs: DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            reconcile_interval_secs: DEFAULT_RECONCILE_INTERVAL_SECS,
            startup_timeout_secs: DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_SERVER_POLL_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        let namespace = std::env::var("WATCH_NAMESPACE")
            .ok()
            .filter(|ns| !ns.is_empty())
            .unwrap_or_else(|| env_var_or_default_str("POD_NAMESPACE", DEFAULT_NAMESPACE));

        Self {
            controller_image: env_var_or_default_str("CONTROLLER_IMAGE", DEFAULT_CONTROLLER_IMAGE),
            speaker_image: env_var_or_default_str("SPEAKER_IMAGE", DEFAULT_SPEAKER_IMAGE),
            namespace,
            manifest_path: PathBuf::from(env_var_or_default_str(
                "MANIFEST_PATH",
                DEFAULT_MANIFEST_PATH,
            )),
            metrics_port: env_var_or_default("METRICS_PORT", DEFAULT_METRICS_PORT),
            reconciliation_error_requeue_secs: env_var_or_default(
                "RECONCILIATION_ERROR_REQUEUE_SECS",
                DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS,
            ),
            reconcile_interval_secs: env_var_or_default(
                "RECONCILE_INTERVAL_SECS",
                DEFAULT_RECONCILE_INTERVAL_SECS,
            ),
            startup_timeout_secs: env_var_or_default(
                "SERVER_STARTUP_TIMEOUT_SECS",
                DEFAULT_SERVER_STARTUP_TIMEOUT_SECS,
            ),
            poll_interval_ms: env_var_or_default(
                "SERVER_POLL_INTERVAL_MS",
                DEFAULT_SERVER_POLL_INTERVAL_MS,
            ),
        }
    }

    #[must_use]
    pub fn reconciliation_error_requeue_duration(&self) -> Duration {
        Duration::from_secs(self.reconciliation_error_requeue_secs)
    }

    #[must_use]
    pub fn reconcile_interval(&self) -> Duration {
        Duration::from_secs(self.reconcile_interval_secs)
    }

    #[must_use]
    pub fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

/// Read environment variable or return default
fn env_var_or_default<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Read environment variable as string or return default
fn env_var_or_default_str(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ControllerConfig::default();
        assert_eq!(config.namespace, "metallb-system");
        assert_eq!(config.manifest_path, PathBuf::from("bindata/deployment"));
        assert_eq!(config.reconciliation_error_requeue_duration(), Duration::from_secs(60));
        assert_eq!(config.reconcile_interval(), Duration::from_secs(300));
        assert_eq!(config.poll_interval(), Duration::from_millis(50));
    }

    // Each test uses its own variable names so they can run in parallel
    #[test]
    fn test_env_var_or_default_parses_numbers() {
        std::env::set_var("METALLB_OPERATOR_TEST_PORT", "9090");
        assert_eq!(env_var_or_default("METALLB_OPERATOR_TEST_PORT", 8080u16), 9090);
        std::env::remove_var("METALLB_OPERATOR_TEST_PORT");
    }

    #[test]
    fn test_env_var_or_default_ignores_garbage() {
        std::env::set_var("METALLB_OPERATOR_TEST_REQUEUE", "soon");
        assert_eq!(env_var_or_default("METALLB_OPERATOR_TEST_REQUEUE", 60u64), 60);
        std::env::remove_var("METALLB_OPERATOR_TEST_REQUEUE");
    }

    #[test]
    fn test_env_var_or_default_str_treats_empty_as_unset() {
        std::env::set_var("METALLB_OPERATOR_TEST_IMAGE", "");
        assert_eq!(
            env_var_or_default_str("METALLB_OPERATOR_TEST_IMAGE", "speaker:main"),
            "speaker:main"
        );
        std::env::remove_var("METALLB_OPERATOR_TEST_IMAGE");
        assert_eq!(
            env_var_or_default_str("METALLB_OPERATOR_TEST_UNSET", "speaker:main"),
            "speaker:main"
        );
    }
}
