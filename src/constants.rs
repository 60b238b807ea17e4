//! # Constants
//!
//! Shared constants used throughout the operator.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 8080;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default requeue interval for reconciliation errors (seconds)
pub const DEFAULT_RECONCILIATION_ERROR_REQUEUE_SECS: u64 = 60;

/// Default interval between periodic Metallb reconciliations (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 300;

/// Namespace the operator installs MetalLB into when none is configured
pub const DEFAULT_NAMESPACE: &str = "metallb-system";

/// Directory holding the MetalLB manifest templates
pub const DEFAULT_MANIFEST_PATH: &str = "bindata/deployment";

pub const DEFAULT_CONTROLLER_IMAGE: &str = "quay.io/metallb/controller:main";

pub const DEFAULT_SPEAKER_IMAGE: &str = "quay.io/metallb/speaker:main";

/// Name of the ConfigMap MetalLB reads its configuration from
pub const ADDRESS_POOL_CONFIG_MAP_NAME: &str = "config";

/// Reserved ConfigMap data key holding the aggregated address pool configuration
pub const ADDRESS_POOL_CONFIG_KEY: &str = "config";

/// Annotation maintained by the Deployment controller; never overwritten by a re-apply
pub const DEPLOYMENT_REVISION_ANNOTATION: &str = "deployment.kubernetes.io/revision";
