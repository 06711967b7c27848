//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from TOML files.
//! The three construction parameters (strategy, parallel requests per
//! provider, health-check interval) are required; everything else has a default.

use serde::{Deserialize, Serialize};

use crate::load_balancer::strategy::StrategyKind;

/// Root configuration for a load balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BalancerConfig {
    /// How a provider is chosen among the online ones.
    pub strategy: StrategyKind,

    /// Permits granted per online provider.
    pub max_parallel_requests: usize,

    /// Health monitor settings.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl BalancerConfig {
    /// Config with the required parameters and defaults for the rest.
    pub fn new(strategy: StrategyKind, max_parallel_requests: usize, interval_secs: u64) -> Self {
        Self {
            strategy,
            max_parallel_requests,
            health_check: HealthCheckConfig {
                interval_secs,
                ..HealthCheckConfig::default()
            },
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HealthCheckConfig {
    /// Seconds between the start of two health cycles.
    pub interval_secs: u64,

    /// Probe timeout in milliseconds. A timed-out probe counts as a failure.
    #[serde(default = "default_probe_timeout_ms")]
    pub probe_timeout_ms: u64,
}

fn default_probe_timeout_ms() -> u64 {
    2000
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            interval_secs: 10,
            probe_timeout_ms: default_probe_timeout_ms(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}
