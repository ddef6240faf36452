//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the application host.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct HostConfig {
    /// Status API configuration.
    pub status: StatusConfig,

    /// Health check settings.
    pub health_check: HealthCheckConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Endpoint port allocation.
    pub ports: PortsConfig,

    /// Restart policy for supervised processes.
    pub restart: RestartConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Per-resource overrides keyed by resource name.
    pub resources: HashMap<String, ResourceOverride>,
}

/// Status API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StatusConfig {
    /// Enable the status API.
    pub enabled: bool,

    /// Bind address (e.g., "127.0.0.1:18888").
    pub bind_address: String,

    /// Bearer token; empty disables authentication.
    pub api_key: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bind_address: "127.0.0.1:18888".to_string(),
            api_key: String::new(),
            tls: None,
        }
    }
}

/// TLS configuration for the status listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable health probing.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// Number of consecutive failures before marking unhealthy.
    pub unhealthy_threshold: u32,

    /// Number of consecutive successes before marking healthy.
    pub healthy_threshold: u32,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 2,
            timeout_secs: 5,
            unhealthy_threshold: 3,
            healthy_threshold: 1,
        }
    }
}

/// Timeout configuration for startup and shutdown.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Per-resource deadline for reaching ready, in seconds.
    pub startup_secs: u64,

    /// Grace period when stopping a process, in seconds.
    pub stop_grace_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            startup_secs: 60,
            stop_grace_secs: 5,
        }
    }
}

/// Endpoint port allocation.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PortsConfig {
    /// First port tried when allocating resource endpoints.
    pub base: u16,
}

impl Default for PortsConfig {
    fn default() -> Self {
        Self { base: 18000 }
    }
}

/// Restart policy for supervised processes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RestartConfig {
    /// Enable restarts of exited processes.
    pub enabled: bool,

    /// Maximum consecutive restart attempts before the run fails.
    pub max_attempts: u32,

    /// Base delay for exponential backoff in milliseconds.
    pub base_delay_ms: u64,

    /// Maximum delay for exponential backoff in milliseconds.
    pub max_delay_ms: u64,
}

impl Default for RestartConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 5,
            base_delay_ms: 250,
            max_delay_ms: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "127.0.0.1:19090".to_string(),
        }
    }
}

/// Per-resource override.
///
/// Everything is optional; an empty table leaves the runtime defaults in
/// place for that resource.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ResourceOverride {
    /// Replace the launch command (program name or path).
    pub command: Option<String>,

    /// Arguments appended to the launch command.
    pub args: Vec<String>,

    /// Extra environment variables for the process.
    pub env: HashMap<String, String>,

    /// Fixed endpoint port instead of an allocated one.
    pub port: Option<u16>,

    /// Working directory for the process.
    pub workdir: Option<String>,

    /// Adopt an existing endpoint ("host:port") instead of spawning.
    pub attach: Option<String>,
}
