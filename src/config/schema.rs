//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the forwarder.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;
use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// Root configuration for the edge forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ForwarderConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Path prefixes the forwarder is registered for.
    pub routes: RoutesConfig,

    /// How the backend origin is chosen for each request.
    pub upstream: UpstreamConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl ForwarderConfig {
    /// Local development preset: every registered path goes to the fixed
    /// target, the way the site dev servers proxy `/api` to `127.0.0.1:5000`.
    pub fn local_development() -> Self {
        let mut config = Self::default();
        config.upstream.mode = TargetMode::Fixed;
        config
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Path registration for the forwarder.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RoutesConfig {
    /// Segment-aware path prefixes. `/api` covers `/api` and `/api/*`;
    /// `/` covers every request.
    pub path_prefixes: Vec<String>,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            path_prefixes: vec!["/api".to_string()],
        }
    }
}

/// Upstream selection strategy.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum TargetMode {
    /// Derive the backend from the leading label of the request host.
    #[default]
    Subdomain,
    /// Send everything to `fixed_target`, ignoring the request host.
    Fixed,
}

/// Subdomain to backend host naming convention.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum NamingConvention {
    /// `{subdomain}.api.{base_domain}`
    #[default]
    Dotted,
    /// `{subdomain}_api.{base_domain}`
    Underscore,
}

/// Scheme used for upstream requests.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamScheme {
    Http,
    #[default]
    Https,
}

/// Upstream configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Subdomain routing or a fixed target.
    pub mode: TargetMode,

    /// Naming convention for subdomain mode.
    pub convention: NamingConvention,

    /// Domain suffix appended by the naming convention.
    pub base_domain: String,

    /// Scheme for subdomain mode.
    pub scheme: UpstreamScheme,

    /// Explicit upstream port for subdomain mode (scheme default otherwise).
    pub port: Option<u16>,

    /// Origin used in fixed mode (e.g., "http://127.0.0.1:5000").
    pub fixed_target: String,

    /// Static host to IP overrides consulted before DNS.
    pub resolve: HashMap<String, IpAddr>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            mode: TargetMode::Subdomain,
            convention: NamingConvention::Dotted,
            base_domain: "einsum.org".to_string(),
            scheme: UpstreamScheme::Https,
            port: None,
            fixed_target: "http://127.0.0.1:5000".to_string(),
            resolve: HashMap::new(),
        }
    }
}

/// Timeout configuration for upstream calls.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Deadline for the upstream response head in seconds.
    pub upstream_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            upstream_secs: 30,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10MB
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Human-readable or JSON log lines.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
