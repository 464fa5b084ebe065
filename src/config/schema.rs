//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the proxy.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the Lambda proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ProxyConfig {
    /// Listener configuration (bind address, TLS).
    pub listener: ListenerConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Client address resolution.
    pub client_ip: ClientIpConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Functions to route requests to.
    pub functions: Vec<FunctionConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum buffered request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            // Synchronous invocation payload ceiling.
            max_body_bytes: 6 * 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// How the client address placed in `x-forwarded-for` is resolved.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientIpConfig {
    /// Peers whose forwarding header is trusted.
    pub trusted_proxies: Vec<String>,

    /// Header consulted when the peer is trusted.
    pub header: String,
}

impl Default for ClientIpConfig {
    fn default() -> Self {
        Self {
            trusted_proxies: Vec::new(),
            header: "x-forwarded-for".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
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

/// A function and the requests routed to it.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct FunctionConfig {
    /// Function name, full ARN or partial ARN.
    pub name: String,

    /// Host header to match (exact match).
    #[serde(default)]
    pub host: Option<String>,

    /// Path prefix to match.
    #[serde(default = "default_path_prefix")]
    pub path_prefix: String,

    /// Route priority (higher = checked first).
    #[serde(default)]
    pub priority: u32,

    /// AWS region. Falls back to the default provider chain when unset.
    #[serde(default)]
    pub region: Option<String>,

    /// Static access key. Falls back to the default provider chain when unset.
    #[serde(default)]
    pub access_key: Option<String>,

    /// Static secret key, required together with `access_key`.
    #[serde(default)]
    pub secret_key: Option<String>,

    /// Custom Lambda endpoint (e.g. LocalStack).
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// Value sent as `requestContext.elb.targetGroupArn`.
    #[serde(default)]
    pub target_group_arn: String,

    /// Invocation timeout in seconds.
    #[serde(default = "default_invoke_timeout")]
    pub timeout_secs: u64,

    /// Rules applied to request headers before encoding.
    #[serde(default)]
    pub header_up: HeaderRulesConfig,

    /// Rules applied to response headers after decoding.
    #[serde(default)]
    pub header_down: HeaderRulesConfig,
}

impl FunctionConfig {
    /// A function routed on every path with default settings.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host: None,
            path_prefix: default_path_prefix(),
            priority: 0,
            region: None,
            access_key: None,
            secret_key: None,
            endpoint_url: None,
            target_group_arn: String::new(),
            timeout_secs: default_invoke_timeout(),
            header_up: HeaderRulesConfig::default(),
            header_down: HeaderRulesConfig::default(),
        }
    }
}

fn default_path_prefix() -> String {
    "/".to_string()
}

fn default_invoke_timeout() -> u64 {
    30
}

/// Header manipulation rules.
///
/// Applied in the order: add, set, delete, replace.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq, Eq)]
#[serde(default)]
pub struct HeaderRulesConfig {
    /// Headers to remove.
    pub delete: Vec<String>,

    /// Headers to overwrite.
    pub set: BTreeMap<String, String>,

    /// Headers to append a value to.
    pub add: BTreeMap<String, String>,

    /// Substring replacements within existing header values.
    pub replace: Vec<HeaderReplacement>,
}

/// Substring replacement inside a header's values.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct HeaderReplacement {
    pub field: String,
    pub search: String,
    pub replace: String,
}
