//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gateway. All types derive Serde traits for deserialization from the
//! YAML config file.

use serde::Deserialize;

use crate::capability::keys::SubscriberKeyConfig;
use crate::pipeline::Role;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address, body limit).
    pub listener: ListenerConfig,

    /// This gateway's own subscriber id on the network.
    pub subscriber_id: String,

    /// Participant role this gateway acts as.
    pub role: Role,

    /// Ordered pipeline step names for the configured endpoint.
    pub steps: Vec<String>,

    /// Routing-rule source.
    pub routing: RoutingConfig,

    /// Outbound signing settings.
    pub signing: SigningConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Subscriber key material for the in-memory key manager.
    pub keys: Vec<SubscriberKeyConfig>,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_bytes: 2 * 1024 * 1024,
        }
    }
}

/// Routing-rule source configuration.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RoutingConfig {
    /// Path to the routing-rules YAML file. Required when the `addRoute`
    /// step is configured.
    pub rules_path: Option<String>,
}

/// Outbound signing configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SigningConfig {
    /// Signature validity window in seconds.
    pub ttl_secs: u64,
}

impl Default for SigningConfig {
    fn default() -> Self {
        Self { ttl_secs: 300 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}
