//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

use crate::dispatch::AffineMode;
use crate::greet::template::DEFAULT_TEMPLATE;

/// Root configuration for the greeting service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Greeting application settings.
    pub app: AppConfig,

    /// How affine backends are invoked.
    pub dispatch: DispatchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
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

/// Greeting application settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Initial greeting, replaced at runtime by `PUT <prefix>/greeting`.
    pub greeting: String,

    /// Message template with `{greeting}` and `{name}` placeholders.
    pub template: String,

    /// Path prefix the greeting routes are mounted under.
    pub route_prefix: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            greeting: "Ciao".to_string(),
            template: DEFAULT_TEMPLATE.to_string(),
            route_prefix: "/greet".to_string(),
        }
    }
}

/// Dispatch configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// `blocking`: the request waits for the affine worker.
    /// `deferred`: the worker completes the response on its own.
    pub affine_mode: AffineMode,
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
        Self { request_secs: 30 }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_size: 64 * 1024,
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
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: ServiceConfig = toml::from_str("").unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8080");
        assert_eq!(config.app.greeting, "Ciao");
        assert_eq!(config.app.route_prefix, "/greet");
        assert_eq!(config.dispatch.affine_mode, AffineMode::Blocking);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn test_partial_config() {
        let config: ServiceConfig = toml::from_str(
            r#"
            [app]
            greeting = "Hello"

            [dispatch]
            affine_mode = "deferred"
            "#,
        )
        .unwrap();
        assert_eq!(config.app.greeting, "Hello");
        assert_eq!(config.app.template, DEFAULT_TEMPLATE);
        assert_eq!(config.dispatch.affine_mode, AffineMode::Deferred);
        assert_eq!(config.timeouts.request_secs, 30);
    }

    #[test]
    fn test_unknown_mode_rejected() {
        let result: Result<ServiceConfig, _> = toml::from_str("[dispatch]\naffine_mode = \"eventually\"");
        assert!(result.is_err());
    }
}
