//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration for the component server.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Document roots: host (or `*`) → directory or base URL.
    pub contents: BTreeMap<String, String>,

    /// Component execution settings.
    pub components: ComponentsConfig,

    /// Error document settings.
    pub errors: ErrorsConfig,

    /// Forwarding to remote document roots.
    pub remote: RemoteConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    pub security: SecurityConfig,

    /// Extra extension → MIME type mappings.
    pub mime: BTreeMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Directory relative document roots are resolved against. Set by the
    /// loader to the config file's directory.
    #[serde(skip)]
    pub base_dir: PathBuf,
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

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ComponentsConfig {
    /// File extension of components, without the dot.
    pub extension: String,

    /// MIME type components are registered under.
    pub mime_type: String,

    /// Share compiled components between requests.
    pub cache: bool,

    /// Upper bound for a request waiting on compilation or execution.
    pub pending_timeout_secs: u64,
}

impl Default for ComponentsConfig {
    fn default() -> Self {
        Self {
            extension: "cmp".to_string(),
            mime_type: "application/x-component".to_string(),
            cache: true,
            pending_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ErrorsConfig {
    /// Error documents entered per request before the built-in page is used.
    pub max_depth: u8,

    /// Built-in root. Serves hosts without a `[contents]` entry, and its
    /// `errors/<status>.<ext>` are used when the request's own root has none.
    pub builtin_root: Option<String>,
}

impl Default for ErrorsConfig {
    fn default() -> Self {
        Self {
            max_depth: 2,
            builtin_root: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct RemoteConfig {
    /// Register the `http://` forwarder.
    pub enabled: bool,

    /// Largest upstream body accepted, in bytes.
    pub max_body_bytes: usize,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_body_bytes: 8 * 1024 * 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct SecurityConfig {
    /// Add `X-Content-Type-Options: nosniff` to responses.
    pub enable_headers: bool,
    /// Maximum request body size in bytes.
    pub max_body_size: usize,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            enable_headers: true,
            max_body_size: 2 * 1024 * 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
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
    fn minimal_config_uses_defaults() {
        let config: ServerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ServerConfig::default());
        assert_eq!(config.components.extension, "cmp");
        assert_eq!(config.errors.max_depth, 2);
        assert!(config.contents.is_empty());
    }

    #[test]
    fn full_config_parses() {
        let config: ServerConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:8000"

            [contents]
            "*" = "contents"
            "api.example.com" = "http://127.0.0.1:9000/v1"

            [components]
            extension = "page"
            cache = false
            pending_timeout_secs = 5

            [errors]
            max_depth = 1
            builtin_root = "builtin"

            [mime]
            md = "text/markdown"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:8000");
        assert_eq!(config.contents["api.example.com"], "http://127.0.0.1:9000/v1");
        assert_eq!(config.components.extension, "page");
        assert_eq!(config.components.mime_type, "application/x-component");
        assert!(!config.components.cache);
        assert_eq!(config.errors.builtin_root.as_deref(), Some("builtin"));
        assert_eq!(config.mime["md"], "text/markdown");
    }
}
