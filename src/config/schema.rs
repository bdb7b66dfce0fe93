//! Configuration schema definitions.
//!
//! This module defines the complete runtime configuration of the gateway.
//! All types derive Serde traits so the same shape is used for config files,
//! environment overrides and the resolved value handed to the engine.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{duration, list};

/// Default TCP port for the gNMI server.
pub const DEFAULT_SERVER_LISTEN_PORT: u16 = 9339;

/// Default lock path prefix in Zookeeper.
pub const DEFAULT_ZOOKEEPER_PREFIX: &str = "/gnmi/gateway/";

/// Root configuration for the gateway.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Enable the gNMI server.
    pub enable_gnmi_server: bool,

    /// Exporters to enable.
    pub exporters: ExportersConfig,

    /// Target loaders to enable and their data sources.
    pub target_loaders: TargetLoadersConfig,

    /// Size of the buffer between targets and exporters/clients.
    pub gateway_transition_buffer_size: u64,

    /// Include the file and line number with each log message.
    pub log_caller: bool,

    /// Log filter directive used when `RUST_LOG` is not set.
    pub log_level: String,

    /// OpenConfig models directory (required by the prometheus exporter).
    pub open_config_directory: Option<PathBuf>,

    /// Address where other cluster members can reach the gNMI server.
    /// The engine picks the first assigned IP address when unset.
    pub server_address: Option<String>,

    /// Port where other cluster members can reach the gNMI server.
    /// `0` means "same as `server_listen_port`".
    pub server_port: u16,

    /// Interface address the gNMI server binds to.
    pub server_listen_address: String,

    /// Port the gNMI server binds to.
    pub server_listen_port: u16,

    /// gNMI server TLS certificate (PEM).
    pub server_tls_cert: Option<PathBuf>,

    /// gNMI server TLS private key (PEM).
    pub server_tls_key: Option<PathBuf>,

    /// Atlas URI for internal gateway stats.
    pub stats_spectator_uri: Option<String>,

    /// Dial timeout for target connections.
    #[serde(with = "duration")]
    pub target_dial_timeout: Duration,

    /// Maximum number of targets this instance connects to at once.
    pub target_limit: usize,

    /// Zookeeper hosts, each including its port.
    #[serde(deserialize_with = "list::deserialize")]
    pub zookeeper_hosts: Vec<String>,

    /// Prefix for the lock path in Zookeeper.
    pub zookeeper_prefix: String,

    /// Zookeeper session timeout. Failover takes roughly twice this.
    #[serde(with = "duration")]
    pub zookeeper_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            enable_gnmi_server: false,
            exporters: ExportersConfig::default(),
            target_loaders: TargetLoadersConfig::default(),
            gateway_transition_buffer_size: 10_000,
            log_caller: false,
            log_level: "info".to_string(),
            open_config_directory: None,
            server_address: None,
            server_port: 0,
            server_listen_address: "0.0.0.0".to_string(),
            server_listen_port: DEFAULT_SERVER_LISTEN_PORT,
            server_tls_cert: None,
            server_tls_key: None,
            stats_spectator_uri: None,
            target_dial_timeout: Duration::from_secs(10),
            target_limit: 100,
            zookeeper_hosts: Vec::new(),
            zookeeper_prefix: DEFAULT_ZOOKEEPER_PREFIX.to_string(),
            zookeeper_timeout: Duration::from_secs(1),
        }
    }
}

impl GatewayConfig {
    /// Port advertised to other cluster members.
    pub fn advertised_port(&self) -> u16 {
        if self.server_port == 0 {
            self.server_listen_port
        } else {
            self.server_port
        }
    }

    /// Address the gNMI server binds to, as `host:port`.
    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.server_listen_address, self.server_listen_port)
    }

    /// Whether cluster coordination is configured.
    pub fn clustering_enabled(&self) -> bool {
        !self.zookeeper_hosts.is_empty()
    }
}

/// Exporter selection.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ExportersConfig {
    /// Exporter names, in the order they were given.
    #[serde(deserialize_with = "list::deserialize")]
    pub enabled: Vec<String>,
}

impl ExportersConfig {
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|e| e == name)
    }
}

/// Target loader selection and data sources.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct TargetLoadersConfig {
    /// Loader names, in the order they were given.
    #[serde(deserialize_with = "list::deserialize")]
    pub enabled: Vec<String>,

    /// Simple YAML file containing the target configurations.
    pub simple_file: Option<PathBuf>,

    /// Reload interval for `simple_file`.
    #[serde(with = "duration")]
    pub simple_file_reload_interval: Duration,

    /// JSON file containing the target configurations.
    pub json_file: Option<PathBuf>,

    /// Reload interval for `json_file`.
    #[serde(with = "duration")]
    pub json_file_reload_interval: Duration,
}

impl Default for TargetLoadersConfig {
    fn default() -> Self {
        Self {
            enabled: Vec::new(),
            simple_file: None,
            simple_file_reload_interval: Duration::from_secs(30),
            json_file: None,
            json_file_reload_interval: Duration::from_secs(30),
        }
    }
}
