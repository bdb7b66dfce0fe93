//! Configuration validation.
//!
//! # Responsibilities
//! - Flag combinations the engine is known to reject or misbehave on
//! - Value ranges (timeouts, limits, buffer sizes)
//!
//! # Design Decisions
//! - Advisory only: the lifecycle layer logs warnings and still starts the
//!   engine, which owns the hard checks
//! - Returns all findings, not just the first
//! - Pure function: &GatewayConfig → Vec<ValidationWarning>

use std::fmt;
use std::time::Duration;

use crate::config::schema::GatewayConfig;

/// Name of the exporter that needs an OpenConfig models directory.
pub const PROMETHEUS_EXPORTER: &str = "prometheus";

/// Lowest Zookeeper session timeout the coordination client accepts.
pub const MIN_ZOOKEEPER_TIMEOUT: Duration = Duration::from_secs(1);

/// A suspicious configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub field: &'static str,
    pub message: String,
}

impl fmt::Display for ValidationWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

pub fn validate(config: &GatewayConfig) -> Vec<ValidationWarning> {
    let mut warnings = Vec::new();
    let mut warn = |field: &'static str, message: String| {
        warnings.push(ValidationWarning { field, message });
    };

    if config.enable_gnmi_server && (config.server_tls_cert.is_none() || config.server_tls_key.is_none()) {
        warn(
            "enable_gnmi_server",
            "the gNMI server needs both server_tls_cert and server_tls_key".to_string(),
        );
    }

    if config.exporters.is_enabled(PROMETHEUS_EXPORTER) && config.open_config_directory.is_none() {
        warn(
            "open_config_directory",
            "required by the prometheus exporter".to_string(),
        );
    }

    if config.clustering_enabled() {
        if config.zookeeper_timeout < MIN_ZOOKEEPER_TIMEOUT {
            warn(
                "zookeeper_timeout",
                format!(
                    "{} is below the {} minimum; failover takes about twice the timeout",
                    humantime::format_duration(config.zookeeper_timeout),
                    humantime::format_duration(MIN_ZOOKEEPER_TIMEOUT),
                ),
            );
        }
        if config.zookeeper_prefix.is_empty() {
            warn("zookeeper_prefix", "empty lock path prefix".to_string());
        }
    }

    if config.target_limit == 0 {
        warn("target_limit", "no targets will be connected".to_string());
    }

    if config.gateway_transition_buffer_size == 0 {
        warn(
            "gateway_transition_buffer_size",
            "an unbuffered transition stalls ingestion on every slow consumer".to_string(),
        );
    }

    warnings
}
