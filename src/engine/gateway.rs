//! Default engine host.
//!
//! # Responsibilities
//! - Check the startup preconditions the gateway depends on
//! - Log the effective topology
//! - Hold the process open until a signal ends it

use std::path::Path;

use async_trait::async_trait;

use crate::config::validation::PROMETHEUS_EXPORTER;
use crate::config::GatewayConfig;
use crate::engine::{Engine, EngineError, StartOptions};

pub struct Gateway {
    config: GatewayConfig,
}

impl Gateway {
    pub fn new(config: GatewayConfig) -> Self {
        Self { config }
    }

    async fn preflight(&self) -> Result<(), EngineError> {
        if self.config.enable_gnmi_server {
            let (Some(cert), Some(key)) = (&self.config.server_tls_cert, &self.config.server_tls_key) else {
                return Err(EngineError::MissingTls);
            };
            check_readable(cert).await?;
            check_readable(key).await?;
        }

        if self.config.exporters.is_enabled(PROMETHEUS_EXPORTER) && self.config.open_config_directory.is_none() {
            return Err(EngineError::Precondition(
                "the prometheus exporter requires an OpenConfig directory".to_string(),
            ));
        }

        Ok(())
    }
}

async fn check_readable(path: &Path) -> Result<(), EngineError> {
    tokio::fs::metadata(path)
        .await
        .map(|_| ())
        .map_err(|source| EngineError::TlsFile {
            path: path.to_path_buf(),
            source,
        })
}

#[async_trait]
impl Engine for Gateway {
    async fn start(&self, _options: StartOptions) -> Result<(), EngineError> {
        self.preflight().await?;

        let config = &self.config;
        tracing::info!(
            gnmi_server = config.enable_gnmi_server,
            listen_address = %config.listen_address(),
            advertised_port = config.advertised_port(),
            exporters = ?config.exporters.enabled,
            target_loaders = ?config.target_loaders.enabled,
            target_limit = config.target_limit,
            buffer_size = config.gateway_transition_buffer_size,
            clustered = config.clustering_enabled(),
            "Gateway started"
        );

        std::future::pending().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_server_without_tls_fails() {
        let mut config = GatewayConfig::default();
        config.enable_gnmi_server = true;
        let err = Gateway::new(config).start(StartOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::MissingTls));
    }

    #[tokio::test]
    async fn test_missing_tls_file_fails() {
        let mut config = GatewayConfig::default();
        config.enable_gnmi_server = true;
        config.server_tls_cert = Some("/nonexistent/cert.pem".into());
        config.server_tls_key = Some("/nonexistent/key.pem".into());
        let err = Gateway::new(config).start(StartOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::TlsFile { .. }));
    }

    #[tokio::test]
    async fn test_prometheus_without_openconfig_fails() {
        let mut config = GatewayConfig::default();
        config.exporters.enabled = vec!["prometheus".to_string()];
        let err = Gateway::new(config).start(StartOptions::default()).await.unwrap_err();
        assert!(matches!(err, EngineError::Precondition(_)));
    }

    #[tokio::test]
    async fn test_valid_config_keeps_running() {
        let gateway = Gateway::new(GatewayConfig::default());
        let result = tokio::time::timeout(Duration::from_millis(100), gateway.start(StartOptions::default())).await;
        assert!(result.is_err(), "start should block");
    }
}
