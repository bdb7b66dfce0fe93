//! Gateway engine seam.
//!
//! The supervisor only needs two things from an engine: a constructor that
//! takes ownership of the resolved [`GatewayConfig`](crate::config::GatewayConfig),
//! and a start call that runs until the process ends or returns an error.
//! The gNMI server, exporters, target loaders and cluster coordination live
//! behind this trait.

pub mod gateway;

use std::path::PathBuf;

use async_trait::async_trait;

pub use gateway::Gateway;

/// Parameters for [`Engine::start`] that are not part of the configuration.
#[derive(Debug, Clone, Default)]
#[non_exhaustive]
pub struct StartOptions {}

/// Errors returned by an engine's start call.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("the gNMI server requires both a TLS certificate and a TLS key")]
    MissingTls,

    #[error("TLS file {} is not readable: {source}", path.display())]
    TlsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Precondition(String),
}

#[async_trait]
pub trait Engine: Send + Sync {
    /// Run the gateway. Healthy engines never return.
    async fn start(&self, options: StartOptions) -> Result<(), EngineError>;
}
