//! Crate-level error type.

use crate::config::ConfigError;
use crate::engine::EngineError;
use crate::observability::DiagnosticsError;

/// Any error that can end a gateway process.
///
/// The supervisor funnels every failure through this type to pick the
/// process outcome.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Diagnostics(#[from] DiagnosticsError),

    #[error(transparent)]
    Engine(#[from] EngineError),
}
