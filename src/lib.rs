//! gNMI gateway process lifecycle.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod lifecycle;
pub mod observability;

pub use config::{BuildInfo, ConfigResolver, GatewayConfig, ProcessOptions};
pub use engine::{Engine, EngineError, Gateway, StartOptions};
pub use error::GatewayError;
pub use lifecycle::{CleanupGuard, CleanupRegistry, RunOutcome, SignalShutdownCoordinator, Supervisor};
pub use observability::{setup_debugging, DebugSession};
