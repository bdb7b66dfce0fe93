//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! GatewayConfig::default() (schema.rs)
//!     → cli flags (crate::cli)
//!     → loader.rs (optional TOML/JSON overlay)
//!     → env.rs (GATEWAY_* variables, applied last)
//!     → validation.rs (advisory warnings)
//!     → GatewayConfig, moved into the engine
//! ```
//!
//! # Design Decisions
//! - Every layer only overwrites the fields it actually sets
//! - All fields have defaults to allow an empty command line
//! - Process switches (version, profiling) live in `ProcessOptions`, not in
//!   the gateway configuration

pub mod duration;
pub mod env;
pub mod list;
pub mod loader;
pub mod resolver;
pub mod schema;
pub mod validation;

pub use crate::cli::clean_split;
pub use loader::ConfigError;
pub use resolver::{BuildInfo, ConfigResolver, DebugOptions, ProcessOptions};
pub use schema::{ExportersConfig, GatewayConfig, TargetLoadersConfig};
