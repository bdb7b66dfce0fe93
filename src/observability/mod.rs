//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! setup_debugging (diagnostics.rs)
//!     → logging.rs (global subscriber, optional caller tagging)
//!     → server.rs (profiling web server, optional)
//!         → profiling.rs (on-demand flamegraphs)
//!         → metrics.rs (Prometheus exposition)
//!     → profiling.rs (CPU capture to file, optional)
//!     → CleanupGuard that flushes the capture on shutdown
//! ```
//!
//! # Design Decisions
//! - Only a failing CPU capture is fatal; the web server is best effort
//! - Background tasks are owned handles, stopped by the supervisor

pub mod diagnostics;
pub mod logging;
pub mod metrics;
pub mod profiling;
pub mod server;

pub use diagnostics::{setup_debugging, DebugSession, DiagnosticsError};
pub use server::ProfilingServer;
