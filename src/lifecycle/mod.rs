//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (supervisor.rs):
//!     Resolve config → [-version: print, exit] → Arm signals
//!         → Diagnostics → Construct engine → Start (blocks)
//!
//! Shutdown (shutdown.rs + cleanup.rs):
//!     SIGINT/SIGTERM → Release cleanup guards in order → Exit 0
//!     Second signal during cleanup → Exit 1
//!
//! Signals (signals.rs):
//!     OS handlers → mpsc channel → coordinator
//! ```
//!
//! # Design Decisions
//! - Ordered startup: each step is a hard precondition for the next
//! - Cleanup is registered before the engine starts; late registrations
//!   are released immediately
//! - No drain of engine work here; that belongs to the engine

pub mod cleanup;
pub mod shutdown;
pub mod signals;
pub mod supervisor;

pub use cleanup::{CleanupGuard, CleanupRegistry, ShutdownState};
pub use shutdown::{Shutdown, ShutdownOutcome, SignalShutdownCoordinator};
pub use signals::Signal;
pub use supervisor::{RunOutcome, Supervisor};
