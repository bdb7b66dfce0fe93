//! gNMI gateway
//!
//! Streams telemetry from gNMI targets to clients and exporters.
//!
//! # Architecture Overview
//!
//! ```text
//!   argv, config file, GATEWAY_* env
//!                │
//!                ▼
//!       ┌─────────────────┐      ┌─────────────────────────────┐
//!       │ ConfigResolver  │      │ SIGINT / SIGTERM            │
//!       └────────┬────────┘      └──────────────┬──────────────┘
//!                │                              ▼
//!                │               ┌─────────────────────────────┐
//!                │               │ SignalShutdownCoordinator   │
//!                │               │   → CleanupRegistry         │
//!                │               └──────────────▲──────────────┘
//!                ▼                              │ cleanup guard
//!       ┌─────────────────┐      ┌──────────────┴──────────────┐
//!       │   Supervisor    │─────▶│ Diagnostics                 │
//!       └────────┬────────┘      │  logging, pprof, CPU profile│
//!                │               └─────────────────────────────┘
//!                ▼
//!       ┌─────────────────┐
//!       │  Gateway engine │
//!       └─────────────────┘
//! ```
//!
//! Flags follow the single-dash form, e.g. `-EnableGNMIServer -ServerListenPort=9339`.

use gnmi_gateway::{BuildInfo, Gateway, Supervisor};

#[tokio::main]
async fn main() {
    let outcome = Supervisor::new(Gateway::new)
        .with_build_info(BuildInfo::current())
        .run(std::env::args_os())
        .await;

    // Exit explicitly: a cleanup interrupted by a second signal may still be
    // running on the blocking pool.
    std::process::exit(outcome.exit_code());
}
