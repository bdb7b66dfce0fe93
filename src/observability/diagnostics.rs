//! Process diagnostics: caller-tagged logging, the profiling web server and
//! CPU profile capture.

use std::path::PathBuf;

use crate::config::{DebugOptions, GatewayConfig};
use crate::lifecycle::CleanupGuard;
use crate::observability::logging::{init_logging, LoggingOptions};
use crate::observability::metrics;
use crate::observability::profiling::CpuProfile;
use crate::observability::server::ProfilingServer;

/// Fatal diagnostics failures.
#[derive(Debug, thiserror::Error)]
pub enum DiagnosticsError {
    #[error("unable to create CPU profiling file {}: {source}", path.display())]
    CreateProfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unable to start CPU profiling: {0}")]
    StartProfile(#[source] pprof::Error),

    #[error("unable to build CPU profile report: {0}")]
    Report(#[source] pprof::Error),

    #[error("unable to write CPU profile {}: {source}", path.display())]
    WriteProfile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Everything [`setup_debugging`] started.
pub struct DebugSession {
    /// Stops any CPU capture and flushes it to disk.
    pub cleanup: CleanupGuard,
    /// The profiling web server, when `-PProf` was given.
    pub profiling_server: Option<ProfilingServer>,
}

/// Set up the diagnostics requested by `config` and `options`.
///
/// Logging is initialised first so caller tagging applies to every line that
/// follows. The profiling server is best effort: a bind failure is logged by
/// the server task and does not fail setup. Failing to create the CPU profile
/// file or to start sampling is fatal.
///
/// Must be called from within a Tokio runtime when `options.pprof` is set.
pub fn setup_debugging(config: &GatewayConfig, options: &DebugOptions) -> Result<DebugSession, DiagnosticsError> {
    init_logging(&LoggingOptions {
        level: config.log_level.clone(),
        caller: config.log_caller,
    });

    let profiling_server = options
        .pprof
        .then(|| ProfilingServer::spawn(options.pprof_address, metrics::init_metrics()));

    let cpu_profile = match &options.cpu_profile {
        Some(path) => match CpuProfile::start(path) {
            Ok(profile) => {
                tracing::info!(path = %path.display(), "Started CPU profiling");
                Some(profile)
            }
            Err(e) => {
                tracing::error!(error = %e, "Unable to start CPU profiling");
                return Err(e);
            }
        },
        None => None,
    };

    let cleanup = CleanupGuard::new("debugging", move || {
        tracing::info!("Cleaning up debugging");
        if let Some(profile) = cpu_profile {
            let path = profile.path().to_path_buf();
            match profile.finish() {
                Ok(()) => tracing::info!(path = %path.display(), "CPU profile written"),
                Err(e) => tracing::error!(error = %e, "Unable to write CPU profile"),
            }
        }
    });

    Ok(DebugSession {
        cleanup,
        profiling_server,
    })
}
