//! Process supervisor.
//!
//! # Responsibilities
//! - Resolve the configuration and process options
//! - Handle `-version` before anything with side effects
//! - Arm signal-driven shutdown before any resource needing cleanup exists
//! - Set up diagnostics and register their cleanup
//! - Build the engine and block in its start call
//!
//! # Startup Sequence
//! 1. Resolve (help or a bad flag ends the run here)
//! 2. Version check
//! 3. Arm the signal coordinator
//! 4. Diagnostics
//! 5. Construct the engine
//! 6. Start the engine; whichever of engine exit and signal shutdown comes
//!    first decides the outcome

use std::ffi::OsString;
use std::net::SocketAddr;

use tokio::sync::mpsc;

use crate::config::loader::ConfigError;
use crate::config::validation;
use crate::config::{BuildInfo, ConfigResolver, GatewayConfig};
use crate::engine::{Engine, EngineError, StartOptions};
use crate::error::GatewayError;
use crate::lifecycle::cleanup::CleanupRegistry;
use crate::lifecycle::shutdown::{ShutdownOutcome, SignalShutdownCoordinator};
use crate::lifecycle::signals::{self, Signal};
use crate::observability::{metrics, setup_debugging, ProfilingServer};

/// How a supervised run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// `-help` was given.
    HelpPrinted,
    /// `-version` was given.
    VersionPrinted,
    /// A signal arrived and every cleanup action ran.
    SignalShutdown { released: usize },
    /// The engine returned without an error.
    EngineStopped,
    /// A flag, the config file or the environment could not be applied.
    ConfigFailed,
    /// The CPU profile could not be started.
    DiagnosticsFailed,
    /// The engine returned an error.
    EngineFailed,
    /// A second signal interrupted cleanup.
    ForcedShutdown,
}

impl RunOutcome {
    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self,
            RunOutcome::HelpPrinted
                | RunOutcome::VersionPrinted
                | RunOutcome::SignalShutdown { .. }
                | RunOutcome::EngineStopped
        )
    }
}

enum Finished {
    Engine(Result<(), EngineError>),
    Signal(ShutdownOutcome),
}

/// Drives one gateway process from argument parsing to exit.
///
/// `F` builds the engine from the resolved configuration and is called at
/// most once, after diagnostics are in place.
pub struct Supervisor<F> {
    engine_factory: F,
    resolver: ConfigResolver,
    build_info: BuildInfo,
    signals: Option<mpsc::Receiver<Signal>>,
    pprof_address: Option<SocketAddr>,
}

impl<F, E> Supervisor<F>
where
    F: FnOnce(GatewayConfig) -> E,
    E: Engine,
{
    pub fn new(engine_factory: F) -> Self {
        Self {
            engine_factory,
            resolver: ConfigResolver::new(),
            build_info: BuildInfo::current(),
            signals: None,
            pprof_address: None,
        }
    }

    pub fn with_resolver(mut self, resolver: ConfigResolver) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_build_info(mut self, build_info: BuildInfo) -> Self {
        self.build_info = build_info;
        self
    }

    /// Use `signals` instead of installing OS signal handlers.
    pub fn with_signals(mut self, signals: mpsc::Receiver<Signal>) -> Self {
        self.signals = Some(signals);
        self
    }

    /// Bind the profiling server to `address` instead of the fixed port.
    pub fn with_pprof_address(mut self, address: SocketAddr) -> Self {
        self.pprof_address = Some(address);
        self
    }

    /// Run the process. Must be called from within a Tokio runtime.
    ///
    /// `args` includes the program name, as from [`std::env::args_os`].
    pub async fn run<I, T>(self, args: I) -> RunOutcome
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let Self {
            engine_factory,
            resolver,
            build_info,
            signals,
            pprof_address,
        } = self;

        let (config, mut options) = match resolver.resolve(args) {
            Ok(resolved) => resolved,
            Err(e) => return report_failure(e.into()),
        };
        if let Some(address) = pprof_address {
            options.debug.pprof_address = address;
        }

        if options.print_version {
            println!("{}", build_info.version_line());
            return RunOutcome::VersionPrinted;
        }

        let registry = CleanupRegistry::new();
        let signals = signals.unwrap_or_else(signals::listen);
        let mut coordinator = SignalShutdownCoordinator::arm(registry.clone(), signals);

        let session = match setup_debugging(&config, &options.debug) {
            Ok(session) => session,
            Err(e) => {
                coordinator.disarm();
                registry.drain();
                return report_failure(e.into());
            }
        };
        registry.register(session.cleanup);
        let profiling_server = session.profiling_server;

        metrics::record_build_info(&build_info);
        tracing::info!(
            version = build_info.version,
            build_time = build_info.build_time,
            config_file = ?options.config_file,
            "Starting gnmi-gateway"
        );
        for warning in validation::validate(&config) {
            tracing::warn!(field = warning.field, "{}", warning.message);
        }

        let engine = engine_factory(config);

        let finished = tokio::select! {
            result = engine.start(StartOptions::default()) => Finished::Engine(result),
            outcome = coordinator.wait() => Finished::Signal(outcome),
        };

        match finished {
            Finished::Signal(ShutdownOutcome::Completed { released }) => {
                stop_server(profiling_server).await;
                tracing::info!("Exit.");
                RunOutcome::SignalShutdown { released }
            }
            Finished::Signal(ShutdownOutcome::Forced) => RunOutcome::ForcedShutdown,
            Finished::Engine(result) => {
                coordinator.disarm();
                let outcome = match result {
                    Ok(()) => {
                        tracing::info!("Gateway stopped");
                        RunOutcome::EngineStopped
                    }
                    Err(e) => report_failure(e.into()),
                };
                // Waits for a signal-triggered drain that is already running.
                let drain = registry.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || drain.drain()).await {
                    tracing::error!(error = %e, "Cleanup action panicked");
                }
                registry.mark_terminated();
                stop_server(profiling_server).await;
                outcome
            }
        }
    }
}

/// Report `error` where it belongs and map it to the run's outcome.
///
/// Configuration errors happen before logging is set up and go to the
/// terminal; everything later is logged.
fn report_failure(error: GatewayError) -> RunOutcome {
    match error {
        GatewayError::Config(e) => {
            match &e {
                // clap routes help to stdout and usage errors to stderr.
                ConfigError::Cli(cli) => {
                    let _ = cli.print();
                }
                other => eprintln!("Unable to load configuration: {other}"),
            }
            if e.is_help() {
                RunOutcome::HelpPrinted
            } else {
                RunOutcome::ConfigFailed
            }
        }
        GatewayError::Diagnostics(e) => {
            tracing::error!(error = %e, "Unable to setup debugging");
            RunOutcome::DiagnosticsFailed
        }
        GatewayError::Engine(e) => {
            tracing::error!(error = %e, "Unable to start gateway");
            RunOutcome::EngineFailed
        }
    }
}

async fn stop_server(server: Option<ProfilingServer>) {
    if let Some(server) = server {
        server.stop().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    struct FailingEngine;

    #[async_trait]
    impl Engine for FailingEngine {
        async fn start(&self, _options: StartOptions) -> Result<(), EngineError> {
            Err(EngineError::Precondition("boom".to_string()))
        }
    }

    struct ReturningEngine;

    #[async_trait]
    impl Engine for ReturningEngine {
        async fn start(&self, _options: StartOptions) -> Result<(), EngineError> {
            Ok(())
        }
    }

    struct BlockingEngine;

    #[async_trait]
    impl Engine for BlockingEngine {
        async fn start(&self, _options: StartOptions) -> Result<(), EngineError> {
            std::future::pending().await
        }
    }

    fn args(extra: &[&str]) -> Vec<String> {
        std::iter::once("gnmi-gateway")
            .chain(extra.iter().copied())
            .map(String::from)
            .collect()
    }

    fn supervisor<F, E>(factory: F) -> Supervisor<F>
    where
        F: FnOnce(GatewayConfig) -> E,
        E: Engine,
    {
        Supervisor::new(factory).with_resolver(ConfigResolver::with_env(HashMap::new()))
    }

    #[test]
    fn test_failures_map_to_outcomes() {
        let help = crate::cli::GatewayArgs::try_parse_normalized(["gnmi-gateway", "-help"]).unwrap_err();
        assert_eq!(report_failure(ConfigError::from(help).into()), RunOutcome::HelpPrinted);

        let usage = crate::cli::GatewayArgs::try_parse_normalized(["gnmi-gateway", "-Bogus"]).unwrap_err();
        assert_eq!(report_failure(ConfigError::from(usage).into()), RunOutcome::ConfigFailed);

        let missing = ConfigError::Io {
            path: "/nonexistent.toml".into(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(report_failure(missing.into()), RunOutcome::ConfigFailed);

        let diagnostics = crate::observability::DiagnosticsError::CreateProfile {
            path: "/nonexistent/cpu.svg".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert_eq!(report_failure(diagnostics.into()), RunOutcome::DiagnosticsFailed);

        assert_eq!(report_failure(EngineError::MissingTls.into()), RunOutcome::EngineFailed);
    }

    #[test]
    fn test_exit_codes() {
        assert_eq!(RunOutcome::VersionPrinted.exit_code(), 0);
        assert_eq!(RunOutcome::HelpPrinted.exit_code(), 0);
        assert_eq!(RunOutcome::SignalShutdown { released: 1 }.exit_code(), 0);
        assert_eq!(RunOutcome::EngineStopped.exit_code(), 0);
        assert_eq!(RunOutcome::ConfigFailed.exit_code(), 1);
        assert_eq!(RunOutcome::DiagnosticsFailed.exit_code(), 1);
        assert_eq!(RunOutcome::EngineFailed.exit_code(), 1);
        assert_eq!(RunOutcome::ForcedShutdown.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_version_skips_engine() {
        let built = Arc::new(AtomicBool::new(false));
        let flag = built.clone();
        let (tx, rx) = mpsc::channel(1);

        let outcome = supervisor(move |_| {
            flag.store(true, Ordering::SeqCst);
            ReturningEngine
        })
        .with_signals(rx)
        .run(args(&["-version"]))
        .await;

        assert_eq!(outcome, RunOutcome::VersionPrinted);
        assert!(!built.load(Ordering::SeqCst));
        assert!(tx.is_closed(), "signals must not be armed");
    }

    #[tokio::test]
    async fn test_unknown_flag_fails() {
        let outcome = supervisor(|_| ReturningEngine).run(args(&["-NoSuchFlag"])).await;
        assert_eq!(outcome, RunOutcome::ConfigFailed);
    }

    #[tokio::test]
    async fn test_engine_error_fails() {
        let (_tx, rx) = mpsc::channel(1);
        let outcome = supervisor(|_| FailingEngine).with_signals(rx).run(args(&[])).await;
        assert_eq!(outcome, RunOutcome::EngineFailed);
    }

    #[tokio::test]
    async fn test_engine_return_stops() {
        let (_tx, rx) = mpsc::channel(1);
        let outcome = supervisor(|_| ReturningEngine).with_signals(rx).run(args(&[])).await;
        assert_eq!(outcome, RunOutcome::EngineStopped);
    }

    #[tokio::test]
    async fn test_signal_ends_blocking_engine() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(Signal::Terminate).await.unwrap();

        let outcome = supervisor(|_| BlockingEngine).with_signals(rx).run(args(&[])).await;
        assert!(matches!(outcome, RunOutcome::SignalShutdown { .. }));
    }

    #[tokio::test]
    async fn test_engine_receives_resolved_config() {
        let (tx, rx) = mpsc::channel(1);
        tx.send(Signal::Interrupt).await.unwrap();
        let seen = Arc::new(std::sync::Mutex::new(None));
        let slot = seen.clone();

        supervisor(move |config: GatewayConfig| {
            *slot.lock().unwrap() = Some(config.server_listen_port);
            BlockingEngine
        })
        .with_signals(rx)
        .run(args(&["-ServerListenPort=9999"]))
        .await;

        assert_eq!(*seen.lock().unwrap(), Some(9999));
    }
}
