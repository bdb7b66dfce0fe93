//! Shutdown coordination for the gateway process.

use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::lifecycle::cleanup::CleanupRegistry;
use crate::lifecycle::signals::Signal;
use crate::observability::metrics;

/// Stop handle for owned background tasks such as the profiling server.
///
/// Each long-running task subscribes once and exits when the signal fires
/// or when the handle is dropped.
#[derive(Debug)]
pub struct Shutdown {
    /// Fan-out to every subscribed task.
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    /// Create a handle with no subscribers.
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Receiver that yields once the owner asks the task to stop.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Ask every subscribed task to stop. A no-op when none is listening.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of tasks still listening.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

/// How signal-driven shutdown ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownOutcome {
    /// Every cleanup action ran.
    Completed { released: usize },
    /// A second signal arrived before cleanup finished.
    Forced,
}

/// Waits for the first termination signal and then drains the cleanup
/// registry.
///
/// ```text
/// Armed --signal--> Triggered --cleanup done--> Terminated
///                       \--second signal--> Forced
/// ```
///
/// There is no deadline on cleanup: a hanging action holds shutdown until a
/// second signal forces it.
#[derive(Debug)]
pub struct SignalShutdownCoordinator {
    task: JoinHandle<ShutdownOutcome>,
    outcome: Option<ShutdownOutcome>,
}

impl SignalShutdownCoordinator {
    /// Start watching `signals`. Must be called from within a Tokio runtime.
    pub fn arm(registry: CleanupRegistry, signals: mpsc::Receiver<Signal>) -> Self {
        let task = tokio::spawn(watch(registry, signals));
        tracing::debug!("Signal shutdown coordinator armed");
        Self {
            task,
            outcome: None,
        }
    }

    /// Wait until signal-driven shutdown has finished.
    ///
    /// Cancel safe; once finished, later calls return the same outcome.
    pub async fn wait(&mut self) -> ShutdownOutcome {
        if let Some(outcome) = self.outcome {
            return outcome;
        }
        let outcome = match (&mut self.task).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!(error = %e, "Shutdown coordinator failed");
                ShutdownOutcome::Forced
            }
        };
        self.outcome = Some(outcome);
        outcome
    }

    /// Stop watching for signals without running any cleanup.
    pub fn disarm(&self) {
        self.task.abort();
    }
}

async fn watch(registry: CleanupRegistry, mut signals: mpsc::Receiver<Signal>) -> ShutdownOutcome {
    let Some(signal) = signals.recv().await else {
        tracing::warn!("Signal source closed, shutdown will not be signal-triggered");
        return std::future::pending().await;
    };

    tracing::info!(signal = %signal, "Shutdown signal received");
    metrics::record_signal(signal);

    let drain = registry.clone();
    let mut cleanup = tokio::task::spawn_blocking(move || drain.drain());

    tokio::select! {
        result = &mut cleanup => {
            let released = result.unwrap_or_else(|e| {
                tracing::error!(error = %e, "Cleanup action panicked");
                0
            });
            registry.mark_terminated();
            tracing::info!(released, "Cleanup complete");
            ShutdownOutcome::Completed { released }
        }
        Some(second) = signals.recv() => {
            tracing::warn!(signal = %second, "Second signal during cleanup, forcing exit");
            ShutdownOutcome::Forced
        }
    }
}
