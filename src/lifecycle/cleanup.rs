//! Cleanup guards and the ordered shutdown registry.
//!
//! # Responsibilities
//! - Own each shutdown action in a named guard that runs it at most once
//! - Keep guards in registration order until shutdown drains them
//! - Track the shutdown state machine: Armed → Triggered → Terminated
//!
//! # Design Decisions
//! - A guard dropped without being released runs its action on drop
//! - Registering after shutdown has started releases the guard immediately
//!   instead of losing it

use std::borrow::Cow;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::observability::metrics;

type CleanupAction = Box<dyn FnOnce() + Send + 'static>;

/// A named resource release action that runs at most once.
pub struct CleanupGuard {
    name: Cow<'static, str>,
    action: Option<CleanupAction>,
}

impl CleanupGuard {
    pub fn new<F>(name: impl Into<Cow<'static, str>>, action: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        Self {
            name: name.into(),
            action: Some(Box::new(action)),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_released(&self) -> bool {
        self.action.is_none()
    }

    /// Run the action. Returns `false` if it had already run.
    pub fn release(&mut self) -> bool {
        let Some(action) = self.action.take() else {
            return false;
        };
        tracing::debug!(action = %self.name, "Running cleanup action");
        action();
        metrics::record_cleanup(&self.name);
        true
    }
}

impl Drop for CleanupGuard {
    fn drop(&mut self) {
        self.release();
    }
}

impl fmt::Debug for CleanupGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CleanupGuard")
            .field("name", &self.name)
            .field("released", &self.is_released())
            .finish()
    }
}

/// Shutdown progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShutdownState {
    /// Accepting registrations; no signal seen yet.
    Armed,
    /// Shutdown started; cleanup is running or has run.
    Triggered,
    /// Cleanup finished; the process is about to exit.
    Terminated,
}

#[derive(Debug)]
struct RegistryInner {
    state: ShutdownState,
    guards: Vec<CleanupGuard>,
}

/// Ordered, append-only list of cleanup guards shared between the
/// supervisor and the signal coordinator.
#[derive(Debug, Clone)]
pub struct CleanupRegistry {
    inner: Arc<Mutex<RegistryInner>>,
    /// Held for the whole of a drain so concurrent drains wait for it.
    draining: Arc<Mutex<()>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(RegistryInner {
                state: ShutdownState::Armed,
                guards: Vec::new(),
            })),
            draining: Arc::new(Mutex::new(())),
        }
    }

    fn lock(&self) -> MutexGuard<'_, RegistryInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a guard.
    ///
    /// Returns `false` when shutdown has already started; the guard is then
    /// released on the spot.
    pub fn register(&self, mut guard: CleanupGuard) -> bool {
        {
            let mut inner = self.lock();
            if inner.state == ShutdownState::Armed {
                inner.guards.push(guard);
                return true;
            }
        }

        tracing::warn!(
            action = %guard.name(),
            "Cleanup registered after shutdown started, releasing immediately"
        );
        guard.release();
        false
    }

    /// Release every registered guard in registration order.
    ///
    /// The first call moves the registry to `Triggered`; later calls find
    /// nothing left and return 0. Returns the number of actions run. A call
    /// made while another drain is running blocks until that one finishes,
    /// so every action has run once `drain` returns.
    pub fn drain(&self) -> usize {
        let _draining = self.draining.lock().unwrap_or_else(PoisonError::into_inner);
        let guards = {
            let mut inner = self.lock();
            if inner.state == ShutdownState::Armed {
                inner.state = ShutdownState::Triggered;
            }
            std::mem::take(&mut inner.guards)
        };

        // Actions run outside the lock so a slow one cannot block `register`.
        let mut released = 0;
        for mut guard in guards {
            if guard.release() {
                released += 1;
            }
        }
        released
    }

    pub fn mark_terminated(&self) {
        self.lock().state = ShutdownState::Terminated;
    }

    pub fn state(&self) -> ShutdownState {
        self.lock().state
    }

    pub fn len(&self) -> usize {
        self.lock().guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for CleanupRegistry {
    fn default() -> Self {
        Self::new()
    }
}
