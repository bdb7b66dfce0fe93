//! OS signal handling.
//!
//! # Responsibilities
//! - Register SIGINT/SIGTERM handlers (Ctrl+C only on non-unix targets)
//! - Translate each delivery into a [`Signal`] on a channel
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Handlers are installed synchronously in [`listen`], so arming is
//!   complete before the caller starts blocking work
//! - The forwarding task exits once the receiver is dropped

use std::fmt;

use tokio::sync::mpsc;

/// A termination request delivered to the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// SIGINT / Ctrl+C.
    Interrupt,
    /// SIGTERM.
    Terminate,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Signal::Interrupt => "interrupt",
            Signal::Terminate => "terminate",
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Start forwarding OS termination signals.
///
/// Must be called from within a Tokio runtime. If a handler cannot be
/// installed the error is logged and that signal is never reported.
pub fn listen() -> mpsc::Receiver<Signal> {
    let (tx, rx) = mpsc::channel(4);

    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let interrupt = signal(SignalKind::interrupt())
            .map_err(|e| tracing::error!(error = %e, "Failed to install SIGINT handler"))
            .ok();
        let terminate = signal(SignalKind::terminate())
            .map_err(|e| tracing::error!(error = %e, "Failed to install SIGTERM handler"))
            .ok();

        tokio::spawn(forward_unix(tx, interrupt, terminate));
    }

    #[cfg(not(unix))]
    tokio::spawn(forward_ctrl_c(tx));

    rx
}

#[cfg(unix)]
async fn forward_unix(
    tx: mpsc::Sender<Signal>,
    mut interrupt: Option<tokio::signal::unix::Signal>,
    mut terminate: Option<tokio::signal::unix::Signal>,
) {
    async fn next(stream: &mut Option<tokio::signal::unix::Signal>) {
        match stream {
            Some(s) => {
                if s.recv().await.is_none() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    loop {
        let signal = tokio::select! {
            () = next(&mut interrupt) => Signal::Interrupt,
            () = next(&mut terminate) => Signal::Terminate,
            () = tx.closed() => break,
        };
        if tx.send(signal).await.is_err() {
            break;
        }
    }
}

#[cfg(not(unix))]
async fn forward_ctrl_c(tx: mpsc::Sender<Signal>) {
    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                if let Err(e) = result {
                    tracing::error!(error = %e, "Failed to install Ctrl+C handler");
                    tx.closed().await;
                    break;
                }
                if tx.send(Signal::Interrupt).await.is_err() {
                    break;
                }
            }
            () = tx.closed() => break,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_names() {
        assert_eq!(Signal::Interrupt.to_string(), "interrupt");
        assert_eq!(Signal::Terminate.as_str(), "terminate");
    }
}
