//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the global tracing subscriber
//! - Optionally tag every line with its call site (`-LogCaller`)
//!
//! # Design Decisions
//! - `RUST_LOG` wins over the configured level
//! - Initialisation happens once per process; later calls are no-ops, so
//!   caller tagging must be decided before the first call

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logging switches taken from the resolved configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingOptions {
    pub level: String,
    pub caller: bool,
}

impl LoggingOptions {
    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env()
            .or_else(|_| EnvFilter::try_new(&self.level))
            .unwrap_or_else(|_| EnvFilter::new("info"))
    }
}

/// Install the global subscriber. Returns `false` if one was already set.
pub fn init_logging(options: &LoggingOptions) -> bool {
    tracing_subscriber::registry()
        .with(options.filter())
        .with(
            fmt::layer()
                .with_file(options.caller)
                .with_line_number(options.caller),
        )
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        let options = LoggingOptions {
            level: "debug".to_string(),
            caller: true,
        };
        init_logging(&options);
        assert!(!init_logging(&options));
    }
}
