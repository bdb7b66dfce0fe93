//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_build_info` (gauge): always 1, labelled with `version`
//! - `gateway_signals_total` (counter): termination signals by `signal`
//! - `gateway_cleanup_actions_total` (counter): cleanup actions run by `action`
//!
//! The Prometheus recorder is installed lazily the first time the profiling
//! endpoint needs it. Until then the macros record into the no-op recorder.

use std::sync::OnceLock;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::config::BuildInfo;
use crate::lifecycle::signals::Signal;

static HANDLE: OnceLock<Option<PrometheusHandle>> = OnceLock::new();

/// Install the Prometheus recorder and return a handle for rendering.
///
/// Returns `None` when another global recorder was installed first.
pub fn init_metrics() -> Option<PrometheusHandle> {
    HANDLE
        .get_or_init(|| {
            let recorder = PrometheusBuilder::new().build_recorder();
            let handle = recorder.handle();
            match metrics::set_global_recorder(recorder) {
                Ok(()) => Some(handle),
                Err(_) => {
                    tracing::warn!("Metrics recorder already installed");
                    None
                }
            }
        })
        .clone()
}

pub fn record_build_info(info: &BuildInfo) {
    metrics::gauge!("gateway_build_info", "version" => info.version).set(1.0);
}

pub fn record_signal(signal: Signal) {
    metrics::counter!("gateway_signals_total", "signal" => signal.as_str()).increment(1);
}

pub fn record_cleanup(action: &str) {
    metrics::counter!("gateway_cleanup_actions_total", "action" => action.to_string()).increment(1);
}
