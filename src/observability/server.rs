//! Profiling web server.
//!
//! # Endpoints
//! - `GET /debug/pprof/`: index
//! - `GET /debug/pprof/flamegraph?seconds=N`: samples the CPU for N seconds
//!   (default 30, max 300) and returns an SVG flamegraph
//! - `GET /metrics`: Prometheus text exposition
//!
//! The server runs as an owned background task. A bind failure is logged and
//! ends the task without affecting the caller.

use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use metrics_exporter_prometheus::PrometheusHandle;
use pprof::ProfilerGuard;
use serde::Deserialize;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::trace::TraceLayer;

use crate::lifecycle::Shutdown;
use crate::observability::profiling::{write_flamegraph, CPU_PROFILE_FREQUENCY};

const DEFAULT_PROFILE_SECONDS: u64 = 30;
const MAX_PROFILE_SECONDS: u64 = 300;

/// How long [`ProfilingServer::stop`] waits for in-flight requests.
const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Clone)]
struct ServerState {
    metrics: Option<PrometheusHandle>,
}

#[derive(Debug, Deserialize)]
struct ProfileParams {
    seconds: Option<u64>,
}

/// Handle to the running profiling server.
pub struct ProfilingServer {
    address: SocketAddr,
    shutdown: Shutdown,
    task: JoinHandle<()>,
}

impl ProfilingServer {
    /// Bind `address` and serve in the background.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn spawn(address: SocketAddr, metrics: Option<PrometheusHandle>) -> Self {
        let shutdown = Shutdown::new();
        let mut stop = shutdown.subscribe();
        let app = build_router(ServerState { metrics });

        let task = tokio::spawn(async move {
            let listener = match TcpListener::bind(address).await {
                Ok(listener) => listener,
                Err(e) => {
                    tracing::error!(address = %address, error = %e, "Error starting pprof web server");
                    return;
                }
            };
            tracing::info!(address = %address, "Launched pprof web server");

            let served = axum::serve(listener, app)
                .with_graceful_shutdown(async move {
                    let _ = stop.recv().await;
                })
                .await;
            if let Err(e) = served {
                tracing::error!(error = %e, "pprof web server failed");
            }
            tracing::debug!("pprof web server stopped");
        });

        Self {
            address,
            shutdown,
            task,
        }
    }

    pub fn address(&self) -> SocketAddr {
        self.address
    }

    /// Whether the server task has exited (stopped, or never bound).
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop accepting, give in-flight requests a short grace period, then abort.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let mut task = self.task;
        if tokio::time::timeout(STOP_GRACE, &mut task).await.is_err() {
            tracing::warn!("pprof web server did not stop in time, aborting");
            task.abort();
        }
    }
}

fn build_router(state: ServerState) -> Router {
    Router::new()
        .route("/debug/pprof/", get(index))
        .route("/debug/pprof/flamegraph", get(flamegraph))
        .route("/metrics", get(render_metrics))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

async fn index() -> &'static str {
    "/debug/pprof/flamegraph?seconds=N  CPU flamegraph (SVG)\n/metrics                           Prometheus metrics\n"
}

async fn flamegraph(Query(params): Query<ProfileParams>) -> Response {
    let seconds = params
        .seconds
        .unwrap_or(DEFAULT_PROFILE_SECONDS)
        .clamp(1, MAX_PROFILE_SECONDS);

    let guard = match ProfilerGuard::new(CPU_PROFILE_FREQUENCY) {
        Ok(guard) => guard,
        Err(e) => {
            return (
                StatusCode::CONFLICT,
                format!("could not enable CPU profiling: {e}"),
            )
                .into_response();
        }
    };

    tokio::time::sleep(Duration::from_secs(seconds)).await;

    let mut svg = Vec::new();
    match write_flamegraph(&guard, &mut svg) {
        Ok(()) => ([(header::CONTENT_TYPE, "image/svg+xml")], svg).into_response(),
        Err(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

async fn render_metrics(State(state): State<ServerState>) -> Response {
    match state.metrics {
        Some(handle) => handle.render().into_response(),
        None => (StatusCode::NOT_FOUND, "metrics recorder not installed").into_response(),
    }
}
