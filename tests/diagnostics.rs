//! Diagnostics setup tests: profiling server, CPU capture and cleanup.

use std::time::Duration;

use gnmi_gateway::config::{DebugOptions, GatewayConfig};
use gnmi_gateway::observability::DiagnosticsError;
use gnmi_gateway::setup_debugging;

mod common;

#[tokio::test]
async fn test_unwritable_cpu_profile_fails() {
    let options = DebugOptions {
        cpu_profile: Some("/nonexistent/dir/cpu.svg".into()),
        ..DebugOptions::default()
    };

    let err = setup_debugging(&GatewayConfig::default(), &options).err().unwrap();
    assert!(matches!(err, DiagnosticsError::CreateProfile { .. }));
}

#[tokio::test]
async fn test_no_options_starts_nothing() {
    let mut session = setup_debugging(&GatewayConfig::default(), &DebugOptions::default()).unwrap();

    assert!(session.profiling_server.is_none());
    assert!(session.cleanup.release());
    assert!(!session.cleanup.release());
}

#[tokio::test]
async fn test_profiling_server_serves_endpoints() {
    let options = DebugOptions {
        pprof: true,
        pprof_address: common::local_addr(28261),
        ..DebugOptions::default()
    };
    let session = setup_debugging(&GatewayConfig::default(), &options).unwrap();
    let server = session.profiling_server.unwrap();
    assert_eq!(server.address(), common::local_addr(28261));

    let index = common::wait_for_http("http://127.0.0.1:28261/debug/pprof/").await;
    assert_eq!(index.status(), 200);
    assert!(index.text().await.unwrap().contains("flamegraph"));

    let metrics = reqwest::get("http://127.0.0.1:28261/metrics").await.unwrap();
    assert_eq!(metrics.status(), 200);

    server.stop().await;
    assert!(reqwest::get("http://127.0.0.1:28261/debug/pprof/").await.is_err());
}

#[tokio::test]
async fn test_port_in_use_is_not_fatal() {
    let taken = std::net::TcpListener::bind(common::local_addr(28262)).unwrap();
    let options = DebugOptions {
        pprof: true,
        pprof_address: taken.local_addr().unwrap(),
        ..DebugOptions::default()
    };

    let mut session = setup_debugging(&GatewayConfig::default(), &options).unwrap();
    let server = session.profiling_server.take().unwrap();

    for _ in 0..50 {
        if server.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    assert!(server.is_finished(), "server task should give up on a bound port");
    assert!(session.cleanup.release());
    assert!(session.cleanup.is_released());
}

#[tokio::test]
async fn test_cpu_profile_flushed_on_release() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("cpu.svg");
    let options = DebugOptions {
        cpu_profile: Some(path.clone()),
        ..DebugOptions::default()
    };

    let mut session = setup_debugging(&GatewayConfig::default(), &options).unwrap();
    assert!(path.exists(), "profile file is created up front");

    // Give the sampler something to record.
    let mut acc = 0u64;
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_millis(200) {
        acc = acc.wrapping_mul(31).wrapping_add(7);
    }
    std::hint::black_box(acc);

    assert!(session.cleanup.release());
    assert!(path.exists());
}
