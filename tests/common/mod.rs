//! Shared utilities for integration testing.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use gnmi_gateway::{ConfigResolver, Engine, EngineError, StartOptions};

/// Command line with the program name prepended.
pub fn args(flags: &[&str]) -> Vec<String> {
    std::iter::once("gnmi-gateway")
        .chain(flags.iter().copied())
        .map(String::from)
        .collect()
}

/// Resolver that sees only `vars`, never the process environment.
pub fn resolver(vars: &[(&str, &str)]) -> ConfigResolver {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect();
    ConfigResolver::with_env(vars)
}

#[allow(dead_code)]
pub fn local_addr(port: u16) -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], port))
}

/// Engine that runs until the process is shut down.
#[allow(dead_code)]
pub struct PendingEngine;

#[async_trait]
impl Engine for PendingEngine {
    async fn start(&self, _options: StartOptions) -> Result<(), EngineError> {
        std::future::pending().await
    }
}

/// Poll `url` until the server answers.
#[allow(dead_code)]
pub async fn wait_for_http(url: &str) -> reqwest::Response {
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if let Ok(response) = client.get(url).send().await {
            return response;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    panic!("server at {url} never became reachable");
}
