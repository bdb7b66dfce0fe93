//! Layered configuration resolution.
//!
//! # Data Flow
//! ```text
//! GatewayConfig::default()
//!     → command-line flags (only the flags given)
//!     → config file overlay (when -ConfigFile is set)
//!     → GATEWAY_* environment variables (always last, always win)
//!     → list normalisation
//! ```
//!
//! Each layer mutates the configuration in place. A failing layer returns
//! its error without undoing the layers before it.

use std::collections::HashMap;
use std::ffi::OsString;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::cli::{clean_split, GatewayArgs};
use crate::config::env::apply_environment;
use crate::config::loader::{populate_from_file, ConfigError};
use crate::config::schema::GatewayConfig;

/// Fixed port of the profiling web server.
pub const DEFAULT_PPROF_PORT: u16 = 6161;

/// Process-level switches that are not part of the gateway configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessOptions {
    pub config_file: Option<PathBuf>,
    pub print_version: bool,
    pub debug: DebugOptions,
}

/// Diagnostics switches consumed by `setup_debugging`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugOptions {
    /// Write a CPU profile to this file until shutdown.
    pub cpu_profile: Option<PathBuf>,
    /// Serve the profiling endpoint.
    pub pprof: bool,
    /// Where the profiling endpoint binds.
    pub pprof_address: SocketAddr,
}

impl Default for DebugOptions {
    fn default() -> Self {
        Self {
            cpu_profile: None,
            pprof: false,
            pprof_address: SocketAddr::from((Ipv4Addr::LOCALHOST, DEFAULT_PPROF_PORT)),
        }
    }
}

/// Build identification printed by `-version`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BuildInfo {
    pub version: &'static str,
    pub build_time: &'static str,
}

impl BuildInfo {
    /// Identification of the running binary.
    pub fn current() -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION"),
            build_time: option_env!("GATEWAY_BUILD_TIME").unwrap_or("unknown"),
        }
    }

    pub fn version_line(&self) -> String {
        format!("gnmi-gateway version {} (Built {})", self.version, self.build_time)
    }
}

impl Default for BuildInfo {
    fn default() -> Self {
        Self::current()
    }
}

/// Resolves a [`GatewayConfig`] from flags, an optional file and the environment.
#[derive(Debug, Clone, Default)]
pub struct ConfigResolver {
    env: Option<HashMap<String, String>>,
}

impl ConfigResolver {
    /// Resolver reading the process environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver reading `vars` instead of the process environment.
    pub fn with_env(vars: HashMap<String, String>) -> Self {
        Self { env: Some(vars) }
    }

    /// Resolve a configuration starting from the built-in defaults.
    pub fn resolve<I, T>(&self, args: I) -> Result<(GatewayConfig, ProcessOptions), ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let mut config = GatewayConfig::default();
        let options = self.parse_args(&mut config, args)?;
        Ok((config, options))
    }

    /// Apply flags, then the config file, then the environment onto `config`.
    pub fn parse_args<I, T>(&self, config: &mut GatewayConfig, args: I) -> Result<ProcessOptions, ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        let args = GatewayArgs::try_parse_normalized(args)?;
        args.apply(config);

        let config_file = args.config_file();
        if let Some(path) = &config_file {
            populate_from_file(config, path)?;
        }

        apply_environment(config, self.env.as_ref())?;
        normalize_lists(config);

        Ok(ProcessOptions {
            config_file,
            print_version: args.print_version(),
            debug: DebugOptions {
                cpu_profile: args.cpu_profile(),
                pprof: args.pprof(),
                ..DebugOptions::default()
            },
        })
    }
}

/// Re-apply the flag splitting rule to lists that came from a file or the environment.
fn normalize_lists(config: &mut GatewayConfig) {
    for list in [
        &mut config.exporters.enabled,
        &mut config.target_loaders.enabled,
        &mut config.zookeeper_hosts,
    ] {
        *list = list.iter().flat_map(|item| clean_split(item)).collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_without_overrides() {
        let (config, options) = ConfigResolver::with_env(HashMap::new())
            .resolve(["gnmi-gateway"])
            .unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert!(!options.print_version);
        assert_eq!(options.debug, DebugOptions::default());
        assert_eq!(options.debug.pprof_address.port(), 6161);
    }

    #[test]
    fn test_process_options_from_flags() {
        let (_, options) = ConfigResolver::with_env(HashMap::new())
            .resolve(["gnmi-gateway", "-version", "-PProf", "-CPUProfile=/tmp/cpu.svg"])
            .unwrap();
        assert!(options.print_version);
        assert!(options.debug.pprof);
        assert_eq!(options.debug.cpu_profile, Some(PathBuf::from("/tmp/cpu.svg")));
    }

    #[test]
    fn test_empty_path_flags_are_ignored() {
        let (config, options) = ConfigResolver::with_env(HashMap::new())
            .resolve(["gnmi-gateway", "-ConfigFile=", "-CPUProfile=", "-PProf=true"])
            .unwrap();
        assert_eq!(config, GatewayConfig::default());
        assert_eq!(options.config_file, None);
        assert_eq!(options.debug.cpu_profile, None);
        assert!(options.debug.pprof);
    }

    #[test]
    fn test_env_lists_are_trimmed() {
        let env = HashMap::from([(
            "GATEWAY_TARGET_LOADERS__ENABLED".to_string(),
            "simple, json,".to_string(),
        )]);
        let (config, _) = ConfigResolver::with_env(env).resolve(["gnmi-gateway"]).unwrap();
        assert_eq!(config.target_loaders.enabled, vec!["simple", "json"]);
    }

    #[test]
    fn test_version_line() {
        let info = BuildInfo {
            version: "1.2.3",
            build_time: "2024-01-01",
        };
        assert_eq!(info.version_line(), "gnmi-gateway version 1.2.3 (Built 2024-01-01)");
    }
}
