//! Command-line arguments.
//!
//! Flags keep their historical single-dash spelling (`-EnableGNMIServer`,
//! `-ServerListenPort=9999`). [`normalize_args`] rewrites them into the `--`
//! form clap expects before parsing.

use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::config::schema::GatewayConfig;

#[derive(Debug, Parser)]
#[command(name = "gnmi-gateway")]
#[command(about = "gNMI telemetry gateway", long_about = None)]
#[command(disable_version_flag = true)]
pub struct GatewayArgs {
    /// Path of the gateway configuration file (TOML, or JSON with a .json extension)
    #[arg(long = "ConfigFile", value_name = "PATH")]
    pub config_file: Option<String>,

    /// Enable the gNMI server
    #[arg(long = "EnableGNMIServer", num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub enable_gnmi_server: Option<bool>,

    /// Comma-separated list of Exporters to enable
    #[arg(long = "Exporters", value_name = "LIST")]
    pub exporters: Option<String>,

    /// Size of the buffer between targets and exporters/clients [default: 10000]
    #[arg(long = "GatewayTransitionBufferSize")]
    pub gateway_transition_buffer_size: Option<u64>,

    /// Include the file and line number with each log message
    #[arg(long = "LogCaller", num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub log_caller: Option<bool>,

    /// Log filter used when RUST_LOG is unset [default: info]
    #[arg(long = "LogLevel")]
    pub log_level: Option<String>,

    /// OpenConfig models directory (required to enable the Prometheus exporter)
    #[arg(long = "OpenConfigDirectory", value_name = "DIR")]
    pub open_config_directory: Option<PathBuf>,

    /// IP address where other cluster members can reach the gNMI server
    #[arg(long = "ServerAddress")]
    pub server_address: Option<String>,

    /// TCP port where other cluster members can reach the gNMI server [default: ServerListenPort]
    #[arg(long = "ServerPort")]
    pub server_port: Option<u16>,

    /// Interface IP address the gNMI server will listen on [default: 0.0.0.0]
    #[arg(long = "ServerListenAddress")]
    pub server_listen_address: Option<String>,

    /// TCP port to run the gNMI server on [default: 9339]
    #[arg(long = "ServerListenPort")]
    pub server_listen_port: Option<u16>,

    /// File containing the gNMI server TLS certificate (required to enable the gNMI server)
    #[arg(long = "ServerTLSCert", value_name = "PATH")]
    pub server_tls_cert: Option<PathBuf>,

    /// File containing the gNMI server TLS key (required to enable the gNMI server)
    #[arg(long = "ServerTLSKey", value_name = "PATH")]
    pub server_tls_key: Option<PathBuf>,

    /// Simple YAML file containing the target configurations
    #[arg(long = "SimpleFile", value_name = "PATH")]
    pub simple_file: Option<PathBuf>,

    /// Interval to reload the simple YAML file [default: 30s]
    #[arg(long = "SimpleFileReloadInterval", value_parser = humantime::parse_duration)]
    pub simple_file_reload_interval: Option<Duration>,

    /// URI for Atlas server to send internal gateway stats to
    #[arg(long = "StatsSpectatorURI")]
    pub stats_spectator_uri: Option<String>,

    /// Comma-separated list of Target Loaders to enable
    #[arg(long = "TargetLoaders", value_name = "LIST")]
    pub target_loaders: Option<String>,

    /// JSON file containing the target configurations
    #[arg(long = "TargetJSONFile", value_name = "PATH")]
    pub target_json_file: Option<PathBuf>,

    /// Interval to reload the JSON target file [default: 30s]
    #[arg(long = "TargetJSONFileReloadInterval", value_parser = humantime::parse_duration)]
    pub target_json_file_reload_interval: Option<Duration>,

    /// Dial timeout time [default: 10s]
    #[arg(long = "TargetDialTimeout", value_parser = humantime::parse_duration)]
    pub target_dial_timeout: Option<Duration>,

    /// Maximum number of targets that this instance will connect to at once [default: 100]
    #[arg(long = "TargetLimit")]
    pub target_limit: Option<usize>,

    /// Comma-separated list of zookeeper hosts including port
    #[arg(long = "ZookeeperHosts", value_name = "LIST")]
    pub zookeeper_hosts: Option<String>,

    /// Prefix for the lock path in Zookeeper [default: /gnmi/gateway/]
    #[arg(long = "ZookeeperPrefix")]
    pub zookeeper_prefix: Option<String>,

    /// Zookeeper timeout. Failover time is twice this [default: 1s]
    #[arg(long = "ZookeeperTimeout", value_parser = humantime::parse_duration)]
    pub zookeeper_timeout: Option<Duration>,

    /// File to write a CPU profile to; enables CPU profiling
    #[arg(long = "CPUProfile", value_name = "PATH")]
    pub cpu_profile: Option<String>,

    /// Enable the profiling web server
    #[arg(long = "PProf", num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub pprof: Option<bool>,

    /// Print version and exit
    #[arg(long = "version", num_args = 0..=1, default_missing_value = "true", require_equals = true)]
    pub version: Option<bool>,
}

impl GatewayArgs {
    /// Parse `args` (including the program name) after normalising flag spelling.
    pub fn try_parse_normalized<I, T>(args: I) -> Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString>,
    {
        Self::try_parse_from(normalize_args(args))
    }

    /// Config file to overlay. An empty `-ConfigFile=` counts as not given.
    pub fn config_file(&self) -> Option<PathBuf> {
        non_empty_path(self.config_file.as_deref())
    }

    /// CPU profile destination. An empty `-CPUProfile=` counts as not given.
    pub fn cpu_profile(&self) -> Option<PathBuf> {
        non_empty_path(self.cpu_profile.as_deref())
    }

    pub fn pprof(&self) -> bool {
        self.pprof.unwrap_or(false)
    }

    pub fn print_version(&self) -> bool {
        self.version.unwrap_or(false)
    }

    /// Write every flag that was given onto `config`.
    pub fn apply(&self, config: &mut GatewayConfig) {
        if let Some(v) = self.enable_gnmi_server {
            config.enable_gnmi_server = v;
        }
        if let Some(v) = &self.exporters {
            config.exporters.enabled = clean_split(v);
        }
        if let Some(v) = self.gateway_transition_buffer_size {
            config.gateway_transition_buffer_size = v;
        }
        if let Some(v) = self.log_caller {
            config.log_caller = v;
        }
        if let Some(v) = &self.log_level {
            config.log_level.clone_from(v);
        }
        if let Some(v) = &self.open_config_directory {
            config.open_config_directory = Some(v.clone());
        }
        if let Some(v) = &self.server_address {
            config.server_address = Some(v.clone());
        }
        if let Some(v) = self.server_port {
            config.server_port = v;
        }
        if let Some(v) = &self.server_listen_address {
            config.server_listen_address.clone_from(v);
        }
        if let Some(v) = self.server_listen_port {
            config.server_listen_port = v;
        }
        if let Some(v) = &self.server_tls_cert {
            config.server_tls_cert = Some(v.clone());
        }
        if let Some(v) = &self.server_tls_key {
            config.server_tls_key = Some(v.clone());
        }
        if let Some(v) = &self.simple_file {
            config.target_loaders.simple_file = Some(v.clone());
        }
        if let Some(v) = self.simple_file_reload_interval {
            config.target_loaders.simple_file_reload_interval = v;
        }
        if let Some(v) = &self.stats_spectator_uri {
            config.stats_spectator_uri = Some(v.clone());
        }
        if let Some(v) = &self.target_loaders {
            config.target_loaders.enabled = clean_split(v);
        }
        if let Some(v) = &self.target_json_file {
            config.target_loaders.json_file = Some(v.clone());
        }
        if let Some(v) = self.target_json_file_reload_interval {
            config.target_loaders.json_file_reload_interval = v;
        }
        if let Some(v) = self.target_dial_timeout {
            config.target_dial_timeout = v;
        }
        if let Some(v) = self.target_limit {
            config.target_limit = v;
        }
        if let Some(v) = &self.zookeeper_hosts {
            config.zookeeper_hosts = clean_split(v);
        }
        if let Some(v) = &self.zookeeper_prefix {
            config.zookeeper_prefix.clone_from(v);
        }
        if let Some(v) = self.zookeeper_timeout {
            config.zookeeper_timeout = v;
        }
    }
}

/// Rewrite single-dash long flags (`-ServerPort=1`) as `--ServerPort=1`.
///
/// Single-letter flags such as `-h`, anything already using `--`, and every
/// argument after a bare `--` are left untouched. The first element is the
/// program name and is never rewritten.
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let mut out = Vec::new();
    let mut passthrough = false;

    for (i, arg) in args.into_iter().enumerate() {
        let arg: OsString = arg.into();
        if i == 0 || passthrough {
            out.push(arg);
            continue;
        }

        match arg.to_str() {
            Some("--") => {
                passthrough = true;
                out.push(arg);
            }
            Some(s) if is_single_dash_long(s) => out.push(format!("-{s}").into()),
            _ => out.push(arg),
        }
    }

    out
}

fn is_single_dash_long(s: &str) -> bool {
    let Some(rest) = s.strip_prefix('-') else {
        return false;
    };
    let name = rest.split('=').next().unwrap_or_default();
    !rest.starts_with('-') && name.len() > 1 && name.starts_with(|c: char| c.is_ascii_alphabetic())
}

fn non_empty_path(value: Option<&str>) -> Option<PathBuf> {
    value.filter(|v| !v.is_empty()).map(PathBuf::from)
}

/// Split a comma-separated list into trimmed, non-empty tokens, keeping order.
pub fn clean_split(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_split() {
        assert_eq!(clean_split("a, b,,c"), vec!["a", "b", "c"]);
        assert_eq!(clean_split(" kafka "), vec!["kafka"]);
        assert!(clean_split("").is_empty());
        assert!(clean_split("  ").is_empty());
        assert!(clean_split(" , ,").is_empty());
    }

    #[test]
    fn test_normalize_args() {
        let normalized = normalize_args([
            "gnmi-gateway",
            "-EnableGNMIServer",
            "-ServerListenPort=9999",
            "--TargetLimit",
            "5",
            "-h",
            "-version",
            "--",
            "-Untouched",
        ]);
        let normalized: Vec<_> = normalized.iter().map(|s| s.to_str().unwrap()).collect();
        assert_eq!(
            normalized,
            vec![
                "gnmi-gateway",
                "--EnableGNMIServer",
                "--ServerListenPort=9999",
                "--TargetLimit",
                "5",
                "-h",
                "--version",
                "--",
                "-Untouched",
            ]
        );
    }

    #[test]
    fn test_normalize_leaves_negative_numbers() {
        let normalized = normalize_args(["gw", "-5"]);
        assert_eq!(normalized[1], "-5");
    }

    #[test]
    fn test_parse_go_style_flags() {
        let args = GatewayArgs::try_parse_normalized([
            "gnmi-gateway",
            "-EnableGNMIServer",
            "-ServerListenPort=9999",
            "-Exporters=kafka, prometheus",
            "-TargetDialTimeout=1m30s",
            "-LogCaller=false",
        ])
        .unwrap();

        assert_eq!(args.enable_gnmi_server, Some(true));
        assert_eq!(args.server_listen_port, Some(9999));
        assert_eq!(args.target_dial_timeout, Some(Duration::from_secs(90)));
        assert_eq!(args.log_caller, Some(false));
        assert!(!args.pprof());
        assert!(!args.print_version());

        let mut config = GatewayConfig::default();
        args.apply(&mut config);
        assert!(config.enable_gnmi_server);
        assert_eq!(config.server_listen_port, 9999);
        assert_eq!(config.exporters.enabled, vec!["kafka", "prometheus"]);
        assert_eq!(config.target_limit, 100);
    }

    #[test]
    fn test_unset_flags_leave_config_alone() {
        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway"]).unwrap();
        let mut config = GatewayConfig::default();
        args.apply(&mut config);
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_unknown_flag_is_rejected() {
        assert!(GatewayArgs::try_parse_normalized(["gnmi-gateway", "-NoSuchFlag"]).is_err());
    }

    #[test]
    fn test_bad_duration_is_rejected() {
        assert!(GatewayArgs::try_parse_normalized(["gnmi-gateway", "-ZookeeperTimeout=soon"]).is_err());
    }

    #[test]
    fn test_process_switches_take_explicit_values() {
        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway", "-PProf=true", "-version=false"]).unwrap();
        assert!(args.pprof());
        assert!(!args.print_version());

        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway", "-PProf", "-version"]).unwrap();
        assert!(args.pprof());
        assert!(args.print_version());

        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway", "-PProf=false"]).unwrap();
        assert!(!args.pprof());
    }

    #[test]
    fn test_empty_paths_count_as_unset() {
        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway", "-ConfigFile=", "-CPUProfile="]).unwrap();
        assert_eq!(args.config_file(), None);
        assert_eq!(args.cpu_profile(), None);

        let args = GatewayArgs::try_parse_normalized(["gnmi-gateway", "-CPUProfile=/tmp/cpu.svg"]).unwrap();
        assert_eq!(args.cpu_profile(), Some(PathBuf::from("/tmp/cpu.svg")));
    }
}
