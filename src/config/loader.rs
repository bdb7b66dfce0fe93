//! Configuration loading from disk.
//!
//! The file is an overlay, not a full document: only the keys it contains
//! replace the values already resolved from defaults and flags.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::config::schema::GatewayConfig;

/// Error type for configuration resolution.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error(transparent)]
    Cli(#[from] clap::Error),

    #[error("failed to populate config from file {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to populate config from file {}: {source}", path.display())]
    Toml {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to populate config from file {}: {source}", path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read environment variable configuration: {0}")]
    Environment(#[from] config::ConfigError),

    #[error("failed to encode configuration: {0}")]
    Encode(#[source] serde_json::Error),
}

impl ConfigError {
    /// Whether this is clap asking to print help rather than a real failure.
    pub fn is_help(&self) -> bool {
        matches!(
            self,
            ConfigError::Cli(e) if matches!(
                e.kind(),
                clap::error::ErrorKind::DisplayHelp
                    | clap::error::ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
            )
        )
    }
}

/// Overlay the contents of a TOML or JSON file onto `config`.
///
/// Files ending in `.json` are read as JSON, anything else as TOML. Fields
/// missing from the file keep their current value. On error `config` is left
/// as it was before the call.
pub fn populate_from_file(config: &mut GatewayConfig, path: &Path) -> Result<(), ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let overlay = parse_overlay(path, &content)?;

    let mut merged = serde_json::to_value(&*config).map_err(ConfigError::Encode)?;
    merge(&mut merged, overlay);

    *config = serde_json::from_value(merged).map_err(|source| ConfigError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::debug!(path = %path.display(), "Configuration file applied");
    Ok(())
}

fn parse_overlay(path: &Path, content: &str) -> Result<Value, ConfigError> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    if is_json {
        serde_json::from_str(content).map_err(|source| ConfigError::Json {
            path: path.to_path_buf(),
            source,
        })
    } else {
        toml::from_str(content).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Deep merge: objects merge key by key, everything else is replaced.
fn merge(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                merge(base.entry(key).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;

    fn write_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_toml_overlay_keeps_untouched_fields() {
        let file = write_file(
            ".toml",
            r#"
            target_limit = 250
            zookeeper_timeout = "5s"

            [target_loaders]
            enabled = ["simple"]
            "#,
        );

        let mut config = GatewayConfig::default();
        config.server_listen_port = 9999;
        populate_from_file(&mut config, file.path()).unwrap();

        assert_eq!(config.target_limit, 250);
        assert_eq!(config.zookeeper_timeout, Duration::from_secs(5));
        assert_eq!(config.target_loaders.enabled, vec!["simple"]);
        // Set before the file and not mentioned in it.
        assert_eq!(config.server_listen_port, 9999);
        assert_eq!(
            config.target_loaders.simple_file_reload_interval,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_json_overlay() {
        let file = write_file(
            ".json",
            r#"{"enable_gnmi_server": true, "exporters": {"enabled": ["kafka", "prometheus"]}}"#,
        );

        let mut config = GatewayConfig::default();
        populate_from_file(&mut config, file.path()).unwrap();

        assert!(config.enable_gnmi_server);
        assert_eq!(config.exporters.enabled, vec!["kafka", "prometheus"]);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let mut config = GatewayConfig::default();
        let err = populate_from_file(&mut config, Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
        assert_eq!(config, GatewayConfig::default());
    }

    #[test]
    fn test_malformed_toml() {
        let file = write_file(".toml", "target_limit = = 3");
        let mut config = GatewayConfig::default();
        let err = populate_from_file(&mut config, file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));
    }

    #[test]
    fn test_wrong_type_is_rejected() {
        let file = write_file(".json", r#"{"target_limit": "lots"}"#);
        let mut config = GatewayConfig::default();
        let err = populate_from_file(&mut config, file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert_eq!(config.target_limit, 100);
    }
}
