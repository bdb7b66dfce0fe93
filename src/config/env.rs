//! Environment variable overrides.
//!
//! One variable per configuration field under the `GATEWAY_` prefix, nested
//! fields joined with `__`:
//!
//! ```text
//! GATEWAY_ENABLE_GNMI_SERVER=true
//! GATEWAY_SERVER_LISTEN_PORT=9999
//! GATEWAY_EXPORTERS__ENABLED=kafka,prometheus
//! GATEWAY_TARGET_LOADERS__SIMPLE_FILE=/etc/gateway/targets.yaml
//! GATEWAY_ZOOKEEPER_TIMEOUT=2s
//! ```

use std::collections::HashMap;

use config::{Config, Environment};

use crate::config::loader::ConfigError;
use crate::config::schema::GatewayConfig;

/// Variable name prefix.
pub const ENV_PREFIX: &str = "GATEWAY";

/// Apply environment overrides on top of `config`.
///
/// `vars` replaces the process environment when given. Variables that are
/// not set leave their field alone. Values stay strings until the target
/// field's type asks for a number, a boolean, a duration or a list.
pub fn apply_environment(
    config: &mut GatewayConfig,
    vars: Option<&HashMap<String, String>>,
) -> Result<(), ConfigError> {
    let environment = Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .source(vars.map(|vars| vars.clone().into_iter().collect()));

    let resolved: GatewayConfig = Config::builder()
        .add_source(Config::try_from(&*config)?)
        .add_source(environment)
        .build()?
        .try_deserialize()?;

    *config = resolved;
    Ok(())
}
