use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::path::Path;
use tracing::debug;

use super::{types::Config, ConfigError};

/// Prefix of environment variables overriding file values.
///
/// Nested keys are separated by `__`, e.g. `PLEXPOST_SERVER__PORT`.
pub const ENV_PREFIX: &str = "PLEXPOST_";

/// Load configuration from files with environment variable overrides.
///
/// Files are merged in order, later ones overriding earlier ones. The first
/// file is required; the others (typically a secrets file) are skipped when
/// missing.
pub fn load_config<P: AsRef<Path>>(paths: &[P]) -> Result<Config, ConfigError> {
    let Some(first) = paths.first() else {
        return Err(ConfigError::FileNotFound(
            "no configuration file given".to_string(),
        ));
    };
    if !first.as_ref().exists() {
        return Err(ConfigError::FileNotFound(
            first.as_ref().display().to_string(),
        ));
    }

    let mut figment = Figment::new();
    for path in paths {
        let path = path.as_ref();
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        } else {
            debug!(path = %path.display(), "optional configuration file missing, skipping");
        }
    }

    let config: Config = figment
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
