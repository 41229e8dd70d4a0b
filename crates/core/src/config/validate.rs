use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - At least one flow is configured, none with an empty directory tag
/// - Scheduler interval is not 0
/// - Exactly one of the transfer and sftp sections is present, with a
///   non-zero number of connect attempts
/// - Server port is not 0 when the status API is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.flows.is_empty() {
        return Err(ConfigError::ValidationError(
            "at least one of flows.default, flows.movies or flows.tv must be configured"
                .to_string(),
        ));
    }

    for (kind, flow) in config.flows.configured() {
        if flow.download_dir_tag.trim().is_empty() {
            return Err(ConfigError::ValidationError(format!(
                "flows.{}.download_dir_tag cannot be empty",
                kind.as_str()
            )));
        }
    }

    if config.scheduler.interval_secs == 0 {
        return Err(ConfigError::ValidationError(
            "scheduler.interval_secs cannot be 0".to_string(),
        ));
    }

    let (section, connect_attempts) = match (&config.transfer, &config.sftp) {
        (Some(transfer), None) => ("transfer", transfer.connect_attempts),
        (None, Some(sftp)) => ("sftp", sftp.connect_attempts),
        (Some(_), Some(_)) => {
            return Err(ConfigError::ValidationError(
                "only one of transfer and sftp can be configured".to_string(),
            ))
        }
        (None, None) => {
            return Err(ConfigError::ValidationError(
                "one of transfer or sftp must be configured".to_string(),
            ))
        }
    };
    if connect_attempts == 0 {
        return Err(ConfigError::ValidationError(format!(
            "{section}.connect_attempts cannot be 0"
        )));
    }

    if config.server.enabled && config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    Ok(())
}
