use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - api.url is set and uses http(s)
/// - api.key is set
/// - polling.interval is not 0
/// - dispatch.timeout_secs is not 0
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    let url = config.api.url.trim();
    if url.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.url cannot be empty".to_string(),
        ));
    }
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "api.url must start with http:// or https://, got {}",
            url
        )));
    }

    if config.api.key.is_empty() {
        return Err(ConfigError::ValidationError(
            "api.key cannot be empty".to_string(),
        ));
    }

    if config.polling.interval == 0 {
        return Err(ConfigError::ValidationError(
            "polling.interval cannot be 0".to_string(),
        ));
    }

    if let Some(dispatch) = &config.dispatch {
        if dispatch.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "dispatch.timeout_secs cannot be 0".to_string(),
            ));
        }
    }

    Ok(())
}
