use super::{types::Config, ConfigError};

/// Validate configuration.
///
/// The resolver section checks its own ranges and patterns; errors are
/// prefixed with the section name.
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    config
        .resolver
        .validate()
        .map_err(|e| ConfigError::ValidationError(format!("resolver: {e}")))?;

    Ok(())
}
