//! Configuration validation utilities.

use super::error::{ConfigError, ConfigResult};
use super::schema::{
    CommandConfig, EmiConfig, GatewayConfig, LogOutput, LoggingConfig, ReconnectConfig,
    RetryConfig, StreamConfig,
};

/// Validates the entire configuration.
pub fn validate_config(config: &EmiConfig) -> ConfigResult<()> {
    validate_gateway_config(&config.gateway)?;
    validate_command_config(&config.command)?;
    validate_stream_config(&config.stream)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

fn validate_gateway_config(gateway: &GatewayConfig) -> ConfigResult<()> {
    validate_url(&gateway.event_url, &["ws://", "wss://"])?;
    validate_url(&gateway.api_url, &["http://", "https://"])?;

    if let Some(token) = &gateway.access_token
        && token.chars().any(|c| c.is_control())
    {
        return Err(ConfigError::validation(
            "Access token cannot contain control characters",
        ));
    }

    Ok(())
}

fn validate_command_config(command: &CommandConfig) -> ConfigResult<()> {
    if command.timeout_ms == 0 {
        return Err(ConfigError::validation("Timeout must be greater than 0"));
    }
    validate_retry_config(&command.retry)
}

fn validate_retry_config(retry: &RetryConfig) -> ConfigResult<()> {
    if retry.base_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Base retry delay must be greater than 0",
        ));
    }

    if retry.max_delay_ms < retry.base_delay_ms {
        return Err(ConfigError::validation(
            "Max retry delay must be greater than or equal to base delay",
        ));
    }

    Ok(())
}

fn validate_stream_config(stream: &StreamConfig) -> ConfigResult<()> {
    if stream.connect_timeout_ms == 0 {
        return Err(ConfigError::validation(
            "Connect timeout must be greater than 0",
        ));
    }
    validate_reconnect_config(&stream.reconnect)
}

fn validate_reconnect_config(reconnect: &ReconnectConfig) -> ConfigResult<()> {
    if reconnect.initial_delay_ms == 0 {
        return Err(ConfigError::validation(
            "Initial reconnect delay must be greater than 0",
        ));
    }

    if reconnect.max_delay_ms < reconnect.initial_delay_ms {
        return Err(ConfigError::validation(
            "Max reconnect delay must be greater than or equal to initial delay",
        ));
    }

    if reconnect.multiplier.is_nan() || reconnect.multiplier < 1.0 {
        return Err(ConfigError::validation(
            "Backoff multiplier must be at least 1.0",
        ));
    }

    if reconnect.max_attempts == Some(0) {
        return Err(ConfigError::validation(
            "Max reconnect attempts must be greater than 0 when set",
        ));
    }

    Ok(())
}

fn validate_logging_config(logging: &LoggingConfig) -> ConfigResult<()> {
    if logging.output == LogOutput::File && logging.file_path.is_none() {
        return Err(ConfigError::validation(
            "File log output requires logging.file_path",
        ));
    }

    if let Some(module) = logging.filters.keys().find(|m| m.trim().is_empty()) {
        return Err(ConfigError::validation(format!(
            "Invalid log filter module name: {module:?}"
        )));
    }

    Ok(())
}

/// Validates a URL against the allowed scheme prefixes.
fn validate_url(url: &str, valid_schemes: &[&str]) -> ConfigResult<()> {
    if url.is_empty() {
        return Err(ConfigError::invalid_url(url, "URL cannot be empty"));
    }

    if !valid_schemes.iter().any(|s| url.starts_with(s)) {
        return Err(ConfigError::invalid_url(
            url,
            format!("URL must start with one of: {valid_schemes:?}"),
        ));
    }

    Ok(())
}
