//! Configuration schema definitions.

use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use emi_core::{CommandClientConfig, ReconnectPolicy, RetryPolicy, StreamConnectionConfig};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EmiConfig {
    /// Gateway addresses and credentials.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// Command client settings.
    #[serde(default)]
    pub command: CommandConfig,

    /// Event stream settings.
    #[serde(default)]
    pub stream: StreamConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl EmiConfig {
    /// Resolves the command client configuration.
    pub fn command_client_config(&self) -> CommandClientConfig {
        CommandClientConfig {
            api_url: self.gateway.api_url.clone(),
            access_token: self.gateway.access_token.clone(),
            timeout: Duration::from_millis(self.command.timeout_ms),
            retry: self.command.retry.to_policy(),
        }
    }

    /// Resolves the event stream configuration.
    pub fn stream_connection_config(&self) -> StreamConnectionConfig {
        StreamConnectionConfig {
            url: self.gateway.event_url.clone(),
            access_token: self.gateway.access_token.clone(),
            connect_timeout: Duration::from_millis(self.stream.connect_timeout_ms),
        }
    }
}

// =============================================================================
// Gateway
// =============================================================================

/// Gateway endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// WebSocket URL of the event stream.
    #[serde(default = "default_event_url")]
    pub event_url: String,

    /// Base URL commands are posted under.
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token for both channels.
    #[serde(default)]
    pub access_token: Option<String>,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            event_url: default_event_url(),
            api_url: default_api_url(),
            access_token: None,
        }
    }
}

fn default_event_url() -> String {
    "ws://127.0.0.1:3000/event".to_string()
}

fn default_api_url() -> String {
    "http://127.0.0.1:3000/api".to_string()
}

// =============================================================================
// Command
// =============================================================================

/// Command client settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandConfig {
    /// Per-attempt timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,

    /// Retry configuration.
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            retry: RetryConfig::default(),
        }
    }
}

fn default_timeout_ms() -> u64 {
    10000
}

/// Retry configuration for command calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Delay before the first retry in milliseconds.
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,

    /// Maximum delay between retries in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Exclusive upper bound of the random jitter in milliseconds.
    #[serde(default = "default_max_jitter_ms")]
    pub max_jitter_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            base_delay_ms: default_base_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            max_jitter_ms: default_max_jitter_ms(),
        }
    }
}

impl RetryConfig {
    /// Converts to the core retry policy.
    pub fn to_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.base_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            max_jitter: Duration::from_millis(self.max_jitter_ms),
        }
    }
}

fn default_max_retries() -> u32 {
    5
}

fn default_base_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    5000
}

fn default_max_jitter_ms() -> u64 {
    100
}

// =============================================================================
// Stream
// =============================================================================

/// Event stream settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// Re-open the stream after it ends.
    #[serde(default = "default_auto_reconnect")]
    pub auto_reconnect: bool,

    /// Connect and handshake timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Reconnect backoff.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            auto_reconnect: default_auto_reconnect(),
            connect_timeout_ms: default_timeout_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }
}

fn default_auto_reconnect() -> bool {
    true
}

/// Reconnect backoff configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first reconnect in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay between reconnects in milliseconds.
    #[serde(default = "default_reconnect_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Exponential backoff multiplier.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Consecutive failed opens before giving up. Unset retries forever.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_reconnect_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: None,
        }
    }
}

impl ReconnectConfig {
    /// Converts to the core reconnect policy.
    pub fn to_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy {
            initial_delay: Duration::from_millis(self.initial_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            multiplier: self.multiplier,
            max_attempts: self.max_attempts,
        }
    }
}

fn default_initial_delay_ms() -> u64 {
    1000
}

fn default_reconnect_max_delay_ms() -> u64 {
    30000
}

fn default_multiplier() -> f64 {
    2.0
}

// =============================================================================
// Logging
// =============================================================================

/// Log verbosity level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Returns the level name as used in filter directives.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }

    /// Converts to a `tracing` level.
    pub fn to_tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info => tracing::Level::INFO,
            Self::Warn => tracing::Level::WARN,
            Self::Error => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Full,
    Pretty,
    /// Requires the `json-log` feature; falls back to `full` without it.
    Json,
}

/// Log destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogOutput {
    #[default]
    Stdout,
    Stderr,
    File,
}

/// Log file rotation period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogRotation {
    #[default]
    Never,
    Hourly,
    Daily,
}

/// Which span lifecycle events are logged.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SpanEventConfig {
    pub new: bool,
    pub enter: bool,
    pub exit: bool,
    pub close: bool,
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Base level. `RUST_LOG` takes precedence when set.
    #[serde(default)]
    pub level: LogLevel,

    #[serde(default)]
    pub format: LogFormat,

    #[serde(default)]
    pub output: LogOutput,

    /// Log file path, required for `file` output.
    #[serde(default)]
    pub file_path: Option<PathBuf>,

    #[serde(default)]
    pub rotation: LogRotation,

    #[serde(default)]
    pub thread_ids: bool,

    /// Include source file and line.
    #[serde(default)]
    pub file_location: bool,

    #[serde(default)]
    pub span_events: SpanEventConfig,

    /// Per-module level overrides, e.g. `emi_transport = "debug"`.
    #[serde(default)]
    pub filters: HashMap<String, LogLevel>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            format: LogFormat::Compact,
            output: LogOutput::Stdout,
            file_path: None,
            rotation: LogRotation::Never,
            thread_ids: false,
            file_location: false,
            span_events: SpanEventConfig::default(),
            filters: HashMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_core_policies() {
        let config = EmiConfig::default();

        let command = config.command_client_config();
        assert_eq!(command.api_url, "http://127.0.0.1:3000/api");
        assert_eq!(command.timeout, Duration::from_secs(10));
        assert_eq!(command.retry, RetryPolicy::default());

        let stream = config.stream_connection_config();
        assert_eq!(stream.url, "ws://127.0.0.1:3000/event");
        assert!(stream.access_token.is_none());
        assert_eq!(stream.connect_timeout, Duration::from_secs(10));

        assert_eq!(config.stream.reconnect.to_policy(), ReconnectPolicy::default());
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: EmiConfig = serde_json::from_str(
            r#"{"gateway":{"access_token":"t"},"command":{"retry":{"max_retries":0}},
                "logging":{"level":"debug","filters":{"emi_transport":"trace"}}}"#,
        )
        .unwrap();

        assert_eq!(config.gateway.access_token.as_deref(), Some("t"));
        assert_eq!(config.gateway.event_url, "ws://127.0.0.1:3000/event");
        assert_eq!(config.command.retry.max_retries, 0);
        assert_eq!(config.command.retry.base_delay_ms, 100);
        assert_eq!(config.logging.level, LogLevel::Debug);
        assert_eq!(config.logging.filters["emi_transport"], LogLevel::Trace);
        assert!(config.stream.auto_reconnect);
    }
}
