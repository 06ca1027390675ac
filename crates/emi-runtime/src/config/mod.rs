//! Layered configuration for emi.
//!
//! Defaults, config files (TOML by default, YAML behind `yaml-config`) and
//! `EMI_*` environment variables are merged with figment and validated before
//! they reach the transport.

pub mod error;
pub mod loader;
pub mod schema;
pub mod validation;

pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigLoader, Profile, load_config, load_config_from_file};
pub use schema::{
    CommandConfig, EmiConfig, GatewayConfig, LogFormat, LogLevel, LogOutput, LogRotation,
    LoggingConfig, ReconnectConfig, RetryConfig, SpanEventConfig, StreamConfig,
};
pub use validation::validate_config;
