//! Runtime error types.

use thiserror::Error;

use emi_core::{RegistryError, TransportError};

use crate::config::ConfigError;

/// Errors that can occur during runtime operations.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// The event source failed to open or close.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// An event type could not be registered.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// The configuration could not be loaded or is invalid.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Result type for runtime operations.
pub type RuntimeResult<T> = Result<T, RuntimeError>;
