//! Unified error types for the emi core.
//!
//! Transport, frame, registry and command errors live here so that every
//! layer above can surface them without depending on a concrete transport.

use thiserror::Error;

// =============================================================================
// Transport Errors
// =============================================================================

/// Errors that can occur on the persistent event connection.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// The connection is already open.
    #[error("already connected")]
    AlreadyConnected,

    /// Connection failed.
    #[error("connection failed: {url} - {reason}")]
    ConnectionFailed {
        /// The URL that failed to connect.
        url: String,
        /// Reason for failure.
        reason: String,
    },

    /// The connection was closed before it finished opening.
    #[error("connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for closure.
        reason: String,
    },

    /// Invalid configuration.
    #[error("invalid transport configuration: {0}")]
    InvalidConfig(String),
}

// =============================================================================
// Frame Errors
// =============================================================================

/// Errors raised while turning one inbound frame into a [`RawEvent`](crate::RawEvent).
///
/// These never terminate a connection; the offending frame is dropped.
#[derive(Debug, Clone, Error)]
pub enum FrameError {
    /// The binary frame was not valid zlib data.
    #[error("failed to decompress frame: {0}")]
    Decompress(String),

    /// The frame bytes were not a valid event envelope.
    #[error("failed to decode frame: {0}")]
    Decode(String),

    /// The frame kind carries no event payload.
    #[error("unsupported frame kind: {0}")]
    Unsupported(&'static str),
}

impl From<serde_json::Error> for FrameError {
    fn from(err: serde_json::Error) -> Self {
        Self::Decode(err.to_string())
    }
}

// =============================================================================
// Registry Errors
// =============================================================================

/// Errors raised by the event registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// An event type with the same identifier is already registered.
    #[error("event registry already exists for '{event_type}'")]
    AlreadyExists {
        /// The duplicate identifier.
        event_type: String,
    },
}

// =============================================================================
// Command Errors
// =============================================================================

/// Errors returned by command calls.
#[derive(Debug, Clone, Error)]
pub enum CommandError {
    /// The endpoint could not be joined with the base address.
    #[error("failed to join URL path '{endpoint}': {reason}")]
    InvalidEndpoint {
        /// The endpoint that was requested.
        endpoint: String,
        /// Reason for failure.
        reason: String,
    },

    /// The request body could not be serialized.
    #[error("failed to marshal request: {0}")]
    Serialize(String),

    /// The request could not be sent or the response could not be read.
    #[error("request failed: {0}")]
    Request(String),

    /// The gateway answered with a status outside `[200, 300)`.
    #[error("unexpected status code {status}, response body: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Raw response body.
        body: String,
    },

    /// The response envelope or its payload could not be decoded.
    #[error("failed to decode response: {0}")]
    Decode(String),

    /// The caller cancelled the call.
    #[error("command call cancelled")]
    Cancelled,

    /// Every allowed attempt failed.
    #[error("max retries exceeded after {attempts} attempts: {last}")]
    MaxRetriesExceeded {
        /// Number of attempts performed.
        attempts: u32,
        /// The error of the final attempt.
        last: Box<CommandError>,
    },
}

impl CommandError {
    /// Returns true if this error was caused by cancellation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Result type for frame decoding.
pub type FrameResult<T> = Result<T, FrameError>;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Result type for command calls.
pub type CommandResult<T> = Result<T, CommandError>;
