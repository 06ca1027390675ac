//! # Emi Core
//!
//! Core data model and abstractions shared by every emi crate.
//!
//! This crate has no network code. It defines what flows over the wire and
//! the seams the transport and runtime crates plug into.
//!
//! ## Contents
//!
//! - **Events**: the wire envelope [`RawEvent`], type-erased decoded events
//!   ([`Event`], [`BoxedEvent`]) and the [`impl_event!`] helper
//! - **Registry**: [`EventRegistry`] maps event type identifiers to
//!   [`EventPrototype`]s that decode payloads into concrete shapes
//! - **Sources**: the [`EventSource`] trait the dispatcher consumes
//! - **Configuration**: resolved transport settings ([`CommandClientConfig`],
//!   [`StreamConnectionConfig`], [`RetryPolicy`], [`ReconnectPolicy`])
//! - **Model**: gateway entities, the 19 built-in event shapes, the command
//!   catalogue and typed command bodies
//! - **Errors**: [`TransportError`], [`FrameError`], [`RegistryError`] and
//!   [`CommandError`]
//!
//! ## Event Flow
//!
//! ```text
//! ┌──────────────┐  RawEvent  ┌────────────┐  BoxedEvent  ┌──────────┐
//! │ EventSource  │───────────▶│  Registry  │─────────────▶│ Handlers │
//! │ (WebSocket)  │            │  (decode)  │              │          │
//! └──────────────┘            └────────────┘              └──────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod model;
pub mod registry;
pub mod source;

pub use config::{CommandClientConfig, ReconnectPolicy, RetryPolicy, StreamConnectionConfig};
pub use error::{
    CommandError, CommandResult, FrameError, FrameResult, RegistryError, RegistryResult,
    TransportError, TransportResult,
};
pub use event::{BoxedEvent, Event, RawEvent, TypedEvent};
pub use registry::{EventPrototype, EventRegistry};
pub use source::EventSource;
