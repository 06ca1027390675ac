//! # Emi Transport
//!
//! Network implementations of the emi gateway transport.
//!
//! This crate provides the two channels a bot uses to talk to the gateway.
//! Both are enabled by default and can be switched off with feature flags.
//!
//! ## Features
//!
//! - `http-client` (default): [`CommandClient`], request/response commands with retry
//! - `ws-client` (default): [`StreamConnection`], the persistent event stream
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────┐
//! │  emi-runtime        │  (dispatcher, supervisor)
//! ├─────────────────────┤
//! │  emi-transport      │  <- This crate (implementations)
//! ├─────────────────────┤
//! │  emi-core           │  (EventSource, RawEvent, configs)
//! ├─────────────────────┤
//! │  Network (TCP/HTTP) │
//! └─────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use emi_core::{CommandClientConfig, EventSource, StreamConnectionConfig};
//! use emi_transport::{CommandClient, StreamConnection};
//! use tokio_util::sync::CancellationToken;
//!
//! let commands = CommandClient::new(CommandClientConfig::new("http://127.0.0.1:3000/api"))?;
//! let info = commands.get_login_info(&CancellationToken::new()).await?;
//!
//! let stream = StreamConnection::new(StreamConnectionConfig::new("ws://127.0.0.1:3000/event"));
//! let mut events = stream.open().await?;
//! while let Some(raw) = events.recv().await {
//!     println!("{} for {}", raw.event_type, info.uin);
//! }
//! ```

#[cfg(feature = "http-client")]
pub mod http;

#[cfg(feature = "ws-client")]
pub mod websocket;

#[cfg(feature = "http-client")]
pub use http::CommandClient;

#[cfg(feature = "ws-client")]
pub use websocket::StreamConnection;
