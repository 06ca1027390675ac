//! # Emi
//!
//! A transport for chat-bot gateways: a live event stream over WebSocket and
//! request/response commands over HTTP, bridged into one handler surface.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────┐  RawEvent  ┌─────────────┐  typed event  ┌──────────┐
//! │ StreamConnection │───────────▶│     Bot     │──────────────▶│ Handlers │
//! │   (WebSocket)    │            │ (dispatcher)│               └────┬─────┘
//! └──────────────────┘            └─────────────┘                    │
//!                                                                    ▼
//!                                                           ┌────────────────┐
//!                                                           │ CommandClient  │
//!                                                           │    (HTTP)      │
//!                                                           └────────────────┘
//! ```
//!
//! - **core**: wire model, event registry, gateway entities and commands
//! - **transport**: [`StreamConnection`](transport::StreamConnection) and
//!   [`CommandClient`](transport::CommandClient)
//! - **runtime**: the dispatcher, handlers, reconnect supervisor, config and logging
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use emi::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     init_logging(&config.logging)?;
//!
//!     let bot = BotBuilder::from_config(&config)?
//!         .with_default_events()
//!         .on(|ctx: EventContext<MessageReceiveEvent>| async move {
//!             tracing::info!(text = %ctx.plain_text(), "message");
//!         })
//!         .build();
//!
//!     Supervisor::from_config(bot, &config.stream).run().await?;
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - `toml-config` (default): TOML configuration files
//! - `yaml-config`: YAML configuration files
//! - `json-log`: JSON log output

pub use emi_core as core;
pub use emi_runtime as runtime;
pub use emi_transport as transport;

/// Commonly used types.
///
/// ```rust,ignore
/// use emi::prelude::*;
/// ```
pub mod prelude {
    // Dispatcher and supervision
    pub use emi_runtime::{
        Bot, BotBuilder, EventContext, EventHandler, Supervisor, on, shutdown_signal,
    };

    // Configuration and logging
    pub use emi_runtime::config::{EmiConfig, load_config, load_config_from_file};
    pub use emi_runtime::logging::init_from_config as init_logging;

    // Transport
    pub use emi_transport::{CommandClient, StreamConnection};

    // Events and commands
    pub use emi_core::model::Segment;
    pub use emi_core::model::event::*;
    pub use emi_core::{BoxedEvent, Event, EventSource, RawEvent, TypedEvent, impl_event};

    pub use tokio_util::sync::CancellationToken;
}
