//! # Emi Runtime
//!
//! Everything between the transport and application code:
//!
//! - The event dispatcher ([`Bot`], [`BotBuilder`]) that decodes raw events
//!   and runs the handlers registered for them
//! - Handlers ([`EventHandler`], the [`on`] closure adapter) and their
//!   [`HandlerRegistry`]
//! - Reconnect supervision ([`Supervisor`]) and [`shutdown_signal`]
//! - Layered configuration ([`config`]) and logging setup ([`logging`])
//!
//! ```rust,ignore
//! use emi_runtime::config::load_config;
//! use emi_runtime::{BotBuilder, Supervisor, logging, shutdown_signal};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config()?;
//!     logging::init_from_config(&config.logging)?;
//!
//!     let bot = BotBuilder::from_config(&config)?.with_default_events().build();
//!     let supervisor = Supervisor::from_config(bot, &config.stream);
//!
//!     let shutdown = supervisor.shutdown_token();
//!     tokio::spawn(async move {
//!         shutdown_signal().await;
//!         shutdown.cancel();
//!     });
//!     supervisor.run().await?;
//!     Ok(())
//! }
//! ```

pub mod bot;
pub mod config;
pub mod error;
pub mod handler;
pub mod logging;
pub mod registry;
pub mod supervisor;

pub use bot::{Bot, BotBuilder};
pub use config::{ConfigError, ConfigLoader, ConfigResult, EmiConfig};
pub use error::{RuntimeError, RuntimeResult};
pub use handler::{BoxedHandler, EventContext, EventHandler, on};
pub use logging::{LoggingBuilder, SpanEvents};
pub use registry::HandlerRegistry;
pub use supervisor::{Supervisor, shutdown_signal};
