//! The event dispatcher.
//!
//! A [`Bot`] binds an [`EventSource`] to the handlers registered on it and
//! carries the [`CommandClient`] handlers use to answer events. Raw events are
//! consumed on one dispatch task, strictly in arrival order; every handler
//! for an event type runs to completion, in registration order, before the
//! next event is looked at.
//!
//! ```rust,ignore
//! use emi_runtime::{BotBuilder, handler::EventContext};
//! use emi_core::model::event::MessageReceiveEvent;
//!
//! let bot = BotBuilder::from_config(&config)?
//!     .with_default_events()
//!     .on(|ctx: EventContext<MessageReceiveEvent>| async move {
//!         tracing::info!(text = %ctx.plain_text(), "message");
//!     })
//!     .build();
//!
//! bot.open().await?;
//! bot.wait().await;
//! ```

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, trace, warn};

use emi_core::model::default_event_registry;
use emi_core::{EventPrototype, EventRegistry, EventSource, RawEvent, TypedEvent};
use emi_transport::{CommandClient, StreamConnection};

use crate::config::EmiConfig;
use crate::error::RuntimeResult;
use crate::handler::{BoxedHandler, EventContext, on};
use crate::registry::HandlerRegistry;

struct BotInner {
    source: Arc<dyn EventSource>,
    commands: CommandClient,
    events: RwLock<EventRegistry>,
    handlers: RwLock<HandlerRegistry>,
    /// Fired when the most recent dispatch task ends.
    done: Mutex<Option<CancellationToken>>,
}

/// A cheaply cloneable handle to one dispatcher instance.
#[derive(Clone)]
pub struct Bot {
    inner: Arc<BotInner>,
}

impl Bot {
    /// Returns a builder over `source` and `commands`.
    pub fn builder(source: impl EventSource + 'static, commands: CommandClient) -> BotBuilder {
        BotBuilder::new(source, commands)
    }

    /// Returns the command client.
    pub fn commands(&self) -> &CommandClient {
        &self.inner.commands
    }

    /// Registers an event type.
    ///
    /// Fails if the identifier is already registered.
    pub fn register_event_type(
        &self,
        event_type: impl Into<String>,
        prototype: EventPrototype,
    ) -> RuntimeResult<()> {
        self.inner.events.write().register(event_type, prototype)?;
        Ok(())
    }

    /// Registers event shape `E` under its own identifier.
    pub fn register_event<E: TypedEvent>(&self) -> RuntimeResult<()> {
        self.register_event_type(E::EVENT_TYPE, EventPrototype::of::<E>())
    }

    /// Registers an event type, overwriting any existing entry.
    pub fn replace_event_type(
        &self,
        event_type: impl Into<String>,
        prototype: EventPrototype,
    ) -> Option<EventPrototype> {
        self.inner.events.write().replace(event_type, prototype)
    }

    /// Returns true if the identifier has a registered event shape.
    pub fn is_event_registered(&self, event_type: &str) -> bool {
        self.inner.events.read().contains(event_type)
    }

    /// Appends a handler for its declared event type.
    pub fn register_handler(&self, handler: BoxedHandler) {
        self.inner.handlers.write().register(handler);
    }

    /// Appends a closure handler for event shape `E`.
    pub fn on<E, F, Fut>(&self, f: F)
    where
        E: TypedEvent,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register_handler(on(f));
    }

    /// Returns the number of handlers registered for an identifier.
    pub fn handler_count(&self, event_type: &str) -> usize {
        self.inner.handlers.read().count(event_type)
    }

    /// Opens the event source and starts dispatching.
    ///
    /// Fails with `AlreadyConnected` if the source is already open.
    pub async fn open(&self) -> RuntimeResult<()> {
        let rx = self.inner.source.open().await?;

        let done = CancellationToken::new();
        *self.inner.done.lock() = Some(done.clone());

        let bot = self.clone();
        tokio::spawn(async move {
            let _done = done.drop_guard();
            bot.run_dispatch(rx).await;
        });

        info!("Bot opened");
        Ok(())
    }

    /// Closes the event source. Dispatch ends once the source has drained.
    pub async fn close(&self) -> RuntimeResult<()> {
        self.inner.source.close().await?;
        Ok(())
    }

    /// Resolves once the current (or most recent) dispatch task has ended.
    ///
    /// Returns immediately if the bot was never opened.
    pub async fn wait(&self) {
        let done = self.inner.done.lock().clone();
        if let Some(done) = done {
            done.cancelled().await;
        }
    }

    async fn run_dispatch(&self, mut rx: mpsc::Receiver<RawEvent>) {
        debug!("Dispatch loop started");
        while let Some(raw) = rx.recv().await {
            self.dispatch(raw).await;
        }
        info!("Dispatch loop ended");
    }

    /// Decodes one raw event and runs its handlers.
    ///
    /// Unknown types, missing handlers and undecodable payloads are logged
    /// and skipped.
    pub async fn dispatch(&self, raw: RawEvent) {
        debug!(
            event_type = %raw.event_type,
            self_id = raw.self_id,
            time = raw.time,
            "Received event"
        );

        let prototype = self.inner.events.read().get(&raw.event_type).copied();
        let Some(prototype) = prototype else {
            warn!(event_type = %raw.event_type, "Unknown event type");
            return;
        };

        let handlers = self.inner.handlers.read().snapshot(&raw.event_type);
        let Some(handlers) = handlers else {
            trace!(event_type = %raw.event_type, "No handlers registered");
            return;
        };

        let event = match prototype.decode(&raw.data) {
            Ok(event) => event,
            Err(e) => {
                error!(event_type = %raw.event_type, error = %e, "Failed to decode event");
                return;
            }
        };

        let raw = Arc::new(raw);
        for handler in handlers {
            handler
                .handle(self.clone(), event.clone(), Arc::clone(&raw))
                .await;
        }
    }
}

impl fmt::Debug for Bot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bot")
            .field("events", &self.inner.events.read().len())
            .field("handlers", &*self.inner.handlers.read())
            .finish_non_exhaustive()
    }
}

/// Builder for [`Bot`].
pub struct BotBuilder {
    source: Arc<dyn EventSource>,
    commands: CommandClient,
    events: EventRegistry,
    handlers: HandlerRegistry,
}

impl BotBuilder {
    /// Starts from an event source and a command client, with no event types.
    pub fn new(source: impl EventSource + 'static, commands: CommandClient) -> Self {
        Self {
            source: Arc::new(source),
            commands,
            events: EventRegistry::new(),
            handlers: HandlerRegistry::new(),
        }
    }

    /// Builds the WebSocket source and HTTP command client from configuration.
    pub fn from_config(config: &EmiConfig) -> RuntimeResult<Self> {
        let source = StreamConnection::new(config.stream_connection_config());
        let commands = CommandClient::new(config.command_client_config())?;
        Ok(Self::new(source, commands))
    }

    /// Installs the gateway's built-in event types.
    ///
    /// Identifiers that are already registered are kept.
    pub fn with_default_events(mut self) -> Self {
        let defaults = default_event_registry();
        for event_type in defaults.event_types() {
            if self.events.contains(event_type) {
                continue;
            }
            if let Some(prototype) = defaults.get(event_type) {
                self.events.replace(event_type, *prototype);
            }
        }
        self
    }

    /// Registers an event type. Fails if the identifier is taken.
    pub fn event_type(
        mut self,
        event_type: impl Into<String>,
        prototype: EventPrototype,
    ) -> RuntimeResult<Self> {
        self.events.register(event_type, prototype)?;
        Ok(self)
    }

    /// Registers event shape `E` under its own identifier.
    pub fn event<E: TypedEvent>(mut self) -> RuntimeResult<Self> {
        self.events.register_type::<E>()?;
        Ok(self)
    }

    /// Merges a whole registry. Fails on the first identifier already present.
    pub fn events(mut self, registry: EventRegistry) -> RuntimeResult<Self> {
        self.events.extend(registry)?;
        Ok(self)
    }

    /// Appends a handler.
    pub fn handler(mut self, handler: BoxedHandler) -> Self {
        self.handlers.register(handler);
        self
    }

    /// Appends a closure handler for event shape `E`.
    pub fn on<E, F, Fut>(self, f: F) -> Self
    where
        E: TypedEvent,
        F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.handler(on(f))
    }

    /// Finishes the builder. The bot starts closed.
    pub fn build(self) -> Bot {
        debug!(
            events = self.events.len(),
            handlers = self.handlers.len(),
            "Building bot"
        );
        Bot {
            inner: Arc::new(BotInner {
                source: self.source,
                commands: self.commands,
                events: RwLock::new(self.events),
                handlers: RwLock::new(self.handlers),
                done: Mutex::new(None),
            }),
        }
    }
}
