//! Event handlers.
//!
//! A handler declares the event type identifier it listens to and is handed
//! the bot, the decoded event and the raw envelope for every matching event.
//! Most handlers are closures over a typed context:
//!
//! ```rust,ignore
//! use emi_runtime::handler::{on, EventContext};
//! use emi_core::model::event::MessageReceiveEvent;
//!
//! let handler = on(|ctx: EventContext<MessageReceiveEvent>| async move {
//!     tracing::info!(text = %ctx.plain_text(), "received");
//! });
//! ```

use std::fmt;
use std::future::Future;
use std::marker::PhantomData;
use std::ops::Deref;
use std::pin::Pin;
use std::sync::Arc;

use tracing::warn;

use emi_core::{BoxedEvent, RawEvent, TypedEvent};

use crate::bot::Bot;

/// A type alias for a boxed, pinned future that is `Send`.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A type-erased handler that can be stored in collections.
pub type BoxedHandler = Arc<dyn EventHandler>;

/// Something that reacts to one event type.
pub trait EventHandler: Send + Sync {
    /// The event type identifier this handler is registered under.
    fn event_type(&self) -> &str;

    /// Handles one decoded event.
    fn handle(&self, bot: Bot, event: BoxedEvent, raw: Arc<RawEvent>) -> BoxFuture<'static, ()>;
}

/// What a typed handler receives.
///
/// Derefs to the event, so fields can be read directly off the context.
pub struct EventContext<E> {
    /// The dispatching bot, for issuing commands.
    pub bot: Bot,
    /// The decoded event.
    pub event: Arc<E>,
    /// The envelope the event was decoded from.
    pub raw: Arc<RawEvent>,
}

impl<E> EventContext<E> {
    /// The account the event belongs to.
    pub fn self_id(&self) -> i64 {
        self.raw.self_id
    }

    /// Unix timestamp of the event in seconds.
    pub fn time(&self) -> i64 {
        self.raw.time
    }
}

impl<E> Deref for EventContext<E> {
    type Target = E;

    fn deref(&self) -> &Self::Target {
        &self.event
    }
}

impl<E> Clone for EventContext<E> {
    fn clone(&self) -> Self {
        Self {
            bot: self.bot.clone(),
            event: Arc::clone(&self.event),
            raw: Arc::clone(&self.raw),
        }
    }
}

impl<E: fmt::Debug> fmt::Debug for EventContext<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventContext")
            .field("event", &self.event)
            .field("raw", &self.raw)
            .finish()
    }
}

/// Adapts a closure over [`EventContext<E>`] into an [`EventHandler`].
pub struct HandlerFn<E, F> {
    f: F,
    _marker: PhantomData<fn() -> E>,
}

impl<E, F> HandlerFn<E, F> {
    pub fn new(f: F) -> Self {
        Self {
            f,
            _marker: PhantomData,
        }
    }
}

impl<E, F, Fut> EventHandler for HandlerFn<E, F>
where
    E: TypedEvent,
    F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn event_type(&self) -> &str {
        E::EVENT_TYPE
    }

    fn handle(&self, bot: Bot, event: BoxedEvent, raw: Arc<RawEvent>) -> BoxFuture<'static, ()> {
        match event.downcast_arc::<E>() {
            Some(event) => Box::pin((self.f)(EventContext { bot, event, raw })),
            None => {
                // The registry maps this identifier to another shape.
                warn!(
                    event_type = E::EVENT_TYPE,
                    decoded = event.event_type(),
                    "Handler event shape does not match the registered prototype"
                );
                Box::pin(async {})
            }
        }
    }
}

/// Builds a handler for event shape `E` from an async closure.
pub fn on<E, F, Fut>(f: F) -> BoxedHandler
where
    E: TypedEvent,
    F: Fn(EventContext<E>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    Arc::new(HandlerFn::<E, F>::new(f))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicI64, Ordering};

    use serde::Deserialize;
    use serde_json::value::RawValue;

    use emi_core::impl_event;

    use super::*;
    use crate::bot::tests::test_bot;

    #[derive(Debug, Default, Deserialize)]
    struct Counter {
        n: i64,
    }

    impl_event!(Counter => "counter");

    #[derive(Debug, Default, Deserialize)]
    struct Other {}

    impl_event!(Other => "other");

    fn raw(event_type: &str, data: &str) -> Arc<RawEvent> {
        Arc::new(RawEvent {
            event_type: event_type.into(),
            self_id: 7,
            time: 1000,
            data: RawValue::from_string(data.into()).unwrap(),
        })
    }

    #[tokio::test]
    async fn test_typed_handler_receives_context() {
        let seen = Arc::new(AtomicI64::new(0));
        let handler = on({
            let seen = Arc::clone(&seen);
            move |ctx: EventContext<Counter>| {
                let seen = Arc::clone(&seen);
                async move {
                    assert_eq!(ctx.self_id(), 7);
                    assert_eq!(ctx.time(), 1000);
                    seen.store(ctx.n, Ordering::SeqCst);
                }
            }
        });
        assert_eq!(handler.event_type(), "counter");

        let (bot, _tx) = test_bot();
        handler
            .handle(bot, BoxedEvent::new(Counter { n: 5 }), raw("counter", r#"{"n":5}"#))
            .await;
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[tokio::test]
    async fn test_mismatched_shape_is_skipped() {
        let seen = Arc::new(AtomicI64::new(0));
        let handler = on({
            let seen = Arc::clone(&seen);
            move |_ctx: EventContext<Counter>| {
                let seen = Arc::clone(&seen);
                async move {
                    seen.fetch_add(1, Ordering::SeqCst);
                }
            }
        });

        let (bot, _tx) = test_bot();
        handler
            .handle(bot, BoxedEvent::new(Other {}), raw("counter", "{}"))
            .await;
        assert_eq!(seen.load(Ordering::SeqCst), 0);
    }
}
