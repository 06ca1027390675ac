//! Event system for emi.
//!
//! This module provides the core event infrastructure:
//!
//! - [`RawEvent`] - The wire envelope produced for every inbound frame
//! - [`Event`] - Base trait for all decoded event shapes
//! - [`TypedEvent`] - Events that know their identifier and can be decoded from JSON
//! - [`BoxedEvent`] - A type-erased, cheaply clonable decoded event
//!
//! # Deferred decoding
//!
//! The `data` field of a [`RawEvent`] is kept as unparsed JSON. The dispatcher
//! looks up the event type identifier in the
//! [`EventRegistry`](crate::registry::EventRegistry) and only then decodes the
//! payload into the registered concrete shape.
//!
//! ```rust,ignore
//! use emi_core::{BoxedEvent, impl_event};
//!
//! #[derive(Debug, Default, Deserialize)]
//! struct Ping {
//!     text: String,
//! }
//!
//! impl_event!(Ping => "ping");
//!
//! let event: BoxedEvent = registry.get("ping").unwrap().decode(&raw.data)?;
//! assert_eq!(event.downcast_ref::<Ping>().unwrap().text, "hi");
//! ```

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

use crate::error::FrameResult;

// ============================================================================
// Raw Event
// ============================================================================

/// The generic, not-yet-specialized envelope of an inbound event.
///
/// Wire form: `{"type": string, "self_id": int64, "time": int64, "data": <opaque>}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Event type identifier.
    #[serde(rename = "type")]
    pub event_type: String,
    /// The account this event belongs to.
    pub self_id: i64,
    /// Unix timestamp in seconds.
    pub time: i64,
    /// Unparsed event payload.
    pub data: Box<RawValue>,
}

impl RawEvent {
    /// Decodes an envelope from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> FrameResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Returns the payload as a JSON string slice.
    pub fn data_json(&self) -> &str {
        self.data.get()
    }
}

impl PartialEq for RawEvent {
    fn eq(&self, other: &Self) -> bool {
        self.event_type == other.event_type
            && self.self_id == other.self_id
            && self.time == other.time
            && self.data.get() == other.data.get()
    }
}

impl Eq for RawEvent {}

// ============================================================================
// Core Event Trait
// ============================================================================

/// The base trait for all decoded events.
///
/// Events are type-erased using `dyn Event` and can be downcast to concrete
/// types using `as_any()`.
pub trait Event: Any + Send + Sync + fmt::Debug {
    /// Returns the event type identifier this shape is registered under.
    fn event_type(&self) -> &'static str;

    /// Returns a reference to self as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;
}

/// An event shape that can be decoded from its JSON payload.
///
/// Implement it with [`impl_event!`](crate::impl_event) rather than by hand.
pub trait TypedEvent: Event + DeserializeOwned + Sized {
    /// The identifier carried in the `type` field of the envelope.
    const EVENT_TYPE: &'static str;
}

/// Implements [`Event`] and [`TypedEvent`] for a deserializable struct.
///
/// ```rust,ignore
/// impl_event!(GroupMuteEvent => "group_mute");
/// ```
#[macro_export]
macro_rules! impl_event {
    ($ty:ty => $id:literal) => {
        impl $crate::event::Event for $ty {
            fn event_type(&self) -> &'static str {
                $id
            }

            fn as_any(&self) -> &dyn ::std::any::Any {
                self
            }
        }

        impl $crate::event::TypedEvent for $ty {
            const EVENT_TYPE: &'static str = $id;
        }
    };
}

// ============================================================================
// Boxed Event
// ============================================================================

/// A type-erased container for decoded events that supports runtime downcasting.
///
/// `BoxedEvent` implements `Deref<Target = dyn Event>`, so trait methods can
/// be called directly:
///
/// ```rust,ignore
/// let event: BoxedEvent = /* ... */;
/// let id = event.event_type();
/// ```
#[derive(Clone)]
pub struct BoxedEvent {
    inner: Arc<dyn Event>,
    /// The same allocation viewed as `Any`, for owned downcasts.
    any: Arc<dyn Any + Send + Sync>,
}

impl BoxedEvent {
    /// Creates a new `BoxedEvent` from any type implementing `Event`.
    pub fn new<E: Event>(event: E) -> Self {
        let event = Arc::new(event);
        Self {
            inner: event.clone(),
            any: event,
        }
    }

    /// Returns the inner `Arc<dyn Event>`.
    pub fn inner(&self) -> &Arc<dyn Event> {
        &self.inner
    }

    /// Attempts to downcast to a concrete event type.
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.inner.as_any().downcast_ref()
    }

    /// Attempts to downcast to a shared handle of a concrete event type.
    pub fn downcast_arc<E: Event>(&self) -> Option<Arc<E>> {
        Arc::clone(&self.any).downcast().ok()
    }

    /// Returns true if the wrapped event is of type `E`.
    pub fn is<E: Event>(&self) -> bool {
        self.inner.as_any().is::<E>()
    }
}

impl std::ops::Deref for BoxedEvent {
    type Target = dyn Event;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl fmt::Debug for BoxedEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoxedEvent")
            .field("event_type", &self.event_type())
            .field("inner", &self.inner)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Deserialize)]
    struct Greeting {
        text: String,
    }

    impl_event!(Greeting => "greeting");

    #[test]
    fn test_raw_event_decode() {
        let raw = RawEvent::from_slice(
            br#"{"type":"message_receive","self_id":1,"time":1000,"data":{"text":"hi"}}"#,
        )
        .unwrap();

        assert_eq!(raw.event_type, "message_receive");
        assert_eq!(raw.self_id, 1);
        assert_eq!(raw.time, 1000);
        assert_eq!(raw.data_json(), r#"{"text":"hi"}"#);
    }

    #[test]
    fn test_raw_event_missing_type_is_error() {
        let result = RawEvent::from_slice(br#"{"self_id":1,"time":1000,"data":{}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_boxed_event_downcast() {
        let event = BoxedEvent::new(Greeting {
            text: "hello".into(),
        });

        assert_eq!(event.event_type(), "greeting");
        assert!(event.is::<Greeting>());
        assert_eq!(event.downcast_ref::<Greeting>().unwrap().text, "hello");
        assert_eq!(Greeting::EVENT_TYPE, "greeting");

        let shared = event.downcast_arc::<Greeting>().unwrap();
        assert_eq!(shared.text, "hello");
        assert!(std::ptr::eq(shared.as_ref(), event.downcast_ref::<Greeting>().unwrap()));
    }
}
