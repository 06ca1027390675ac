//! Event type registry.
//!
//! Maps event type identifiers to [`EventPrototype`]s, the factories that turn
//! an opaque JSON payload into a concrete [`BoxedEvent`]. A registry is owned
//! by a single dispatcher instance; there is no process-wide table.

use std::collections::HashMap;
use std::fmt;

use serde_json::value::RawValue;

use crate::error::{RegistryError, RegistryResult};
use crate::event::{BoxedEvent, TypedEvent};

type DecodeFn = fn(&RawValue) -> serde_json::Result<BoxedEvent>;

/// Factory for one concrete event shape.
#[derive(Clone, Copy)]
pub struct EventPrototype {
    event_type: &'static str,
    decode: DecodeFn,
}

impl EventPrototype {
    /// Creates the prototype for event shape `E`.
    pub fn of<E: TypedEvent>() -> Self {
        Self {
            event_type: E::EVENT_TYPE,
            decode: decode_as::<E>,
        }
    }

    /// Returns the identifier the shape reports for itself.
    pub fn event_type(&self) -> &'static str {
        self.event_type
    }

    /// Decodes a fresh event instance from the payload.
    pub fn decode(&self, data: &RawValue) -> serde_json::Result<BoxedEvent> {
        (self.decode)(data)
    }
}

impl fmt::Debug for EventPrototype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventPrototype")
            .field("event_type", &self.event_type)
            .finish()
    }
}

fn decode_as<E: TypedEvent>(data: &RawValue) -> serde_json::Result<BoxedEvent> {
    serde_json::from_str::<E>(data.get()).map(BoxedEvent::new)
}

/// Mapping from event type identifier to the prototype decoding it.
#[derive(Debug, Clone, Default)]
pub struct EventRegistry {
    prototypes: HashMap<String, EventPrototype>,
}

impl EventRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a prototype under `event_type`.
    ///
    /// Fails with [`RegistryError::AlreadyExists`] if the identifier is taken;
    /// use [`replace`](Self::replace) to overwrite deliberately.
    pub fn register(
        &mut self,
        event_type: impl Into<String>,
        prototype: EventPrototype,
    ) -> RegistryResult<()> {
        let event_type = event_type.into();
        if self.prototypes.contains_key(&event_type) {
            return Err(RegistryError::AlreadyExists { event_type });
        }
        self.prototypes.insert(event_type, prototype);
        Ok(())
    }

    /// Registers shape `E` under its own identifier.
    pub fn register_type<E: TypedEvent>(&mut self) -> RegistryResult<()> {
        self.register(E::EVENT_TYPE, EventPrototype::of::<E>())
    }

    /// Registers a prototype, returning the one it replaced.
    pub fn replace(
        &mut self,
        event_type: impl Into<String>,
        prototype: EventPrototype,
    ) -> Option<EventPrototype> {
        self.prototypes.insert(event_type.into(), prototype)
    }

    /// Merges every entry of `other` into this registry, failing on the first collision.
    pub fn extend(&mut self, other: EventRegistry) -> RegistryResult<()> {
        for (event_type, prototype) in other.prototypes {
            self.register(event_type, prototype)?;
        }
        Ok(())
    }

    /// Looks up the prototype for an identifier.
    pub fn get(&self, event_type: &str) -> Option<&EventPrototype> {
        self.prototypes.get(event_type)
    }

    /// Returns true if the identifier is registered.
    pub fn contains(&self, event_type: &str) -> bool {
        self.prototypes.contains_key(event_type)
    }

    /// Returns the registered identifiers in no particular order.
    pub fn event_types(&self) -> impl Iterator<Item = &str> {
        self.prototypes.keys().map(String::as_str)
    }

    /// Returns the number of registered event types.
    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    /// Returns true if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_event;
    use serde::Deserialize;

    #[derive(Debug, Default, Deserialize)]
    struct Ping {
        seq: u32,
    }

    impl_event!(Ping => "ping");

    #[derive(Debug, Default, Deserialize)]
    struct Pong {}

    impl_event!(Pong => "pong");

    fn raw(json: &str) -> Box<RawValue> {
        RawValue::from_string(json.to_string()).unwrap()
    }

    #[test]
    fn test_register_and_decode() {
        let mut registry = EventRegistry::new();
        registry.register_type::<Ping>().unwrap();

        let prototype = registry.get("ping").unwrap();
        assert_eq!(prototype.event_type(), "ping");

        let event = prototype.decode(&raw(r#"{"seq":7}"#)).unwrap();
        assert_eq!(event.downcast_ref::<Ping>().unwrap().seq, 7);
    }

    #[test]
    fn test_duplicate_registration_fails() {
        let mut registry = EventRegistry::new();
        registry.register_type::<Ping>().unwrap();

        let err = registry
            .register("ping", EventPrototype::of::<Pong>())
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::AlreadyExists {
                event_type: "ping".into()
            }
        );
        // The original entry is untouched.
        assert_eq!(registry.get("ping").unwrap().event_type(), "ping");
    }

    #[test]
    fn test_replace_overwrites() {
        let mut registry = EventRegistry::new();
        registry.register_type::<Ping>().unwrap();

        let previous = registry.replace("ping", EventPrototype::of::<Pong>());
        assert_eq!(previous.unwrap().event_type(), "ping");
        assert_eq!(registry.get("ping").unwrap().event_type(), "pong");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_decode_failure() {
        let prototype = EventPrototype::of::<Ping>();
        assert!(prototype.decode(&raw(r#"{"seq":"nope"}"#)).is_err());
    }

    #[test]
    fn test_extend_reports_collision() {
        let mut a = EventRegistry::new();
        a.register_type::<Ping>().unwrap();
        let mut b = EventRegistry::new();
        b.register_type::<Ping>().unwrap();

        assert!(a.extend(b).is_err());
    }
}
