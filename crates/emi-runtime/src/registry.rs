//! Handler registry.
//!
//! Maps event type identifiers to the handlers listening for them, in
//! registration order.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::handler::BoxedHandler;

/// Ordered handler lists keyed by event type identifier.
#[derive(Clone, Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Vec<BoxedHandler>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a handler under its declared event type.
    ///
    /// Registering the same handler twice appends it twice.
    pub fn register(&mut self, handler: BoxedHandler) {
        let list = self
            .handlers
            .entry(handler.event_type().to_string())
            .or_default();
        debug!(
            event_type = %handler.event_type(),
            position = list.len(),
            "Registered handler"
        );
        list.push(handler);
    }

    /// Returns the handlers for an identifier, in invocation order.
    pub fn get(&self, event_type: &str) -> Option<&[BoxedHandler]> {
        self.handlers
            .get(event_type)
            .map(Vec::as_slice)
            .filter(|list| !list.is_empty())
    }

    /// Returns a shared copy of the handler list for an identifier.
    pub fn snapshot(&self, event_type: &str) -> Option<Vec<BoxedHandler>> {
        self.get(event_type)
            .map(|list| list.iter().map(Arc::clone).collect())
    }

    /// Returns the number of handlers registered for an identifier.
    pub fn count(&self, event_type: &str) -> usize {
        self.get(event_type).map_or(0, <[_]>::len)
    }

    /// Returns the total number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.values().map(Vec::len).sum()
    }

    /// Returns true if no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let counts: HashMap<&str, usize> = self
            .handlers
            .iter()
            .map(|(k, v)| (k.as_str(), v.len()))
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("handlers", &counts)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use emi_core::{BoxedEvent, RawEvent};

    use super::*;
    use crate::bot::Bot;
    use crate::handler::{BoxFuture, EventHandler};

    struct Named(&'static str);

    impl EventHandler for Named {
        fn event_type(&self) -> &str {
            self.0
        }

        fn handle(&self, _: Bot, _: BoxedEvent, _: Arc<RawEvent>) -> BoxFuture<'static, ()> {
            Box::pin(async {})
        }
    }

    fn names(handlers: &[BoxedHandler]) -> Vec<*const ()> {
        handlers
            .iter()
            .map(|h| Arc::as_ptr(h) as *const ())
            .collect()
    }

    #[test]
    fn test_register_keeps_order() {
        let a: BoxedHandler = Arc::new(Named("ping"));
        let b: BoxedHandler = Arc::new(Named("ping"));
        let c: BoxedHandler = Arc::new(Named("pong"));

        let mut registry = HandlerRegistry::new();
        registry.register(Arc::clone(&a));
        registry.register(Arc::clone(&c));
        registry.register(Arc::clone(&b));

        assert_eq!(names(registry.get("ping").unwrap()), names(&[a, b]));
        assert_eq!(registry.count("pong"), 1);
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_reregistration_appends() {
        let a: BoxedHandler = Arc::new(Named("ping"));
        let mut registry = HandlerRegistry::new();
        registry.register(Arc::clone(&a));
        registry.register(Arc::clone(&a));
        assert_eq!(registry.count("ping"), 2);
    }

    #[test]
    fn test_missing_type() {
        let registry = HandlerRegistry::new();
        assert!(registry.get("ping").is_none());
        assert!(registry.snapshot("ping").is_none());
        assert!(registry.is_empty());
    }
}
