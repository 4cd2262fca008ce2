// ── Local event bus ──
//
// Ordered multimap of event name -> handlers. Handlers run synchronously in
// registration order. A name is only present while it has handlers.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::warn;

use crate::error::Error;

/// A bus callback. Identity (for removal) is the `Arc` allocation.
pub type Handler<P> = Arc<dyn Fn(&P) + Send + Sync>;

/// In-process publish/subscribe registry.
///
/// Internally synchronized so it can be shared between the caller and the
/// task that republishes push notifications. Handlers are cloned out of the
/// lock before they run, so a handler may itself call [`on`](Self::on) or
/// [`off`](Self::off).
pub struct EventBus<P> {
    handlers: Mutex<HashMap<String, Vec<Handler<P>>>>,
}

impl<P> Default for EventBus<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> EventBus<P> {
    pub fn new() -> Self {
        Self {
            handlers: Mutex::new(HashMap::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Vec<Handler<P>>>> {
        self.handlers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append `handler` to the list for `event_name`.
    ///
    /// The same handler may be registered more than once; it then runs once
    /// per registration.
    pub fn on(&self, event_name: &str, handler: Handler<P>) -> Result<(), Error> {
        if event_name.is_empty() {
            return Err(Error::Bus {
                message: "A valid eventName string must be provided",
            });
        }

        self.lock()
            .entry(event_name.to_owned())
            .or_default()
            .push(handler);
        Ok(())
    }

    /// Remove handlers.
    ///
    /// - no event name: clear the whole bus
    /// - event name only: drop every handler of that event
    /// - both: drop every registration of that exact handler
    pub fn off(&self, event_name: Option<&str>, handler: Option<&Handler<P>>) {
        let mut handlers = self.lock();

        let Some(event_name) = event_name.filter(|name| !name.is_empty()) else {
            handlers.clear();
            return;
        };

        match handler {
            Some(target) => {
                if let Some(list) = handlers.get_mut(event_name) {
                    list.retain(|h| !Arc::ptr_eq(h, target));
                    if list.is_empty() {
                        handlers.remove(event_name);
                    }
                }
            }
            None => {
                handlers.remove(event_name);
            }
        }
    }

    /// Invoke every handler of `event_name`, in registration order.
    ///
    /// Returns how many handlers ran. With none registered a warning is
    /// logged and nothing is dispatched.
    pub fn trigger(&self, event_name: &str, payload: &P) -> usize {
        let snapshot = self.lock().get(event_name).cloned().unwrap_or_default();

        if snapshot.is_empty() {
            warn!("No handlers found for {event_name}");
            return 0;
        }

        for handler in &snapshot {
            handler(payload);
        }
        snapshot.len()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Whether `event_name` currently has any handlers.
    pub fn contains(&self, event_name: &str) -> bool {
        self.lock().contains_key(event_name)
    }

    /// Number of registrations for `event_name`.
    pub fn handler_count(&self, event_name: &str) -> usize {
        self.lock().get(event_name).map_or(0, Vec::len)
    }

    /// Names of all events with at least one handler.
    pub fn event_names(&self) -> Vec<String> {
        self.lock().keys().cloned().collect()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
