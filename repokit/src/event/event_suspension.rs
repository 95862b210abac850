use crate::common::{atomic, Atomic};
use crate::event::event_manager::same_listener;
use crate::event::{EventListener, EventManager, EventSubscriber, Subscription};
use indexmap::IndexMap;
use std::any::type_name;
use std::sync::Arc;

/// Records subscribers and listeners taken out of an [`EventManager`] so they
/// can be put back as the very same instances.
///
/// Suspending something already suspended does nothing, and so does
/// restoring something never suspended.
#[derive(Clone, Default)]
pub struct EventSuspension {
    subscribers: Atomic<IndexMap<&'static str, Subscription>>,
    listeners: Atomic<IndexMap<String, Vec<Arc<dyn EventListener>>>>,
}

impl EventSuspension {
    pub fn new() -> Self {
        EventSuspension {
            subscribers: atomic(IndexMap::new()),
            listeners: atomic(IndexMap::new()),
        }
    }

    /// Detaches the first registered subscriber of type `S`.
    pub fn disable_event_subscriber<S: EventSubscriber>(&self, manager: &EventManager) {
        let key = type_name::<S>();
        if self.subscribers.read().contains_key(key) {
            return;
        }

        match manager.subscribers().into_iter().find(|s| s.is::<S>()) {
            Some(subscription) => {
                manager.remove_event_subscriber(&subscription);
                log::debug!("Suspended event subscriber {}", key);
                self.subscribers.write().insert(key, subscription);
            }
            None => log::warn!("No event subscriber of type {} is registered", key),
        }
    }

    pub fn restore_event_subscribers(&self, manager: &EventManager) {
        let suspended = std::mem::take(&mut *self.subscribers.write());
        for (key, subscription) in suspended {
            log::debug!("Restoring event subscriber {}", key);
            manager.add_subscription(subscription);
        }
    }

    /// Detaches every listener of `event`.
    pub fn disable_event_listeners(&self, manager: &EventManager, event: &str) {
        for listener in manager.listeners(event) {
            manager.remove_event_listener(event, &listener);
            self.record_listener(event, listener);
        }
    }

    /// Detaches the first listener of type `L` on `event`.
    pub fn disable_event_listener<L: EventListener>(&self, manager: &EventManager, event: &str) {
        let already_suspended = self
            .listeners
            .read()
            .get(event)
            .is_some_and(|listeners| listeners.iter().any(|l| l.as_any().is::<L>()));
        if already_suspended {
            return;
        }

        let found = manager
            .listeners(event)
            .into_iter()
            .find(|l| l.as_any().is::<L>());
        match found {
            Some(listener) => {
                manager.remove_event_listener(event, &listener);
                self.record_listener(event, listener);
            }
            None => log::warn!(
                "No event listener of type {} is registered for {}",
                type_name::<L>(),
                event
            ),
        }
    }

    pub fn restore_event_listeners(&self, manager: &EventManager, event: &str) {
        let suspended = self.listeners.write().shift_remove(event);
        if let Some(listeners) = suspended {
            for listener in listeners {
                manager.add_event_listener(&[event], listener);
            }
        }
    }

    pub fn restore_all_event_listeners(&self, manager: &EventManager) {
        let suspended = std::mem::take(&mut *self.listeners.write());
        for (event, listeners) in suspended {
            for listener in listeners {
                manager.add_event_listener(&[event.as_str()], listener);
            }
        }
    }

    pub fn suspended_events(&self) -> Vec<String> {
        self.listeners.read().keys().cloned().collect()
    }

    fn record_listener(&self, event: &str, listener: Arc<dyn EventListener>) {
        log::debug!("Suspended a listener of {}", event);
        let mut suspended = self.listeners.write();
        let listeners = suspended.entry(event.to_string()).or_default();
        if !listeners.iter().any(|l| same_listener(l, &listener)) {
            listeners.push(listener);
        }
    }
}
