use crate::common::Atomic;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::{EventListener, EventSubscriber, LifecycleEventArgs};
use indexmap::IndexMap;
use std::any::type_name;
use std::sync::Arc;

/// A registered subscriber together with the events it was attached to.
#[derive(Clone)]
pub struct Subscription {
    listener: Arc<dyn EventListener>,
    events: Vec<String>,
    type_name: &'static str,
}

impl Subscription {
    pub fn of<S: EventSubscriber>(subscriber: Arc<S>) -> Self {
        let events = subscriber
            .subscribed_events()
            .into_iter()
            .map(str::to_string)
            .collect();
        Subscription {
            listener: subscriber,
            events,
            type_name: type_name::<S>(),
        }
    }

    pub fn listener(&self) -> &Arc<dyn EventListener> {
        &self.listener
    }

    pub fn events(&self) -> &[String] {
        &self.events
    }

    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub fn is<S: EventSubscriber>(&self) -> bool {
        self.listener.as_any().is::<S>()
    }
}

/// Per-session registry of lifecycle listeners and subscribers.
///
/// Cheap to clone; all clones share one registry. Listener identity is the
/// `Arc` allocation, so removing and re-adding the same `Arc` restores the
/// exact instance.
#[derive(Clone, Default)]
pub struct EventManager {
    inner: Arc<EventManagerInner>,
}

impl EventManager {
    pub fn new() -> Self {
        EventManager {
            inner: Arc::new(EventManagerInner::default()),
        }
    }

    pub fn add_event_listener(&self, events: &[&str], listener: Arc<dyn EventListener>) {
        self.inner.add_event_listener(events, listener)
    }

    /// Detaches `listener` from `event`. Returns whether it was attached.
    pub fn remove_event_listener(&self, event: &str, listener: &Arc<dyn EventListener>) -> bool {
        self.inner.remove_event_listener(event, listener)
    }

    pub fn add_event_subscriber<S: EventSubscriber>(&self, subscriber: Arc<S>) {
        self.inner.add_subscription(Subscription::of(subscriber))
    }

    /// Re-attaches a subscription previously taken out of this manager.
    pub fn add_subscription(&self, subscription: Subscription) {
        self.inner.add_subscription(subscription)
    }

    /// Detaches the subscriber from every event it subscribed to.
    pub fn remove_event_subscriber(&self, subscription: &Subscription) -> bool {
        self.inner.remove_subscription(subscription)
    }

    pub fn subscribers(&self) -> Vec<Subscription> {
        self.inner.subscribers.read().clone()
    }

    /// Listeners of `event` in registration order.
    pub fn listeners(&self, event: &str) -> Vec<Arc<dyn EventListener>> {
        self.inner
            .listeners
            .read()
            .get(event)
            .cloned()
            .unwrap_or_default()
    }

    /// Every event with at least one listener, mapped to its listeners.
    pub fn all_listeners(&self) -> IndexMap<String, Vec<Arc<dyn EventListener>>> {
        self.inner
            .listeners
            .read()
            .iter()
            .filter(|(_, listeners)| !listeners.is_empty())
            .map(|(event, listeners)| (event.clone(), listeners.clone()))
            .collect()
    }

    pub fn has_listeners(&self, event: &str) -> bool {
        self.inner
            .listeners
            .read()
            .get(event)
            .is_some_and(|listeners| !listeners.is_empty())
    }

    pub fn dispatch(&self, args: &LifecycleEventArgs) -> RepoResult<()> {
        self.inner.dispatch(args)
    }
}

#[derive(Default)]
struct EventManagerInner {
    listeners: Atomic<IndexMap<String, Vec<Arc<dyn EventListener>>>>,
    subscribers: Atomic<Vec<Subscription>>,
}

impl EventManagerInner {
    fn add_event_listener(&self, events: &[&str], listener: Arc<dyn EventListener>) {
        let mut registry = self.listeners.write();
        for event in events {
            let listeners = registry.entry(event.to_string()).or_default();
            if !listeners.iter().any(|l| same_listener(l, &listener)) {
                listeners.push(listener.clone());
            }
        }
    }

    fn remove_event_listener(&self, event: &str, listener: &Arc<dyn EventListener>) -> bool {
        let mut registry = self.listeners.write();
        match registry.get_mut(event) {
            Some(listeners) => {
                let before = listeners.len();
                listeners.retain(|l| !same_listener(l, listener));
                before != listeners.len()
            }
            None => false,
        }
    }

    fn add_subscription(&self, subscription: Subscription) {
        let events: Vec<&str> = subscription.events.iter().map(String::as_str).collect();
        self.add_event_listener(&events, subscription.listener.clone());

        let mut subscribers = self.subscribers.write();
        if !subscribers
            .iter()
            .any(|s| same_listener(&s.listener, &subscription.listener))
        {
            subscribers.push(subscription);
        }
    }

    fn remove_subscription(&self, subscription: &Subscription) -> bool {
        for event in &subscription.events {
            self.remove_event_listener(event, &subscription.listener);
        }

        let mut subscribers = self.subscribers.write();
        let before = subscribers.len();
        subscribers.retain(|s| !same_listener(&s.listener, &subscription.listener));
        before != subscribers.len()
    }

    fn dispatch(&self, args: &LifecycleEventArgs) -> RepoResult<()> {
        // snapshot so listeners may touch the registry
        let listeners = match self.listeners.read().get(args.event()) {
            Some(listeners) if !listeners.is_empty() => listeners.clone(),
            _ => return Ok(()),
        };

        log::debug!(
            "Dispatching {} for {} to {} listener(s)",
            args.event(),
            args.entity_name(),
            listeners.len()
        );

        for listener in listeners {
            if let Err(err) = listener.on_event(args) {
                log::error!("Listener failed while handling {}: {}", args.event(), err);
                if err.kind() == &ErrorKind::EventError {
                    return Err(err);
                }
                return Err(RepoError::new_with_cause(
                    &format!("Event listener failed while handling {}", args.event()),
                    ErrorKind::EventError,
                    err,
                ));
            }
        }
        Ok(())
    }
}

pub(crate) fn same_listener(a: &Arc<dyn EventListener>, b: &Arc<dyn EventListener>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}
