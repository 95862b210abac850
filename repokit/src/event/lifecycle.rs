use crate::common::Document;
use crate::errors::RepoResult;
use std::any::Any;

pub const PRE_PERSIST: &str = "prePersist";
pub const POST_PERSIST: &str = "postPersist";
pub const PRE_REMOVE: &str = "preRemove";
pub const POST_REMOVE: &str = "postRemove";
pub const PRE_FLUSH: &str = "preFlush";
pub const ON_FLUSH: &str = "onFlush";
pub const POST_FLUSH: &str = "postFlush";

/// Every lifecycle event a session dispatches.
pub const LIFECYCLE_EVENTS: [&str; 7] = [
    PRE_PERSIST,
    POST_PERSIST,
    PRE_REMOVE,
    POST_REMOVE,
    PRE_FLUSH,
    ON_FLUSH,
    POST_FLUSH,
];

/// Payload handed to listeners.
///
/// Flush events carry no document.
#[derive(Clone, Debug)]
pub struct LifecycleEventArgs {
    event: String,
    entity_name: String,
    document: Option<Document>,
}

impl LifecycleEventArgs {
    pub fn new(event: &str, entity_name: &str, document: Option<Document>) -> Self {
        LifecycleEventArgs {
            event: event.to_string(),
            entity_name: entity_name.to_string(),
            document,
        }
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn entity_name(&self) -> &str {
        &self.entity_name
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }
}

/// Receives lifecycle events it was registered for.
///
/// `as_any` lets suspension helpers pick listeners by concrete type.
pub trait EventListener: Any + Send + Sync {
    fn on_event(&self, args: &LifecycleEventArgs) -> RepoResult<()>;

    fn as_any(&self) -> &dyn Any;
}

/// A listener that declares the events it wants.
pub trait EventSubscriber: EventListener {
    fn subscribed_events(&self) -> Vec<&'static str>;
}
