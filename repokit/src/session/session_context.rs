use crate::entity::Entity;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::EventManager;
use crate::filter::FilterCollection;
use crate::session::UnitOfWork;
use dashmap::DashMap;
use std::any::Any;
use std::sync::Arc;
use uuid::Uuid;

/// State shared by every session opened on the same context: the event
/// manager, the filter collection and one unit of work per entity type.
///
/// # Examples
///
/// ```rust,ignore
/// let context = SessionContext::new();
/// let users = SqlSession::<User>::new(&context)?;
/// let groups = SqlSession::<Group>::new(&context)?;
/// assert_eq!(users.session_id(), groups.session_id());
/// ```
#[derive(Clone)]
pub struct SessionContext {
    inner: Arc<SessionContextInner>,
}

impl Default for SessionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionContext {
    pub fn new() -> Self {
        SessionContext {
            inner: Arc::new(SessionContextInner {
                id: Uuid::new_v4().to_string(),
                event_manager: EventManager::new(),
                filters: FilterCollection::new(),
                units: DashMap::new(),
            }),
        }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn event_manager(&self) -> EventManager {
        self.inner.event_manager.clone()
    }

    pub fn filters(&self) -> FilterCollection {
        self.inner.filters.clone()
    }

    /// The unit of work tracking `T`, created on first use.
    pub fn unit_of_work<T: Entity>(&self) -> RepoResult<UnitOfWork<T>> {
        let name = T::entity_name();
        let entry = self
            .inner
            .units
            .entry(name.clone())
            .or_insert_with(|| {
                Box::new(UnitOfWork::<T>::new(self.handle())) as Box<dyn Any + Send + Sync>
            });

        entry.downcast_ref::<UnitOfWork<T>>().cloned().ok_or_else(|| {
            log::error!("Entity name {} is mapped by another type", name);
            RepoError::new(
                &format!("Entity name \"{}\" is already mapped by another type", name),
                ErrorKind::InvalidArgument,
            )
        })
    }

    fn handle(&self) -> SessionHandle {
        SessionHandle {
            id: self.inner.id.clone(),
            event_manager: self.inner.event_manager.clone(),
            filters: self.inner.filters.clone(),
        }
    }
}

/// The context parts a unit of work needs, without a reference cycle back to
/// the context.
#[derive(Clone)]
pub struct SessionHandle {
    id: String,
    event_manager: EventManager,
    filters: FilterCollection,
}

impl SessionHandle {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn event_manager(&self) -> &EventManager {
        &self.event_manager
    }

    pub fn filters(&self) -> &FilterCollection {
        &self.filters
    }
}

struct SessionContextInner {
    id: String,
    event_manager: EventManager,
    filters: FilterCollection,
    units: DashMap<String, Box<dyn Any + Send + Sync>>,
}
