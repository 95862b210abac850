use crate::common::{atomic, Atomic, Document, OrderBy, ReadExecutor, Value, WriteExecutor};
use crate::criteria::{matches_all, Condition};
use crate::entity::{Entity, EntityMetadata};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::{
    EventManager, LifecycleEventArgs, ON_FLUSH, POST_FLUSH, POST_PERSIST, POST_REMOVE,
    PRE_FLUSH, PRE_PERSIST, PRE_REMOVE,
};
use crate::filter::FilterCollection;
use crate::session::SessionHandle;
use indexmap::IndexMap;
use std::sync::Arc;

enum PendingChange<T> {
    Persist(T),
    Remove(T),
}

/// In-memory unit of work for one entity type.
///
/// Flushed entities live in an insertion-ordered store keyed by id; pending
/// changes are applied in the order they were scheduled. Lifecycle events are
/// dispatched without holding any lock, so listeners may call back into the
/// session.
pub struct UnitOfWork<T: Entity> {
    inner: Arc<UnitOfWorkInner<T>>,
}

impl<T: Entity> Clone for UnitOfWork<T> {
    fn clone(&self) -> Self {
        UnitOfWork {
            inner: self.inner.clone(),
        }
    }
}

impl<T: Entity> UnitOfWork<T> {
    pub fn new(handle: SessionHandle) -> Self {
        UnitOfWork {
            inner: Arc::new(UnitOfWorkInner {
                metadata: T::metadata(),
                handle,
                committed: atomic(IndexMap::new()),
                pending: atomic(Vec::new()),
            }),
        }
    }

    pub fn metadata(&self) -> &EntityMetadata {
        &self.inner.metadata
    }

    pub fn session_id(&self) -> &str {
        self.inner.handle.id()
    }

    pub fn event_manager(&self) -> EventManager {
        self.inner.handle.event_manager().clone()
    }

    pub fn filters(&self) -> FilterCollection {
        self.inner.handle.filters().clone()
    }

    pub fn persist(&self, entity: T) -> RepoResult<()> {
        self.inner.persist(entity)
    }

    pub fn remove(&self, entity: &T) -> RepoResult<()> {
        self.inner.remove(entity)
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.inner.flush()
    }

    pub fn refresh(&self, entity: &mut T) -> RepoResult<()> {
        self.inner.refresh(entity)
    }

    pub fn detach(&self, entity: &T) {
        self.inner.detach(entity)
    }

    /// Flushed entity with the given id, if visible through the enabled
    /// filters.
    pub fn find(&self, id: &Value) -> Option<T> {
        self.inner.find(id)
    }

    /// Flushed entities matching `conditions`, sorted and windowed.
    pub fn select(
        &self,
        conditions: &[Condition],
        order_by: &OrderBy,
        offset: usize,
        limit: Option<usize>,
    ) -> Vec<T> {
        self.inner.select(conditions, order_by, offset, limit)
    }

    /// Number of flushed entities matching `conditions`; nothing is cloned.
    pub fn count(&self, conditions: &[Condition]) -> usize {
        self.inner.count(conditions)
    }

    pub fn pending_changes(&self) -> usize {
        self.inner.pending.read().len()
    }
}

struct UnitOfWorkInner<T> {
    metadata: EntityMetadata,
    handle: SessionHandle,
    committed: Atomic<IndexMap<String, T>>,
    pending: Atomic<Vec<PendingChange<T>>>,
}

impl<T: Entity> UnitOfWorkInner<T> {
    fn persist(&self, entity: T) -> RepoResult<()> {
        let id = entity.id();
        if id.is_null() {
            log::error!("Cannot persist {} without an identifier", self.metadata.name());
            return Err(RepoError::new(
                &format!(
                    "Entity {} must have a non-null \"{}\" to be persisted",
                    self.metadata.name(),
                    self.metadata.id_field()
                ),
                ErrorKind::InvalidArgument,
            ));
        }

        self.dispatch(PRE_PERSIST, Some(entity.to_document()))?;
        self.pending.write().push(PendingChange::Persist(entity));
        Ok(())
    }

    fn remove(&self, entity: &T) -> RepoResult<()> {
        if entity.id().is_null() {
            log::warn!("Ignoring removal of a {} that was never persisted", self.metadata.name());
            return Ok(());
        }

        self.dispatch(PRE_REMOVE, Some(entity.to_document()))?;
        self.pending.write().push(PendingChange::Remove(entity.clone()));
        Ok(())
    }

    fn flush(&self) -> RepoResult<()> {
        self.dispatch(PRE_FLUSH, None)?;

        let changes = self.pending.write_with(std::mem::take);
        if changes.is_empty() {
            return Ok(());
        }

        if let Err(err) = self.dispatch(ON_FLUSH, None) {
            let mut pending = self.pending.write();
            let scheduled_later = std::mem::take(&mut *pending);
            *pending = changes;
            pending.extend(scheduled_later);
            return Err(err);
        }

        log::debug!(
            "Flushing {} change(s) of {}",
            changes.len(),
            self.metadata.name()
        );

        let mut applied = Vec::with_capacity(changes.len());
        {
            let mut committed = self.committed.write();
            for change in changes {
                match change {
                    PendingChange::Persist(entity) => {
                        let document = entity.to_document();
                        committed.insert(entity.id().to_string(), entity);
                        applied.push((POST_PERSIST, document));
                    }
                    PendingChange::Remove(entity) => {
                        committed.shift_remove(&entity.id().to_string());
                        applied.push((POST_REMOVE, entity.to_document()));
                    }
                }
            }
        }

        for (event, document) in applied {
            self.dispatch(event, Some(document))?;
        }
        self.dispatch(POST_FLUSH, None)
    }

    fn refresh(&self, entity: &mut T) -> RepoResult<()> {
        let key = entity.id().to_string();
        match self.committed.read().get(&key) {
            Some(stored) => {
                *entity = stored.clone();
                Ok(())
            }
            None => {
                log::error!("Cannot refresh {} {}, it is not stored", self.metadata.name(), key);
                Err(RepoError::new(
                    &format!("Entity {} with id {} is not stored", self.metadata.name(), key),
                    ErrorKind::NotFound,
                ))
            }
        }
    }

    fn detach(&self, entity: &T) {
        let id = entity.id();
        self.pending.write_with(|pending| {
            pending.retain(|change| match change {
                PendingChange::Persist(e) | PendingChange::Remove(e) => e.id() != id,
            })
        });
    }

    fn find(&self, id: &Value) -> Option<T> {
        let committed = self.committed.read();
        let entity = committed.get(&id.to_string())?;
        if self.visible(&entity.to_document()) {
            Some(entity.clone())
        } else {
            None
        }
    }

    fn select(
        &self,
        conditions: &[Condition],
        order_by: &OrderBy,
        offset: usize,
        limit: Option<usize>,
    ) -> Vec<T> {
        let committed = self.committed.read();
        let mut matched: Vec<(Document, &T)> = committed
            .values()
            .map(|entity| (entity.to_document(), entity))
            .filter(|(document, _)| matches_all(conditions, document) && self.visible(document))
            .collect();

        if !order_by.is_empty() {
            // stable, so ties keep flush order
            matched.sort_by(|(a, _), (b, _)| order_by.compare(a, b));
        }

        matched
            .into_iter()
            .skip(offset)
            .take(limit.unwrap_or(usize::MAX))
            .map(|(_, entity)| entity.clone())
            .collect()
    }

    fn count(&self, conditions: &[Condition]) -> usize {
        self.committed.read_with(|committed| {
            committed
                .values()
                .filter(|entity| {
                    let document = entity.to_document();
                    matches_all(conditions, &document) && self.visible(&document)
                })
                .count()
        })
    }

    fn visible(&self, document: &Document) -> bool {
        self.handle.filters().accepts(self.metadata.name(), document)
    }

    fn dispatch(&self, event: &str, document: Option<Document>) -> RepoResult<()> {
        let manager = self.handle.event_manager();
        if !manager.has_listeners(event) {
            return Ok(());
        }
        manager.dispatch(&LifecycleEventArgs::new(event, self.metadata.name(), document))
    }
}
