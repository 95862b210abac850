use crate::common::Value;
use crate::entity::{Entity, EntityMetadata};
use crate::errors::RepoResult;
use crate::event::EventManager;
use crate::filter::FilterCollection;
use crate::pager::PaginatorAdapter;

/// The persistence collaborator a repository is bound to.
///
/// A session tracks pending changes for one entity type (unit of work),
/// executes its backend's native queries and owns the event manager and
/// filter collection of the surrounding session context. Backend errors are
/// returned as they are; the repository never retries.
pub trait PersistenceSession<T: Entity>: Clone + Send + Sync + 'static {
    /// Backend-native query handle.
    type Query: Clone + Send + Sync + 'static;

    /// Schedules `entity` for insertion or update on the next flush.
    fn persist(&self, entity: T) -> RepoResult<()>;

    /// Schedules `entity` for removal on the next flush.
    fn remove(&self, entity: &T) -> RepoResult<()>;

    /// Writes every pending change.
    fn flush(&self) -> RepoResult<()>;

    /// Reloads `entity` from the store; `NotFound` when it was never flushed.
    fn refresh(&self, entity: &mut T) -> RepoResult<()>;

    /// Drops pending changes of `entity`.
    fn detach(&self, entity: &T) -> RepoResult<()>;

    fn find(&self, id: &Value) -> RepoResult<Option<T>>;

    fn find_all(&self) -> RepoResult<Vec<T>>;

    fn execute(&self, query: &Self::Query) -> RepoResult<Vec<T>>;

    /// Runs a count query; the scalar comes back in the backend's own type.
    fn count(&self, query: &Self::Query) -> RepoResult<Value>;

    fn adapter(&self, query: Self::Query) -> Box<dyn PaginatorAdapter<T>>;

    fn metadata(&self) -> EntityMetadata;

    fn event_manager(&self) -> EventManager;

    fn filters(&self) -> FilterCollection;

    /// Identity of the session context, used as a cache key.
    fn session_id(&self) -> String;
}
