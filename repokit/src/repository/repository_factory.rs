use crate::backend::{
    CouchRepository, CouchSession, MongoRepository, MongoSession, SqlRepository, SqlSession,
};
use crate::criteria::QueryTranslator;
use crate::entity::Entity;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::repository::Repository;
use crate::repository_config::RepositoryConfig;
use crate::session::{PersistenceSession, SessionContext};
use dashmap::DashMap;
use parking_lot::Mutex;
use std::any::{type_name, Any};
use std::sync::Arc;

/// Hands out one repository per entity type and session.
///
/// Every repository it creates starts from the factory's [`RepositoryConfig`].
/// Repositories are cached by entity name, session id and session type, so
/// asking twice for the same pair yields clones sharing auto-flush and
/// suspension state.
#[derive(Clone)]
pub struct RepositoryFactory {
    inner: Arc<RepositoryFactoryInner>,
}

impl Default for RepositoryFactory {
    fn default() -> Self {
        Self::new(RepositoryConfig::default())
    }
}

impl RepositoryFactory {
    pub fn new(config: RepositoryConfig) -> Self {
        RepositoryFactory {
            inner: Arc::new(RepositoryFactoryInner {
                config,
                registry: DashMap::new(),
                lock: Mutex::new(()),
            }),
        }
    }

    pub fn config(&self) -> &RepositoryConfig {
        &self.inner.config
    }

    pub fn get_repository<T, Tr, S>(&self, session: S) -> RepoResult<Repository<T, Tr, S>>
    where
        T: Entity,
        Tr: QueryTranslator,
        S: PersistenceSession<T, Query = Tr::Query>,
    {
        self.inner.get_repository(session)
    }

    pub fn has_repository<T, S>(&self, session: &S) -> bool
    where
        T: Entity,
        S: PersistenceSession<T>,
    {
        self.inner
            .registry
            .contains_key(&repository_key::<T, S>(session))
    }

    pub fn sql_repository<T: Entity>(&self, context: &SessionContext) -> RepoResult<SqlRepository<T>> {
        self.get_repository(SqlSession::new(context)?)
    }

    pub fn mongo_repository<T: Entity>(&self, context: &SessionContext) -> RepoResult<MongoRepository<T>> {
        self.get_repository(MongoSession::new(context)?)
    }

    pub fn couch_repository<T: Entity>(&self, context: &SessionContext) -> RepoResult<CouchRepository<T>> {
        self.get_repository(CouchSession::new(context)?)
    }

    pub fn len(&self) -> usize {
        self.inner.registry.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.registry.is_empty()
    }

    pub fn clear(&self) {
        let _guard = self.inner.lock.lock();
        self.inner.registry.clear();
    }
}

struct RepositoryFactoryInner {
    config: RepositoryConfig,
    registry: DashMap<String, Box<dyn Any + Send + Sync>>,
    lock: Mutex<()>,
}

impl RepositoryFactoryInner {
    fn get_repository<T, Tr, S>(&self, session: S) -> RepoResult<Repository<T, Tr, S>>
    where
        T: Entity,
        Tr: QueryTranslator,
        S: PersistenceSession<T, Query = Tr::Query>,
    {
        let key = repository_key::<T, S>(&session);

        let _guard = self.lock.lock();
        if let Some(entry) = self.registry.get(&key) {
            return entry
                .downcast_ref::<Repository<T, Tr, S>>()
                .cloned()
                .ok_or_else(|| {
                    log::error!("Repository {} is registered with another translator", key);
                    RepoError::new(
                        &format!("Repository {} is registered with a different type", key),
                        ErrorKind::InternalError,
                    )
                });
        }

        log::debug!("Creating repository {}", key);
        let repository = Repository::with_config(session, self.config.clone());
        self.registry.insert(key, Box::new(repository.clone()));
        Ok(repository)
    }
}

fn repository_key<T: Entity, S: PersistenceSession<T>>(session: &S) -> String {
    format!(
        "{}@{}#{}",
        T::entity_name(),
        session.session_id(),
        type_name::<S>()
    )
}
