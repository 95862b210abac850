use crate::common::{atomic, Atomic, Document};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use indexmap::{IndexMap, IndexSet};
use std::sync::Arc;

/// A named, session-wide query filter.
///
/// Enabled filters hide every entity they reject from queries and counts.
pub trait QueryFilter: Send + Sync {
    fn accept(&self, entity_name: &str, document: &Document) -> bool;
}

impl<F> QueryFilter for F
where
    F: Fn(&str, &Document) -> bool + Send + Sync,
{
    fn accept(&self, entity_name: &str, document: &Document) -> bool {
        self(entity_name, document)
    }
}

/// Registered query filters and which of them are enabled.
#[derive(Clone, Default)]
pub struct FilterCollection {
    inner: Arc<FilterCollectionInner>,
}

impl FilterCollection {
    pub fn new() -> Self {
        FilterCollection {
            inner: Arc::new(FilterCollectionInner {
                registered: atomic(IndexMap::new()),
                enabled: atomic(IndexSet::new()),
            }),
        }
    }

    /// Registers a filter under `name`, disabled.
    pub fn register(&self, name: &str, filter: Arc<dyn QueryFilter>) {
        self.inner
            .registered
            .write()
            .insert(name.to_string(), filter);
    }

    pub fn enable(&self, name: &str) -> RepoResult<()> {
        self.inner.check_registered(name)?;
        self.inner.enabled.write().insert(name.to_string());
        log::debug!("Enabled query filter {}", name);
        Ok(())
    }

    pub fn disable(&self, name: &str) -> RepoResult<()> {
        self.inner.check_registered(name)?;
        self.inner.enabled.write().shift_remove(name);
        log::debug!("Disabled query filter {}", name);
        Ok(())
    }

    pub fn is_enabled(&self, name: &str) -> bool {
        self.inner.enabled.read().contains(name)
    }

    /// Names of enabled filters in the order they were enabled.
    pub fn enabled_filters(&self) -> Vec<String> {
        self.inner.enabled.read().iter().cloned().collect()
    }

    /// True when no enabled filter rejects the document.
    pub fn accepts(&self, entity_name: &str, document: &Document) -> bool {
        let active: Vec<Arc<dyn QueryFilter>> = {
            let registered = self.inner.registered.read();
            self.inner
                .enabled
                .read()
                .iter()
                .filter_map(|name| registered.get(name).cloned())
                .collect()
        };
        active.iter().all(|f| f.accept(entity_name, document))
    }
}

#[derive(Default)]
struct FilterCollectionInner {
    registered: Atomic<IndexMap<String, Arc<dyn QueryFilter>>>,
    enabled: Atomic<IndexSet<String>>,
}

impl FilterCollectionInner {
    fn check_registered(&self, name: &str) -> RepoResult<()> {
        if self.registered.read().contains_key(name) {
            Ok(())
        } else {
            log::error!("Query filter {} is not registered", name);
            Err(RepoError::new(
                &format!("Filter \"{}\" does not exist", name),
                ErrorKind::InvalidArgument,
            ))
        }
    }
}
