use crate::common::{atomic, Atomic};
use crate::errors::RepoResult;
use crate::filter::FilterCollection;
use indexmap::IndexSet;

/// Remembers which enabled filters were turned off so only those get turned
/// back on.
#[derive(Clone, Default)]
pub struct FilterSuspension {
    disabled: Atomic<IndexSet<String>>,
}

impl FilterSuspension {
    pub fn new() -> Self {
        FilterSuspension {
            disabled: atomic(IndexSet::new()),
        }
    }

    pub fn disable_filter(&self, filters: &FilterCollection, name: &str) -> RepoResult<()> {
        if self.disabled.read().contains(name) {
            return Ok(());
        }
        if !filters.is_enabled(name) {
            log::warn!("Query filter {} is not enabled", name);
            return Ok(());
        }

        filters.disable(name)?;
        self.disabled.write().insert(name.to_string());
        Ok(())
    }

    pub fn disable_filters(&self, filters: &FilterCollection) -> RepoResult<()> {
        for name in filters.enabled_filters() {
            self.disable_filter(filters, &name)?;
        }
        Ok(())
    }

    pub fn restore_filter(&self, filters: &FilterCollection, name: &str) -> RepoResult<()> {
        let suspended = self.disabled.write().shift_remove(name);
        if suspended {
            filters.enable(name)?;
        }
        Ok(())
    }

    pub fn restore_filters(&self, filters: &FilterCollection) -> RepoResult<()> {
        let suspended = std::mem::take(&mut *self.disabled.write());
        for name in suspended {
            filters.enable(&name)?;
        }
        Ok(())
    }

    pub fn disabled_filters(&self) -> Vec<String> {
        self.disabled.read().iter().cloned().collect()
    }
}
