use crate::errors::{RepoError, RepoResult};
use crate::repository::RepositoryFactory;
use crate::repository_config::RepositoryConfig;

/// Fluent configuration of repository defaults.
///
/// Invalid settings do not fail immediately; the first error is kept and
/// returned by [`RepositoryBuilder::build`] or [`RepositoryBuilder::factory`].
///
/// # Examples
///
/// ```rust
/// use repokit::repository_builder::RepositoryBuilder;
///
/// let config = RepositoryBuilder::new()
///     .auto_flush(true)
///     .page_size(20)
///     .items_per_page(0)
///     .build()
///     .unwrap();
/// assert!(config.auto_flush());
/// assert_eq!(config.page_size(), 20);
///
/// assert!(RepositoryBuilder::new().page_size(0).build().is_err());
/// ```
#[derive(Default)]
pub struct RepositoryBuilder {
    error: Option<RepoError>,
    config: RepositoryConfig,
}

impl RepositoryBuilder {
    pub fn new() -> Self {
        RepositoryBuilder {
            error: None,
            config: RepositoryConfig::new(),
        }
    }

    /// Flush after every mutating repository call.
    pub fn auto_flush(self, auto_flush: bool) -> Self {
        self.config.set_auto_flush(auto_flush);
        self
    }

    /// Default limit of `find_paged_by`. Must be at least 1.
    pub fn page_size(mut self, page_size: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_page_size(page_size) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Default page length of `find_paginated_by`; 0 means unbounded.
    pub fn items_per_page(self, items_per_page: usize) -> Self {
        self.config.set_items_per_page(items_per_page);
        self
    }

    pub fn build(self) -> RepoResult<RepositoryConfig> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.config),
        }
    }

    /// Builds the configuration and a factory that applies it.
    pub fn factory(self) -> RepoResult<RepositoryFactory> {
        self.build().map(RepositoryFactory::new)
    }
}
