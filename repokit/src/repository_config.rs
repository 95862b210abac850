//! Defaults applied to every repository.

use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::pager::DEFAULT_PAGE_SIZE;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared repository defaults.
///
/// Clones share one configuration. A repository reads the defaults when it is
/// created (auto-flush) or when a call leaves them unspecified (page size,
/// items per page).
///
/// # Examples
///
/// ```rust
/// use repokit::repository_config::RepositoryConfig;
///
/// let config = RepositoryConfig::new();
/// config.set_page_size(25).unwrap();
/// assert_eq!(config.page_size(), 25);
/// assert!(config.set_page_size(0).is_err());
/// ```
#[derive(Clone)]
pub struct RepositoryConfig {
    inner: Arc<RepositoryConfigInner>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl RepositoryConfig {
    pub fn new() -> Self {
        RepositoryConfig {
            inner: Arc::new(RepositoryConfigInner {
                auto_flush: AtomicBool::new(false),
                page_size: AtomicUsize::new(DEFAULT_PAGE_SIZE),
                items_per_page: AtomicUsize::new(DEFAULT_PAGE_SIZE),
            }),
        }
    }

    /// Whether new repositories flush after every mutation.
    pub fn auto_flush(&self) -> bool {
        self.inner.auto_flush.load(Ordering::Relaxed)
    }

    pub fn set_auto_flush(&self, auto_flush: bool) {
        self.inner.auto_flush.store(auto_flush, Ordering::Relaxed);
    }

    /// Page size used by `find_paged_by` when no limit is given.
    pub fn page_size(&self) -> usize {
        self.inner.page_size.load(Ordering::Relaxed)
    }

    /// # Errors
    ///
    /// `OutOfBounds` when `page_size` is 0.
    pub fn set_page_size(&self, page_size: usize) -> RepoResult<()> {
        if page_size < 1 {
            log::error!("Invalid default page size {}", page_size);
            return Err(RepoError::new(
                &format!("Page size must be at least 1. {} given", page_size),
                ErrorKind::OutOfBounds,
            ));
        }
        self.inner.page_size.store(page_size, Ordering::Relaxed);
        Ok(())
    }

    /// Items per page used by `find_paginated_by` when none is given; 0 means
    /// unbounded.
    pub fn items_per_page(&self) -> usize {
        self.inner.items_per_page.load(Ordering::Relaxed)
    }

    pub fn set_items_per_page(&self, items_per_page: usize) {
        self.inner
            .items_per_page
            .store(items_per_page, Ordering::Relaxed);
    }
}

struct RepositoryConfigInner {
    auto_flush: AtomicBool,
    page_size: AtomicUsize,
    items_per_page: AtomicUsize,
}
