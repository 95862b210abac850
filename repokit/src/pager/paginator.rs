use crate::errors::RepoResult;
use crate::pager::Page;

/// Lazy window + count provider over a backend query.
///
/// Every call runs the backend query again with the requested window; no
/// result set is kept between calls. `count` must not load the matching
/// entities.
pub trait PaginatorAdapter<T>: Send + Sync {
    /// Fetches at most `count` items starting at `offset`.
    fn items(&self, offset: usize, count: usize) -> RepoResult<Vec<T>>;

    /// Total number of items the query matches.
    fn count(&self) -> RepoResult<usize>;
}

/// A lazily fetching paginator.
///
/// An item count per page of `0` means unbounded: a single page holds every
/// item. Page numbers are 1-indexed and clamped into `[1, count()]` on read.
///
/// # Examples
///
/// ```rust,ignore
/// let mut paginator = repository.find_paginated_by(criteria! { "role": "admin" }, OrderBy::asc("name"), 20)?;
/// paginator.set_current_page_number(2);
/// for user in paginator.current_items()? {
///     println!("{}", user.name);
/// }
/// ```
pub struct Paginator<T> {
    adapter: Box<dyn PaginatorAdapter<T>>,
    item_count_per_page: usize,
    current_page_number: usize,
}

impl<T> Paginator<T> {
    pub fn new(adapter: Box<dyn PaginatorAdapter<T>>, item_count_per_page: usize) -> Self {
        Paginator {
            adapter,
            item_count_per_page,
            current_page_number: 1,
        }
    }

    pub fn item_count_per_page(&self) -> usize {
        self.item_count_per_page
    }

    pub fn set_item_count_per_page(&mut self, item_count_per_page: usize) {
        self.item_count_per_page = item_count_per_page;
    }

    pub fn set_current_page_number(&mut self, page_number: usize) {
        self.current_page_number = page_number;
    }

    /// Current page number, clamped into the valid page range.
    pub fn current_page_number(&self) -> RepoResult<usize> {
        self.normalize_page_number(self.current_page_number)
    }

    pub fn total_item_count(&self) -> RepoResult<usize> {
        self.adapter.count()
    }

    /// Number of pages, never less than 1.
    pub fn count(&self) -> RepoResult<usize> {
        if self.item_count_per_page == 0 {
            return Ok(1);
        }
        let total = self.adapter.count()?;
        Ok(total.div_ceil(self.item_count_per_page).max(1))
    }

    pub fn items_by_page(&self, page_number: usize) -> RepoResult<Vec<T>> {
        let page_number = self.normalize_page_number(page_number)?;
        if self.item_count_per_page == 0 {
            let total = self.adapter.count()?;
            return self.adapter.items(0, total);
        }

        let offset = (page_number - 1) * self.item_count_per_page;
        self.adapter.items(offset, self.item_count_per_page)
    }

    pub fn current_items(&self) -> RepoResult<Vec<T>> {
        self.items_by_page(self.current_page_number)
    }

    /// Materializes page `page_number` (clamped) into a [`Page`].
    pub fn page(&self, page_number: usize) -> RepoResult<Page<T>> {
        let page_number = self.normalize_page_number(page_number)?;
        let total = self.adapter.count()?;
        let items = self.items_by_page(page_number)?;
        let page_size = if self.item_count_per_page == 0 {
            total.max(1)
        } else {
            self.item_count_per_page
        };
        Page::new(items, page_number, page_size, total)
    }

    fn normalize_page_number(&self, page_number: usize) -> RepoResult<usize> {
        let page_count = self.count()?;
        Ok(page_number.clamp(1, page_count))
    }
}
