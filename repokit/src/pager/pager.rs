use crate::errors::RepoResult;

/// A page shape the repository can materialize paged results into.
///
/// [`Page`](crate::pager::Page) is the stock implementation. A custom pager
/// only has to store what `new` hands it; navigation metadata is derived from
/// the four stored values.
///
/// ```rust
/// use repokit::pager::Pager;
/// use repokit::RepoResult;
///
/// struct Window {
///     ids: Vec<u32>,
///     page: usize,
///     size: usize,
///     total: usize,
/// }
///
/// impl Pager<u32> for Window {
///     fn new(ids: Vec<u32>, page: usize, size: usize, total: usize) -> RepoResult<Self> {
///         Ok(Window { ids, page, size, total })
///     }
///
///     fn current_page(&self) -> usize { self.page }
///     fn page_size(&self) -> usize { self.size }
///     fn total_count(&self) -> usize { self.total }
///     fn items(&self) -> &[u32] { &self.ids }
/// }
///
/// let window = Window::new(vec![5, 6], 3, 2, 6).unwrap();
/// assert!(window.is_last_page());
/// assert_eq!(window.current_page_offset_start(), 4);
/// assert_eq!(window.previous_page(), Some(2));
/// ```
pub trait Pager<T>: Sized {
    /// Builds the pager for one fetched window.
    ///
    /// `page` is 1-indexed and `total_count` counts every match, not only
    /// `items`.
    fn new(items: Vec<T>, page: usize, page_size: usize, total_count: usize) -> RepoResult<Self>;

    fn current_page(&self) -> usize;

    fn page_size(&self) -> usize;

    fn total_count(&self) -> usize;

    fn items(&self) -> &[T];

    fn total_pages(&self) -> usize {
        self.total_count().div_ceil(self.page_size().max(1)).max(1)
    }

    fn current_page_offset_start(&self) -> usize {
        self.current_page().saturating_sub(1) * self.page_size()
    }

    fn current_page_offset_end(&self) -> usize {
        self.total_count()
            .min(self.current_page_offset_start() + self.page_size())
    }

    fn is_first_page(&self) -> bool {
        self.current_page() == 1
    }

    fn is_last_page(&self) -> bool {
        self.current_page() == self.total_pages()
    }

    fn previous_page(&self) -> Option<usize> {
        if self.is_first_page() {
            None
        } else {
            Some(self.current_page() - 1)
        }
    }

    fn next_page(&self) -> Option<usize> {
        if self.is_last_page() {
            None
        } else {
            Some(self.current_page() + 1)
        }
    }
}
