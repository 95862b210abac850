use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::pager::Pager;

/// Default number of items on a page.
pub const DEFAULT_PAGE_SIZE: usize = 10;

/// One fetched slice of a larger result set plus navigation metadata.
///
/// All fields are fixed at construction; construction fails when the page
/// number or page size fall outside the valid range.
///
/// ```rust
/// use repokit::pager::Page;
///
/// let page = Page::new(vec![1, 2, 3, 4], 1, 4, 12).unwrap();
/// assert_eq!(page.total_pages(), 3);
/// assert_eq!(page.current_page_offset_start(), 0);
/// assert_eq!(page.current_page_offset_end(), 4);
/// assert_eq!(page.previous_page(), None);
/// assert_eq!(page.next_page(), Some(2));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Page<T> {
    items: Vec<T>,
    current_page: usize,
    page_size: usize,
    total_count: usize,
    total_pages: usize,
}

impl<T> Page<T> {
    /// Builds a page.
    ///
    /// Items beyond `page_size` are dropped. A `total_count` of zero is
    /// replaced by the number of kept items.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when `page_size` is 0, `page` is 0 or `page` is past the
    /// last page.
    pub fn new(
        mut items: Vec<T>,
        page: usize,
        page_size: usize,
        total_count: usize,
    ) -> RepoResult<Page<T>> {
        if page_size < 1 {
            log::error!("Invalid page size {}", page_size);
            return Err(RepoError::new(
                &format!("Page size must be at least 1. {} given", page_size),
                ErrorKind::OutOfBounds,
            ));
        }

        if page < 1 {
            log::error!("Invalid page number {}", page);
            return Err(RepoError::new(
                &format!("Current page cannot be lower than 1. {} given", page),
                ErrorKind::OutOfBounds,
            ));
        }

        items.truncate(page_size);

        let total_count = if total_count < 1 {
            items.len()
        } else {
            total_count
        };
        let total_pages = total_count.div_ceil(page_size).max(1);

        if page > total_pages {
            log::error!("Page {} is past the last page {}", page, total_pages);
            return Err(RepoError::new(
                &format!(
                    "Current page cannot be higher than {}. {} given",
                    total_pages, page
                ),
                ErrorKind::OutOfBounds,
            ));
        }

        Ok(Page {
            items,
            current_page: page,
            page_size,
            total_count,
            total_pages,
        })
    }

    /// A first page of at most [`DEFAULT_PAGE_SIZE`] items counting only the
    /// given items.
    pub fn from_items(items: Vec<T>) -> RepoResult<Page<T>> {
        Page::new(items, 1, DEFAULT_PAGE_SIZE, 0)
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn total_count(&self) -> usize {
        self.total_count
    }

    pub fn total_pages(&self) -> usize {
        self.total_pages
    }

    pub fn current_page_offset_start(&self) -> usize {
        (self.current_page - 1) * self.page_size
    }

    pub fn current_page_offset_end(&self) -> usize {
        self.total_count
            .min(self.current_page_offset_start() + self.page_size)
    }

    pub fn is_first_page(&self) -> bool {
        self.current_page == 1
    }

    pub fn is_last_page(&self) -> bool {
        self.current_page == self.total_pages
    }

    pub fn previous_page(&self) -> Option<usize> {
        if self.is_first_page() {
            None
        } else {
            Some(self.current_page - 1)
        }
    }

    pub fn next_page(&self) -> Option<usize> {
        if self.is_last_page() {
            None
        } else {
            Some(self.current_page + 1)
        }
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl<T> Pager<T> for Page<T> {
    fn new(items: Vec<T>, page: usize, page_size: usize, total_count: usize) -> RepoResult<Self> {
        Page::new(items, page, page_size, total_count)
    }

    fn current_page(&self) -> usize {
        self.current_page
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    fn total_count(&self) -> usize {
        self.total_count
    }

    fn items(&self) -> &[T] {
        &self.items
    }

    fn total_pages(&self) -> usize {
        self.total_pages
    }
}

impl<T> IntoIterator for Page<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a, T> IntoIterator for &'a Page<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_navigation_metadata() {
        let page = Page::new(vec!["a", "b", "c", "d"], 1, 4, 12).unwrap();

        assert_eq!(page.current_page(), 1);
        assert_eq!(page.page_size(), 4);
        assert_eq!(page.total_count(), 12);
        assert_eq!(page.total_pages(), 3);
        assert_eq!(page.current_page_offset_start(), 0);
        assert_eq!(page.current_page_offset_end(), 4);
        assert!(page.is_first_page());
        assert!(!page.is_last_page());
        assert_eq!(page.previous_page(), None);
        assert_eq!(page.next_page(), Some(2));
        assert_eq!(page.len(), 4);
    }

    #[test]
    fn test_middle_and_last_page() {
        let middle = Page::new(vec![5, 6, 7, 8], 2, 4, 10).unwrap();
        assert_eq!(middle.previous_page(), Some(1));
        assert_eq!(middle.next_page(), Some(3));
        assert_eq!(middle.current_page_offset_start(), 4);
        assert_eq!(middle.current_page_offset_end(), 8);

        let last = Page::new(vec![9, 10], 3, 4, 10).unwrap();
        assert!(last.is_last_page());
        assert_eq!(last.next_page(), None);
        assert_eq!(last.current_page_offset_end(), 10);
    }

    #[test]
    fn test_items_are_truncated_to_page_size() {
        let page = Page::new((0..25).collect(), 1, 10, 0).unwrap();
        assert_eq!(page.len(), 10);
        assert_eq!(page.total_count(), 10);
        assert_eq!(page.total_pages(), 1);
    }

    #[test]
    fn test_total_count_derived_from_items() {
        let page = Page::new(vec![1, 2, 3], 1, 10, 0).unwrap();
        assert_eq!(page.total_count(), 3);

        let empty: Page<i32> = Page::new(vec![], 1, 10, 0).unwrap();
        assert_eq!(empty.total_count(), 0);
        assert_eq!(empty.total_pages(), 1);
        assert!(empty.is_first_page() && empty.is_last_page());
    }

    #[test]
    fn test_zero_page_size_fails() {
        let err = Page::new(vec![1], 1, 0, 10).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
        assert!(err.message().contains("Page size must be at least 1"));
    }

    #[test]
    fn test_zero_page_fails() {
        let err = Page::new(vec![1], 0, 10, 10).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
        assert!(err.message().contains("cannot be lower than 1"));
    }

    #[test]
    fn test_page_past_last_fails() {
        let err = Page::new(Vec::<i32>::new(), 4, 4, 12).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::OutOfBounds);
        assert!(err.message().contains("cannot be higher than 3"));
    }

    #[test]
    fn test_last_valid_page_is_last() {
        for page_size in 1..=7usize {
            for total_count in 0..=30usize {
                let last = total_count.div_ceil(page_size).max(1);
                let page = Page::new(Vec::<u8>::new(), last, page_size, total_count).unwrap();
                assert!(page.is_last_page());
                assert!(
                    page.current_page_offset_end() - page.current_page_offset_start()
                        <= page_size
                );
                assert_eq!(page.previous_page().is_none(), page.is_first_page());
                assert_eq!(page.next_page().is_none(), page.is_last_page());

                let past = Page::new(Vec::<u8>::new(), last + 1, page_size, total_count);
                assert!(past.is_err());
            }
        }
    }

    #[test]
    fn test_into_iterator() {
        let page = Page::from_items(vec![1, 2, 3]).unwrap();
        let doubled: Vec<i32> = (&page).into_iter().map(|x| x * 2).collect();
        assert_eq!(doubled, vec![2, 4, 6]);
        assert_eq!(page.into_iter().sum::<i32>(), 6);
    }
}
