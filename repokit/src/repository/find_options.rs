use crate::common::{OrderBy, SortOrder};

/// Ordering and window of a `find_by` call.
///
/// # Examples
///
/// ```rust
/// use repokit::repository::{order_by, FindOptions};
/// use repokit::common::SortOrder;
///
/// let options = order_by("name", SortOrder::Ascending).skip(10).limit(20);
/// assert_eq!(options.skip_count(), Some(10));
/// assert_eq!(options.limit_count(), Some(20));
///
/// let everything = FindOptions::new();
/// assert!(everything.order().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) order_by: OrderBy,
    pub(crate) skip: Option<usize>,
    pub(crate) limit: Option<usize>,
}

/// Creates `FindOptions` sorted by one field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` skipping the first `skip` results.
pub fn skip_by(skip: usize) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` returning at most `limit` results.
pub fn limit_to(limit: usize) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> Self {
        FindOptions {
            order_by: OrderBy::new(),
            skip: None,
            limit: None,
        }
    }

    /// Appends a sort field; earlier fields take priority.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.order_by = self.order_by.add(field_name, sort_order);
        self
    }

    /// Replaces the whole ordering.
    pub fn with_order(mut self, order_by: OrderBy) -> Self {
        self.order_by = order_by;
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = Some(skip);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn order(&self) -> &OrderBy {
        &self.order_by
    }

    pub fn skip_count(&self) -> Option<usize> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<usize> {
        self.limit
    }

    pub(crate) fn has_window(&self) -> bool {
        self.skip.is_some() || self.limit.is_some()
    }
}
