use crate::common::{Document, Value};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt::Display;

/// Specifies the direction for sorting query results.
///
/// ```text
/// let order = OrderBy::new().add("lastName", SortOrder::Ascending);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Smallest to largest, A to Z
    Ascending,
    /// Largest to smallest, Z to A
    Descending,
}

impl SortOrder {
    /// Parses the `ASC`/`DESC` keywords (case-insensitive).
    pub fn parse(keyword: &str) -> RepoResult<SortOrder> {
        match keyword.trim().to_ascii_uppercase().as_str() {
            "ASC" | "ASCENDING" => Ok(SortOrder::Ascending),
            "DESC" | "DESCENDING" => Ok(SortOrder::Descending),
            other => {
                log::error!("Invalid sort direction {}", other);
                Err(RepoError::new(
                    &format!("Invalid sort direction \"{}\". Use ASC or DESC", keyword),
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// Ordered list of `(field, direction)` pairs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderBy {
    sorting_order: Vec<(String, SortOrder)>,
}

impl OrderBy {
    pub fn new() -> Self {
        OrderBy {
            sorting_order: Vec::new(),
        }
    }

    pub fn asc(field_name: &str) -> Self {
        OrderBy::new().add(field_name, SortOrder::Ascending)
    }

    pub fn desc(field_name: &str) -> Self {
        OrderBy::new().add(field_name, SortOrder::Descending)
    }

    pub fn add(mut self, field_name: &str, sort_order: SortOrder) -> Self {
        self.sorting_order.push((field_name.to_string(), sort_order));
        self
    }

    pub fn sorting_order(&self) -> &[(String, SortOrder)] {
        &self.sorting_order
    }

    pub fn is_empty(&self) -> bool {
        self.sorting_order.is_empty()
    }

    /// Compares two documents field by field in sort priority.
    pub fn compare(&self, left: &Document, right: &Document) -> Ordering {
        for (field, order) in &self.sorting_order {
            let ordering = left.get(field).compare(&right.get(field));
            let ordering = match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

impl Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            self.sorting_order
                .iter()
                .map(|(field, order)| format!("{} {}", field, order.keyword()))
                .join(", ")
        )
    }
}

impl TryFrom<&Value> for OrderBy {
    type Error = RepoError;

    /// Reads a `{field: "ASC" | "DESC"}` map; `Null` means no ordering.
    fn try_from(value: &Value) -> RepoResult<Self> {
        match value {
            Value::Null => Ok(OrderBy::new()),
            Value::Map(map) => {
                let mut order_by = OrderBy::new();
                for (field, direction) in map {
                    let keyword = direction.as_str().ok_or_else(|| {
                        RepoError::new(
                            &format!("Sort direction of \"{}\" must be a string", field),
                            ErrorKind::InvalidArgument,
                        )
                    })?;
                    order_by = order_by.add(field, SortOrder::parse(keyword)?);
                }
                Ok(order_by)
            }
            other => {
                log::error!("Invalid order by argument {}", other);
                Err(RepoError::new(
                    "Order by must be a map of field to ASC or DESC",
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }
}
