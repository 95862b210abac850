//! Name-based finders and removers (`findByUserName`, `removeOneByEmail`, ...).
//!
//! A method name is split into a registered verb prefix and a field part.
//! The field part is camel-cased and must name a field or association of the
//! entity; the first argument is the value matched against it.

use crate::common::{camelize, OrderBy, Value};
use crate::entity::EntityMetadata;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::pager::{Page, Paginator};
use indexmap::IndexMap;
use itertools::Itertools;

pub const FIND_BY: &str = "findBy";
pub const FIND_ONE_BY: &str = "findOneBy";
pub const FIND_PAGINATED_BY: &str = "findPaginatedBy";
pub const FIND_PAGED_BY: &str = "findPagedBy";
pub const REMOVE_BY: &str = "removeBy";
pub const REMOVE_ONE_BY: &str = "removeOneBy";

/// What a dynamic call produced.
pub enum DynamicResult<T> {
    Many(Vec<T>),
    One(Option<T>),
    Paginated(Paginator<T>),
    Paged(Page<T>),
    Removed(usize),
}

impl<T> DynamicResult<T> {
    pub fn into_many(self) -> Option<Vec<T>> {
        match self {
            DynamicResult::Many(items) => Some(items),
            _ => None,
        }
    }

    pub fn into_one(self) -> Option<Option<T>> {
        match self {
            DynamicResult::One(item) => Some(item),
            _ => None,
        }
    }

    pub fn into_paginator(self) -> Option<Paginator<T>> {
        match self {
            DynamicResult::Paginated(paginator) => Some(paginator),
            _ => None,
        }
    }

    pub fn into_page(self) -> Option<Page<T>> {
        match self {
            DynamicResult::Paged(page) => Some(page),
            _ => None,
        }
    }

    pub fn removed(&self) -> Option<usize> {
        match self {
            DynamicResult::Removed(count) => Some(*count),
            _ => None,
        }
    }
}

/// Receives the receiver, the criteria (a `Value::Map`, or the raw first
/// argument for a bare prefix) and the remaining positional arguments.
pub type DynamicHandler<R, T> = fn(&R, Value, &[Value]) -> RepoResult<DynamicResult<T>>;

/// Verb prefixes and their handlers.
pub struct DispatchRegistry<R, T> {
    handlers: Vec<(&'static str, DynamicHandler<R, T>)>,
}

impl<R, T> Default for DispatchRegistry<R, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R, T> DispatchRegistry<R, T> {
    pub fn new() -> Self {
        DispatchRegistry {
            handlers: Vec::new(),
        }
    }

    pub fn register(mut self, prefix: &'static str, handler: DynamicHandler<R, T>) -> Self {
        self.handlers.push((prefix, handler));
        self
    }

    pub fn prefixes(&self) -> Vec<&'static str> {
        self.handlers.iter().map(|(prefix, _)| *prefix).collect()
    }

    /// Longest registered prefix of `method`, its handler and the rest of
    /// the name.
    pub fn resolve<'m>(
        &self,
        method: &'m str,
    ) -> Option<(&'static str, DynamicHandler<R, T>, &'m str)> {
        self.handlers
            .iter()
            .filter(|(prefix, _)| method.starts_with(prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map(|(prefix, handler)| (*prefix, *handler, &method[prefix.len()..]))
    }

    /// Validates `method` and `args` and runs the matching handler.
    ///
    /// # Errors
    ///
    /// * `NoSuchMethod` when no prefix matches.
    /// * `InvalidArgument` when `args` is empty or the field part names
    ///   neither a field nor an association.
    pub fn dispatch(
        &self,
        receiver: &R,
        metadata: &EntityMetadata,
        method: &str,
        mut args: Vec<Value>,
    ) -> RepoResult<DynamicResult<T>> {
        let class_name = metadata.name();
        let Some((prefix, handler, field_part)) = self.resolve(method) else {
            log::error!("Undefined dynamic method {}::{}", class_name, method);
            return Err(RepoError::new(
                &format!(
                    "Undefined method \"{}\". Method name must start with one of \"{}\"!",
                    method,
                    self.prefixes().iter().join("\", \"")
                ),
                ErrorKind::NoSuchMethod,
            ));
        };

        if args.is_empty() {
            log::error!("Dynamic method {}::{} called without arguments", class_name, method);
            return Err(RepoError::new(
                &format!("You need to pass a parameter to {}::{}", class_name, method),
                ErrorKind::InvalidArgument,
            ));
        }

        let first = args.remove(0);
        let criteria = if field_part.is_empty() {
            first
        } else {
            let field = camelize(field_part);
            if !metadata.has_field(&field) && !metadata.has_association(&field) {
                log::error!("Dynamic method {}::{} names unknown field {}", class_name, method, field);
                return Err(RepoError::new(
                    &format!(
                        "Invalid call to {}::{}. Field \"{}\" does not exist",
                        class_name, prefix, field
                    ),
                    ErrorKind::InvalidArgument,
                ));
            }

            let mut map = IndexMap::new();
            map.insert(field, first);
            Value::Map(map)
        };

        log::debug!("Dispatching {}::{} as {}", class_name, method, prefix);
        handler(receiver, criteria, &args)
    }
}

/// Positional order argument: a `{field: "ASC" | "DESC"}` map, absent or null.
pub fn order_arg(args: &[Value], index: usize) -> RepoResult<OrderBy> {
    match args.get(index) {
        None => Ok(OrderBy::new()),
        Some(value) => OrderBy::try_from(value),
    }
}

/// Positional integer argument; absent or null gives `None`.
pub fn int_arg(args: &[Value], index: usize, name: &str) -> RepoResult<Option<i64>> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            log::error!("Positional argument {} must be an integer, got {}", name, value);
            RepoError::new(
                &format!("Argument \"{}\" must be an integer. {} given", name, value),
                ErrorKind::InvalidArgument,
            )
        }),
    }
}

/// Positional non-negative integer argument.
pub fn count_arg(args: &[Value], index: usize, name: &str) -> RepoResult<Option<usize>> {
    match int_arg(args, index, name)? {
        Some(n) if n < 0 => {
            log::error!("Positional argument {} must not be negative, got {}", name, n);
            Err(RepoError::new(
                &format!("Argument \"{}\" cannot be negative. {} given", name, n),
                ErrorKind::InvalidArgument,
            ))
        }
        other => Ok(other.map(|n| n as usize)),
    }
}

/// Positional flag; absent or null gives `false`.
pub fn bool_arg(args: &[Value], index: usize, name: &str) -> RepoResult<bool> {
    match args.get(index) {
        None | Some(Value::Null) => Ok(false),
        Some(value) => value.as_bool().ok_or_else(|| {
            log::error!("Positional argument {} must be a boolean, got {}", name, value);
            RepoError::new(
                &format!("Argument \"{}\" must be a boolean. {} given", name, value),
                ErrorKind::InvalidArgument,
            )
        }),
    }
}
