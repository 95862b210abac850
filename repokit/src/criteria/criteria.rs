use crate::common::Value;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Insertion-ordered `field -> value` filter map.
///
/// A `Value::Null` value selects entities whose field is null, an array value
/// selects entities whose field is one of its elements and any other value
/// selects by equality. All entries are conjoined.
///
/// ```rust
/// use repokit::criteria;
/// use repokit::common::Value;
///
/// let criteria = criteria! { "role": vec!["admin", "staff"], "deletedAt": Value::Null };
/// assert_eq!(criteria.len(), 2);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Criteria {
    fields: IndexMap<String, Value>,
}

impl Criteria {
    /// Criteria without entries; matches every entity.
    pub fn new() -> Self {
        Criteria {
            fields: IndexMap::new(),
        }
    }

    pub fn with<V: Into<Value>>(mut self, field: &str, value: V) -> Self {
        self.insert(field, value);
        self
    }

    pub fn insert<V: Into<Value>>(&mut self, field: &str, value: V) {
        self.fields.insert(field.to_string(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }
}

impl IntoIterator for Criteria {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Criteria {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Criteria {
            fields: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

impl From<IndexMap<String, Value>> for Criteria {
    fn from(fields: IndexMap<String, Value>) -> Self {
        Criteria { fields }
    }
}

impl TryFrom<Value> for Criteria {
    type Error = RepoError;

    fn try_from(value: Value) -> RepoResult<Self> {
        match value {
            Value::Map(fields) => Ok(Criteria { fields }),
            other => {
                log::error!("Invalid criteria {}", other);
                Err(RepoError::new(
                    "Criteria must be a field map or a native query",
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }
}

impl Display for Criteria {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.fields
                .iter()
                .map(|(k, v)| format!("{}: {}", k, v))
                .join(", ")
        )
    }
}

/// What a query is built from.
///
/// `Dynamic` carries untyped input (for instance the first argument of a
/// dynamic finder) and must hold a `Value::Map`.
#[derive(Clone, Debug)]
pub enum QuerySource<Q> {
    Criteria(Criteria),
    Native(Q),
    Dynamic(Value),
}

impl<Q> QuerySource<Q> {
    /// Wraps a backend-native query so it bypasses translation.
    pub fn native(query: Q) -> Self {
        QuerySource::Native(query)
    }
}

impl<Q> Default for QuerySource<Q> {
    fn default() -> Self {
        QuerySource::Criteria(Criteria::new())
    }
}

impl<Q> From<Criteria> for QuerySource<Q> {
    fn from(criteria: Criteria) -> Self {
        QuerySource::Criteria(criteria)
    }
}

impl<Q> From<Value> for QuerySource<Q> {
    fn from(value: Value) -> Self {
        QuerySource::Dynamic(value)
    }
}

/// Builds a [`Criteria`] from `"field": value` pairs.
#[macro_export]
macro_rules! criteria {
    () => {
        $crate::criteria::Criteria::new()
    };
    ($($field:literal : $value:expr),+ $(,)?) => {{
        let mut criteria = $crate::criteria::Criteria::new();
        $(criteria.insert($field, $value);)+
        criteria
    }};
}
