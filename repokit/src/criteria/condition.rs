use crate::common::{Document, Value};
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A resolved predicate evaluated against entity documents.
///
/// Backends translate their native query form into conditions right before
/// execution, after parameters are bound.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    Equals(String, Value),
    IsNull(String),
    In(String, Vec<Value>),
}

impl Condition {
    pub fn field(&self) -> &str {
        match self {
            Condition::Equals(field, _) | Condition::IsNull(field) | Condition::In(field, _) => {
                field
            }
        }
    }

    pub fn matches(&self, document: &Document) -> bool {
        match self {
            Condition::Equals(field, value) => document.get(field) == *value,
            Condition::IsNull(field) => document.get(field).is_null(),
            Condition::In(field, values) => {
                let actual = document.get(field);
                values.iter().any(|v| *v == actual)
            }
        }
    }
}

/// True when `document` satisfies every condition.
pub fn matches_all(conditions: &[Condition], document: &Document) -> bool {
    conditions.iter().all(|c| c.matches(document))
}

impl Display for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Condition::Equals(field, value) => write!(f, "{} == {}", field, value),
            Condition::IsNull(field) => write!(f, "{} IS NULL", field),
            Condition::In(field, values) => {
                write!(f, "{} IN ({})", field, values.iter().join(", "))
            }
        }
    }
}
