use crate::common::Value;
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Debug, Display, Formatter};

/// An ordered field map describing one entity as the query engine sees it.
///
/// Missing fields read as [`Value::Null`], which is what makes null criteria
/// match entities that never set the field.
///
/// ```rust
/// use repokit::doc;
/// use repokit::common::Value;
///
/// let doc = doc! { "name": "alice", "age": 30 };
/// assert_eq!(doc.get("name"), Value::from("alice"));
/// assert!(doc.get("missing").is_null());
/// ```
#[derive(Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates `value` with `key`, replacing any previous value.
    pub fn put<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) {
        self.data.insert(key.into(), value.into());
    }

    /// Returns the value of `key`, or `Value::Null` when the field is absent.
    pub fn get(&self, key: &str) -> Value {
        self.data.get(key).cloned().unwrap_or_default()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }
}

impl From<Document> for Value {
    fn from(document: Document) -> Self {
        Value::Map(document.data)
    }
}

impl From<IndexMap<String, Value>> for Document {
    fn from(data: IndexMap<String, Value>) -> Self {
        Document { data }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.data
                .iter()
                .map(|(k, v)| format!("\"{}\": {}", k, v))
                .join(", ")
        )
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

/// Builds a [`Document`] from `"field": value` pairs.
#[macro_export]
macro_rules! doc {
    () => {
        $crate::common::Document::new()
    };
    ($($key:literal : $value:expr),+ $(,)?) => {{
        let mut doc = $crate::common::Document::new();
        $(doc.put($key, $value);)+
        doc
    }};
}
