//! Entity contract and mapping metadata.

use crate::common::{Document, Value};
use indexmap::IndexSet;

/// Mapping metadata of a managed entity type.
///
/// Dynamic dispatch and criteria translation consult it to decide whether a
/// name refers to a mapped field or association.
///
/// ```rust
/// use repokit::entity::EntityMetadata;
///
/// let metadata = EntityMetadata::new("User", "id")
///     .field("userName")
///     .association("group");
/// assert!(metadata.has_field("id"));
/// assert!(metadata.has_association("group"));
/// assert!(!metadata.has_field("group"));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct EntityMetadata {
    name: String,
    id_field: String,
    fields: IndexSet<String>,
    associations: IndexSet<String>,
}

impl EntityMetadata {
    pub fn new(name: &str, id_field: &str) -> Self {
        let mut fields = IndexSet::new();
        fields.insert(id_field.to_string());
        EntityMetadata {
            name: name.to_string(),
            id_field: id_field.to_string(),
            fields,
            associations: IndexSet::new(),
        }
    }

    pub fn field(mut self, name: &str) -> Self {
        self.fields.insert(name.to_string());
        self
    }

    pub fn association(mut self, name: &str) -> Self {
        self.associations.insert(name.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn id_field(&self) -> &str {
        &self.id_field
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.fields.contains(name)
    }

    pub fn has_association(&self, name: &str) -> bool {
        self.associations.contains(name)
    }

    pub fn field_names(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

/// A type managed by a persistence session.
///
/// `Default` backs `get_new`/`create_new`; `to_document` exposes field values
/// to the query engine.
pub trait Entity: Clone + Default + Send + Sync + 'static {
    /// Mapping metadata of this type.
    fn metadata() -> EntityMetadata;

    /// Identifier value; must not be `Value::Null` once persisted.
    fn id(&self) -> Value;

    fn to_document(&self) -> Document;

    fn entity_name() -> String {
        Self::metadata().name().to_string()
    }
}
