use crate::common::{OrderBy, Value};
use crate::criteria::{Criteria, QuerySource};
use crate::entity::EntityMetadata;
use crate::errors::{ErrorKind, RepoError, RepoResult};

/// Turns criteria into a backend's native query and shapes that query for
/// ordering, windowing and counting.
///
/// Implementors only describe how one predicate is appended; the conjunction
/// of criteria entries, field validation and native-query passthrough live in
/// [`QueryTranslator::translate`].
pub trait QueryTranslator: Clone + Send + Sync + 'static {
    /// Backend-native query handle.
    type Query: Clone + Send + Sync + 'static;

    fn for_metadata(metadata: EntityMetadata) -> Self;

    fn metadata(&self) -> &EntityMetadata;

    /// Query selecting every entity of the managed type.
    fn base_query(&self) -> Self::Query;

    /// Appends a predicate matching a null `field`.
    fn null_predicate(&self, query: Self::Query, field: &str, position: usize) -> Self::Query;

    /// Appends a predicate matching `field == value`.
    fn equals_predicate(
        &self,
        query: Self::Query,
        field: &str,
        value: Value,
        position: usize,
    ) -> Self::Query;

    /// Appends a predicate matching `field` against any of `values`.
    fn in_predicate(
        &self,
        query: Self::Query,
        field: &str,
        values: Vec<Value>,
        position: usize,
    ) -> Self::Query;

    fn order(&self, query: Self::Query, order_by: &OrderBy) -> Self::Query;

    /// Restricts the query to `[offset, offset + limit)`; `None` leaves the
    /// upper bound open.
    fn window(&self, query: Self::Query, offset: usize, limit: Option<usize>) -> Self::Query;

    /// Turns the query into a count query.
    fn count(&self, query: Self::Query) -> Self::Query;

    /// Builds a native query from `source`.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when a dynamic source is not a map or when a
    /// criteria field is neither a field nor an association of the entity.
    fn translate(&self, source: QuerySource<Self::Query>) -> RepoResult<Self::Query> {
        match source {
            QuerySource::Native(query) => Ok(query),
            QuerySource::Dynamic(value) => {
                self.translate(QuerySource::Criteria(Criteria::try_from(value)?))
            }
            QuerySource::Criteria(criteria) => {
                let metadata = self.metadata();
                let mut query = self.base_query();
                for (position, (field, value)) in criteria.into_iter().enumerate() {
                    if !metadata.has_field(&field) && !metadata.has_association(&field) {
                        log::error!("Unknown field {} in criteria for {}", field, metadata.name());
                        return Err(RepoError::new(
                            &format!("Field \"{}\" does not exist on {}", field, metadata.name()),
                            ErrorKind::InvalidArgument,
                        ));
                    }

                    query = match value {
                        Value::Null => self.null_predicate(query, &field, position),
                        Value::Array(values) => self.in_predicate(query, &field, values, position),
                        value => self.equals_predicate(query, &field, value, position),
                    };
                }
                Ok(query)
            }
        }
    }
}

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Deterministic bind-parameter name for the predicate at `position` on
/// `field`, e.g. `name_d54846`.
///
/// The suffix is the low 24 bits of a 64-bit FNV-1a hash over the field
/// bytes followed by the little-endian position, so names are identical
/// across builds and toolchains.
pub fn parameter_name(field: &str, position: usize) -> String {
    let suffix = field
        .bytes()
        .chain((position as u64).to_le_bytes())
        .fold(FNV_OFFSET_BASIS, |hash, byte| {
            (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
        })
        & 0xff_ffff;
    let base: String = field
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    format!("{}_{:06x}", base, suffix)
}
