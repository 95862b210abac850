//! Cursor-based document backend.
//!
//! Queries run through cursors. A query may ask for an eager cursor, which
//! loads every match on first access; counting always goes through the lazy
//! cursor underneath so it never loads documents.

use crate::common::{Document, OrderBy, SortOrder, Value};
use crate::criteria::{Condition, QueryTranslator};
use crate::entity::{Entity, EntityMetadata};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::EventManager;
use crate::filter::FilterCollection;
use crate::pager::PaginatorAdapter;
use crate::repository::Repository;
use crate::session::{PersistenceSession, SessionContext, UnitOfWork};
use indexmap::IndexMap;
use std::fmt::{Display, Formatter};

/// Repository over the cursor-based document backend.
pub type MongoRepository<T> = Repository<T, MongoTranslator, MongoSession<T>>;

/// A find (or count) against one collection.
#[derive(Clone, Debug, PartialEq)]
pub struct DocumentQuery {
    collection: String,
    conditions: Vec<Condition>,
    sort: OrderBy,
    skip: usize,
    limit: Option<usize>,
    count: bool,
    eager: bool,
}

impl DocumentQuery {
    pub fn for_collection(collection: &str) -> Self {
        DocumentQuery {
            collection: collection.to_string(),
            conditions: Vec::new(),
            sort: OrderBy::new(),
            skip: 0,
            limit: None,
            count: false,
            eager: false,
        }
    }

    /// Adds `field == value`; a null value matches null or missing fields.
    pub fn equals(mut self, field: &str, value: Value) -> Self {
        self.conditions
            .push(Condition::Equals(field.to_string(), value));
        self
    }

    pub fn is_in(mut self, field: &str, values: Vec<Value>) -> Self {
        self.conditions.push(Condition::In(field.to_string(), values));
        self
    }

    pub fn sort(mut self, field: &str, order: SortOrder) -> Self {
        self.sort = self.sort.add(field, order);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: Option<usize>) -> Self {
        self.limit = limit;
        self
    }

    pub fn count(mut self) -> Self {
        self.count = true;
        self
    }

    pub fn eager_cursor(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    /// The filter as a query document, e.g. `{"role": {"$in": ["a"]}}`.
    pub fn filter_document(&self) -> Document {
        let mut filter = Document::new();
        for condition in &self.conditions {
            match condition {
                Condition::Equals(field, value) => filter.put(field.as_str(), value.clone()),
                Condition::IsNull(field) => filter.put(field.as_str(), Value::Null),
                Condition::In(field, values) => {
                    let mut operator = IndexMap::new();
                    operator.insert("$in".to_string(), Value::Array(values.clone()));
                    filter.put(field.as_str(), Value::Map(operator));
                }
            }
        }
        filter
    }
}

impl Display for DocumentQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let verb = if self.count { "count" } else { "find" };
        write!(f, "db.{}.{}({})", self.collection, verb, self.filter_document())?;
        if !self.sort.is_empty() {
            write!(f, ".sort({})", self.sort)?;
        }
        if self.skip > 0 {
            write!(f, ".skip({})", self.skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, ".limit({})", limit)?;
        }
        Ok(())
    }
}

/// Streams matches on demand.
pub struct LazyCursor<T: Entity> {
    unit_of_work: UnitOfWork<T>,
    query: DocumentQuery,
}

impl<T: Entity> LazyCursor<T> {
    pub fn query(&self) -> &DocumentQuery {
        &self.query
    }

    /// Number of matches, ignoring skip and limit.
    pub fn count(&self) -> usize {
        self.unit_of_work.count(&self.query.conditions)
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.unit_of_work.select(
            &self.query.conditions,
            &self.query.sort,
            self.query.skip,
            self.query.limit,
        )
    }
}

/// Loads every match of the wrapped cursor on first access and keeps it.
pub struct EagerCursor<T: Entity> {
    cursor: LazyCursor<T>,
    data: Option<Vec<T>>,
}

impl<T: Entity> EagerCursor<T> {
    pub fn new(cursor: LazyCursor<T>) -> Self {
        EagerCursor { cursor, data: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.data.is_some()
    }

    pub fn initialize(&mut self) -> &[T] {
        let cursor = &self.cursor;
        self.data.get_or_insert_with(|| cursor.to_vec())
    }

    /// Counts by loading; prefer the lazy cursor from [`EagerCursor::into_inner`].
    pub fn count(&mut self) -> usize {
        self.initialize().len()
    }

    pub fn to_vec(mut self) -> Vec<T> {
        self.initialize();
        self.data.unwrap_or_default()
    }

    pub fn into_inner(self) -> LazyCursor<T> {
        self.cursor
    }
}

pub enum Cursor<T: Entity> {
    Lazy(LazyCursor<T>),
    Eager(EagerCursor<T>),
}

impl<T: Entity> Cursor<T> {
    pub fn to_vec(self) -> Vec<T> {
        match self {
            Cursor::Lazy(cursor) => cursor.to_vec(),
            Cursor::Eager(cursor) => cursor.to_vec(),
        }
    }

    /// The lazy cursor, unwrapping an eager one without loading it.
    pub fn into_lazy(self) -> LazyCursor<T> {
        match self {
            Cursor::Lazy(cursor) => cursor,
            Cursor::Eager(cursor) => cursor.into_inner(),
        }
    }
}

#[derive(Clone)]
pub struct MongoTranslator {
    metadata: EntityMetadata,
}

impl QueryTranslator for MongoTranslator {
    type Query = DocumentQuery;

    fn for_metadata(metadata: EntityMetadata) -> Self {
        MongoTranslator { metadata }
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn base_query(&self) -> DocumentQuery {
        DocumentQuery::for_collection(self.metadata.name())
    }

    fn null_predicate(&self, query: DocumentQuery, field: &str, _position: usize) -> DocumentQuery {
        query.equals(field, Value::Null)
    }

    fn equals_predicate(
        &self,
        query: DocumentQuery,
        field: &str,
        value: Value,
        _position: usize,
    ) -> DocumentQuery {
        query.equals(field, value)
    }

    fn in_predicate(
        &self,
        query: DocumentQuery,
        field: &str,
        values: Vec<Value>,
        _position: usize,
    ) -> DocumentQuery {
        query.is_in(field, values)
    }

    fn order(&self, query: DocumentQuery, order_by: &OrderBy) -> DocumentQuery {
        order_by
            .sorting_order()
            .iter()
            .fold(query, |q, (field, order)| q.sort(field, *order))
    }

    fn window(&self, query: DocumentQuery, offset: usize, limit: Option<usize>) -> DocumentQuery {
        query.skip(offset).limit(limit)
    }

    fn count(&self, query: DocumentQuery) -> DocumentQuery {
        query.count()
    }
}

/// In-memory cursor-based session. Counts come back as 64-bit integers.
pub struct MongoSession<T: Entity> {
    unit_of_work: UnitOfWork<T>,
}

impl<T: Entity> Clone for MongoSession<T> {
    fn clone(&self) -> Self {
        MongoSession {
            unit_of_work: self.unit_of_work.clone(),
        }
    }
}

impl<T: Entity> MongoSession<T> {
    pub fn new(context: &SessionContext) -> RepoResult<Self> {
        Ok(MongoSession {
            unit_of_work: context.unit_of_work::<T>()?,
        })
    }

    /// Opens a cursor, eager when the query asks for it.
    pub fn cursor(&self, query: &DocumentQuery) -> RepoResult<Cursor<T>> {
        let name = self.unit_of_work.metadata().name();
        if query.collection() != name {
            log::error!("Query {} does not target {}", query, name);
            return Err(RepoError::new(
                &format!(
                    "Query targets collection {} but the session manages {}",
                    query.collection(),
                    name
                ),
                ErrorKind::BackendError,
            ));
        }

        let cursor = LazyCursor {
            unit_of_work: self.unit_of_work.clone(),
            query: query.clone(),
        };
        if query.is_eager() {
            Ok(Cursor::Eager(EagerCursor::new(cursor)))
        } else {
            Ok(Cursor::Lazy(cursor))
        }
    }
}

impl<T: Entity> PersistenceSession<T> for MongoSession<T> {
    type Query = DocumentQuery;

    fn persist(&self, entity: T) -> RepoResult<()> {
        self.unit_of_work.persist(entity)
    }

    fn remove(&self, entity: &T) -> RepoResult<()> {
        self.unit_of_work.remove(entity)
    }

    fn flush(&self) -> RepoResult<()> {
        self.unit_of_work.flush()
    }

    fn refresh(&self, entity: &mut T) -> RepoResult<()> {
        self.unit_of_work.refresh(entity)
    }

    fn detach(&self, entity: &T) -> RepoResult<()> {
        self.unit_of_work.detach(entity);
        Ok(())
    }

    fn find(&self, id: &Value) -> RepoResult<Option<T>> {
        Ok(self.unit_of_work.find(id))
    }

    fn find_all(&self) -> RepoResult<Vec<T>> {
        Ok(self.unit_of_work.select(&[], &OrderBy::new(), 0, None))
    }

    fn execute(&self, query: &DocumentQuery) -> RepoResult<Vec<T>> {
        if query.is_count() {
            log::error!("Count query {} passed to execute", query);
            return Err(RepoError::new(
                "A count query returns a scalar, use count instead",
                ErrorKind::BackendError,
            ));
        }
        log::debug!("Executing {}", query);
        Ok(self.cursor(query)?.to_vec())
    }

    fn count(&self, query: &DocumentQuery) -> RepoResult<Value> {
        log::debug!("Counting {}", query);
        let count = self.cursor(query)?.into_lazy().count();
        Ok(Value::I64(count as i64))
    }

    fn adapter(&self, query: DocumentQuery) -> Box<dyn PaginatorAdapter<T>> {
        Box::new(MongoPaginatorAdapter {
            session: self.clone(),
            query,
        })
    }

    fn metadata(&self) -> EntityMetadata {
        self.unit_of_work.metadata().clone()
    }

    fn event_manager(&self) -> EventManager {
        self.unit_of_work.event_manager()
    }

    fn filters(&self) -> FilterCollection {
        self.unit_of_work.filters()
    }

    fn session_id(&self) -> String {
        self.unit_of_work.session_id().to_string()
    }
}

struct MongoPaginatorAdapter<T: Entity> {
    session: MongoSession<T>,
    query: DocumentQuery,
}

impl<T: Entity> PaginatorAdapter<T> for MongoPaginatorAdapter<T> {
    fn items(&self, offset: usize, count: usize) -> RepoResult<Vec<T>> {
        let query = self.query.clone().skip(offset).limit(Some(count));
        Ok(self.session.cursor(&query)?.to_vec())
    }

    fn count(&self) -> RepoResult<usize> {
        Ok(self.session.cursor(&self.query)?.into_lazy().count())
    }
}
