//! Selector-based document backend.
//!
//! Queries are Mango-style selectors: each field maps to an operator object
//! such as `{"$eq": value}` or `{"$in": [values]}`.

use crate::common::{OrderBy, SortOrder, Value};
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

/// Repository over the selector-based document backend.
pub type CouchRepository<T> = Repository<T, CouchTranslator, CouchSession<T>>;

const EQ: &str = "$eq";
const IN: &str = "$in";

#[derive(Clone, Debug, PartialEq)]
pub struct SelectorQuery {
    doc_type: String,
    selector: IndexMap<String, Value>,
    sort: OrderBy,
    skip: usize,
    limit: Option<usize>,
    count: bool,
}

impl SelectorQuery {
    pub fn for_type(doc_type: &str) -> Self {
        SelectorQuery {
            doc_type: doc_type.to_string(),
            selector: IndexMap::new(),
            sort: OrderBy::new(),
            skip: 0,
            limit: None,
            count: false,
        }
    }

    /// Builds a query from a raw selector map.
    ///
    /// # Errors
    ///
    /// `InvalidArgument` when `selector` is not a map.
    pub fn from_selector(doc_type: &str, selector: Value) -> RepoResult<Self> {
        match selector {
            Value::Map(selector) => Ok(SelectorQuery {
                selector,
                ..SelectorQuery::for_type(doc_type)
            }),
            other => {
                log::error!("Invalid selector {}", other);
                Err(RepoError::new(
                    "Selector must be a map of field to operator",
                    ErrorKind::InvalidArgument,
                ))
            }
        }
    }

    pub fn eq(self, field: &str, value: Value) -> Self {
        self.operator(field, EQ, value)
    }

    pub fn in_values(self, field: &str, values: Vec<Value>) -> Self {
        self.operator(field, IN, Value::Array(values))
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

    pub fn doc_type(&self) -> &str {
        &self.doc_type
    }

    pub fn selector(&self) -> &IndexMap<String, Value> {
        &self.selector
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    fn operator(mut self, field: &str, operator: &str, operand: Value) -> Self {
        let mut op = IndexMap::new();
        op.insert(operator.to_string(), operand);
        self.selector.insert(field.to_string(), Value::Map(op));
        self
    }

    /// Reads the selector into conditions. A bare value means equality.
    fn conditions(&self) -> RepoResult<Vec<Condition>> {
        let mut conditions = Vec::with_capacity(self.selector.len());
        for (field, expression) in &self.selector {
            let operators = match expression {
                Value::Map(operators) => operators,
                value => {
                    conditions.push(Condition::Equals(field.clone(), value.clone()));
                    continue;
                }
            };

            for (operator, operand) in operators {
                let condition = match (operator.as_str(), operand) {
                    (EQ, value) => Condition::Equals(field.clone(), value.clone()),
                    (IN, Value::Array(values)) => Condition::In(field.clone(), values.clone()),
                    (op, operand) => {
                        log::error!("Unsupported selector {} {} on {}", op, operand, field);
                        return Err(RepoError::new(
                            &format!("Unsupported selector operator \"{}\" on {}", op, field),
                            ErrorKind::BackendError,
                        ));
                    }
                };
                conditions.push(condition);
            }
        }
        Ok(conditions)
    }
}

impl Display for SelectorQuery {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{\"type\": \"{}\", \"selector\": {}",
            self.doc_type,
            Value::Map(self.selector.clone())
        )?;
        if !self.sort.is_empty() {
            write!(f, ", \"sort\": \"{}\"", self.sort)?;
        }
        if self.skip > 0 {
            write!(f, ", \"skip\": {}", self.skip)?;
        }
        if let Some(limit) = self.limit {
            write!(f, ", \"limit\": {}", limit)?;
        }
        write!(f, "}}")
    }
}

#[derive(Clone)]
pub struct CouchTranslator {
    metadata: EntityMetadata,
}

impl QueryTranslator for CouchTranslator {
    type Query = SelectorQuery;

    fn for_metadata(metadata: EntityMetadata) -> Self {
        CouchTranslator { metadata }
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn base_query(&self) -> SelectorQuery {
        SelectorQuery::for_type(self.metadata.name())
    }

    fn null_predicate(&self, query: SelectorQuery, field: &str, _position: usize) -> SelectorQuery {
        query.eq(field, Value::Null)
    }

    fn equals_predicate(
        &self,
        query: SelectorQuery,
        field: &str,
        value: Value,
        _position: usize,
    ) -> SelectorQuery {
        query.eq(field, value)
    }

    fn in_predicate(
        &self,
        query: SelectorQuery,
        field: &str,
        values: Vec<Value>,
        _position: usize,
    ) -> SelectorQuery {
        query.in_values(field, values)
    }

    fn order(&self, query: SelectorQuery, order_by: &OrderBy) -> SelectorQuery {
        order_by
            .sorting_order()
            .iter()
            .fold(query, |q, (field, order)| q.sort(field, *order))
    }

    fn window(&self, query: SelectorQuery, offset: usize, limit: Option<usize>) -> SelectorQuery {
        query.skip(offset).limit(limit)
    }

    fn count(&self, query: SelectorQuery) -> SelectorQuery {
        query.count()
    }
}

/// In-memory selector session. Counts come back as unsigned integers.
pub struct CouchSession<T: Entity> {
    unit_of_work: UnitOfWork<T>,
}

impl<T: Entity> Clone for CouchSession<T> {
    fn clone(&self) -> Self {
        CouchSession {
            unit_of_work: self.unit_of_work.clone(),
        }
    }
}

impl<T: Entity> CouchSession<T> {
    pub fn new(context: &SessionContext) -> RepoResult<Self> {
        Ok(CouchSession {
            unit_of_work: context.unit_of_work::<T>()?,
        })
    }

    fn prepare(&self, query: &SelectorQuery) -> RepoResult<Vec<Condition>> {
        let name = self.unit_of_work.metadata().name();
        if query.doc_type() != name {
            log::error!("Query {} does not target {}", query, name);
            return Err(RepoError::new(
                &format!(
                    "Query targets type {} but the session manages {}",
                    query.doc_type(),
                    name
                ),
                ErrorKind::BackendError,
            ));
        }
        query.conditions()
    }
}

impl<T: Entity> PersistenceSession<T> for CouchSession<T> {
    type Query = SelectorQuery;

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

    fn execute(&self, query: &SelectorQuery) -> RepoResult<Vec<T>> {
        if query.is_count() {
            log::error!("Count query {} passed to execute", query);
            return Err(RepoError::new(
                "A count query returns a scalar, use count instead",
                ErrorKind::BackendError,
            ));
        }

        let conditions = self.prepare(query)?;
        log::debug!("Executing {}", query);
        Ok(self
            .unit_of_work
            .select(&conditions, &query.sort, query.skip, query.limit))
    }

    fn count(&self, query: &SelectorQuery) -> RepoResult<Value> {
        let conditions = self.prepare(query)?;
        log::debug!("Counting {}", query);
        Ok(Value::U64(self.unit_of_work.count(&conditions) as u64))
    }

    fn adapter(&self, query: SelectorQuery) -> Box<dyn PaginatorAdapter<T>> {
        Box::new(CouchPaginatorAdapter {
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

struct CouchPaginatorAdapter<T: Entity> {
    session: CouchSession<T>,
    query: SelectorQuery,
}

impl<T: Entity> PaginatorAdapter<T> for CouchPaginatorAdapter<T> {
    fn items(&self, offset: usize, count: usize) -> RepoResult<Vec<T>> {
        let query = self.query.clone().skip(offset).limit(Some(count));
        self.session.execute(&query)
    }

    fn count(&self) -> RepoResult<usize> {
        self.session.count(&self.query)?.to_count()
    }
}
