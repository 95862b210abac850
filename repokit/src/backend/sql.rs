//! Relational backend: DQL-style select queries with named parameters.

use crate::common::{OrderBy, SortOrder, Value};
use crate::criteria::{parameter_name, Condition, QueryTranslator};
use crate::entity::{Entity, EntityMetadata};
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::EventManager;
use crate::filter::FilterCollection;
use crate::pager::PaginatorAdapter;
use crate::repository::Repository;
use crate::session::{PersistenceSession, SessionContext, UnitOfWork};
use indexmap::IndexMap;
use itertools::Itertools;

/// Repository over the relational backend.
pub type SqlRepository<T> = Repository<T, SqlTranslator, SqlSession<T>>;

/// One `WHERE` predicate. Values never appear in the query text; they are
/// bound through the query's parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlPredicate {
    Compare { field: String, parameter: String },
    IsNull { field: String },
    In { field: String, parameter: String },
}

/// A select query against one entity.
///
/// ```rust
/// use repokit::backend::{SqlPredicate, SqlQuery};
/// use repokit::common::{SortOrder, Value};
///
/// let query = SqlQuery::select("User", "e")
///     .and_where(SqlPredicate::Compare { field: "role".into(), parameter: "role".into() })
///     .set_parameter("role", Value::from("admin"))
///     .add_order_by("name", SortOrder::Ascending);
/// assert_eq!(query.dql(), "SELECT e FROM User e WHERE e.role = :role ORDER BY e.name ASC");
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct SqlQuery {
    entity: String,
    alias: String,
    predicates: Vec<SqlPredicate>,
    parameters: IndexMap<String, Value>,
    order_by: OrderBy,
    first_result: usize,
    max_results: Option<usize>,
    count: bool,
}

impl SqlQuery {
    pub fn select(entity: &str, alias: &str) -> Self {
        SqlQuery {
            entity: entity.to_string(),
            alias: alias.to_string(),
            predicates: Vec::new(),
            parameters: IndexMap::new(),
            order_by: OrderBy::new(),
            first_result: 0,
            max_results: None,
            count: false,
        }
    }

    pub fn and_where(mut self, predicate: SqlPredicate) -> Self {
        self.predicates.push(predicate);
        self
    }

    pub fn set_parameter(mut self, name: &str, value: Value) -> Self {
        self.parameters.insert(name.to_string(), value);
        self
    }

    pub fn add_order_by(mut self, field: &str, order: SortOrder) -> Self {
        self.order_by = self.order_by.add(field, order);
        self
    }

    pub fn set_first_result(mut self, first_result: usize) -> Self {
        self.first_result = first_result;
        self
    }

    pub fn set_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    /// Replaces the projection with `COUNT(alias)`; ordering and window are
    /// dropped.
    pub fn select_count(mut self) -> Self {
        self.count = true;
        self.order_by = OrderBy::new();
        self.first_result = 0;
        self.max_results = None;
        self
    }

    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn predicates(&self) -> &[SqlPredicate] {
        &self.predicates
    }

    pub fn parameter(&self, name: &str) -> Option<&Value> {
        self.parameters.get(name)
    }

    pub fn parameters(&self) -> &IndexMap<String, Value> {
        &self.parameters
    }

    pub fn first_result(&self) -> usize {
        self.first_result
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }

    pub fn is_count(&self) -> bool {
        self.count
    }

    /// Query text with `:name` placeholders.
    pub fn dql(&self) -> String {
        let projection = if self.count {
            format!("COUNT({})", self.alias)
        } else {
            self.alias.clone()
        };
        let mut dql = format!("SELECT {} FROM {} {}", projection, self.entity, self.alias);

        if !self.predicates.is_empty() {
            let clauses = self
                .predicates
                .iter()
                .map(|p| match p {
                    SqlPredicate::Compare { field, parameter } => {
                        format!("{}.{} = :{}", self.alias, field, parameter)
                    }
                    SqlPredicate::IsNull { field } => format!("{}.{} IS NULL", self.alias, field),
                    SqlPredicate::In { field, parameter } => {
                        format!("{}.{} IN (:{})", self.alias, field, parameter)
                    }
                })
                .join(" AND ");
            dql.push_str(" WHERE ");
            dql.push_str(&clauses);
        }

        if !self.order_by.is_empty() {
            let order = self
                .order_by
                .sorting_order()
                .iter()
                .map(|(field, order)| format!("{}.{} {}", self.alias, field, order.keyword()))
                .join(", ");
            dql.push_str(" ORDER BY ");
            dql.push_str(&order);
        }
        dql
    }

    /// Resolves predicates against the bound parameters.
    fn bind(&self) -> RepoResult<Vec<Condition>> {
        self.predicates
            .iter()
            .map(|predicate| match predicate {
                SqlPredicate::IsNull { field } => Ok(Condition::IsNull(field.clone())),
                SqlPredicate::Compare { field, parameter } => {
                    let value = self.bound(parameter)?;
                    Ok(Condition::Equals(field.clone(), value.clone()))
                }
                SqlPredicate::In { field, parameter } => match self.bound(parameter)? {
                    Value::Array(values) => Ok(Condition::In(field.clone(), values.clone())),
                    other => Ok(Condition::In(field.clone(), vec![other.clone()])),
                },
            })
            .collect()
    }

    fn bound(&self, parameter: &str) -> RepoResult<&Value> {
        self.parameters.get(parameter).ok_or_else(|| {
            log::error!("Unbound parameter {} in {}", parameter, self.dql());
            RepoError::new(
                &format!("Parameter \":{}\" is not bound", parameter),
                ErrorKind::BackendError,
            )
        })
    }
}

/// Builds [`SqlQuery`] values aliased `e`.
#[derive(Clone)]
pub struct SqlTranslator {
    metadata: EntityMetadata,
}

const ALIAS: &str = "e";

impl QueryTranslator for SqlTranslator {
    type Query = SqlQuery;

    fn for_metadata(metadata: EntityMetadata) -> Self {
        SqlTranslator { metadata }
    }

    fn metadata(&self) -> &EntityMetadata {
        &self.metadata
    }

    fn base_query(&self) -> SqlQuery {
        SqlQuery::select(self.metadata.name(), ALIAS)
    }

    fn null_predicate(&self, query: SqlQuery, field: &str, _position: usize) -> SqlQuery {
        query.and_where(SqlPredicate::IsNull {
            field: field.to_string(),
        })
    }

    fn equals_predicate(
        &self,
        query: SqlQuery,
        field: &str,
        value: Value,
        position: usize,
    ) -> SqlQuery {
        let parameter = parameter_name(field, position);
        query
            .and_where(SqlPredicate::Compare {
                field: field.to_string(),
                parameter: parameter.clone(),
            })
            .set_parameter(&parameter, value)
    }

    fn in_predicate(
        &self,
        query: SqlQuery,
        field: &str,
        values: Vec<Value>,
        position: usize,
    ) -> SqlQuery {
        let parameter = parameter_name(field, position);
        query
            .and_where(SqlPredicate::In {
                field: field.to_string(),
                parameter: parameter.clone(),
            })
            .set_parameter(&parameter, Value::Array(values))
    }

    fn order(&self, query: SqlQuery, order_by: &OrderBy) -> SqlQuery {
        order_by
            .sorting_order()
            .iter()
            .fold(query, |q, (field, order)| q.add_order_by(field, *order))
    }

    fn window(&self, query: SqlQuery, offset: usize, limit: Option<usize>) -> SqlQuery {
        query.set_first_result(offset).set_max_results(limit)
    }

    fn count(&self, query: SqlQuery) -> SqlQuery {
        query.select_count()
    }
}

/// In-memory relational session. Counts come back as numeric strings, the
/// way scalar results of SQL drivers do.
pub struct SqlSession<T: Entity> {
    unit_of_work: UnitOfWork<T>,
}

impl<T: Entity> Clone for SqlSession<T> {
    fn clone(&self) -> Self {
        SqlSession {
            unit_of_work: self.unit_of_work.clone(),
        }
    }
}

impl<T: Entity> SqlSession<T> {
    pub fn new(context: &SessionContext) -> RepoResult<Self> {
        Ok(SqlSession {
            unit_of_work: context.unit_of_work::<T>()?,
        })
    }

    fn check_target(&self, query: &SqlQuery) -> RepoResult<Vec<Condition>> {
        let name = self.unit_of_work.metadata().name();
        if query.entity() != name {
            log::error!("Query {} does not select {}", query.dql(), name);
            return Err(RepoError::new(
                &format!("Query selects {} but the session manages {}", query.entity(), name),
                ErrorKind::BackendError,
            ));
        }
        query.bind()
    }
}

impl<T: Entity> PersistenceSession<T> for SqlSession<T> {
    type Query = SqlQuery;

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

    fn execute(&self, query: &SqlQuery) -> RepoResult<Vec<T>> {
        if query.is_count() {
            log::error!("Count query {} passed to execute", query.dql());
            return Err(RepoError::new(
                "A count query returns a scalar, use count instead",
                ErrorKind::BackendError,
            ));
        }

        let conditions = self.check_target(query)?;
        log::debug!(
            "Executing {} [first {}, max {:?}]",
            query.dql(),
            query.first_result(),
            query.max_results()
        );
        Ok(self.unit_of_work.select(
            &conditions,
            &query.order_by,
            query.first_result(),
            query.max_results(),
        ))
    }

    fn count(&self, query: &SqlQuery) -> RepoResult<Value> {
        let query = if query.is_count() {
            query.clone()
        } else {
            query.clone().select_count()
        };
        let conditions = self.check_target(&query)?;
        log::debug!("Executing {}", query.dql());
        Ok(Value::String(self.unit_of_work.count(&conditions).to_string()))
    }

    fn adapter(&self, query: SqlQuery) -> Box<dyn PaginatorAdapter<T>> {
        Box::new(SqlPaginatorAdapter {
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

/// Re-runs the query with first/max results for every window.
struct SqlPaginatorAdapter<T: Entity> {
    session: SqlSession<T>,
    query: SqlQuery,
}

impl<T: Entity> PaginatorAdapter<T> for SqlPaginatorAdapter<T> {
    fn items(&self, offset: usize, count: usize) -> RepoResult<Vec<T>> {
        let query = self
            .query
            .clone()
            .set_first_result(offset)
            .set_max_results(Some(count));
        self.session.execute(&query)
    }

    fn count(&self) -> RepoResult<usize> {
        self.session.count(&self.query)?.to_count()
    }
}
