use crate::common::{OrderBy, Value};
use crate::criteria::{QuerySource, QueryTranslator};
use crate::entity::Entity;
use crate::errors::{ErrorKind, RepoError, RepoResult};
use crate::event::{EventListener, EventSubscriber, EventSuspension};
use crate::filter::FilterSuspension;
use crate::pager::{Page, Pager, Paginator};
use crate::repository::dispatch::{
    bool_arg, count_arg, int_arg, order_arg, DispatchRegistry, DynamicResult, FIND_BY,
    FIND_ONE_BY, FIND_PAGED_BY, FIND_PAGINATED_BY, REMOVE_BY, REMOVE_ONE_BY,
};
use crate::repository::FindOptions;
use crate::repository_config::RepositoryConfig;
use crate::session::PersistenceSession;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Repository of one entity type over a persistence session.
///
/// `Tr` turns criteria into the session's native queries; everything else
/// (paging, counting, find-or-new, auto-flush, event and filter suspension,
/// name-based finders) is shared by all backends.
///
/// Cloning is cheap and clones share auto-flush state and suspension
/// bookkeeping.
///
/// # Examples
///
/// ```rust,ignore
/// use repokit::backend::SqlRepository;
/// use repokit::criteria;
///
/// let users = SqlRepository::<User>::new(SqlSession::new(&context)?);
/// users.add([User::new(1, "alice")], true)?;
///
/// let page = users.find_paged_by(criteria! { "role": "admin" }, OrderBy::asc("name"), Some(20), 0)?;
/// let bob = users.call("findOneByUserName", vec![val!("bob")])?.into_one();
/// ```
pub struct Repository<T, Tr, S>
where
    T: Entity,
    Tr: QueryTranslator,
    S: PersistenceSession<T, Query = Tr::Query>,
{
    inner: Arc<RepositoryInner<T, Tr, S>>,
}

impl<T, Tr, S> Clone for Repository<T, Tr, S>
where
    T: Entity,
    Tr: QueryTranslator,
    S: PersistenceSession<T, Query = Tr::Query>,
{
    fn clone(&self) -> Self {
        Repository {
            inner: self.inner.clone(),
        }
    }
}

impl<T, Tr, S> Repository<T, Tr, S>
where
    T: Entity,
    Tr: QueryTranslator,
    S: PersistenceSession<T, Query = Tr::Query>,
{
    pub fn new(session: S) -> Self {
        Self::with_config(session, RepositoryConfig::default())
    }

    pub fn with_config(session: S, config: RepositoryConfig) -> Self {
        let translator = Tr::for_metadata(session.metadata());
        Repository {
            inner: Arc::new(RepositoryInner {
                auto_flush: AtomicBool::new(config.auto_flush()),
                session,
                translator,
                config,
                events: EventSuspension::new(),
                filters: FilterSuspension::new(),
                dispatch: Self::registry(),
                _entity: PhantomData,
            }),
        }
    }

    /// Name of the managed entity type.
    pub fn class_name(&self) -> String {
        T::entity_name()
    }

    pub fn session(&self) -> &S {
        &self.inner.session
    }

    pub fn translator(&self) -> &Tr {
        &self.inner.translator
    }

    pub fn is_auto_flush(&self) -> bool {
        self.inner.auto_flush.load(Ordering::Relaxed)
    }

    pub fn set_auto_flush(&self, auto_flush: bool) {
        self.inner.auto_flush.store(auto_flush, Ordering::Relaxed);
    }

    pub fn flush(&self) -> RepoResult<()> {
        self.inner.session.flush()
    }

    pub fn refresh(&self, object: &mut T) -> RepoResult<()> {
        self.inner.session.refresh(object)
    }

    pub fn detach(&self, object: &T) -> RepoResult<()> {
        self.inner.session.detach(object)
    }

    pub fn find<V: Into<Value>>(&self, id: V) -> RepoResult<Option<T>> {
        self.inner.session.find(&id.into())
    }

    pub fn find_all(&self) -> RepoResult<Vec<T>> {
        self.inner.session.find_all()
    }

    pub fn find_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        options: FindOptions,
    ) -> RepoResult<Vec<T>> {
        let translator = &self.inner.translator;
        let mut query = translator.translate(criteria.into())?;
        if !options.order_by.is_empty() {
            query = translator.order(query, &options.order_by);
        }
        if options.has_window() {
            query = translator.window(query, options.skip.unwrap_or(0), options.limit);
        }
        self.inner.session.execute(&query)
    }

    pub fn find_one_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        order_by: OrderBy,
    ) -> RepoResult<Option<T>> {
        let options = FindOptions::new().with_order(order_by).limit(1);
        Ok(self.find_by(criteria, options)?.into_iter().next())
    }

    /// Like [`Repository::find_by`], failing with `NotFound` when nothing
    /// matches.
    pub fn find_by_or_fail<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        options: FindOptions,
    ) -> RepoResult<Vec<T>> {
        let items = self.find_by(criteria, options)?;
        if items.is_empty() {
            return Err(self.not_found());
        }
        Ok(items)
    }

    pub fn find_one_by_or_fail<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        order_by: OrderBy,
    ) -> RepoResult<T> {
        self.find_one_by(criteria, order_by)?
            .ok_or_else(|| self.not_found())
    }

    /// Materializes one page of matching entities.
    ///
    /// `limit` defaults to the configured page size and `offset` must be a
    /// multiple of it. The page number is `offset / limit + 1`; the total
    /// count comes from a separate count query on the same criteria.
    ///
    /// # Errors
    ///
    /// `OutOfBounds` when `limit < 1`, `offset < 0`, `offset` is not a
    /// multiple of `limit` or `offset` lies past the last page.
    pub fn find_paged_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        order_by: OrderBy,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<Page<T>> {
        self.find_paged_by_as::<Page<T>, C>(criteria, order_by, limit, offset)
    }

    /// Same as [`find_paged_by`](Self::find_paged_by), but builds the page
    /// with a caller-chosen [`Pager`] implementation.
    ///
    /// Errors returned by `P::new` are passed through unchanged.
    pub fn find_paged_by_as<P, C>(
        &self,
        criteria: C,
        order_by: OrderBy,
        limit: Option<i64>,
        offset: i64,
    ) -> RepoResult<P>
    where
        P: Pager<T>,
        C: Into<QuerySource<Tr::Query>>,
    {
        let limit = limit.unwrap_or(self.inner.config.page_size() as i64);
        if limit < 1 {
            log::error!("Invalid page limit {} for {}", limit, self.class_name());
            return Err(RepoError::new(
                &format!("Page size must be at least 1. {} given", limit),
                ErrorKind::OutOfBounds,
            ));
        }
        if offset < 0 {
            log::error!("Invalid page offset {} for {}", offset, self.class_name());
            return Err(RepoError::new(
                &format!("Offset cannot be lower than 0. {} given", offset),
                ErrorKind::OutOfBounds,
            ));
        }
        if offset % limit != 0 {
            log::error!(
                "Page offset {} is not aligned to limit {} for {}",
                offset,
                limit,
                self.class_name()
            );
            return Err(RepoError::new(
                &format!(
                    "Offset must be a multiple of the page size {}. {} given",
                    limit, offset
                ),
                ErrorKind::OutOfBounds,
            ));
        }
        let (limit, offset) = (limit as usize, offset as usize);

        let translator = &self.inner.translator;
        let source = criteria.into();
        let query = translator.translate(source.clone())?;
        let query = translator.window(translator.order(query, &order_by), offset, Some(limit));

        let items = self.inner.session.execute(&query)?;
        let total_count = self.count_by(source)?;
        P::new(items, offset / limit + 1, limit, total_count)
    }

    /// Lazy paginator over matching entities.
    ///
    /// `items_per_page` defaults to the configured value; negative values are
    /// clamped to 0, which means a single page with everything.
    pub fn find_paginated_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        order_by: OrderBy,
        items_per_page: Option<i64>,
    ) -> RepoResult<Paginator<T>> {
        let items_per_page = match items_per_page {
            Some(n) => n.max(0) as usize,
            None => self.inner.config.items_per_page(),
        };

        let translator = &self.inner.translator;
        let query = translator.translate(criteria.into())?;
        let query = translator.order(query, &order_by);
        Ok(Paginator::new(
            self.inner.session.adapter(query),
            items_per_page,
        ))
    }

    pub fn find_paginated_by_or_fail<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        order_by: OrderBy,
        items_per_page: Option<i64>,
    ) -> RepoResult<Paginator<T>> {
        let paginator = self.find_paginated_by(criteria, order_by, items_per_page)?;
        if paginator.total_item_count()? == 0 {
            return Err(self.not_found());
        }
        Ok(paginator)
    }

    pub fn count_by<C: Into<QuerySource<Tr::Query>>>(&self, criteria: C) -> RepoResult<usize> {
        let translator = &self.inner.translator;
        let query = translator.count(translator.translate(criteria.into())?);
        self.inner.session.count(&query)?.to_count()
    }

    pub fn count_all(&self) -> RepoResult<usize> {
        self.count_by(QuerySource::default())
    }

    /// First match, or a fresh unmanaged entity.
    pub fn find_one_by_or_get_new<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
    ) -> RepoResult<T> {
        Ok(self
            .find_one_by(criteria, OrderBy::new())?
            .unwrap_or_else(|| self.get_new()))
    }

    /// Same as [`Repository::find_one_by_or_get_new`].
    pub fn find_one_by_or_create_new<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
    ) -> RepoResult<T> {
        self.find_one_by_or_get_new(criteria)
    }

    /// A fresh entity; it is not persisted.
    pub fn get_new(&self) -> T {
        T::default()
    }

    /// Same as [`Repository::get_new`].
    pub fn create_new(&self) -> T {
        self.get_new()
    }

    pub fn add<I: IntoIterator<Item = T>>(&self, objects: I, flush: bool) -> RepoResult<()> {
        for object in objects {
            self.inner.session.persist(object)?;
        }
        self.flush_if(flush)
    }

    pub fn remove<I: IntoIterator<Item = T>>(&self, objects: I, flush: bool) -> RepoResult<()> {
        for object in objects {
            self.inner.session.remove(&object)?;
        }
        self.flush_if(flush)
    }

    /// Removes the entity with `id`. Returns whether one was found.
    pub fn remove_by_id<V: Into<Value>>(&self, id: V, flush: bool) -> RepoResult<bool> {
        match self.find(id)? {
            Some(object) => {
                self.remove([object], flush)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes every match. Returns how many were scheduled for removal.
    pub fn remove_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        flush: bool,
    ) -> RepoResult<usize> {
        let objects = self.find_by(criteria, FindOptions::new())?;
        let count = objects.len();
        self.remove(objects, flush)?;
        Ok(count)
    }

    /// Removes the first match, if any. Nothing is flushed when nothing
    /// matched.
    pub fn remove_one_by<C: Into<QuerySource<Tr::Query>>>(
        &self,
        criteria: C,
        flush: bool,
    ) -> RepoResult<bool> {
        match self.find_one_by(criteria, OrderBy::new())? {
            Some(object) => {
                self.remove([object], flush)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn remove_all(&self, flush: bool) -> RepoResult<usize> {
        let objects = self.find_all()?;
        let count = objects.len();
        self.remove(objects, flush)?;
        Ok(count)
    }

    /// Detaches the first subscriber of type `E` from the session's event
    /// manager until [`Repository::restore_event_subscribers`].
    pub fn disable_event_subscriber<E: EventSubscriber>(&self) {
        self.inner
            .events
            .disable_event_subscriber::<E>(&self.inner.session.event_manager())
    }

    pub fn restore_event_subscribers(&self) {
        self.inner
            .events
            .restore_event_subscribers(&self.inner.session.event_manager())
    }

    pub fn disable_event_listeners(&self, event: &str) {
        self.inner
            .events
            .disable_event_listeners(&self.inner.session.event_manager(), event)
    }

    pub fn disable_event_listener<L: EventListener>(&self, event: &str) {
        self.inner
            .events
            .disable_event_listener::<L>(&self.inner.session.event_manager(), event)
    }

    pub fn restore_event_listeners(&self, event: &str) {
        self.inner
            .events
            .restore_event_listeners(&self.inner.session.event_manager(), event)
    }

    pub fn restore_all_event_listeners(&self) {
        self.inner
            .events
            .restore_all_event_listeners(&self.inner.session.event_manager())
    }

    /// Events that currently have listeners.
    pub fn registered_events(&self) -> Vec<String> {
        self.inner
            .session
            .event_manager()
            .all_listeners()
            .into_keys()
            .collect()
    }

    pub fn disable_filter(&self, name: &str) -> RepoResult<()> {
        self.inner
            .filters
            .disable_filter(&self.inner.session.filters(), name)
    }

    pub fn disable_filters(&self) -> RepoResult<()> {
        self.inner
            .filters
            .disable_filters(&self.inner.session.filters())
    }

    pub fn restore_filter(&self, name: &str) -> RepoResult<()> {
        self.inner
            .filters
            .restore_filter(&self.inner.session.filters(), name)
    }

    pub fn restore_filters(&self) -> RepoResult<()> {
        self.inner
            .filters
            .restore_filters(&self.inner.session.filters())
    }

    /// Runs a name-based finder or remover such as `findByUserName` or
    /// `removeOneByEmail`.
    ///
    /// The first argument is the value to match. The remaining ones are
    /// positional:
    ///
    /// | prefix            | arguments after the value      |
    /// |-------------------|--------------------------------|
    /// | `findBy`          | order?, limit?, offset?        |
    /// | `findOneBy`       | order?                         |
    /// | `findPaginatedBy` | order?, items per page?        |
    /// | `findPagedBy`     | order?, limit?, offset?        |
    /// | `removeBy`        | flush?                         |
    /// | `removeOneBy`     | flush?                         |
    ///
    /// Orders are `{field: "ASC" | "DESC"}` maps. A bare prefix (`findBy`)
    /// takes a criteria map as its first argument.
    pub fn call(&self, method: &str, args: Vec<Value>) -> RepoResult<DynamicResult<T>> {
        let metadata = self.inner.translator.metadata().clone();
        self.inner.dispatch.dispatch(self, &metadata, method, args)
    }

    fn registry() -> DispatchRegistry<Self, T> {
        DispatchRegistry::<Self, T>::new()
            .register(FIND_BY, |repo, criteria, args| {
                let mut options = FindOptions::new().with_order(order_arg(args, 0)?);
                if let Some(limit) = count_arg(args, 1, "limit")? {
                    options = options.limit(limit);
                }
                if let Some(offset) = count_arg(args, 2, "offset")? {
                    options = options.skip(offset);
                }
                repo.find_by(criteria, options).map(DynamicResult::Many)
            })
            .register(FIND_ONE_BY, |repo, criteria, args| {
                repo.find_one_by(criteria, order_arg(args, 0)?)
                    .map(DynamicResult::One)
            })
            .register(FIND_PAGINATED_BY, |repo, criteria, args| {
                let items_per_page = int_arg(args, 1, "itemsPerPage")?;
                repo.find_paginated_by(criteria, order_arg(args, 0)?, items_per_page)
                    .map(DynamicResult::Paginated)
            })
            .register(FIND_PAGED_BY, |repo, criteria, args| {
                let limit = int_arg(args, 1, "limit")?;
                let offset = int_arg(args, 2, "offset")?.unwrap_or(0);
                repo.find_paged_by(criteria, order_arg(args, 0)?, limit, offset)
                    .map(DynamicResult::Paged)
            })
            .register(REMOVE_BY, |repo, criteria, args| {
                repo.remove_by(criteria, bool_arg(args, 0, "flush")?)
                    .map(DynamicResult::Removed)
            })
            .register(REMOVE_ONE_BY, |repo, criteria, args| {
                repo.remove_one_by(criteria, bool_arg(args, 0, "flush")?)
                    .map(|removed| DynamicResult::Removed(removed as usize))
            })
    }

    fn flush_if(&self, flush: bool) -> RepoResult<()> {
        if flush || self.is_auto_flush() {
            self.inner.session.flush()
        } else {
            Ok(())
        }
    }

    fn not_found(&self) -> RepoError {
        log::error!("No {} matched the criteria", self.class_name());
        RepoError::new(
            &format!("No {} found for the given criteria", self.class_name()),
            ErrorKind::NotFound,
        )
    }
}

struct RepositoryInner<T, Tr, S>
where
    T: Entity,
    Tr: QueryTranslator,
    S: PersistenceSession<T, Query = Tr::Query>,
{
    session: S,
    translator: Tr,
    config: RepositoryConfig,
    auto_flush: AtomicBool,
    events: EventSuspension,
    filters: FilterSuspension,
    dispatch: DispatchRegistry<Repository<T, Tr, S>, T>,
    _entity: PhantomData<fn() -> T>,
}
