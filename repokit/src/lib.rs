#![allow(clippy::module_inception)]
//! # repokit
//!
//! A repository layer on top of a persistence session. A session is a unit of
//! work plus a native query dialect; the repository adds what every data access
//! class ends up rewriting:
//!
//! - materialized [`Page`](pager::Page)s and lazy [`Paginator`](pager::Paginator)s
//! - counting with the same criteria as the query it counts
//! - auto-flush after mutations
//! - find-or-new helpers
//! - temporary suspension of event listeners, subscribers and query filters
//! - name-based finders such as `findOneByUserName`
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use repokit::backend::{SqlRepository, SqlSession};
//! use repokit::session::SessionContext;
//! use repokit::{criteria, OrderBy};
//!
//! let context = SessionContext::new();
//! let users = SqlRepository::<User>::new(SqlSession::new(&context)?);
//!
//! users.add([User::new(1, "alice", "admin")], true)?;
//! let admins = users.find_paged_by(criteria! { "role": "admin" }, OrderBy::asc("name"), Some(10), 0)?;
//! ```
//!
//! ## Backends
//!
//! Three in-memory sessions ship in [`backend`], each executing its own query
//! dialect: a relational one (`SqlSession`, DQL-like queries with bound
//! parameters), a cursor based document store (`MongoSession`) and a selector
//! based document store (`CouchSession`). Any other store plugs in through
//! [`PersistenceSession`](session::PersistenceSession) and
//! [`QueryTranslator`](criteria::QueryTranslator).
//!
//! ## Module Organization
//!
//! - [`backend`] - Translators and sessions of the bundled backends
//! - [`common`] - Values, documents, ordering and lock helpers
//! - [`criteria`] - Criteria maps and their translation to native queries
//! - [`entity`] - Entity trait and metadata
//! - [`errors`] - Error types and result definitions
//! - [`event`] - Lifecycle events, the event manager and suspension
//! - [`filter`] - Query filters and suspension
//! - [`pager`] - Pages and paginators
//! - [`repository`] - The repository façade, dynamic dispatch and factory
//! - [`repository_builder`] - Builder for repository defaults
//! - [`repository_config`] - Repository defaults
//! - [`session`] - Persistence sessions and units of work

pub mod backend;
pub mod common;
pub mod criteria;
pub mod entity;
pub mod errors;
pub mod event;
pub mod filter;
pub mod pager;
pub mod repository;
pub mod repository_builder;
pub mod repository_config;
pub mod session;

pub use common::{Document, OrderBy, SortOrder, Value};
pub use entity::{Entity, EntityMetadata};
pub use errors::{ErrorKind, RepoError, RepoResult};
pub use repository::{Repository, RepositoryFactory};
