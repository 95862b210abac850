//! The repository façade, its name-based dispatch and the factory that caches
//! repositories per session.

mod dispatch;
mod find_options;
mod repository;
mod repository_factory;

pub use dispatch::*;
pub use find_options::*;
pub use repository::*;
pub use repository_factory::*;
