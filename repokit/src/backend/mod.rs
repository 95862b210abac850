//! In-memory backends, each a translator + session pair.

mod couch;
mod mongo;
mod sql;

pub use couch::*;
pub use mongo::*;
pub use sql::*;
