//! Persistence sessions and the shared state behind them.

mod persistence_session;
mod session_context;
mod unit_of_work;

pub use persistence_session::*;
pub use session_context::*;
pub use unit_of_work::*;
