//! Lifecycle events, their registry and suspension bookkeeping.

mod event_manager;
mod event_suspension;
mod lifecycle;

pub use event_manager::*;
pub use event_suspension::*;
pub use lifecycle::*;
