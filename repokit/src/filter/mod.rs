mod filter_collection;
mod filter_suspension;

pub use filter_collection::*;
pub use filter_suspension::*;
