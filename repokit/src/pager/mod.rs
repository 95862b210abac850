mod page;
mod pager;
mod paginator;

pub use page::*;
pub use pager::*;
pub use paginator::*;
