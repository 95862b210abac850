mod condition;
mod criteria;
mod translator;

pub use condition::*;
pub use criteria::*;
pub use translator::*;
