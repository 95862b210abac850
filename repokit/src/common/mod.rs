//! Shared building blocks: dynamic values, documents, ordering and lock helpers.

mod document;
mod inflector;
mod sort_order;
mod type_utils;
mod value;

pub use document::*;
pub use inflector::*;
pub use sort_order::*;
pub use type_utils::*;
pub use value::*;
