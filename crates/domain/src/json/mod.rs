//! JSON path matching over response bodies.

mod error;
mod matcher;
mod path;

pub use error::AssertionError;
pub use matcher::{Lookup, ResponseMatcher};
pub use path::{JsonPath, Selector};
