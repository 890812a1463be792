//! NetSuite Domain - Core test framework types
//!
//! This crate defines the domain model for NetSuite: captured requests,
//! responses, JSON path matching, typed value keys and the result tree.
//! All types here are pure Rust with no I/O dependencies.

pub mod error;
pub mod json;
pub mod request;
pub mod response;
pub mod result;
pub mod value;

pub use error::{DomainError, DomainResult};
pub use json::{AssertionError, JsonPath, Lookup, ResponseMatcher, Selector};
pub use request::{HttpMethod, RequestSpec};
pub use response::{ResponseSpec, StatusCode};
pub use result::{Failure, Outcome, ResultNode, ResultTree, SpecError};
pub use value::{Parsable, ValueKey, ValueStatus};
