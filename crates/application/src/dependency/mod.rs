//! Cross-spec dependent values
//!
//! A spec's assertion produces values that other nodes consume as their
//! endpoint, headers or query parameters before the value exists.

mod coordinator;
mod error;
mod handle;

pub use coordinator::DependencyCoordinator;
pub use error::{CoordinatorError, ValueError};
pub use handle::{Translate, ValueHandle};
