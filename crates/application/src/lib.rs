//! NetSuite Application - Test tree and execution
//!
//! This crate defines the application layer with:
//! - The `HttpClient` port
//! - The dependency coordinator for values passed between specs
//! - The suite/spec tree and its context resolution
//! - The runner that schedules the tree and collects results

pub mod context;
pub mod dependency;
pub mod error;
pub mod executor;
pub mod ports;
pub mod response;
pub mod tree;

pub use context::{ExecutionContext, NodeEntries, Scope};
pub use dependency::{CoordinatorError, DependencyCoordinator, Translate, ValueError, ValueHandle};
pub use error::{RunError, RunResult};
pub use executor::Runner;
pub use ports::{HttpClient, HttpClientError};
pub use response::Response;
pub use tree::{Assertion, DependentRef, Spec, Suite, SuiteMode, TestNode, ValueSource};

pub use netsuite_domain::{AssertionError, HttpMethod, Outcome, ResultTree, SpecError, ValueKey};
