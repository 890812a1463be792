//! Application error types

use netsuite_domain::DomainError;
use thiserror::Error;

use crate::dependency::CoordinatorError;

/// Errors that abort a whole run.
///
/// These indicate an invalid static tree definition, not a runtime
/// condition; runtime failures are recorded per spec instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RunError {
    /// A structural error in the tree, such as duplicate sibling names.
    #[error("invalid test tree: {0}")]
    Domain(#[from] DomainError),

    /// A dependent value was resolved more than once.
    #[error("{0}")]
    Coordinator(#[from] CoordinatorError),

    /// The base URL is not an absolute http(s) URL.
    #[error("invalid base URL: {0}")]
    InvalidBaseUrl(String),

    /// The blocking runtime could not be started.
    #[error("runtime error: {0}")]
    Runtime(String),
}

/// Result type alias for runs.
pub type RunResult<T> = Result<T, RunError>;
