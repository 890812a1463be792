//! Domain error types

use thiserror::Error;

/// Domain-level errors that indicate an invalid tree definition or input.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Two nodes share a name path, or a suite path runs through a spec.
    #[error("duplicate name: {path}")]
    DuplicateName {
        /// The name path, joined with " > ".
        path: String,
    },

    /// A result was inserted with an empty name path.
    #[error("result path is empty")]
    EmptyPath,

    /// The provided URL is invalid or malformed.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl DomainError {
    /// Creates a `DuplicateName` error for the given name path.
    #[must_use]
    pub fn duplicate_name(path: &[String]) -> Self {
        Self::DuplicateName {
            path: path.join(" > "),
        }
    }
}

/// Result type alias for domain operations.
pub type DomainResult<T> = Result<T, DomainError>;
