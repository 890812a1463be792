//! Dependency error types

use thiserror::Error;

/// Programmer errors in the use of dependent values. Fatal to a run.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CoordinatorError {
    /// A value was resolved twice, either because an assertion ran more
    /// than once or two logical values share a key.
    #[error("value for key '{key}' was resolved more than once")]
    DuplicateResolution {
        /// Key name.
        key: String,
    },
}

/// Errors reading a dependent value as a string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// The value has not been resolved yet.
    #[error("value for key '{key}' is not ready")]
    NotReady {
        /// Key name.
        key: String,
    },

    /// The value failed to resolve.
    #[error("value for key '{key}' is unavailable")]
    Unavailable {
        /// Key name.
        key: String,
    },
}
