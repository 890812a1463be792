//! Assertion error types

use thiserror::Error;

/// Why a spec's assertion failed.
///
/// Path-carrying variants embed the dotted path walked so far, so a failure
/// can be located without re-running the suite.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum AssertionError {
    /// The response carried no body at all.
    #[error("No data returned with response")]
    NoBody,

    /// The body is not valid UTF-8.
    #[error("Invalid string response")]
    InvalidEncoding,

    /// The body could not be parsed as JSON.
    #[error("Invalid JSON response: {reason}")]
    InvalidJson {
        /// Parser message.
        reason: String,
    },

    /// An index selector was applied to a non-array.
    #[error("Expected array at {path}")]
    NotAnArray {
        /// Path walked so far.
        path: String,
    },

    /// A key selector was applied to a non-object.
    #[error("Expected object at {path}")]
    NotAnObject {
        /// Path walked so far.
        path: String,
    },

    /// An index selector was past the end of the array.
    #[error("Index is out of bounds at {path}")]
    IndexOutOfBounds {
        /// Path walked so far.
        path: String,
    },

    /// A key was missing from an object.
    #[error("Expected object at {path} but it does not exist")]
    KeyMissing {
        /// Path walked so far.
        path: String,
    },

    /// The value has a different JSON kind than expected.
    #[error("Expected {expected} at {path}")]
    TypeMismatch {
        /// Path of the value.
        path: String,
        /// Expected kind.
        expected: &'static str,
    },

    /// The value has the right kind but the wrong content.
    #[error("Expected '{actual}' to be {expected} at {path}")]
    ValueMismatch {
        /// Path of the value.
        path: String,
        /// Expected value.
        expected: String,
        /// Actual value.
        actual: String,
    },

    /// A user predicate rejected the value.
    #[error("Value at {path} failed check: {reason}")]
    PredicateFailed {
        /// Path of the value.
        path: String,
        /// The predicate's own reason.
        reason: String,
    },

    /// The response status differs from the expected one.
    #[error("Expected status to be {expected} but got {actual}")]
    StatusMismatch {
        /// Expected status code.
        expected: u16,
        /// Actual status code.
        actual: u16,
    },

    /// A response header is missing.
    #[error("Expected header '{name}' but it does not exist")]
    HeaderMissing {
        /// Header name.
        name: String,
    },

    /// A response header has a different value.
    #[error("Expected header '{name}' to be '{expected}' but got '{actual}'")]
    HeaderMismatch {
        /// Header name.
        name: String,
        /// Expected value.
        expected: String,
        /// Actual value.
        actual: String,
    },

    /// A regex pattern failed to compile.
    #[error("Invalid regex pattern '{pattern}': {reason}")]
    InvalidPattern {
        /// The pattern.
        pattern: String,
        /// Compiler message.
        reason: String,
    },

    /// A value parsed for a key has the wrong native type.
    #[error("Mismatched type for {key}: expected {expected}")]
    ParseMismatch {
        /// Key name.
        key: String,
        /// Expected kind.
        expected: &'static str,
    },

    /// A key was resolved a second time.
    #[error("Value for {key} was already resolved")]
    DuplicateResolution {
        /// Key name.
        key: String,
    },

    /// A failure raised directly by assertion code.
    #[error("{0}")]
    Custom(String),
}

impl AssertionError {
    /// Creates a custom assertion failure.
    #[must_use]
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}
