//! Spec outcomes

use thiserror::Error;

use crate::json::AssertionError;
use crate::request::RequestSpec;
use crate::response::ResponseSpec;

/// Why a spec failed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SpecError {
    /// The HTTP client could not complete the call.
    #[error("{0}")]
    Transport(String),

    /// One or more referenced values never resolved successfully.
    #[error("Dependent parsed response value {} failed", .keys.join(", "))]
    DependencyFailed {
        /// Names of the failed keys.
        keys: Vec<String>,
    },

    /// The resolved endpoint did not form a valid URL.
    #[error("{0}")]
    InvalidUrl(String),

    /// The spec's assertion rejected the response.
    #[error(transparent)]
    Assertion(#[from] AssertionError),
}

/// A failed spec together with whatever was captured on the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
    /// The failure reason.
    pub error: SpecError,
    /// The request, if one was sent.
    pub request: Option<RequestSpec>,
    /// The response, if one was received.
    pub response: Option<ResponseSpec>,
}

impl Failure {
    /// Creates a failure with nothing captured.
    #[must_use]
    pub const fn new(error: SpecError) -> Self {
        Self {
            error,
            request: None,
            response: None,
        }
    }

    /// Attaches the outgoing request.
    #[must_use]
    pub fn with_request(mut self, request: RequestSpec) -> Self {
        self.request = Some(request);
        self
    }

    /// Attaches the incoming response.
    #[must_use]
    pub fn with_response(mut self, response: ResponseSpec) -> Self {
        self.response = Some(response);
        self
    }
}

/// The result of running one spec.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The assertion passed.
    Pass,
    /// The spec failed.
    Fail(Box<Failure>),
}

impl Outcome {
    /// Wraps a failure.
    #[must_use]
    pub fn fail(failure: Failure) -> Self {
        Self::Fail(Box::new(failure))
    }

    /// Returns true for a passing outcome.
    #[must_use]
    pub const fn is_pass(&self) -> bool {
        matches!(self, Self::Pass)
    }

    /// Returns the failure, if any.
    #[must_use]
    pub fn failure(&self) -> Option<&Failure> {
        match self {
            Self::Pass => None,
            Self::Fail(failure) => Some(failure),
        }
    }

    /// `PASS` or `FAIL: <message>`.
    #[must_use]
    pub fn line(&self) -> String {
        match self {
            Self::Pass => "PASS".to_string(),
            Self::Fail(failure) => format!("FAIL: {}", failure.error),
        }
    }

    /// The progress line printed when a spec completes, e.g.
    /// `Users > create > PASS`.
    #[must_use]
    pub fn progress_line(&self, path: &[String]) -> String {
        let mut output = String::new();
        for part in path {
            output.push_str(part);
            output.push_str(" > ");
        }
        output.push_str(&self.line());
        output
    }
}
