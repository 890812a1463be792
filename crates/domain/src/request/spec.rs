//! Captured outgoing requests

use std::collections::BTreeMap;

use url::Url;

use super::HttpMethod;
use crate::error::{DomainError, DomainResult};

/// A fully resolved outgoing HTTP request.
///
/// Built by the runner once a spec's context is resolved, handed to the
/// HTTP client, and kept alongside failures for the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSpec {
    /// HTTP method
    pub method: HttpMethod,
    /// Absolute URL including the query string
    pub url: String,
    /// HTTP headers
    pub headers: BTreeMap<String, String>,
    /// Request body
    pub body: Option<Vec<u8>>,
}

impl RequestSpec {
    /// Creates a request with no headers and no body.
    #[must_use]
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    /// Replaces the headers of this request.
    #[must_use]
    pub fn with_headers(mut self, headers: BTreeMap<String, String>) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the body of this request.
    #[must_use]
    pub fn with_body(mut self, body: Option<Vec<u8>>) -> Self {
        self.body = body;
        self
    }

    /// Appends a path segment to a base path.
    ///
    /// Exactly one `/` separates the two parts; an empty segment leaves the
    /// base untouched.
    #[must_use]
    pub fn join_path(base: &str, segment: &str) -> String {
        if segment.is_empty() {
            return base.to_string();
        }
        format!(
            "{}/{}",
            base.trim_end_matches('/'),
            segment.trim_start_matches('/')
        )
    }

    /// Builds the absolute URL for a resolved base path and query map.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::InvalidUrl` if the path is not an absolute URL.
    pub fn build_url(base_path: &str, query: &BTreeMap<String, String>) -> DomainResult<String> {
        let mut url =
            Url::parse(base_path).map_err(|e| DomainError::InvalidUrl(format!("{e}: {base_path}")))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.into())
    }

    /// Describes the request for a failure report: method, URL and body.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut output = format!("{} {}\n", self.method, self.url);
        if let Some(body) = &self.body {
            match std::str::from_utf8(body) {
                Ok(text) => output.push_str(text),
                Err(_) => output.push_str("BINARY DATA"),
            }
        }
        output
    }
}
