//! Received responses and status codes

use std::collections::HashMap;
use std::fmt;

const REASONS: &[(u16, &str)] = &[
    (100, "Continue"),
    (101, "Switching Protocols"),
    (200, "OK"),
    (201, "Created"),
    (202, "Accepted"),
    (203, "Non-Authoritative Information"),
    (204, "No Content"),
    (205, "Reset Content"),
    (206, "Partial Content"),
    (300, "Multiple Choices"),
    (301, "Moved Permanently"),
    (302, "Found"),
    (303, "See Other"),
    (304, "Not Modified"),
    (307, "Temporary Redirect"),
    (308, "Permanent Redirect"),
    (400, "Bad Request"),
    (401, "Unauthorized"),
    (402, "Payment Required"),
    (403, "Forbidden"),
    (404, "Not Found"),
    (405, "Method Not Allowed"),
    (406, "Not Acceptable"),
    (408, "Request Timeout"),
    (409, "Conflict"),
    (410, "Gone"),
    (411, "Length Required"),
    (412, "Precondition Failed"),
    (413, "Payload Too Large"),
    (415, "Unsupported Media Type"),
    (422, "Unprocessable Entity"),
    (429, "Too Many Requests"),
    (500, "Internal Server Error"),
    (501, "Not Implemented"),
    (502, "Bad Gateway"),
    (503, "Service Unavailable"),
    (504, "Gateway Timeout"),
];

/// A response status code. Displays as `"404 Not Found"`, or as the bare
/// number when the reason is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StatusCode(pub u16);

impl StatusCode {
    /// Wraps a numeric code.
    #[must_use]
    pub const fn new(code: u16) -> Self {
        Self(code)
    }

    /// The numeric code.
    #[must_use]
    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// Canonical reason phrase for well-known codes.
    #[must_use]
    pub fn reason_phrase(&self) -> Option<&'static str> {
        REASONS
            .binary_search_by_key(&self.0, |(code, _)| *code)
            .ok()
            .map(|index| REASONS[index].1)
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)?;
        if let Some(reason) = self.reason_phrase() {
            write!(f, " {reason}")?;
        }
        Ok(())
    }
}

/// What the transport hands back for one request: status, headers and the
/// raw body bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResponseSpec {
    /// Numeric status code.
    pub status: u16,
    /// Header names as received.
    pub headers: HashMap<String, String>,
    /// Body bytes, possibly empty.
    pub body: Vec<u8>,
}

impl ResponseSpec {
    /// Creates a response from its parts.
    #[must_use]
    pub const fn new(status: u16, headers: HashMap<String, String>, body: Vec<u8>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }

    /// The status wrapped for display.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        StatusCode::new(self.status)
    }

    /// Looks up a header, ignoring ASCII case in the name.
    #[must_use]
    pub fn get_header(&self, name: &str) -> Option<&String> {
        self.headers
            .iter()
            .find_map(|(candidate, value)| candidate.eq_ignore_ascii_case(name).then_some(value))
    }

    /// The body as shown in a failure report.
    ///
    /// JSON is pretty-printed and other UTF-8 text is shown as is. Anything
    /// else becomes `BINARY DATA`.
    #[must_use]
    pub fn body_description(&self) -> String {
        if let Ok(json) = serde_json::from_slice::<serde_json::Value>(&self.body)
            && let Ok(pretty) = serde_json::to_string_pretty(&json)
        {
            return pretty;
        }
        std::str::from_utf8(&self.body).map_or_else(|_| "BINARY DATA".to_string(), str::to_string)
    }

    /// Status line followed by the body description.
    #[must_use]
    pub fn describe(&self) -> String {
        format!("{}\n{}", self.status_code(), self.body_description())
    }
}
