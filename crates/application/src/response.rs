//! The response view handed to spec assertions

use netsuite_domain::{
    AssertionError, JsonPath, Parsable, ResponseMatcher, ResponseSpec, Selector, StatusCode,
    ValueKey,
};

use crate::dependency::DependencyCoordinator;

/// A received response positioned at a JSON path.
///
/// Subscripting with [`key`](Self::key) and [`index`](Self::index) returns
/// a new view one level deeper; the `expect_*` methods check the value at
/// the current path. The root view sees the whole body as text.
#[derive(Debug, Clone)]
pub struct Response<'a> {
    raw: &'a ResponseSpec,
    path: JsonPath,
    coordinator: &'a DependencyCoordinator,
}

impl<'a> Response<'a> {
    /// Creates a root view over a response.
    #[must_use]
    pub const fn new(raw: &'a ResponseSpec, coordinator: &'a DependencyCoordinator) -> Self {
        Self {
            raw,
            path: JsonPath::root(),
            coordinator,
        }
    }

    /// Descends into an object key.
    #[must_use]
    pub fn key(&self, key: &str) -> Self {
        self.at(key)
    }

    /// Descends into an array index.
    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.at(index)
    }

    /// Descends by any selector.
    #[must_use]
    pub fn at(&self, selector: impl Into<Selector>) -> Self {
        Self {
            raw: self.raw,
            path: self.path.child(selector),
            coordinator: self.coordinator,
        }
    }

    /// The current path.
    #[must_use]
    pub const fn path(&self) -> &JsonPath {
        &self.path
    }

    /// The status code.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.raw.status_code()
    }

    /// A header value, matched case-insensitively.
    #[must_use]
    pub fn header(&self, name: &str) -> Option<&'a str> {
        self.raw.get_header(name).map(String::as_str)
    }

    /// The raw body.
    #[must_use]
    pub fn body(&self) -> &'a [u8] {
        &self.raw.body
    }

    /// The underlying response.
    #[must_use]
    pub const fn raw(&self) -> &'a ResponseSpec {
        self.raw
    }

    fn matcher(&self) -> ResponseMatcher<'_> {
        ResponseMatcher::new(Some(self.raw.body.as_slice()), &self.path)
    }

    /// Checks the status code.
    ///
    /// # Errors
    ///
    /// Returns `StatusMismatch` if the code differs.
    pub const fn expect_status(&self, expected: u16) -> Result<(), AssertionError> {
        let actual = self.raw.status;
        if actual == expected {
            Ok(())
        } else {
            Err(AssertionError::StatusMismatch { expected, actual })
        }
    }

    /// Checks a header value exactly.
    ///
    /// # Errors
    ///
    /// Returns `HeaderMissing` or `HeaderMismatch`.
    pub fn expect_header(&self, name: &str, expected: &str) -> Result<(), AssertionError> {
        match self.header(name) {
            None => Err(AssertionError::HeaderMissing {
                name: name.to_string(),
            }),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(AssertionError::HeaderMismatch {
                name: name.to_string(),
                expected: expected.to_string(),
                actual: actual.to_string(),
            }),
        }
    }

    /// See [`ResponseMatcher::expect_string`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a string or different.
    pub fn expect_string(&self, expected: &str) -> Result<(), AssertionError> {
        self.matcher().expect_string(expected)
    }

    /// See [`ResponseMatcher::expect_string_passing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a string or rejected.
    pub fn expect_string_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(&str) -> Result<(), String>,
    {
        self.matcher().expect_string_passing(predicate)
    }

    /// See [`ResponseMatcher::expect_string_matching`].
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern is invalid or does not match.
    pub fn expect_string_matching(&self, pattern: &str) -> Result<(), AssertionError> {
        self.matcher().expect_string_matching(pattern)
    }

    /// See [`ResponseMatcher::expect_int`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not an int or different.
    pub fn expect_int(&self, expected: i64) -> Result<(), AssertionError> {
        self.matcher().expect_int(expected)
    }

    /// See [`ResponseMatcher::expect_int_passing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not an int or rejected.
    pub fn expect_int_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(i64) -> Result<(), String>,
    {
        self.matcher().expect_int_passing(predicate)
    }

    /// See [`ResponseMatcher::expect_double`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a number or different.
    pub fn expect_double(&self, expected: f64) -> Result<(), AssertionError> {
        self.matcher().expect_double(expected)
    }

    /// See [`ResponseMatcher::expect_double_passing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a number or rejected.
    pub fn expect_double_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(f64) -> Result<(), String>,
    {
        self.matcher().expect_double_passing(predicate)
    }

    /// See [`ResponseMatcher::expect_bool`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a bool or different.
    pub fn expect_bool(&self, expected: bool) -> Result<(), AssertionError> {
        self.matcher().expect_bool(expected)
    }

    /// See [`ResponseMatcher::expect_bool_passing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a bool or rejected.
    pub fn expect_bool_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(bool) -> Result<(), String>,
    {
        self.matcher().expect_bool_passing(predicate)
    }

    /// See [`ResponseMatcher::expect_exists`].
    ///
    /// # Errors
    ///
    /// Returns an error if no value is present at the path.
    pub fn expect_exists(&self) -> Result<(), AssertionError> {
        self.matcher().expect_exists()
    }

    /// See [`ResponseMatcher::expect_nil`].
    ///
    /// # Errors
    ///
    /// Returns an error if a non-null value is present at the path.
    pub fn expect_nil(&self) -> Result<(), AssertionError> {
        self.matcher().expect_nil()
    }

    /// See [`ResponseMatcher::expect_array_count`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an array of that length.
    pub fn expect_array_count(&self, expected: usize) -> Result<(), AssertionError> {
        self.matcher().expect_array_count(expected)
    }

    /// See [`ResponseMatcher::expect_array_count_passing`].
    ///
    /// # Errors
    ///
    /// Returns an error if the value is not an array or its length is
    /// rejected.
    pub fn expect_array_count_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(usize) -> Result<(), String>,
    {
        self.matcher().expect_array_count_passing(predicate)
    }

    /// Extracts the value at the current path and resolves `key` with it.
    ///
    /// Dependents of `key` are released as soon as this returns. If the
    /// path cannot be resolved or the value has the wrong type, the key is
    /// marked failed.
    ///
    /// # Errors
    ///
    /// Returns the path error, `ParseMismatch` on a type mismatch, or
    /// `DuplicateResolution` if the key was already resolved.
    pub fn parse<T: Parsable>(&self, key: ValueKey<T>) -> Result<(), AssertionError> {
        match self.matcher().value() {
            Ok(value) => self.coordinator.parse(key, value),
            Err(err) => {
                let handle = self.coordinator.get_or_create(key.name());
                self.coordinator
                    .mark_failed(&handle)
                    .map_err(|_| AssertionError::DuplicateResolution {
                        key: key.name().to_string(),
                    })?;
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use super::*;
    use netsuite_domain::ValueStatus;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const USER_ID: ValueKey<i64> = ValueKey::new("UserId");
    const NAME: ValueKey<String> = ValueKey::new("Name");

    fn raw(status: u16, body: &str) -> ResponseSpec {
        ResponseSpec::new(
            status,
            HashMap::from([("Content-Type".to_string(), "application/json".to_string())]),
            body.as_bytes().to_vec(),
        )
    }

    #[test]
    fn test_subscripting_builds_the_path() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(200, r#"{"a":{"b":[1,2,{"c":"x"}]}}"#);
        let response = Response::new(&raw, &coordinator);

        let nested = response.key("a").key("b").index(2).key("c");
        assert_eq!(nested.path().to_string(), "a.b.2.c");
        assert_eq!(nested.expect_string("x"), Ok(()));
        assert_eq!(
            response.key("a").key("b").index(5).expect_exists(),
            Err(AssertionError::IndexOutOfBounds {
                path: "a.b.5".to_string()
            })
        );
    }

    #[test]
    fn test_status_and_header_checks() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(201, "{}");
        let response = Response::new(&raw, &coordinator);

        assert_eq!(response.expect_status(201), Ok(()));
        assert_eq!(
            response.expect_status(200).map_err(|e| e.to_string()),
            Err("Expected status to be 200 but got 201".to_string())
        );
        assert_eq!(response.expect_header("content-type", "application/json"), Ok(()));
        assert_eq!(
            response.expect_header("X-Missing", "1"),
            Err(AssertionError::HeaderMissing {
                name: "X-Missing".to_string()
            })
        );
    }

    #[test]
    fn test_root_view_reads_plain_text() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(200, "[]");
        let response = Response::new(&raw, &coordinator);
        assert_eq!(response.expect_array_count(0), Ok(()));
        assert_eq!(response.expect_string("[]"), Ok(()));
    }

    #[test]
    fn test_empty_body_reads_as_empty_text() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(204, "");
        let response = Response::new(&raw, &coordinator);

        assert_eq!(response.expect_string(""), Ok(()));
        assert!(matches!(
            response.key("id").expect_exists(),
            Err(AssertionError::InvalidJson { .. })
        ));
    }

    #[test]
    fn test_parse_resolves_the_key() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(201, r#"{"id": 42, "name": "Ada"}"#);
        let response = Response::new(&raw, &coordinator);

        assert_eq!(response.key("id").parse(USER_ID), Ok(()));
        assert_eq!(
            coordinator.get_or_create("UserId").status(),
            ValueStatus::Parsed(json!(42))
        );
        assert_eq!(
            response.key("name").parse(USER_ID),
            Err(AssertionError::DuplicateResolution {
                key: "UserId".to_string()
            })
        );
    }

    #[test]
    fn test_parse_failure_marks_the_key_failed() {
        let coordinator = DependencyCoordinator::new();
        let raw = raw(201, r#"{"id": 42}"#);
        let response = Response::new(&raw, &coordinator);

        assert_eq!(
            response.key("missing").parse(NAME),
            Err(AssertionError::KeyMissing {
                path: "missing".to_string()
            })
        );
        assert_eq!(
            coordinator.get_or_create("Name").status(),
            ValueStatus::Failed
        );

        assert_eq!(
            response.key("id").parse(ValueKey::<String>::new("Other")),
            Err(AssertionError::ParseMismatch {
                key: "Other".to_string(),
                expected: "string"
            })
        );
    }
}
