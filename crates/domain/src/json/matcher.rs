//! JSON path navigation and typed assertions over a response body.

use regex::Regex;
use serde_json::Value;

use super::error::AssertionError;
use super::path::{JsonPath, Selector};

/// The result of resolving a path against a body.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    /// The root path: the whole body decoded as text.
    Text(String),
    /// A JSON value found at the path.
    Json(Value),
    /// The last key of the path is absent from its object.
    Absent,
}

/// Stateless matcher over a body and a path.
///
/// Every assertion resolves the path first, then type-checks the value,
/// then compares it or hands it to a predicate.
#[derive(Debug, Clone, Copy)]
pub struct ResponseMatcher<'a> {
    body: Option<&'a [u8]>,
    path: &'a JsonPath,
}

impl<'a> ResponseMatcher<'a> {
    /// Creates a matcher for the given body and path.
    #[must_use]
    pub const fn new(body: Option<&'a [u8]>, path: &'a JsonPath) -> Self {
        Self { body, path }
    }

    /// Resolves the path against the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body cannot be decoded or the path cannot be
    /// walked. A missing key is only an error when it is not the last
    /// selector.
    pub fn lookup(&self) -> Result<Lookup, AssertionError> {
        let body = self.body.ok_or(AssertionError::NoBody)?;

        if self.path.is_root() {
            let text = std::str::from_utf8(body).map_err(|_| AssertionError::InvalidEncoding)?;
            return Ok(Lookup::Text(text.to_string()));
        }

        let root: Value = serde_json::from_slice(body).map_err(|e| AssertionError::InvalidJson {
            reason: e.to_string(),
        })?;

        let selectors = self.path.selectors();
        let mut walked = JsonPath::root();
        let mut current = &root;
        for (position, selector) in selectors.iter().enumerate() {
            walked = walked.child(selector.clone());
            match selector {
                Selector::Index(index) => {
                    let array = current.as_array().ok_or_else(|| AssertionError::NotAnArray {
                        path: walked.to_string(),
                    })?;
                    current = array
                        .get(*index)
                        .ok_or_else(|| AssertionError::IndexOutOfBounds {
                            path: walked.to_string(),
                        })?;
                }
                Selector::Key(key) => {
                    let object = current.as_object().ok_or_else(|| AssertionError::NotAnObject {
                        path: walked.to_string(),
                    })?;
                    match object.get(key) {
                        Some(value) => current = value,
                        None if position + 1 == selectors.len() => return Ok(Lookup::Absent),
                        None => {
                            return Err(AssertionError::KeyMissing {
                                path: walked.to_string(),
                            });
                        }
                    }
                }
            }
        }

        Ok(Lookup::Json(current.clone()))
    }

    /// Resolves the path to a present value, treating absence as an error.
    fn present(&self) -> Result<Lookup, AssertionError> {
        match self.lookup()? {
            Lookup::Absent => Err(AssertionError::KeyMissing {
                path: self.path.describe(),
            }),
            found => Ok(found),
        }
    }

    /// Resolves the path to a JSON value.
    ///
    /// The root path yields the body text as a JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or the value is absent.
    pub fn value(&self) -> Result<Value, AssertionError> {
        match self.present()? {
            Lookup::Text(text) => Ok(Value::String(text)),
            Lookup::Json(value) => Ok(value),
            Lookup::Absent => Err(AssertionError::KeyMissing {
                path: self.path.describe(),
            }),
        }
    }

    fn mismatch(&self, expected: &'static str) -> AssertionError {
        AssertionError::TypeMismatch {
            path: self.path.describe(),
            expected,
        }
    }

    fn predicate_failed(&self, reason: String) -> AssertionError {
        AssertionError::PredicateFailed {
            path: self.path.describe(),
            reason,
        }
    }

    fn value_mismatch(&self, expected: impl ToString, actual: impl ToString) -> AssertionError {
        AssertionError::ValueMismatch {
            path: self.path.describe(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        }
    }

    /// Returns the string at the path.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value is not a string.
    pub fn string(&self) -> Result<String, AssertionError> {
        match self.present()? {
            Lookup::Text(text) | Lookup::Json(Value::String(text)) => Ok(text),
            _ => Err(self.mismatch("string")),
        }
    }

    /// Returns the integer at the path.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value is not an integer.
    pub fn int(&self) -> Result<i64, AssertionError> {
        match self.present()? {
            Lookup::Json(value) => value.as_i64().ok_or_else(|| self.mismatch("int")),
            _ => Err(self.mismatch("int")),
        }
    }

    /// Returns the number at the path as a double.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value is not a number.
    pub fn double(&self) -> Result<f64, AssertionError> {
        match self.present()? {
            Lookup::Json(value) => value.as_f64().ok_or_else(|| self.mismatch("double")),
            _ => Err(self.mismatch("double")),
        }
    }

    /// Returns the boolean at the path.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value is not a boolean.
    pub fn bool(&self) -> Result<bool, AssertionError> {
        match self.present()? {
            Lookup::Json(Value::Bool(flag)) => Ok(flag),
            _ => Err(self.mismatch("bool")),
        }
    }

    /// Returns the number of elements of the array at the path.
    ///
    /// The literal string `[]` counts as an empty array.
    ///
    /// # Errors
    ///
    /// Returns `TypeMismatch` if the value is not an array.
    pub fn array_count(&self) -> Result<usize, AssertionError> {
        match self.present()? {
            Lookup::Json(Value::Array(items)) => Ok(items.len()),
            Lookup::Text(text) | Lookup::Json(Value::String(text)) if text == "[]" => Ok(0),
            _ => Err(self.mismatch("array")),
        }
    }

    /// Asserts the string at the path equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a string, or different.
    pub fn expect_string(&self, expected: &str) -> Result<(), AssertionError> {
        let actual = self.string()?;
        if actual == expected {
            Ok(())
        } else {
            Err(self.value_mismatch(expected, actual))
        }
    }

    /// Asserts the string at the path satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `PredicateFailed` carrying the predicate's reason.
    pub fn expect_string_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(&str) -> Result<(), String>,
    {
        let actual = self.string()?;
        predicate(&actual).map_err(|reason| self.predicate_failed(reason))
    }

    /// Asserts the string at the path matches a regex pattern.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPattern` for a bad pattern, `ValueMismatch` otherwise.
    pub fn expect_string_matching(&self, pattern: &str) -> Result<(), AssertionError> {
        let regex = Regex::new(pattern).map_err(|e| AssertionError::InvalidPattern {
            pattern: pattern.to_string(),
            reason: e.to_string(),
        })?;
        let actual = self.string()?;
        if regex.is_match(&actual) {
            Ok(())
        } else {
            Err(self.value_mismatch(format!("matching /{pattern}/"), actual))
        }
    }

    /// Asserts the integer at the path equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not an integer, or different.
    pub fn expect_int(&self, expected: i64) -> Result<(), AssertionError> {
        let actual = self.int()?;
        if actual == expected {
            Ok(())
        } else {
            Err(self.value_mismatch(expected, actual))
        }
    }

    /// Asserts the integer at the path satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `PredicateFailed` carrying the predicate's reason.
    pub fn expect_int_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(i64) -> Result<(), String>,
    {
        let actual = self.int()?;
        predicate(actual).map_err(|reason| self.predicate_failed(reason))
    }

    /// Asserts the number at the path equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a number, or different.
    #[allow(clippy::float_cmp)]
    pub fn expect_double(&self, expected: f64) -> Result<(), AssertionError> {
        let actual = self.double()?;
        if actual == expected {
            Ok(())
        } else {
            Err(self.value_mismatch(expected, actual))
        }
    }

    /// Asserts the number at the path satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `PredicateFailed` carrying the predicate's reason.
    pub fn expect_double_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(f64) -> Result<(), String>,
    {
        let actual = self.double()?;
        predicate(actual).map_err(|reason| self.predicate_failed(reason))
    }

    /// Asserts the boolean at the path equals `expected`.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not a boolean, or different.
    pub fn expect_bool(&self, expected: bool) -> Result<(), AssertionError> {
        let actual = self.bool()?;
        if actual == expected {
            Ok(())
        } else {
            Err(self.value_mismatch(expected, actual))
        }
    }

    /// Asserts the boolean at the path satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `PredicateFailed` carrying the predicate's reason.
    pub fn expect_bool_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(bool) -> Result<(), String>,
    {
        let actual = self.bool()?;
        predicate(actual).map_err(|reason| self.predicate_failed(reason))
    }

    /// Asserts a value exists at the path.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be resolved or the value is absent.
    pub fn expect_exists(&self) -> Result<(), AssertionError> {
        self.present().map(|_| ())
    }

    /// Asserts there is no value at the path: the last key is absent or null.
    ///
    /// # Errors
    ///
    /// Returns `ValueMismatch` if a value is present.
    pub fn expect_nil(&self) -> Result<(), AssertionError> {
        match self.lookup()? {
            Lookup::Absent | Lookup::Json(Value::Null) => Ok(()),
            Lookup::Json(value) => Err(self.value_mismatch("no value", value)),
            Lookup::Text(text) => Err(self.value_mismatch("no value", text)),
        }
    }

    /// Asserts the array at the path has `expected` elements.
    ///
    /// # Errors
    ///
    /// Returns an error if the value is missing, not an array, or sized
    /// differently.
    pub fn expect_array_count(&self, expected: usize) -> Result<(), AssertionError> {
        let actual = self.array_count()?;
        if actual == expected {
            Ok(())
        } else {
            Err(self.value_mismatch(format!("{expected} elements"), actual))
        }
    }

    /// Asserts the array length at the path satisfies `predicate`.
    ///
    /// # Errors
    ///
    /// Returns `PredicateFailed` carrying the predicate's reason.
    pub fn expect_array_count_passing<F>(&self, predicate: F) -> Result<(), AssertionError>
    where
        F: FnOnce(usize) -> Result<(), String>,
    {
        let actual = self.array_count()?;
        predicate(actual).map_err(|reason| self.predicate_failed(reason))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const NESTED: &[u8] = br#"{"a":{"b":[1,2,{"c":"x"}]}}"#;

    fn path(selectors: &[Selector]) -> JsonPath {
        selectors.iter().cloned().collect()
    }

    fn abc() -> JsonPath {
        path(&["a".into(), "b".into(), 2_usize.into(), "c".into()])
    }

    #[test]
    fn test_nested_lookup() {
        let path = abc();
        let matcher = ResponseMatcher::new(Some(NESTED), &path);
        assert_eq!(matcher.lookup(), Ok(Lookup::Json(json!("x"))));
        assert_eq!(matcher.expect_string("x"), Ok(()));
    }

    #[test]
    fn test_index_out_of_bounds_names_path() {
        let path = path(&["a".into(), "b".into(), 5_usize.into()]);
        let matcher = ResponseMatcher::new(Some(NESTED), &path);
        assert_eq!(
            matcher.lookup(),
            Err(AssertionError::IndexOutOfBounds {
                path: "a.b.5".to_string()
            })
        );
    }

    #[test]
    fn test_missing_inner_key_is_an_error() {
        let path = path(&["a".into(), "z".into(), "c".into()]);
        let matcher = ResponseMatcher::new(Some(NESTED), &path);
        assert_eq!(
            matcher.lookup(),
            Err(AssertionError::KeyMissing {
                path: "a.z".to_string()
            })
        );
    }

    #[test]
    fn test_missing_trailing_key_is_absent() {
        let path = path(&["a".into(), "z".into()]);
        let matcher = ResponseMatcher::new(Some(NESTED), &path);
        assert_eq!(matcher.lookup(), Ok(Lookup::Absent));
        assert_eq!(matcher.expect_nil(), Ok(()));
        assert_eq!(
            matcher.expect_exists(),
            Err(AssertionError::KeyMissing {
                path: "a.z".to_string()
            })
        );
    }

    #[test]
    fn test_wrong_container_kinds() {
        let index_into_object = path(&["a".into(), 0_usize.into()]);
        assert_eq!(
            ResponseMatcher::new(Some(NESTED), &index_into_object).lookup(),
            Err(AssertionError::NotAnArray {
                path: "a.0".to_string()
            })
        );

        let key_into_array = path(&["a".into(), "b".into(), "c".into()]);
        assert_eq!(
            ResponseMatcher::new(Some(NESTED), &key_into_array).lookup(),
            Err(AssertionError::NotAnObject {
                path: "a.b.c".to_string()
            })
        );
    }

    #[test]
    fn test_root_path_reads_raw_text() {
        let root = JsonPath::root();
        let matcher = ResponseMatcher::new(Some(b"hello"), &root);
        assert_eq!(matcher.expect_string("hello"), Ok(()));

        let invalid = ResponseMatcher::new(Some(&[0xff, 0xfe]), &root);
        assert_eq!(invalid.lookup(), Err(AssertionError::InvalidEncoding));
    }

    #[test]
    fn test_invalid_json_and_missing_body() {
        let path = path(&["id".into()]);
        let matcher = ResponseMatcher::new(Some(b"not json"), &path);
        assert!(matches!(
            matcher.lookup(),
            Err(AssertionError::InvalidJson { .. })
        ));

        let empty = ResponseMatcher::new(None, &path);
        assert_eq!(empty.lookup(), Err(AssertionError::NoBody));
    }

    #[test]
    fn test_typed_assertions() {
        let body = br#"{"id":42,"ratio":0.5,"active":true,"name":"ada","tags":["a","b"],"gone":null}"#;
        let at = |key: &str| path(&[key.into()]);

        let id = at("id");
        assert_eq!(ResponseMatcher::new(Some(body), &id).expect_int(42), Ok(()));
        assert_eq!(ResponseMatcher::new(Some(body), &id).expect_double(42.0), Ok(()));

        let ratio = at("ratio");
        assert_eq!(ResponseMatcher::new(Some(body), &ratio).expect_double(0.5), Ok(()));
        assert_eq!(
            ResponseMatcher::new(Some(body), &ratio).expect_int(0),
            Err(AssertionError::TypeMismatch {
                path: "ratio".to_string(),
                expected: "int"
            })
        );

        let active = at("active");
        assert_eq!(ResponseMatcher::new(Some(body), &active).expect_bool(true), Ok(()));

        let name = at("name");
        assert_eq!(
            ResponseMatcher::new(Some(body), &name).expect_string("bob"),
            Err(AssertionError::ValueMismatch {
                path: "name".to_string(),
                expected: "bob".to_string(),
                actual: "ada".to_string()
            })
        );
        assert_eq!(
            ResponseMatcher::new(Some(body), &name).expect_string_matching("^a.a$"),
            Ok(())
        );

        let tags = at("tags");
        assert_eq!(ResponseMatcher::new(Some(body), &tags).expect_array_count(2), Ok(()));

        let gone = at("gone");
        assert_eq!(ResponseMatcher::new(Some(body), &gone).expect_nil(), Ok(()));
        assert_eq!(
            ResponseMatcher::new(Some(body), &name).expect_nil(),
            Err(AssertionError::ValueMismatch {
                path: "name".to_string(),
                expected: "no value".to_string(),
                actual: "\"ada\"".to_string()
            })
        );
    }

    #[test]
    fn test_predicate_reason_is_carried() {
        let id = path(&["id".into()]);
        let result = ResponseMatcher::new(Some(br#"{"id":7}"#), &id).expect_int_passing(|value| {
            if value > 10 {
                Ok(())
            } else {
                Err(format!("{value} is not above 10"))
            }
        });
        assert_eq!(
            result,
            Err(AssertionError::PredicateFailed {
                path: "id".to_string(),
                reason: "7 is not above 10".to_string()
            })
        );
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Value at id failed check: 7 is not above 10".to_string())
        );
    }

    #[test]
    fn test_every_predicate_kind_carries_its_reason() {
        let body = br#"{"name":"ada","ratio":0.25,"active":false,"tags":["a"],"id":3}"#;
        let at = |key: &str| path(&[key.into()]);
        let (name, ratio, active) = (at("name"), at("ratio"), at("active"));
        let (tags, id) = (at("tags"), at("id"));
        let failed = |path: &str, reason: &str| -> Result<(), AssertionError> {
            Err(AssertionError::PredicateFailed {
                path: path.to_string(),
                reason: reason.to_string(),
            })
        };

        let matcher = ResponseMatcher::new(Some(body), &name);
        let passing = matcher.expect_string_passing(|value| {
            value.starts_with('a').then_some(()).ok_or_else(|| "no a".to_string())
        });
        assert_eq!(passing, Ok(()));
        let result = matcher.expect_string_passing(|value| Err(format!("{value} is too short")));
        assert_eq!(result, failed("name", "ada is too short"));
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Value at name failed check: ada is too short".to_string())
        );

        let matcher = ResponseMatcher::new(Some(body), &ratio);
        let passing = matcher.expect_double_passing(|value| {
            (value < 1.0).then_some(()).ok_or_else(|| "not a fraction".to_string())
        });
        assert_eq!(passing, Ok(()));
        let result = matcher.expect_double_passing(|value| Err(format!("{value} is below 0.5")));
        assert_eq!(result, failed("ratio", "0.25 is below 0.5"));
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Value at ratio failed check: 0.25 is below 0.5".to_string())
        );

        let matcher = ResponseMatcher::new(Some(body), &active);
        let passing = matcher.expect_bool_passing(|value| {
            (!value).then_some(()).ok_or_else(|| "still active".to_string())
        });
        assert_eq!(passing, Ok(()));
        let result = matcher.expect_bool_passing(|value| Err(format!("active was {value}")));
        assert_eq!(result, failed("active", "active was false"));
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Value at active failed check: active was false".to_string())
        );

        let matcher = ResponseMatcher::new(Some(body), &tags);
        let passing = matcher.expect_array_count_passing(|count| {
            (count > 0).then_some(()).ok_or_else(|| "empty".to_string())
        });
        assert_eq!(passing, Ok(()));
        let result =
            matcher.expect_array_count_passing(|count| Err(format!("{count} tags is too few")));
        assert_eq!(result, failed("tags", "1 tags is too few"));
        assert_eq!(
            result.map_err(|e| e.to_string()),
            Err("Value at tags failed check: 1 tags is too few".to_string())
        );

        let matcher = ResponseMatcher::new(Some(body), &id);
        assert_eq!(
            matcher.expect_int_passing(|value| Err(format!("{value} is odd"))),
            failed("id", "3 is odd")
        );
    }

    #[test]
    fn test_predicates_are_not_called_on_type_mismatch() {
        let body = br#"{"name":"ada","id":3,"tags":{"a":1}}"#;
        let at = |key: &str| path(&[key.into()]);
        let (name, id, tags) = (at("name"), at("id"), at("tags"));
        let mismatch = |path: &str, expected: &'static str| -> Result<(), AssertionError> {
            Err(AssertionError::TypeMismatch {
                path: path.to_string(),
                expected,
            })
        };
        let never = || "predicate should not run".to_string();

        assert_eq!(
            ResponseMatcher::new(Some(body), &id).expect_string_passing(|_| Err(never())),
            mismatch("id", "string")
        );
        assert_eq!(
            ResponseMatcher::new(Some(body), &name).expect_int_passing(|_| Err(never())),
            mismatch("name", "int")
        );
        assert_eq!(
            ResponseMatcher::new(Some(body), &name).expect_double_passing(|_| Err(never())),
            mismatch("name", "double")
        );
        assert_eq!(
            ResponseMatcher::new(Some(body), &id).expect_bool_passing(|_| Err(never())),
            mismatch("id", "bool")
        );
        assert_eq!(
            ResponseMatcher::new(Some(body), &tags).expect_array_count_passing(|_| Err(never())),
            mismatch("tags", "array")
        );
        assert_eq!(
            mismatch("tags", "array").map_err(|e| e.to_string()),
            Err("Expected array at tags".to_string())
        );
    }

    #[test]
    fn test_empty_array_synonyms() {
        let root = JsonPath::root();
        assert_eq!(ResponseMatcher::new(Some(b"[]"), &root).expect_array_count(0), Ok(()));

        let items = path(&["items".into()]);
        assert_eq!(
            ResponseMatcher::new(Some(br#"{"items":[]}"#), &items).expect_array_count(0),
            Ok(())
        );
        assert_eq!(
            ResponseMatcher::new(Some(br#"{"items":"[]"}"#), &items).expect_array_count(0),
            Ok(())
        );
        assert!(
            ResponseMatcher::new(Some(br#"{"items":"[]"}"#), &items)
                .expect_array_count(1)
                .is_err()
        );
    }

    #[test]
    fn test_type_mismatch_on_root_text() {
        let root = JsonPath::root();
        assert_eq!(
            ResponseMatcher::new(Some(b"42"), &root).expect_int(42),
            Err(AssertionError::TypeMismatch {
                path: "<root>".to_string(),
                expected: "int"
            })
        );
    }
}
