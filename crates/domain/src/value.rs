//! Typed keys for values produced by one spec and consumed by another.

use std::fmt;
use std::marker::PhantomData;

use serde_json::Value;

/// A native type a response value can be parsed into.
pub trait Parsable {
    /// Human-readable kind used in mismatch messages.
    const KIND: &'static str;

    /// Returns true if the JSON value has this kind.
    fn accepts(value: &Value) -> bool;
}

impl Parsable for String {
    const KIND: &'static str = "string";

    fn accepts(value: &Value) -> bool {
        value.is_string()
    }
}

impl Parsable for i64 {
    const KIND: &'static str = "int";

    fn accepts(value: &Value) -> bool {
        value.as_i64().is_some()
    }
}

impl Parsable for f64 {
    const KIND: &'static str = "double";

    fn accepts(value: &Value) -> bool {
        value.is_number()
    }
}

impl Parsable for bool {
    const KIND: &'static str = "bool";

    fn accepts(value: &Value) -> bool {
        value.is_boolean()
    }
}

/// The logical identity of a dependent value.
///
/// Declare one constant per value:
///
/// ```
/// use netsuite_domain::ValueKey;
///
/// const USER_ID: ValueKey<i64> = ValueKey::new("UserId");
/// assert_eq!(USER_ID.name(), "UserId");
/// ```
pub struct ValueKey<T> {
    name: &'static str,
    kind: PhantomData<fn() -> T>,
}

impl<T> ValueKey<T> {
    /// Creates a key with the given name.
    #[must_use]
    pub const fn new(name: &'static str) -> Self {
        Self {
            name,
            kind: PhantomData,
        }
    }

    /// Returns the registry name of this key.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }
}

impl<T> Clone for ValueKey<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ValueKey<T> {}

impl<T> fmt::Debug for ValueKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ValueKey").field(&self.name).finish()
    }
}

impl<T> fmt::Display for ValueKey<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Resolution state of a dependent value.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum ValueStatus {
    /// No producer has reported yet.
    #[default]
    Waiting,
    /// The producer parsed the value.
    Parsed(Value),
    /// The producer failed or never produced the value.
    Failed,
}

impl ValueStatus {
    /// Returns true while the value is still pending.
    #[must_use]
    pub const fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns the parsed value, if any.
    #[must_use]
    pub const fn parsed(&self) -> Option<&Value> {
        match self {
            Self::Parsed(value) => Some(value),
            Self::Waiting | Self::Failed => None,
        }
    }
}

/// Renders a parsed value the way it appears in a URL or header.
///
/// Strings are used verbatim, every other value uses its JSON text.
#[must_use]
pub fn render_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
