//! Literal or dependent values used for endpoints, headers and query parameters

use std::fmt;
use std::sync::Arc;

use netsuite_domain::ValueKey;
use serde_json::Value;

use crate::dependency::Translate;

/// A reference to a value another spec will produce.
#[derive(Clone)]
pub struct DependentRef {
    key: String,
    translate: Option<Translate>,
}

impl DependentRef {
    /// The key of the referenced value.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The translate function, if one was attached.
    #[must_use]
    pub fn translate(&self) -> Option<&Translate> {
        self.translate.as_ref()
    }
}

impl fmt::Debug for DependentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependentRef")
            .field("key", &self.key)
            .field("translate", &self.translate.is_some())
            .finish()
    }
}

/// Either a fixed string or a value resolved at run time.
#[derive(Debug, Clone)]
pub enum ValueSource {
    /// A fixed string.
    Literal(String),
    /// A value produced by another spec's assertion.
    Dependent(DependentRef),
}

impl ValueSource {
    /// A dependent value converted to a string with `translate` when consumed.
    ///
    /// If several nodes attach a translate to the same key, the first one
    /// registered during the run is used.
    pub fn dependent_with<T, F>(key: ValueKey<T>, translate: F) -> Self
    where
        F: Fn(&Value) -> String + Send + Sync + 'static,
    {
        Self::Dependent(DependentRef {
            key: key.name().to_string(),
            translate: Some(Arc::new(translate)),
        })
    }

    /// The dependent key, if any.
    #[must_use]
    pub fn dependent_key(&self) -> Option<&str> {
        match self {
            Self::Literal(_) => None,
            Self::Dependent(dependent) => Some(dependent.key()),
        }
    }
}

impl Default for ValueSource {
    fn default() -> Self {
        Self::Literal(String::new())
    }
}

impl From<&str> for ValueSource {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_string())
    }
}

impl From<String> for ValueSource {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

impl<T> From<ValueKey<T>> for ValueSource {
    fn from(key: ValueKey<T>) -> Self {
        Self::Dependent(DependentRef {
            key: key.name().to_string(),
            translate: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    const TOKEN: ValueKey<String> = ValueKey::new("Token");

    #[test]
    fn test_literal_conversions() {
        assert!(matches!(ValueSource::from("users"), ValueSource::Literal(s) if s == "users"));
        assert_eq!(ValueSource::from("users".to_string()).dependent_key(), None);
        assert!(matches!(ValueSource::default(), ValueSource::Literal(s) if s.is_empty()));
    }

    #[test]
    fn test_dependent_with_translate() {
        let source = ValueSource::dependent_with(TOKEN, |value: &Value| {
            format!("Bearer {}", value.as_str().unwrap_or_default())
        });
        let ValueSource::Dependent(dependent) = source else {
            panic!("expected a dependent source");
        };
        assert_eq!(dependent.key(), "Token");
        let translate = dependent.translate().map(|f| f(&json!("abc")));
        assert_eq!(translate, Some("Bearer abc".to_string()));
    }

    #[test]
    fn test_plain_key_has_no_translate() {
        let ValueSource::Dependent(dependent) = ValueSource::from(TOKEN) else {
            panic!("expected a dependent source");
        };
        assert!(dependent.translate().is_none());
    }
}
