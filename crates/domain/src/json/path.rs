//! JSON path selectors

use std::fmt;

/// One step of a JSON path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Selector {
    /// Object member lookup.
    Key(String),
    /// Array element lookup.
    Index(usize),
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(index) => write!(f, "{index}"),
        }
    }
}

impl From<&str> for Selector {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for Selector {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for Selector {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

/// An ordered sequence of selectors starting at the response root.
///
/// Displays as dot-separated segments without escaping, e.g. `a.b.2.c`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    selectors: Vec<Selector>,
}

impl JsonPath {
    /// The empty path, addressing the whole body.
    #[must_use]
    pub const fn root() -> Self {
        Self {
            selectors: Vec::new(),
        }
    }

    /// Returns a new path extended by one selector.
    #[must_use]
    pub fn child(&self, selector: impl Into<Selector>) -> Self {
        let mut selectors = self.selectors.clone();
        selectors.push(selector.into());
        Self { selectors }
    }

    /// Returns true for the root path.
    #[must_use]
    pub fn is_root(&self) -> bool {
        self.selectors.is_empty()
    }

    /// Returns the selectors in order.
    #[must_use]
    pub fn selectors(&self) -> &[Selector] {
        &self.selectors
    }

    /// The path as it appears in error messages.
    #[must_use]
    pub fn describe(&self) -> String {
        if self.is_root() {
            "<root>".to_string()
        } else {
            self.to_string()
        }
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, selector) in self.selectors.iter().enumerate() {
            if position > 0 {
                f.write_str(".")?;
            }
            write!(f, "{selector}")?;
        }
        Ok(())
    }
}

impl<S: Into<Selector>> FromIterator<S> for JsonPath {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            selectors: iter.into_iter().map(Into::into).collect(),
        }
    }
}
