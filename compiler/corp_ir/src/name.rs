//! Shared string identifier.
//!
//! Trees arrive fully built from an external parser, so there is no
//! interner to index into. `Name` is a reference-counted string that clones
//! in O(1) and compares by content.

use std::borrow::Borrow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

/// Identifier or file name.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name(Arc<str>);

impl Name {
    /// Create a name from any string-like value.
    #[inline]
    pub fn new(text: impl AsRef<str>) -> Self {
        Name(Arc::from(text.as_ref()))
    }

    /// Borrow the underlying text.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Names starting with `__` are engine-internal and hidden from reports.
    #[inline]
    pub fn is_internal(&self) -> bool {
        self.0.starts_with("__")
    }
}

impl Default for Name {
    fn default() -> Self {
        Name::new("")
    }
}

impl From<&str> for Name {
    fn from(text: &str) -> Self {
        Name::new(text)
    }
}

impl From<String> for Name {
    fn from(text: String) -> Self {
        Name(Arc::from(text))
    }
}

impl Borrow<str> for Name {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Deref for Name {
    type Target = str;

    #[inline]
    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Name {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", &*self.0)
    }
}
