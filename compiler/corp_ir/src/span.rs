//! Source locations.
//!
//! The parser attaches `(file, line, column)` to every node. Lines and
//! columns are 1-based; `0` means "unknown" and is used for synthesized
//! nodes.

use std::fmt;

use crate::Name;

/// Location of a node in its source file.
#[derive(Clone, Eq, PartialEq, Hash, Default)]
pub struct Span {
    /// Path of the file as the parser saw it.
    pub file: Name,
    /// 1-based line, `0` when unknown.
    pub line: u32,
    /// 1-based column, `0` when unknown.
    pub column: u32,
}

impl Span {
    /// Create a new span.
    #[inline]
    pub fn new(file: impl Into<Name>, line: u32, column: u32) -> Self {
        Span {
            file: file.into(),
            line,
            column,
        }
    }

    /// Span for nodes the engine synthesizes itself (built-in classes).
    pub fn builtin() -> Self {
        Span::new("<builtin>", 0, 0)
    }

    /// Whether this span points at a real source line.
    #[inline]
    pub fn is_known(&self) -> bool {
        self.line > 0
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

#[cfg(test)]
mod tests;
