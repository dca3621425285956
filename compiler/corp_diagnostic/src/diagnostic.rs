//! Analyzer reports.
//!
//! A [`Diagnostic`] is assembled with chained `with_*` calls and handed to
//! the host unchanged; rendering is the emitter's job.

use std::fmt;

use corp_ir::Span;

use crate::ErrorCode;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Severity {
    /// The program is rejected.
    Error,
    /// Reported, but the program still runs.
    Warning,
}

impl Severity {
    pub const fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A source location with a short explanation attached.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Label {
    pub span: Span,
    pub message: String,
    /// The location the diagnostic is about, as opposed to related context.
    pub is_primary: bool,
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[must_use = "a diagnostic does nothing until it is returned or emitted"]
pub struct Diagnostic {
    pub code: ErrorCode,
    pub severity: Severity,
    pub message: String,
    /// Primary label first when there is one.
    pub labels: Vec<Label>,
    pub notes: Vec<String>,
    pub suggestions: Vec<String>,
}

impl Diagnostic {
    #[cold]
    pub fn error(code: ErrorCode) -> Self {
        Self::with_severity(code, Severity::Error)
    }

    #[cold]
    pub fn warning(code: ErrorCode) -> Self {
        Self::with_severity(code, Severity::Warning)
    }

    fn with_severity(code: ErrorCode, severity: Severity) -> Self {
        Diagnostic {
            code,
            severity,
            message: String::new(),
            labels: Vec::new(),
            notes: Vec::new(),
            suggestions: Vec::new(),
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    /// Point at the offending location.
    pub fn with_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), true)
    }

    /// Point at a related location, such as the original declaration.
    pub fn with_secondary_label(self, span: Span, message: impl Into<String>) -> Self {
        self.labelled(span, message.into(), false)
    }

    fn labelled(mut self, span: Span, message: String, is_primary: bool) -> Self {
        self.labels.push(Label {
            span,
            message,
            is_primary,
        });
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.notes.push(note.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn is_error(&self) -> bool {
        matches!(self.severity, Severity::Error)
    }

    pub fn primary_span(&self) -> Option<&Span> {
        self.labels
            .iter()
            .find_map(|label| label.is_primary.then_some(&label.span))
    }
}

/// One-line form: `error[E1001]: message`.
impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.code, self.message)
    }
}
