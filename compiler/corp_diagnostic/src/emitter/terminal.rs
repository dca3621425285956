//! Plain-text rendering with optional ANSI colors.
//!
//! ```text
//! error[E1001]: Variable not declared in all branches: `r`
//!   --> src/app.corp:7:10
//!    |
//!  7 |   return r
//!    |          ^ `r` is not in scope here
//!   ::: src/app.corp:3:5: declared inside this branch
//!    = note: ...
//!    = help: ...
//! ```
//!
//! A label gets a source excerpt only when its file is in the attached
//! [`SourceMap`]; otherwise its message follows the location.

use std::io::{self, IsTerminal, Write};

use corp_ir::Span;

use super::DiagnosticEmitter;
use crate::{Diagnostic, Label, Severity, SourceMap};

const RED: &str = "\x1b[1;31m";
const YELLOW: &str = "\x1b[1;33m";
const BLUE: &str = "\x1b[1;34m";
const GREEN: &str = "\x1b[1;32m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

pub struct TerminalEmitter<W: Write> {
    writer: W,
    colored: bool,
    sources: SourceMap,
}

impl<W: Write> TerminalEmitter<W> {
    /// Uncolored output into `writer`.
    pub fn new(writer: W) -> Self {
        TerminalEmitter {
            writer,
            colored: false,
            sources: SourceMap::new(),
        }
    }

    #[must_use]
    pub fn with_colors(mut self, colored: bool) -> Self {
        self.colored = colored;
        self
    }

    #[must_use]
    pub fn with_sources(mut self, sources: SourceMap) -> Self {
        self.sources = sources;
        self
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn paint(&mut self, text: &str, color: &str) -> io::Result<()> {
        if self.colored {
            write!(self.writer, "{color}{text}{RESET}")
        } else {
            self.writer.write_all(text.as_bytes())
        }
    }

    fn write_label(&mut self, label: &Label) -> io::Result<()> {
        let (arrow, marker, color) = if label.is_primary {
            ("-->", '^', RED)
        } else {
            (":::", '-', BLUE)
        };
        let location = location(&label.span);
        let excerpt = self
            .sources
            .line_text(label.span.file.as_str(), label.span.line)
            .map(str::to_owned);

        let Some(text) = excerpt else {
            write!(self.writer, "  {arrow} {location}: ")?;
            self.paint(&label.message, color)?;
            return writeln!(self.writer);
        };

        let number = label.span.line.to_string();
        let gutter = " ".repeat(number.len());
        let indent = " ".repeat(label.span.column.saturating_sub(1) as usize);
        writeln!(self.writer, "  {arrow} {location}")?;
        writeln!(self.writer, " {gutter} |")?;
        writeln!(self.writer, " {number} | {text}")?;
        write!(self.writer, " {gutter} | {indent}")?;
        self.paint(&format!("{marker} {}", label.message), color)?;
        writeln!(self.writer)
    }
}

impl TerminalEmitter<io::Stderr> {
    /// Stderr, colored when it is a terminal.
    pub fn stderr() -> Self {
        let stderr = io::stderr();
        let colored = stderr.is_terminal();
        TerminalEmitter::new(stderr).with_colors(colored)
    }
}

impl<W: Write> DiagnosticEmitter for TerminalEmitter<W> {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()> {
        let color = match diagnostic.severity {
            Severity::Error => RED,
            Severity::Warning => YELLOW,
        };
        self.paint(&format!("{}[{}]", diagnostic.severity, diagnostic.code), color)?;
        self.paint(&format!(": {}", diagnostic.message), BOLD)?;
        writeln!(self.writer)?;

        for label in &diagnostic.labels {
            self.write_label(label)?;
        }
        for note in &diagnostic.notes {
            writeln!(self.writer, "   = note: {note}")?;
        }
        for suggestion in &diagnostic.suggestions {
            write!(self.writer, "   = ")?;
            self.paint("help", GREEN)?;
            writeln!(self.writer, ": {suggestion}")?;
        }
        writeln!(self.writer)?;
        self.writer.flush()
    }

    fn emit_summary(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        if diagnostics.is_empty() {
            return Ok(());
        }
        let errors = diagnostics.iter().filter(|d| d.is_error()).count();
        let warnings = diagnostics.len() - errors;
        let mut parts = Vec::new();
        if errors > 0 {
            parts.push(count(errors, "error"));
        }
        if warnings > 0 {
            parts.push(count(warnings, "warning"));
        }
        if errors > 0 {
            self.paint("error", RED)?;
            writeln!(self.writer, ": {}; the program was not run", parts.join(", "))?;
        } else {
            self.paint("warning", YELLOW)?;
            writeln!(self.writer, ": {}", parts.join(", "))?;
        }
        self.writer.flush()
    }
}

fn location(span: &Span) -> String {
    format!("{}:{}:{}", span.file, span.line, span.column)
}

fn count(n: usize, noun: &str) -> String {
    if n == 1 {
        format!("1 {noun}")
    } else {
        format!("{n} {noun}s")
    }
}
