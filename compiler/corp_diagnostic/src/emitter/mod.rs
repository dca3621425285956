//! Rendering diagnostics for people.
//!
//! The engine only returns [`Diagnostic`] values; a host that wants to show
//! them picks an emitter. [`TerminalEmitter`] is the one shipped here.

mod terminal;

use std::io;

pub use terminal::TerminalEmitter;

use crate::Diagnostic;

pub trait DiagnosticEmitter {
    fn emit(&mut self, diagnostic: &Diagnostic) -> io::Result<()>;

    /// Emit every diagnostic, then a closing summary line.
    fn emit_report(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()> {
        for diagnostic in diagnostics {
            self.emit(diagnostic)?;
        }
        self.emit_summary(diagnostics)
    }

    /// Counts of errors and warnings. Writes nothing for an empty slice.
    fn emit_summary(&mut self, diagnostics: &[Diagnostic]) -> io::Result<()>;
}
