//! How the interpreter is being driven.
//!
//! A mode is a bundle of defaults. Anything set explicitly on the
//! `InterpreterBuilder` wins over what the mode would pick.

use crate::print_handler::{buffer_handler, stdout_handler, SharedPrintHandler};

/// Call depth at which user recursion raises `MemoryError`.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 200;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum EvalMode {
    /// A user running a program; `print` reaches stdout.
    #[default]
    Interpret,
    /// A test harness; `print` is captured so it can be asserted on.
    TestRun,
}

impl EvalMode {
    pub fn captures_output(self) -> bool {
        self == EvalMode::TestRun
    }

    /// Handler used when the host did not supply one.
    pub(crate) fn default_print_handler(self) -> SharedPrintHandler {
        if self.captures_output() {
            buffer_handler()
        } else {
            stdout_handler()
        }
    }

    /// `None` would mean unbounded; no mode currently opts out.
    pub fn max_recursion_depth(self) -> Option<usize> {
        Some(DEFAULT_MAX_CALL_DEPTH)
    }
}
