//! Where `print` output goes.
//!
//! The interpreter never touches the terminal directly. Every `print` call
//! becomes one [`PrintHandlerImpl::write_line`] on the handler the host set
//! in the builder; hosts capture, forward or drop the lines from there.

use std::io::{self, Write};
use std::sync::Arc;

use parking_lot::Mutex;

/// Line-at-a-time stdout writer.
///
/// A closed pipe on the reading side is not a program fault, so write
/// errors are dropped instead of surfacing as a panic.
#[derive(Default)]
pub struct StdoutPrintHandler;

impl StdoutPrintHandler {
    fn write_line(&self, line: &str) {
        let mut out = io::stdout().lock();
        if writeln!(out, "{line}").is_err() {
            tracing::debug!("stdout closed; dropping print output");
        }
    }
}

/// In-memory capture, used by `EvalMode::TestRun` and embedding hosts.
#[derive(Default)]
pub struct BufferPrintHandler {
    lines: Mutex<String>,
}

impl BufferPrintHandler {
    pub fn new() -> Self {
        Self::default()
    }

    fn write_line(&self, line: &str) {
        let mut lines = self.lines.lock();
        lines.push_str(line);
        lines.push('\n');
    }

    /// Everything printed so far, each line newline-terminated.
    pub fn get_output(&self) -> String {
        self.lines.lock().clone()
    }

    /// Hand back the captured text and start over.
    pub fn take(&self) -> String {
        std::mem::take(&mut *self.lines.lock())
    }

    pub fn clear(&self) {
        self.lines.lock().clear();
    }
}

pub enum PrintHandlerImpl {
    Stdout(StdoutPrintHandler),
    Buffer(BufferPrintHandler),
    Silent,
}

impl PrintHandlerImpl {
    pub fn write_line(&self, line: &str) {
        match self {
            PrintHandlerImpl::Stdout(out) => out.write_line(line),
            PrintHandlerImpl::Buffer(buffer) => buffer.write_line(line),
            PrintHandlerImpl::Silent => {}
        }
    }

    /// Captured text; stdout and silent handlers keep nothing.
    pub fn get_output(&self) -> String {
        match self {
            PrintHandlerImpl::Buffer(buffer) => buffer.get_output(),
            PrintHandlerImpl::Stdout(_) | PrintHandlerImpl::Silent => String::new(),
        }
    }

    pub fn take_output(&self) -> String {
        match self {
            PrintHandlerImpl::Buffer(buffer) => buffer.take(),
            PrintHandlerImpl::Stdout(_) | PrintHandlerImpl::Silent => String::new(),
        }
    }

    pub fn clear(&self) {
        if let PrintHandlerImpl::Buffer(buffer) = self {
            buffer.clear();
        }
    }
}

/// One handler, held by both the host and the interpreter.
pub type SharedPrintHandler = Arc<PrintHandlerImpl>;

pub fn stdout_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Stdout(StdoutPrintHandler))
}

pub fn buffer_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Buffer(BufferPrintHandler::new()))
}

pub fn silent_handler() -> SharedPrintHandler {
    Arc::new(PrintHandlerImpl::Silent)
}
