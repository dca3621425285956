//! Live call stack and frame snapshots.
//!
//! Every function call (and the top level of each program or module) pushes
//! a [`CallFrame`]. The dispatcher moves the top frame's location forward one
//! statement at a time. When an exception is raised, [`CallStack::snapshot`]
//! freezes the stack into [`StackFrame`]s that travel with the exception.

use corp_ir::{Name, Span};

use crate::exception::{LocalVar, StackFrame};
use crate::Environment;

/// Longest rendered value kept in a frame's variable listing.
const MAX_VALUE_REPR: usize = 60;

/// A single frame in the live call stack.
#[derive(Clone, Debug)]
pub struct CallFrame {
    /// Function name, `Class.method`, or `<module>`.
    pub function: Name,
    /// Location of the statement currently executing in this frame.
    pub span: Span,
    /// Innermost environment of the statement currently executing.
    pub env: Environment,
}

impl CallFrame {
    pub fn new(function: Name, span: Span, env: Environment) -> Self {
        CallFrame {
            function,
            span,
            env,
        }
    }

    fn snapshot(&self, max_locals: usize) -> StackFrame {
        let locals = self
            .env
            .locals()
            .into_iter()
            .filter(|(name, value)| !name.is_internal() && !value.is_callable())
            .take(max_locals)
            .map(|(name, value)| LocalVar {
                name,
                value: truncate(&value.repr(), MAX_VALUE_REPR),
                type_name: value.type_name(),
            })
            .collect();
        StackFrame {
            file: self.span.file.clone(),
            line: self.span.line,
            column: self.span.column,
            function: self.function.clone(),
            locals,
        }
    }
}

/// Error from [`CallStack::push`] when the depth limit is reached.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DepthExceeded {
    pub max: usize,
}

/// Live call stack for the interpreter.
///
/// The depth check is integrated into `push()`.
#[derive(Clone, Debug)]
pub struct CallStack {
    frames: Vec<CallFrame>,
    max_depth: Option<usize>,
}

impl CallStack {
    /// Create an empty call stack. `None` means unlimited.
    pub fn new(max_depth: Option<usize>) -> Self {
        Self {
            frames: Vec::new(),
            max_depth,
        }
    }

    /// Push a call frame, checking the depth limit.
    ///
    /// The frame is NOT pushed on overflow.
    pub fn push(&mut self, frame: CallFrame) -> Result<(), DepthExceeded> {
        if let Some(max) = self.max_depth {
            if self.frames.len() >= max {
                return Err(DepthExceeded { max });
            }
        }
        self.frames.push(frame);
        Ok(())
    }

    /// Pop the most recent call frame.
    ///
    /// # Panics
    ///
    /// Panics in debug mode if the stack is empty.
    pub fn pop(&mut self) {
        debug_assert!(
            !self.frames.is_empty(),
            "CallStack::pop() called on empty stack"
        );
        self.frames.pop();
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    #[inline]
    pub fn current_frame(&self) -> Option<&CallFrame> {
        self.frames.last()
    }

    /// Record that the top frame is now executing `span` in `env`.
    pub fn set_location(&mut self, span: &Span, env: &Environment) {
        if let Some(frame) = self.frames.last_mut() {
            if span.is_known() {
                frame.span.clone_from(span);
            }
            if !frame.env.same_scope(env) {
                frame.env = env.clone();
            }
        }
    }

    /// Freeze the stack, most recent call first.
    pub fn snapshot(&self, max_locals: usize) -> Vec<StackFrame> {
        self.frames
            .iter()
            .rev()
            .map(|frame| frame.snapshot(max_locals))
            .collect()
    }
}

impl Default for CallStack {
    fn default() -> Self {
        Self::new(None)
    }
}

/// Cut `text` to at most `max` characters, marking the cut with `...`.
pub(crate) fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}
