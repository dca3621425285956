//! Scoped call frames.
//!
//! [`FrameGuard::enter`] pushes a frame and hands back a guard that pops it
//! when dropped. Early `?` returns, raised exceptions and unwinding out of a
//! panicking native all leave the call stack balanced.

use std::ops::{Deref, DerefMut};

use corp_ir::Span;

use super::{ControlAction, Interpreter};
use crate::diagnostics::CallFrame;
use crate::errors;

pub(super) struct FrameGuard<'a> {
    interpreter: &'a mut Interpreter,
}

impl<'a> FrameGuard<'a> {
    /// Push `frame`, or raise `MemoryError` at `span` when the stack is full.
    pub(super) fn enter(
        interpreter: &'a mut Interpreter,
        frame: CallFrame,
        span: &Span,
    ) -> Result<Self, ControlAction> {
        if let Err(exceeded) = interpreter.call_stack.push(frame) {
            return Err(interpreter.raise(errors::recursion_limit(exceeded.max), span));
        }
        Ok(FrameGuard { interpreter })
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        self.interpreter.call_stack.pop();
    }
}

// The body runs through the guard so the borrow outlives every early exit.
impl Deref for FrameGuard<'_> {
    type Target = Interpreter;

    fn deref(&self) -> &Interpreter {
        self.interpreter
    }
}

impl DerefMut for FrameGuard<'_> {
    fn deref_mut(&mut self) -> &mut Interpreter {
        self.interpreter
    }
}
