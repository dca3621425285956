//! `await` and the end-of-run task drain.

use std::rc::Rc;

use tracing::{trace, warn};

use corp_ir::{Node, Span};

use super::call::Args;
use super::{ControlAction, EvalResult, Interpreter};
use crate::errors;
use crate::tasks::{TaskHandle, TaskPoll};
use crate::{Environment, Value};

impl Interpreter {
    /// Awaiting a task runs it if it has not started yet. Awaiting any
    /// other value yields the value.
    pub(super) fn eval_await(&mut self, inner: &Node, env: &Environment, span: &Span) -> EvalResult {
        match self.eval(inner, env)? {
            Value::Task(task) => self.run_task(&task, span),
            value => Ok(value),
        }
    }

    fn run_task(&mut self, task: &TaskHandle, span: &Span) -> EvalResult {
        match task.poll() {
            TaskPoll::Start(call) => {
                trace!(task = task.id(), function = %task.name(), "task started");
                let args = Args::from_vec(call.args);
                match self.invoke_closure(&call.closure, call.receiver, args, span) {
                    Ok(value) => {
                        task.complete(Ok(value.clone()));
                        Ok(value)
                    }
                    Err(ControlAction::Raise(exc)) => {
                        task.complete(Err(Rc::clone(&exc)));
                        Err(ControlAction::Raise(exc))
                    }
                    Err(other) => {
                        task.complete(Ok(Value::Null));
                        Err(other)
                    }
                }
            }
            TaskPoll::Running => Err(self.raise(errors::await_running_task(task.name()), span)),
            TaskPoll::Done(value) => Ok(value),
            TaskPoll::Failed(exc) => Err(ControlAction::Raise(exc)),
        }
    }

    /// Run every task that was scheduled but never awaited, oldest first.
    /// Failures are logged, not propagated.
    pub(super) fn drain_tasks(&mut self) {
        while let Some(task) = self.tasks.pop_front() {
            if task.is_finished() {
                continue;
            }
            match self.run_task(&task, &Span::default()) {
                Ok(_) => trace!(task = task.id(), remaining = self.tasks.len(), "task drained"),
                Err(ControlAction::Raise(exc)) => {
                    warn!(task = task.id(), function = %task.name(), exception = %exc, "unawaited task failed");
                }
                Err(_) => {}
            }
        }
    }
}
