//! Branches, loops, and exceptions.
//!
//! Every branch arm, loop iteration, `try` body, catch clause, `finally`
//! block and `with` statement runs in its own block environment.

use std::rc::Rc;

use tracing::debug;

use corp_ir::{CatchClause, ForEachMode, Name, Node, Span, WithItem};

use super::access::find_hook;
use super::call::Args;
use super::{ControlAction, EvalResult, Interpreter};
use crate::errors;
use crate::exception::{CatchMatcher, ExceptionObject};
use crate::{Environment, Value};

const ENTER_HOOKS: &[&str] = &["__enter__", "enter"];
const EXIT_HOOKS: &[&str] = &["__exit__", "exit"];

/// What a loop does after one pass of its body.
enum Flow {
    Next,
    Exit,
}

/// Consume `break` and `continue`; pass everything else up.
fn loop_flow(outcome: EvalResult) -> Result<Flow, ControlAction> {
    match outcome {
        Ok(_) | Err(ControlAction::Continue) => Ok(Flow::Next),
        Err(ControlAction::Break) => Ok(Flow::Exit),
        Err(other) => Err(other),
    }
}

impl Interpreter {
    pub(super) fn eval_if(
        &mut self,
        condition: &Node,
        then_branch: &[Node],
        else_branch: Option<&[Node]>,
        env: &Environment,
    ) -> EvalResult {
        if self.eval(condition, env)?.is_truthy() {
            self.exec_block(then_branch, &Environment::block(env))
        } else if let Some(else_branch) = else_branch {
            self.exec_block(else_branch, &Environment::block(env))
        } else {
            Ok(Value::Null)
        }
    }

    pub(super) fn eval_while(&mut self, condition: &Node, body: &[Node], env: &Environment) -> EvalResult {
        while self.eval(condition, env)?.is_truthy() {
            let outcome = self.exec_block(body, &Environment::block(env));
            if let Flow::Exit = loop_flow(outcome)? {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// C-style `for`. Variables declared by the initializer are copied into
    /// each iteration's environment and written back before the update, so
    /// closures created in the body keep the value of their own iteration.
    pub(super) fn eval_for(
        &mut self,
        init: Option<&Node>,
        condition: Option<&Node>,
        update: Option<&Node>,
        body: &[Node],
        env: &Environment,
    ) -> EvalResult {
        let loop_env = Environment::block(env);
        if let Some(init) = init {
            self.eval(init, &loop_env)?;
        }
        loop {
            if let Some(condition) = condition {
                if !self.eval(condition, &loop_env)?.is_truthy() {
                    break;
                }
            }

            let iteration_env = Environment::block(&loop_env);
            loop_env.copy_bindings_to(&iteration_env);
            let flow = loop_flow(self.exec_block(body, &iteration_env))?;
            iteration_env.write_back_to(&loop_env);
            if let Flow::Exit = flow {
                break;
            }

            if let Some(update) = update {
                self.eval(update, &loop_env)?;
            }
        }
        Ok(Value::Null)
    }

    /// `for x in xs` over a snapshot of a list, string, or record.
    pub(super) fn eval_for_each(
        &mut self,
        binding: &Name,
        mode: ForEachMode,
        iterable: &Node,
        body: &[Node],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let iterable = self.eval(iterable, env)?;
        let items: Vec<Value> = match (&iterable, mode) {
            (Value::List(items), ForEachMode::Values) => items.borrow().clone(),
            (Value::List(items), ForEachMode::Keys) => indices(items.borrow().len()),
            (Value::Str(text), ForEachMode::Values) => {
                text.chars().map(|c| Value::str(c.to_string())).collect()
            }
            (Value::Str(text), ForEachMode::Keys) => indices(text.chars().count()),
            (Value::Record(fields), ForEachMode::Values) => {
                fields.borrow().iter().map(|(_, value)| value.clone()).collect()
            }
            (Value::Record(fields), ForEachMode::Keys) => {
                fields.borrow().iter().map(|(key, _)| Value::str(key)).collect()
            }
            _ => return Err(self.raise(errors::not_iterable(&iterable), span)),
        };

        for item in items {
            let iteration_env = Environment::block(env);
            iteration_env.define(binding.clone(), item);
            if let Flow::Exit = loop_flow(self.exec_block(body, &iteration_env))? {
                break;
            }
        }
        Ok(Value::Null)
    }

    /// `try`/`catch`/`finally`.
    ///
    /// Only raised exceptions are offered to the catch clauses; `return`,
    /// `break`, and `continue` pass through. `finally` always runs, and a
    /// non-local exit from it replaces whatever was pending.
    pub(super) fn eval_try(
        &mut self,
        body: &[Node],
        catches: &[CatchClause],
        finally: Option<&[Node]>,
        env: &Environment,
    ) -> EvalResult {
        let outcome = match self.exec_block(body, &Environment::block(env)) {
            Err(ControlAction::Raise(exc)) => self.handle_raise(exc, catches, env),
            other => other,
        };
        if let Some(finally) = finally {
            self.exec_block(finally, &Environment::block(env))?;
        }
        outcome
    }

    fn handle_raise(
        &mut self,
        exc: Rc<ExceptionObject>,
        catches: &[CatchClause],
        env: &Environment,
    ) -> EvalResult {
        let matched = {
            let matcher = CatchMatcher::new(&self.classes, env);
            catches
                .iter()
                .find_map(|clause| matcher.matches(&clause.types, &exc).map(|strategy| (clause, strategy)))
        };
        let Some((clause, strategy)) = matched else {
            return Err(ControlAction::Raise(exc));
        };
        debug!(exception = %exc, ?strategy, "exception caught");

        let catch_env = Environment::block(env);
        if let Some(binding) = &clause.binding {
            catch_env.define(binding.clone(), Value::Exception(exc));
        }
        self.exec_block(&clause.body, &catch_env)
    }

    /// `with`. Managers are entered left to right and the ones that were
    /// entered are exited in reverse, however the body finishes.
    ///
    /// An exit hook gets the pending exception, or null. A truthy result
    /// swallows the exception; an exception raised by the hook replaces
    /// whatever was pending, as in `finally`.
    pub(super) fn eval_with(
        &mut self,
        items: &[WithItem],
        body: &[Node],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let with_env = Environment::block(env);
        let mut entered = Vec::with_capacity(items.len());
        let mut outcome = Ok(Value::Null);
        for item in items {
            match self.enter_manager(item, &with_env, span) {
                Ok(manager) => entered.push(manager),
                Err(action) => {
                    outcome = Err(action);
                    break;
                }
            }
        }
        if entered.len() == items.len() {
            outcome = self.exec_block(body, &with_env);
        }
        for manager in entered.iter().rev() {
            outcome = self.exit_manager(manager, outcome, span);
        }
        outcome
    }

    /// Evaluate a manager, call its enter hook and bind the result.
    /// A manager without one is bound as is.
    fn enter_manager(&mut self, item: &WithItem, env: &Environment, span: &Span) -> EvalResult {
        let manager = self.eval(&item.manager, env)?;
        let entered = match find_hook(&manager, ENTER_HOOKS) {
            Some(enter) => self.call_value(&enter, Args::new(), span)?,
            None => manager.clone(),
        };
        if let Some(binding) = &item.binding {
            env.define(binding.clone(), entered);
        }
        Ok(manager)
    }

    fn exit_manager(&mut self, manager: &Value, outcome: EvalResult, span: &Span) -> EvalResult {
        let Some(exit) = find_hook(manager, EXIT_HOOKS) else {
            return outcome;
        };
        let pending = match &outcome {
            Err(ControlAction::Raise(exc)) => Value::Exception(Rc::clone(exc)),
            _ => Value::Null,
        };
        let mut args = Args::new();
        args.push((None, pending));
        let swallow = self.call_value(&exit, args, span)?.is_truthy();
        match outcome {
            Err(ControlAction::Raise(exc)) if swallow => {
                debug!(exception = %exc, "swallowed by a with exit hook");
                Ok(Value::Null)
            }
            other => other,
        }
    }

    /// `throw expr`. Rethrowing a caught exception keeps its original
    /// stack; any other value becomes the payload of a new exception.
    pub(super) fn eval_throw(&mut self, value: &Node, env: &Environment, span: &Span) -> EvalResult {
        let exc = match self.eval(value, env)? {
            Value::Exception(exc) => exc,
            payload => Rc::new(ExceptionObject::from_payload(payload, span.clone(), self.snapshot())),
        };
        debug!(exception = %exc, "thrown");
        Err(ControlAction::Raise(exc))
    }
}

fn indices(len: usize) -> Vec<Value> {
    (0..len)
        .map(|i| Value::Int(i64::try_from(i).unwrap_or(i64::MAX)))
        .collect()
}
