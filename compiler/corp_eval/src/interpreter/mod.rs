//! The dispatcher.
//!
//! [`Interpreter::eval`] is a single exhaustive `match` over [`NodeKind`];
//! the bulky handlers live in submodules grouped by concern:
//!
//! - `call`: calls, argument binding, classes, `new`, `super`, natives
//! - `control`: branches, loops, `try`/`catch`/`finally`, `throw`, `with`
//! - `access`: property and index reads and writes, assignment, `delete`
//! - `operators`: binary and unary operators
//! - `imports`: `import` and `from ... import`
//! - `async_tasks`: `await` and the end-of-run task drain
//!
//! Every handler receives the environment to evaluate in. There is no
//! "current environment" field that handlers swap in and out, so a scope
//! can never be left behind by an early return.

mod access;
mod async_tasks;
mod builder;
mod call;
mod control;
mod frame_guard;
mod imports;
mod operators;

use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;
use tracing::{debug, trace};

use corp_diagnostic::{Diagnostic, SourceMap};
use corp_ir::{Name, Node, NodeKind, Span};

use crate::class::ClassRegistry;
use crate::diagnostics::{CallFrame, CallStack};
use crate::errors::{self, Fault};
use crate::exception::{format_exception, Category, ExceptionObject, HostFault, StackFrame};
use crate::module::{ModuleObject, ModuleResolver};
use crate::tasks::TaskQueue;
use crate::type_check::conforms;
use crate::value::Closure;
use crate::{EvalMode, Environment, Mutability, SharedPrintHandler, Value};

pub use builder::InterpreterBuilder;
pub(crate) use call::{ArgValue, MethodReceiver};
use frame_guard::FrameGuard;

/// Result of evaluating a node.
pub type EvalResult = Result<Value, ControlAction>;

/// Non-local exits. Carried on the `Err` side of [`EvalResult`].
///
/// Loops consume `Break` and `Continue`, calls consume `Return`, and `try`
/// consumes `Raise` only. Anything else passes through untouched.
#[derive(Debug)]
pub enum ControlAction {
    Break,
    Continue,
    Return(Value),
    Raise(Rc<ExceptionObject>),
}

/// Outcome of [`Interpreter::execute`].
#[derive(Debug)]
pub struct ExecutionResult {
    /// Value of the last top-level statement, or of a top-level `return`.
    pub value: Value,
    /// Exception that escaped the program, if any.
    pub raised: Option<Rc<ExceptionObject>>,
    /// Analyzer diagnostics. Errors here mean the program did not run.
    pub diagnostics: Vec<Diagnostic>,
}

impl ExecutionResult {
    pub fn is_success(&self) -> bool {
        self.raised.is_none()
    }
}

/// State of one entry in the module cache.
enum ModuleSlot {
    Loading,
    Loaded(Rc<ModuleObject>),
}

/// Tree-walking interpreter.
///
/// Holds the root environment (builtins), the global environment of the
/// main program, the call stack, the class registry, the module cache and
/// the task queue. One instance may run several programs in turn; globals
/// persist between runs.
pub struct Interpreter {
    root: Environment,
    globals: Environment,
    call_stack: CallStack,
    classes: ClassRegistry,
    modules: FxHashMap<Name, ModuleSlot>,
    resolver: Option<Box<dyn ModuleResolver>>,
    tasks: TaskQueue,
    print_handler: SharedPrintHandler,
    sources: SourceMap,
    workspace_root: String,
    max_frame_locals: usize,
    mode: EvalMode,
}

impl Interpreter {
    /// Interpreter with default settings.
    pub fn new() -> Self {
        InterpreterBuilder::new().build()
    }

    pub fn builder() -> InterpreterBuilder {
        InterpreterBuilder::new()
    }

    /// Environment holding builtins. Its identity never changes.
    pub fn root_env(&self) -> &Environment {
        &self.root
    }

    /// Top-level environment of the main program.
    pub fn globals(&self) -> &Environment {
        &self.globals
    }

    pub fn print_handler(&self) -> &SharedPrintHandler {
        &self.print_handler
    }

    pub fn classes(&self) -> &ClassRegistry {
        &self.classes
    }

    pub fn mode(&self) -> EvalMode {
        self.mode
    }

    /// Number of live call frames.
    pub fn call_depth(&self) -> usize {
        self.call_stack.depth()
    }

    /// File of the statement currently executing.
    pub fn current_file(&self) -> Option<Name> {
        self.call_stack.current_frame().map(|f| f.span.file.clone())
    }

    /// Render an exception with this interpreter's workspace root and sources.
    pub fn format_exception(&self, exc: &ExceptionObject) -> String {
        format_exception(exc, &self.workspace_root, &self.sources)
    }

    /// Hoist, then run `program` in the global environment.
    ///
    /// Analyzer errors stop the run before any statement executes; they
    /// are returned in `diagnostics` and as a raised `ReferenceError`.
    /// Tasks that were scheduled but never awaited are run to completion
    /// before returning.
    #[tracing::instrument(level = "debug", skip_all)]
    pub fn execute(&mut self, program: &Node) -> ExecutionResult {
        let hoisted = corp_hoist::hoist_program(program);
        if hoisted.has_errors() {
            let raised = self.analysis_failure(&hoisted.diagnostics, program);
            debug!(message = %raised.message, "program rejected by analyzer");
            return ExecutionResult {
                value: Value::Null,
                raised: Some(raised),
                diagnostics: hoisted.diagnostics,
            };
        }

        let globals = self.globals.clone();
        let outcome = self.run_module_body(&hoisted.program, &globals, Name::new("<module>"));
        self.drain_tasks();

        let (value, raised) = match outcome {
            Ok(value) => (value, None),
            Err(ControlAction::Raise(exc)) => {
                debug!(exception = %exc, "exception escaped the program");
                (Value::Null, Some(exc))
            }
            Err(ControlAction::Return(value)) => (value, None),
            Err(ControlAction::Break | ControlAction::Continue) => (Value::Null, None),
        };
        ExecutionResult {
            value,
            raised,
            diagnostics: hoisted.diagnostics,
        }
    }

    /// Call a CorpLang callable from host code (typically a native function
    /// taking a callback). A raised exception comes back as
    /// [`HostFault::Raised`] and is re-raised unchanged when the native
    /// returns it.
    pub fn call(&mut self, callee: &Value, args: Vec<Value>) -> Result<Value, HostFault> {
        let span = self
            .call_stack
            .current_frame()
            .map(|f| f.span.clone())
            .unwrap_or_default();
        let args = args.into_iter().map(|v| (None, v)).collect();
        match self.call_value(callee, args, &span) {
            Ok(value) => Ok(value),
            Err(ControlAction::Raise(exc)) => Err(HostFault::Raised(exc)),
            Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Break | ControlAction::Continue) => Ok(Value::Null),
        }
    }

    /// Evaluate one node in `env`.
    pub fn eval(&mut self, node: &Node, env: &Environment) -> EvalResult {
        corp_stack::ensure_sufficient_stack(|| self.eval_inner(node, env))
    }

    fn eval_inner(&mut self, node: &Node, env: &Environment) -> EvalResult {
        let span = &node.span;
        match &node.kind {
            NodeKind::Program(statements) => self.exec_block(statements, env),

            // Expressions
            NodeKind::Literal(lit) => Ok(Value::from_literal(lit)),
            NodeKind::Identifier(name) => env
                .lookup(name)
                .ok_or_else(|| self.raise(errors::undefined_variable(name), span)),
            NodeKind::Binary { op, left, right } => self.eval_binary(*op, left, right, env, span),
            NodeKind::Unary { op, operand } => {
                let value = self.eval(operand, env)?;
                self.eval_unary(*op, &value, span)
            }
            NodeKind::Ternary {
                condition,
                then_value,
                else_value,
            } => {
                if self.eval(condition, env)?.is_truthy() {
                    self.eval(then_value, env)
                } else {
                    self.eval(else_value, env)
                }
            }
            NodeKind::Interpolated(parts) => {
                let mut text = String::new();
                for part in parts {
                    text.push_str(&self.eval(part, env)?.display());
                }
                Ok(Value::str(text))
            }
            NodeKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    values.push(self.eval(item, env)?);
                }
                Ok(Value::list(values))
            }
            NodeKind::Record(entries) => {
                let mut fields: Vec<(Name, Value)> = Vec::with_capacity(entries.len());
                for (key, value_node) in entries {
                    let value = self.eval(value_node, env)?;
                    match fields.iter_mut().find(|(existing, _)| existing == key) {
                        Some(slot) => slot.1 = value,
                        None => fields.push((key.clone(), value)),
                    }
                }
                Ok(Value::record(fields))
            }
            NodeKind::Property { object, name } => {
                let object = self.eval(object, env)?;
                self.get_property(&object, name, span)
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                self.get_index(&object, &index, span)
            }
            NodeKind::Call { callee, args } => self.eval_call(callee, args, env, span),
            NodeKind::New { class, args } => self.eval_new(class, args, env, span),
            NodeKind::This => env
                .lookup("this")
                .ok_or_else(|| self.raise(errors::this_outside_method(), span)),
            NodeKind::SuperCall { method, args } => {
                self.eval_super(method.as_ref(), args, env, span)
            }
            NodeKind::Lambda(def) => Ok(Value::Function(Rc::new(Closure::new(
                Arc::clone(def),
                env.clone(),
            )))),
            NodeKind::Await(inner) => self.eval_await(inner, env, span),

            // Declarations
            NodeKind::VarDecl {
                name,
                ty,
                init,
                constant,
            } => {
                let value = match init {
                    Some(init) => self.eval(init, env)?,
                    None => Value::Null,
                };
                if let Some(ty) = ty {
                    if !conforms(&value, ty) {
                        return Err(self.raise(errors::variable_contract(name, ty, &value), span));
                    }
                }
                let mutability = if *constant {
                    Mutability::Immutable
                } else {
                    Mutability::Mutable
                };
                env.define_with(name.clone(), value, mutability, ty.clone());
                Ok(Value::Null)
            }
            NodeKind::FunctionDecl(def) => {
                trace!(function = %def.name, "function declared");
                let closure = Closure::new(Arc::clone(def), env.clone());
                env.define(def.name.clone(), Value::Function(Rc::new(closure)));
                Ok(Value::Null)
            }
            NodeKind::ClassDecl(def) => self.declare_class(def, env, span),
            NodeKind::MethodDecl { .. } | NodeKind::FieldDecl(_) => {
                Err(self.raise(errors::class_member_outside_class(), span))
            }

            // Statements
            NodeKind::Assign { target, value } => self.eval_assign(target, value, env, span),
            NodeKind::Block(statements) => self.exec_block(statements, &Environment::block(env)),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => self.eval_if(condition, then_branch, else_branch.as_deref(), env),
            NodeKind::While { condition, body } => self.eval_while(condition, body, env),
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => self.eval_for(init.as_deref(), condition.as_deref(), update.as_deref(), body, env),
            NodeKind::ForEach {
                binding,
                mode,
                iterable,
                body,
            } => self.eval_for_each(binding, *mode, iterable, body, env, span),
            NodeKind::Break => Err(ControlAction::Break),
            NodeKind::Continue => Err(ControlAction::Continue),
            NodeKind::Return(value) => {
                let value = match value {
                    Some(value) => self.eval(value, env)?,
                    None => Value::Null,
                };
                Err(ControlAction::Return(value))
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => self.eval_try(body, catches, finally.as_deref(), env),
            NodeKind::Throw(value) => self.eval_throw(value, env, span),
            NodeKind::With { items, body } => self.eval_with(items, body, env, span),
            NodeKind::Delete(target) => self.eval_delete(target, env, span),
            NodeKind::Import { module, alias } => self.eval_import(module, alias.as_ref(), env, span),
            NodeKind::FromImport { module, items } => self.eval_from_import(module, items, env, span),
        }
    }

    /// Run statements in order in `env`. Yields the last statement's value.
    pub(crate) fn exec_block(&mut self, statements: &[Node], env: &Environment) -> EvalResult {
        let mut last = Value::Null;
        for statement in statements {
            self.call_stack.set_location(&statement.span, env);
            last = self.eval(statement, env)?;
        }
        Ok(last)
    }

    /// Run a program or module body under its own `<module>`-style frame.
    fn run_module_body(&mut self, program: &Node, env: &Environment, frame_name: Name) -> EvalResult {
        let statements = match &program.kind {
            NodeKind::Program(statements) => statements.as_slice(),
            _ => std::slice::from_ref(program),
        };
        let frame = CallFrame::new(frame_name, program.span.clone(), env.clone());
        let mut guard = FrameGuard::enter(self, frame, &program.span)?;
        match guard.exec_block(statements, env) {
            Err(ControlAction::Return(value)) => Ok(value),
            Err(ControlAction::Break) => Err(guard.raise(errors::control_outside_loop("break"), &program.span)),
            Err(ControlAction::Continue) => {
                Err(guard.raise(errors::control_outside_loop("continue"), &program.span))
            }
            other => other,
        }
    }

    /// Freeze the live call stack.
    fn snapshot(&self) -> Vec<StackFrame> {
        self.call_stack.snapshot(self.max_frame_locals)
    }

    /// Turn an engine fault into a raised exception at `span`.
    #[cold]
    pub(crate) fn raise(&self, fault: Fault, span: &Span) -> ControlAction {
        let exc = ExceptionObject::new(fault.category, fault.message, span.clone(), self.snapshot());
        trace!(exception = %exc, "raised");
        ControlAction::Raise(Rc::new(exc))
    }

    /// Wrap a native function's fault. Exceptions already raised by
    /// CorpLang code inside the native pass through unchanged.
    #[cold]
    pub(crate) fn raise_host_fault(&self, fault: &HostFault, span: &Span) -> ControlAction {
        if let HostFault::Raised(exc) = fault {
            return ControlAction::Raise(Rc::clone(exc));
        }
        let exc = ExceptionObject::from_host_fault(fault, span.clone(), self.snapshot());
        trace!(exception = %exc, "host fault wrapped");
        ControlAction::Raise(Rc::new(exc))
    }

    /// Exception reported when the analyzer rejects a program.
    fn analysis_failure(&self, diagnostics: &[Diagnostic], program: &Node) -> Rc<ExceptionObject> {
        let first = diagnostics.iter().find(|d| d.is_error());
        let message = first.map_or_else(String::new, |d| d.message.clone());
        let span = first
            .and_then(Diagnostic::primary_span)
            .cloned()
            .unwrap_or_else(|| program.span.clone());
        let frame = StackFrame {
            file: span.file.clone(),
            line: span.line,
            column: span.column,
            function: Name::new("<module>"),
            locals: Vec::new(),
        };
        let mut exc = ExceptionObject::new(Category::ReferenceError, message, span, vec![frame]);
        exc.cause = first.map(|d| format!("rejected before execution ({})", d.code));
        Rc::new(exc)
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
