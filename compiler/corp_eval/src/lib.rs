//! Corp Eval - tree-walking execution engine for CorpLang.
//!
//! The engine receives a parsed [`Node`](corp_ir::Node) tree, runs the
//! hoisting analyzer over it, and walks the result.
//!
//! # Architecture
//!
//! - [`Environment`]: lexical scopes. A child holds its parent; the parent
//!   never points back. Parents are fixed at construction.
//! - [`Value`]: runtime values, including closures that share (not copy)
//!   the environment they were created in.
//! - [`Interpreter`]: the dispatcher. One exhaustive `match` over node
//!   kinds, one call stack, one task queue.
//! - [`ExceptionObject`]: typed exceptions with a stack snapshot frozen at
//!   raise time, matched against `catch` clauses by [`CatchMatcher`].
//!
//! Control flow (`break`, `continue`, `return`) and exceptions travel on the
//! same `Err` channel but as distinct [`ControlAction`] variants, so a
//! `catch` only ever sees exceptions.
//!
//! # Usage
//!
//! ```
//! use corp_eval::{buffer_handler, InterpreterBuilder};
//! use corp_ir::build::{call_fn, int, program, str};
//!
//! let output = buffer_handler();
//! let mut interpreter = InterpreterBuilder::new()
//!     .print_handler(output.clone())
//!     .build();
//! let result = interpreter.execute(&program(vec![call_fn("print", vec![str("hi"), int(2)])]));
//! assert!(result.raised.is_none());
//! assert_eq!(output.get_output(), "hi 2\n");
//! ```

mod builtins;
mod class;
mod diagnostics;
mod environment;
mod errors;
mod eval_mode;
mod exception;
mod interpreter;
mod module;
mod print_handler;
mod tasks;
mod type_check;
mod value;

pub use class::{ClassObject, ClassRegistry, InstanceObject};
pub use diagnostics::{CallFrame, CallStack, DepthExceeded};
pub use environment::{AssignError, Environment, Mutability, ScopeKind};
pub use exception::{
    classify, format_exception, Category, CatchMatcher, ExceptionObject, FaultSource, HostFault,
    IoFaultKind, LocalVar, MatchStrategy, StackFrame,
};
pub use eval_mode::{EvalMode, DEFAULT_MAX_CALL_DEPTH};
pub use interpreter::{ControlAction, EvalResult, ExecutionResult, Interpreter, InterpreterBuilder};
pub use module::{MapResolver, ModuleObject, ModuleResolver, ResolveError, ResolvedModule};
pub use print_handler::{
    buffer_handler, silent_handler, stdout_handler, BufferPrintHandler, PrintHandlerImpl,
    SharedPrintHandler, StdoutPrintHandler,
};
pub use tasks::TaskHandle;
pub use type_check::conforms;
pub use value::{BoundMethod, Closure, NativeFn, NativeFunction, Value};
