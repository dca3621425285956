//! `InterpreterBuilder` for creating Interpreter instances with various configurations.

use rustc_hash::FxHashMap;

use corp_diagnostic::SourceMap;
use corp_ir::Name;

use super::Interpreter;
use crate::class::{install_builtin_exceptions, ClassRegistry};
use crate::diagnostics::CallStack;
use crate::exception::HostFault;
use crate::module::ModuleResolver;
use crate::tasks::TaskQueue;
use crate::{builtins, Environment, EvalMode, SharedPrintHandler, Value};

/// Builder for creating Interpreter instances.
///
/// The mode supplies defaults for output capture and recursion depth;
/// explicit settings override them:
/// - `EvalMode::Interpret` prints to stdout
/// - `EvalMode::TestRun` captures output in a buffer
pub struct InterpreterBuilder {
    mode: EvalMode,
    print_handler: Option<SharedPrintHandler>,
    resolver: Option<Box<dyn ModuleResolver>>,
    sources: SourceMap,
    /// `Some(None)` lifts the depth limit entirely.
    max_call_depth: Option<Option<usize>>,
    max_frame_locals: usize,
    workspace_root: String,
    natives: Vec<(Name, Value)>,
}

impl InterpreterBuilder {
    /// Create a new builder with default `Interpret` mode.
    pub fn new() -> Self {
        Self {
            mode: EvalMode::default(),
            print_handler: None,
            resolver: None,
            sources: SourceMap::new(),
            max_call_depth: None,
            max_frame_locals: 10,
            workspace_root: String::new(),
            natives: Vec::new(),
        }
    }

    /// Set the evaluation mode.
    #[must_use]
    pub fn mode(mut self, mode: EvalMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the handler `print` writes to. Overrides the mode-based default.
    #[must_use]
    pub fn print_handler(mut self, handler: SharedPrintHandler) -> Self {
        self.print_handler = Some(handler);
        self
    }

    /// Set the resolver consulted by `import`.
    #[must_use]
    pub fn module_resolver(mut self, resolver: impl ModuleResolver + 'static) -> Self {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// Set the source texts used for code excerpts in exception reports.
    #[must_use]
    pub fn sources(mut self, sources: SourceMap) -> Self {
        self.sources = sources;
        self
    }

    /// Set the maximum call depth. `None` removes the limit.
    #[must_use]
    pub fn max_call_depth(mut self, max: Option<usize>) -> Self {
        self.max_call_depth = Some(max);
        self
    }

    /// Set how many variables each captured stack frame keeps.
    #[must_use]
    pub fn max_frame_locals(mut self, max: usize) -> Self {
        self.max_frame_locals = max;
        self
    }

    /// Set the prefix stripped from file names in exception reports.
    #[must_use]
    pub fn workspace_root(mut self, root: impl Into<String>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Register a host function as a constant in the root environment.
    #[must_use]
    pub fn native(
        mut self,
        name: impl Into<Name>,
        func: impl Fn(&mut Interpreter, &[Value]) -> Result<Value, HostFault> + 'static,
    ) -> Self {
        let name = name.into();
        self.natives.push((name.clone(), Value::native(name, func)));
        self
    }

    /// Build the interpreter.
    pub fn build(self) -> Interpreter {
        let root = Environment::root();
        builtins::install(&root);
        let mut classes = ClassRegistry::new();
        install_builtin_exceptions(&root, &mut classes);
        for (name, native) in self.natives {
            root.define_const(name, native);
        }
        let globals = Environment::module(&root);

        let print_handler = self
            .print_handler
            .unwrap_or_else(|| self.mode.default_print_handler());
        let max_depth = self
            .max_call_depth
            .unwrap_or_else(|| self.mode.max_recursion_depth());

        Interpreter {
            root,
            globals,
            call_stack: CallStack::new(max_depth),
            classes,
            modules: FxHashMap::default(),
            resolver: self.resolver,
            tasks: TaskQueue::default(),
            print_handler,
            sources: self.sources,
            workspace_root: self.workspace_root,
            max_frame_locals: self.max_frame_locals,
            mode: self.mode,
        }
    }
}

impl Default for InterpreterBuilder {
    fn default() -> Self {
        Self::new()
    }
}
