//! Lexical environments.
//!
//! An [`Environment`] is a handle to one scope. Every scope except the root
//! holds its parent; parents never hold children. The parent of a scope is
//! chosen when the scope is created and never changes afterwards, which is
//! what keeps the root environment stable for the whole run.
//!
//! Handles are shared, not copied: a closure that captures an environment
//! sees later writes to it, and writes through the closure are visible to
//! everyone else holding the same scope.

use rustc_hash::FxHashMap;
use std::cell::RefCell;
use std::fmt;
use std::ops::Deref;
use std::rc::Rc;

use corp_ir::{Name, TypeRef};

use crate::type_check::conforms;
use crate::Value;

/// Whether a variable binding can be reassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mutability {
    /// `var x = ...`
    Mutable,
    /// `const x = ...`, builtins, `this`.
    Immutable,
}

impl Mutability {
    /// Returns `true` if this is `Mutable`.
    #[inline]
    pub fn is_mutable(self) -> bool {
        matches!(self, Mutability::Mutable)
    }
}

/// Error returned by [`Environment::assign`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AssignError {
    /// Variable exists but is a constant.
    Immutable,
    /// Variable not found in any enclosing scope.
    Undefined,
    /// Variable carries a declared type the new value does not satisfy.
    Contract { expected: TypeRef },
}

impl fmt::Display for AssignError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AssignError::Immutable => f.write_str("cannot assign to a constant"),
            AssignError::Undefined => f.write_str("cannot assign to an undeclared variable"),
            AssignError::Contract { expected } => {
                write!(f, "type mismatch: value does not satisfy `{expected}`")
            }
        }
    }
}

/// What created a scope. Used by frame snapshots to decide how far up the
/// chain a function's locals extend.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ScopeKind {
    /// Builtins. Exactly one per interpreter.
    Root,
    /// Top level of the main program or of an imported module.
    Module,
    /// One function invocation.
    Call,
    /// Block, loop iteration, branch, or catch clause.
    Block,
}

/// A single-threaded shared scope cell.
///
/// `#[repr(transparent)]` over `Rc<RefCell<T>>`; all allocation goes through
/// [`LocalScope::new`].
#[repr(transparent)]
pub struct LocalScope<T>(Rc<RefCell<T>>);

impl<T> LocalScope<T> {
    #[inline]
    pub fn new(value: T) -> Self {
        LocalScope(Rc::new(RefCell::new(value)))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }

    /// Number of handles sharing this cell.
    #[inline]
    pub fn strong_count(&self) -> usize {
        Rc::strong_count(&self.0)
    }
}

impl<T> Clone for LocalScope<T> {
    #[inline]
    fn clone(&self) -> Self {
        LocalScope(Rc::clone(&self.0))
    }
}

impl<T> Deref for LocalScope<T> {
    type Target = RefCell<T>;

    #[inline]
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

/// A variable binding.
#[derive(Clone)]
struct Binding {
    value: Value,
    mutability: Mutability,
    declared: Option<TypeRef>,
}

/// The bindings of one scope plus its parent link.
pub struct Scope {
    bindings: FxHashMap<Name, Binding>,
    parent: Option<Environment>,
    kind: ScopeKind,
}

/// Handle to one lexical scope.
#[derive(Clone)]
pub struct Environment(LocalScope<Scope>);

impl Environment {
    fn with_parent(parent: Option<&Environment>, kind: ScopeKind) -> Self {
        Environment(LocalScope::new(Scope {
            bindings: FxHashMap::default(),
            parent: parent.cloned(),
            kind,
        }))
    }

    /// Create a root environment. Only the interpreter does this.
    pub fn root() -> Self {
        Self::with_parent(None, ScopeKind::Root)
    }

    /// Create a module-level environment whose parent is `root`.
    pub fn module(root: &Environment) -> Self {
        Self::with_parent(Some(root), ScopeKind::Module)
    }

    /// Create a call environment for a function defined in `defining`.
    pub fn call(defining: &Environment) -> Self {
        Self::with_parent(Some(defining), ScopeKind::Call)
    }

    /// Create a block environment nested in `enclosing`.
    pub fn block(enclosing: &Environment) -> Self {
        Self::with_parent(Some(enclosing), ScopeKind::Block)
    }

    pub fn kind(&self) -> ScopeKind {
        self.0.borrow().kind
    }

    pub fn parent(&self) -> Option<Environment> {
        self.0.borrow().parent.clone()
    }

    /// Identity comparison: do both handles refer to the same scope?
    pub fn same_scope(&self, other: &Environment) -> bool {
        self.0.ptr_eq(&other.0)
    }

    /// Define a mutable, untyped binding in this scope.
    ///
    /// Redefining a name in the same scope replaces the previous binding.
    pub fn define(&self, name: impl Into<Name>, value: Value) {
        self.define_with(name, value, Mutability::Mutable, None);
    }

    /// Define a constant in this scope.
    pub fn define_const(&self, name: impl Into<Name>, value: Value) {
        self.define_with(name, value, Mutability::Immutable, None);
    }

    /// Define a binding with explicit mutability and an optional declared type.
    pub fn define_with(
        &self,
        name: impl Into<Name>,
        value: Value,
        mutability: Mutability,
        declared: Option<TypeRef>,
    ) {
        self.0.borrow_mut().bindings.insert(
            name.into(),
            Binding {
                value,
                mutability,
                declared,
            },
        );
    }

    /// Look a name up through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<Value> {
        let mut current = self.clone();
        loop {
            let next = {
                let scope = current.0.borrow();
                if let Some(binding) = scope.bindings.get(name) {
                    return Some(binding.value.clone());
                }
                scope.parent.clone()
            };
            current = next?;
        }
    }

    /// Assign to the nearest existing binding of `name`.
    ///
    /// Never creates a binding.
    pub fn assign(&self, name: &str, value: Value) -> Result<(), AssignError> {
        let mut current = self.clone();
        loop {
            let next = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get_mut(name) {
                    if !binding.mutability.is_mutable() {
                        return Err(AssignError::Immutable);
                    }
                    if let Some(expected) = &binding.declared {
                        if !conforms(&value, expected) {
                            return Err(AssignError::Contract {
                                expected: expected.clone(),
                            });
                        }
                    }
                    binding.value = value;
                    return Ok(());
                }
                scope.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Err(AssignError::Undefined),
            }
        }
    }

    /// Remove the nearest binding of `name`, yielding its value.
    ///
    /// Constants cannot be removed.
    pub fn remove(&self, name: &str) -> Result<Value, AssignError> {
        let mut current = self.clone();
        loop {
            let next = {
                let mut scope = current.0.borrow_mut();
                if let Some(binding) = scope.bindings.get(name) {
                    if !binding.mutability.is_mutable() {
                        return Err(AssignError::Immutable);
                    }
                    return match scope.bindings.remove(name) {
                        Some(binding) => Ok(binding.value),
                        None => Err(AssignError::Undefined),
                    };
                }
                scope.parent.clone()
            };
            match next {
                Some(parent) => current = parent,
                None => return Err(AssignError::Undefined),
            }
        }
    }

    /// Copy this scope's own bindings into `target`, keeping each binding's
    /// mutability and declared type.
    pub fn copy_bindings_to(&self, target: &Environment) {
        let source = self.0.borrow();
        let mut target = target.0.borrow_mut();
        for (name, binding) in &source.bindings {
            target.bindings.insert(name.clone(), binding.clone());
        }
    }

    /// Update the values of `target`'s own bindings from the same names in
    /// this scope. Names `target` does not bind are left alone.
    pub fn write_back_to(&self, target: &Environment) {
        let source = self.0.borrow();
        let mut target = target.0.borrow_mut();
        for (name, binding) in &mut target.bindings {
            if let Some(updated) = source.bindings.get(name) {
                binding.value = updated.value.clone();
            }
        }
    }

    /// Break the cycle between a finished scope and the functions declared
    /// directly in it.
    ///
    /// A function declared in a scope is stored there and holds the scope,
    /// so neither is ever freed by reference counting alone. When the only
    /// holders left are the caller's handle and those functions, the
    /// bindings are dropped and `true` is returned. Anything else still
    /// referring to the scope or to one of the functions (a returned
    /// closure, a list holding a lambda) keeps everything intact.
    pub fn release_local_closures(&self) -> bool {
        let self_held = {
            let scope = self.0.borrow();
            let mut count = 0;
            for binding in scope.bindings.values() {
                if let Value::Function(closure) = &binding.value {
                    if closure.defining_env.same_scope(self) {
                        if Rc::strong_count(closure) != 1 {
                            return false;
                        }
                        count += 1;
                    }
                }
            }
            count
        };
        if self_held == 0 || self.0.strong_count() != self_held + 1 {
            return false;
        }
        let released = std::mem::take(&mut self.0.borrow_mut().bindings);
        drop(released);
        true
    }

    /// Does this scope itself (not a parent) bind `name`?
    pub fn contains_local(&self, name: &str) -> bool {
        self.0.borrow().bindings.contains_key(name)
    }

    /// Every binding of this scope, sorted by name.
    pub fn bindings(&self) -> Vec<(Name, Value)> {
        let scope = self.0.borrow();
        let mut out: Vec<(Name, Value)> = scope
            .bindings
            .iter()
            .map(|(name, binding)| (name.clone(), binding.value.clone()))
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    /// Bindings visible as locals of the enclosing function or module.
    ///
    /// Walks outward through block scopes and stops after the first call,
    /// module, or root scope. Inner bindings shadow outer ones; the
    /// innermost scope comes first.
    pub fn locals(&self) -> Vec<(Name, Value)> {
        let mut out: Vec<(Name, Value)> = Vec::new();
        let mut current = Some(self.clone());
        while let Some(env) = current {
            for (name, value) in env.bindings() {
                if !out.iter().any(|(seen, _)| *seen == name) {
                    out.push((name, value));
                }
            }
            if env.kind() != ScopeKind::Block {
                break;
            }
            current = env.parent();
        }
        out
    }
}

impl fmt::Debug for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scope = self.0.borrow();
        f.debug_struct("Environment")
            .field("kind", &scope.kind)
            .field("bindings", &scope.bindings.len())
            .finish_non_exhaustive()
    }
}
