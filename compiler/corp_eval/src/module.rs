//! Module resolution.
//!
//! The engine never touches the file system. A host-supplied
//! [`ModuleResolver`] turns an import name into either a parsed program
//! (which the engine hoists and runs in a fresh module environment) or a
//! ready set of bindings (native modules).

use std::fmt;

use rustc_hash::FxHashMap;

use corp_ir::{Name, Node};

use crate::{Environment, Value};

/// What a resolver hands back for an import name.
#[derive(Clone)]
pub enum ResolvedModule {
    /// Source module: the engine executes it once and exports its top level.
    Program(Node),
    /// Native module: bindings are exported as given.
    Bindings(Vec<(Name, Value)>),
}

/// Failure to resolve an import.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    #[error("module not found: {0}")]
    NotFound(String),
    #[error("cannot load module '{name}': {reason}")]
    Unreadable { name: String, reason: String },
}

/// Host interface used by `import` statements.
pub trait ModuleResolver {
    fn resolve(&mut self, name: &str) -> Result<ResolvedModule, ResolveError>;
}

/// In-memory resolver.
#[derive(Default)]
pub struct MapResolver {
    modules: FxHashMap<String, ResolvedModule>,
}

impl MapResolver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_program(mut self, name: &str, program: Node) -> Self {
        self.modules
            .insert(name.to_string(), ResolvedModule::Program(program));
        self
    }

    #[must_use]
    pub fn with_bindings(mut self, name: &str, bindings: Vec<(Name, Value)>) -> Self {
        self.modules
            .insert(name.to_string(), ResolvedModule::Bindings(bindings));
        self
    }
}

impl ModuleResolver for MapResolver {
    fn resolve(&mut self, name: &str) -> Result<ResolvedModule, ResolveError> {
        self.modules
            .get(name)
            .cloned()
            .ok_or_else(|| ResolveError::NotFound(name.to_string()))
    }
}

/// A loaded module.
pub struct ModuleObject {
    pub name: Name,
    /// Top-level environment of a source module; a detached module scope
    /// for native modules.
    pub environment: Environment,
    exports: Vec<(Name, Value)>,
}

impl ModuleObject {
    pub(crate) fn new(name: Name, environment: Environment) -> Self {
        let exports = environment
            .bindings()
            .into_iter()
            .filter(|(binding, _)| !binding.is_internal())
            .collect();
        ModuleObject {
            name,
            environment,
            exports,
        }
    }

    pub fn exported_bindings(&self) -> &[(Name, Value)] {
        &self.exports
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        self.exports
            .iter()
            .find(|(export, _)| export.as_str() == name)
            .map(|(_, value)| value.clone())
    }
}

impl fmt::Debug for ModuleObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleObject")
            .field("name", &self.name)
            .field("exports", &self.exports.len())
            .finish_non_exhaustive()
    }
}
