//! Catch-clause matching.
//!
//! A clause lists zero or more type names. Zero names catch everything.
//! Otherwise each name is tried against the exception with a fixed order of
//! strategies, and the first strategy that succeeds decides the match.

use std::rc::Rc;

use corp_ir::TypeRef;
use tracing::trace;

use super::{Category, ExceptionObject};
use crate::class::{ClassObject, ClassRegistry};
use crate::{Environment, Value};

/// Which rule matched a catch clause.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Clause lists no types.
    Untyped,
    /// Name equals the category, its constant spelling, or the type name.
    Direct,
    /// Name equals the payload's class.
    PayloadClass,
    /// Name resolves to a class the payload is an instance of.
    Hierarchy,
    /// Name denotes a category that contains the exception's category.
    Category,
    /// Exception message suggests a category contained in the named one.
    Message,
}

/// Decides whether a catch clause accepts an exception.
///
/// Class names are resolved lexically from the `try` statement's
/// environment first, then through the registry of all declared classes.
pub struct CatchMatcher<'a> {
    registry: &'a ClassRegistry,
    env: &'a Environment,
}

impl<'a> CatchMatcher<'a> {
    pub fn new(registry: &'a ClassRegistry, env: &'a Environment) -> Self {
        CatchMatcher { registry, env }
    }

    /// Match a clause (a union of `types`) against `exc`.
    pub fn matches(&self, types: &[TypeRef], exc: &ExceptionObject) -> Option<MatchStrategy> {
        if types.is_empty() {
            return Some(MatchStrategy::Untyped);
        }
        let found = types.iter().find_map(|ty| self.matches_one(ty.name.as_str(), exc));
        trace!(exception = %exc.type_name, ?found, "catch clause tested");
        found
    }

    fn matches_one(&self, name: &str, exc: &ExceptionObject) -> Option<MatchStrategy> {
        if name == exc.kind.name() || name == exc.kind.constant_name() || name == exc.type_name.as_str() {
            return Some(MatchStrategy::Direct);
        }
        if exc
            .payload_class_name
            .as_ref()
            .is_some_and(|class| class.as_str() == name)
        {
            return Some(MatchStrategy::PayloadClass);
        }
        if let (Value::Instance(instance), Some(class)) = (&exc.payload, self.resolve_class(name)) {
            if instance.class.is_subclass_of(&class) {
                return Some(MatchStrategy::Hierarchy);
            }
        }
        if name == "Exception" || name == "Error" {
            return Some(MatchStrategy::Category);
        }
        let wanted = Category::from_type_name(name)?;
        if exc.kind.is_within(wanted) {
            return Some(MatchStrategy::Category);
        }
        if exc.kind == Category::UserRaised
            && Category::from_message(&exc.message).is_some_and(|guess| guess.is_within(wanted))
        {
            return Some(MatchStrategy::Message);
        }
        None
    }

    fn resolve_class(&self, name: &str) -> Option<Rc<ClassObject>> {
        match self.env.lookup(name) {
            Some(Value::Class(class)) => Some(class),
            _ => self.registry.get(name),
        }
    }
}
