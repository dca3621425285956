//! Classes, instances, and the class registry.
//!
//! A class keeps an `anchor`: the environment that was current when its
//! declaration executed. Methods close over the anchor, so a method body
//! resolves free names exactly like a function declared next to the class.
//! Bound methods are built on lookup rather than stored, which keeps
//! instances free of reference cycles back to themselves.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use rustc_hash::FxHashMap;

use corp_ir::build::{assign_to, ident, param_default, prop, str, this};
use corp_ir::{FieldDef, FunctionDef, Name, Span};

use crate::exception::Category;
use crate::value::{Closure, RecordFields};
use crate::{Environment, Mutability, Value};

/// A declared class.
pub struct ClassObject {
    pub name: Name,
    pub superclass: Option<Rc<ClassObject>>,
    pub anchor: Environment,
    /// Own field declarations, in declaration order.
    pub fields: Vec<FieldDef>,
    methods: FxHashMap<Name, Rc<Closure>>,
    static_methods: FxHashMap<Name, Rc<Closure>>,
    /// Set on built-in exception classes only.
    category: Option<Category>,
}

impl ClassObject {
    pub fn new(name: Name, superclass: Option<Rc<ClassObject>>, anchor: Environment) -> Self {
        ClassObject {
            name,
            superclass,
            anchor,
            fields: Vec::new(),
            methods: FxHashMap::default(),
            static_methods: FxHashMap::default(),
            category: None,
        }
    }

    pub fn add_field(&mut self, field: FieldDef) {
        self.fields.push(field);
    }

    /// Add a method. Its closure captures the class anchor.
    pub fn add_method(&mut self, def: Arc<FunctionDef>, is_static: bool) {
        let name = def.name.clone();
        let closure = Rc::new(Closure::method(def, self.anchor.clone(), &self.name));
        if is_static {
            self.static_methods.insert(name, closure);
        } else {
            self.methods.insert(name, closure);
        }
    }

    /// Find an instance method, searching superclasses. Returns the method
    /// and the class that declares it.
    pub fn find_method(class: &Rc<ClassObject>, name: &str) -> Option<(Rc<Closure>, Rc<ClassObject>)> {
        Self::chain(class).into_iter().find_map(|c| {
            c.methods
                .get(name)
                .map(|method| (Rc::clone(method), Rc::clone(&c)))
        })
    }

    /// Find a static method, searching superclasses.
    pub fn find_static(class: &Rc<ClassObject>, name: &str) -> Option<Rc<Closure>> {
        Self::chain(class)
            .into_iter()
            .find_map(|c| c.static_methods.get(name).map(Rc::clone))
    }

    /// The class followed by its ancestors, nearest first.
    pub fn chain(class: &Rc<ClassObject>) -> Vec<Rc<ClassObject>> {
        let mut out = vec![Rc::clone(class)];
        let mut current = class.superclass.clone();
        while let Some(parent) = current {
            current = parent.superclass.clone();
            out.push(parent);
        }
        out
    }

    /// Is `self` the same class as `ancestor` or one of its descendants?
    pub fn is_subclass_of(&self, ancestor: &ClassObject) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if std::ptr::eq(class, ancestor) {
                return true;
            }
            current = class.superclass.as_deref();
        }
        false
    }

    /// Does this class or an ancestor carry `name`?
    pub fn has_ancestor_named(&self, name: &str) -> bool {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.name.as_str() == name {
                return true;
            }
            current = class.superclass.as_deref();
        }
        false
    }

    /// Category of the nearest built-in exception class in the chain.
    pub fn category(&self) -> Option<Category> {
        let mut current = Some(self);
        while let Some(class) = current {
            if class.category.is_some() {
                return class.category;
            }
            current = class.superclass.as_deref();
        }
        None
    }
}

impl fmt::Debug for ClassObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassObject")
            .field("name", &self.name)
            .field(
                "superclass",
                &self.superclass.as_ref().map(|s| s.name.clone()),
            )
            .finish_non_exhaustive()
    }
}

/// An object created by `new`.
pub struct InstanceObject {
    pub class: Rc<ClassObject>,
    fields: RefCell<RecordFields>,
}

impl InstanceObject {
    pub fn new(class: Rc<ClassObject>) -> Self {
        InstanceObject {
            class,
            fields: RefCell::new(Vec::new()),
        }
    }

    pub fn get_field(&self, name: &str) -> Option<Value> {
        self.fields
            .borrow()
            .iter()
            .find(|(field, _)| field.as_str() == name)
            .map(|(_, value)| value.clone())
    }

    /// Set a field, creating it if absent.
    pub fn set_field(&self, name: &Name, value: Value) {
        let mut fields = self.fields.borrow_mut();
        match fields.iter_mut().find(|(field, _)| field == name) {
            Some(slot) => slot.1 = value,
            None => fields.push((name.clone(), value)),
        }
    }

    /// Remove a field, yielding its last value.
    pub fn remove_field(&self, name: &str) -> Option<Value> {
        let mut fields = self.fields.borrow_mut();
        let at = fields.iter().position(|(field, _)| field.as_str() == name)?;
        Some(fields.remove(at).1)
    }
}

/// Classes declared so far, by name.
///
/// The catch matcher consults the registry when a catch clause names a
/// class that is not visible in the lexical scope of the `try`.
#[derive(Default)]
pub struct ClassRegistry {
    classes: FxHashMap<Name, Rc<ClassObject>>,
}

impl ClassRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `class`, replacing an earlier class of the same name.
    pub fn register(&mut self, class: Rc<ClassObject>) {
        self.classes.insert(class.name.clone(), class);
    }

    pub fn get(&self, name: &str) -> Option<Rc<ClassObject>> {
        self.classes.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

/// Built-in exception classes: `(name, parent, category)`.
const BUILTIN_EXCEPTIONS: &[(&str, Option<&str>, Option<Category>)] = &[
    ("Exception", None, None),
    ("Error", Some("Exception"), None),
    ("RuntimeError", Some("Error"), Some(Category::RuntimeError)),
    ("ReferenceError", Some("Error"), Some(Category::ReferenceError)),
    ("TypeError", Some("Error"), Some(Category::TypeError)),
    ("IOError", Some("Error"), Some(Category::IoError)),
    ("ConcurrencyError", Some("Error"), Some(Category::ConcurrencyError)),
    ("TimeoutError", Some("ConcurrencyError"), Some(Category::TimeoutError)),
    ("MemoryError", Some("Error"), Some(Category::MemoryError)),
    ("AssertionError", Some("Error"), Some(Category::AssertionError)),
];

/// `constructor(message = "") { this.message = message }`
fn message_constructor() -> Arc<FunctionDef> {
    Arc::new(FunctionDef {
        name: Name::new("constructor"),
        params: vec![param_default("message", str(""))],
        body: vec![assign_to(prop(this(), "message"), ident("message"))],
        is_async: false,
        return_type: None,
        span: Span::builtin(),
    })
}

/// Define the built-in exception classes in `root` and register them.
pub(crate) fn install_builtin_exceptions(root: &Environment, registry: &mut ClassRegistry) {
    for (name, parent, category) in BUILTIN_EXCEPTIONS {
        let superclass = parent.and_then(|p| registry.get(p));
        let mut class = ClassObject::new(Name::new(name), superclass, root.clone());
        class.category = *category;
        if parent.is_none() {
            class.add_method(message_constructor(), false);
        }
        let class = Rc::new(class);
        root.define_with(
            *name,
            Value::Class(Rc::clone(&class)),
            Mutability::Immutable,
            None,
        );
        registry.register(class);
    }
}
