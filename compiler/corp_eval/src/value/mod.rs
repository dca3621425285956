//! Runtime values.
//!
//! Scalars are stored inline; strings are `Rc<str>`; lists and records are
//! shared mutable cells, so aliasing a list and pushing through one alias is
//! visible through the other. Everything here is single-threaded.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use corp_ir::{FunctionDef, Literal, Name};
use corp_stack::ensure_sufficient_stack;

use crate::class::{ClassObject, InstanceObject};
use crate::exception::{ExceptionObject, HostFault};
use crate::module::ModuleObject;
use crate::tasks::TaskHandle;
use crate::{Environment, Interpreter};

/// Insertion-ordered record storage.
pub type RecordFields = Vec<(Name, Value)>;

/// A CorpLang runtime value.
#[derive(Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(Rc<str>),
    List(Rc<RefCell<Vec<Value>>>),
    Record(Rc<RefCell<RecordFields>>),
    Function(Rc<Closure>),
    Native(Rc<NativeFunction>),
    BoundMethod(Rc<BoundMethod>),
    Class(Rc<ClassObject>),
    Instance(Rc<InstanceObject>),
    Module(Rc<ModuleObject>),
    Task(Rc<TaskHandle>),
    Exception(Rc<ExceptionObject>),
}

/// A user function paired with the environment it was created in.
///
/// The environment is shared, never copied: this is what makes a counter
/// closure observe its own increments across calls.
pub struct Closure {
    pub def: Arc<FunctionDef>,
    pub defining_env: Environment,
    /// Display name used in stack frames, e.g. `Point.norm`.
    pub qualified_name: Name,
}

impl Closure {
    pub fn new(def: Arc<FunctionDef>, defining_env: Environment) -> Self {
        let qualified_name = def.name.clone();
        Closure {
            def,
            defining_env,
            qualified_name,
        }
    }

    /// Create a closure for a method of `class_name`.
    pub fn method(def: Arc<FunctionDef>, defining_env: Environment, class_name: &Name) -> Self {
        let qualified_name = Name::new(format!("{class_name}.{}", def.name));
        Closure {
            def,
            defining_env,
            qualified_name,
        }
    }
}

/// Signature of host functions callable from CorpLang.
pub type NativeFn = dyn Fn(&mut Interpreter, &[Value]) -> Result<Value, HostFault>;

/// A host function, optionally bound to a receiver.
///
/// A bound receiver is passed as the first argument.
pub struct NativeFunction {
    pub name: Name,
    pub receiver: Option<Value>,
    func: Rc<NativeFn>,
}

impl NativeFunction {
    pub fn new(
        name: impl Into<Name>,
        func: impl Fn(&mut Interpreter, &[Value]) -> Result<Value, HostFault> + 'static,
    ) -> Self {
        NativeFunction {
            name: name.into(),
            receiver: None,
            func: Rc::new(func),
        }
    }

    /// A copy of this native with `receiver` prepended to every call.
    #[must_use]
    pub fn bind(&self, receiver: Value) -> Self {
        NativeFunction {
            name: self.name.clone(),
            receiver: Some(receiver),
            func: Rc::clone(&self.func),
        }
    }

    /// Invoke the host function.
    pub fn invoke(&self, interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
        match &self.receiver {
            None => (self.func)(interpreter, args),
            Some(receiver) => {
                let mut full = Vec::with_capacity(args.len() + 1);
                full.push(receiver.clone());
                full.extend_from_slice(args);
                (self.func)(interpreter, &full)
            }
        }
    }
}

/// A method looked up on an instance: receiver, method, and the class that
/// declared the method (the starting point for `super`).
pub struct BoundMethod {
    pub receiver: Value,
    pub method: Rc<Closure>,
    pub owner: Rc<ClassObject>,
}

impl Value {
    pub fn str(s: impl AsRef<str>) -> Self {
        Value::Str(Rc::from(s.as_ref()))
    }

    pub fn list(items: Vec<Value>) -> Self {
        Value::List(Rc::new(RefCell::new(items)))
    }

    pub fn record(fields: RecordFields) -> Self {
        Value::Record(Rc::new(RefCell::new(fields)))
    }

    pub fn native(
        name: impl Into<Name>,
        func: impl Fn(&mut Interpreter, &[Value]) -> Result<Value, HostFault> + 'static,
    ) -> Self {
        Value::Native(Rc::new(NativeFunction::new(name, func)))
    }

    pub fn from_literal(lit: &Literal) -> Self {
        match lit {
            Literal::Null => Value::Null,
            Literal::Bool(b) => Value::Bool(*b),
            Literal::Int(n) => Value::Int(*n),
            Literal::Float(bits) => Value::Float(f64::from_bits(*bits)),
            Literal::Str(s) => Value::str(s),
        }
    }

    /// Name of the value's runtime type, as reported by `type_of`.
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(_) => "bool".into(),
            Value::Int(_) => "int".into(),
            Value::Float(_) => "float".into(),
            Value::Str(_) => "str".into(),
            Value::List(_) => "list".into(),
            Value::Record(_) => "record".into(),
            Value::Function(_) | Value::Native(_) | Value::BoundMethod(_) => "function".into(),
            Value::Class(_) => "class".into(),
            Value::Instance(instance) => instance.class.name.to_string(),
            Value::Module(_) => "module".into(),
            Value::Task(_) => "task".into(),
            Value::Exception(exc) => exc.type_name.to_string(),
        }
    }

    /// Null, false, zero, and empty containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::Int(n) => *n != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::List(items) => !items.borrow().is_empty(),
            Value::Record(fields) => !fields.borrow().is_empty(),
            _ => true,
        }
    }

    pub fn is_callable(&self) -> bool {
        matches!(
            self,
            Value::Function(_) | Value::Native(_) | Value::BoundMethod(_) | Value::Class(_)
        )
    }

    /// User-facing text: strings unquoted.
    pub fn display(&self) -> String {
        match self {
            Value::Str(s) => s.to_string(),
            other => other.repr(),
        }
    }

    /// Debug-style text: strings quoted. Used inside containers and stack
    /// frame variable listings.
    ///
    /// A list or record that contains itself renders the inner occurrence as
    /// `[...]` or `{...}`.
    pub fn repr(&self) -> String {
        let mut out = String::new();
        self.write_repr(&mut out, &mut Vec::new());
        out
    }

    /// `open` holds the containers currently being rendered.
    fn write_repr(&self, out: &mut String, open: &mut Vec<*const ()>) {
        match self {
            Value::List(items) => {
                let id = Rc::as_ptr(items).cast::<()>();
                if open.contains(&id) {
                    out.push_str("[...]");
                    return;
                }
                open.push(id);
                out.push('[');
                for (i, item) in items.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    ensure_sufficient_stack(|| item.write_repr(out, open));
                }
                out.push(']');
                open.pop();
            }
            Value::Record(fields) => {
                let id = Rc::as_ptr(fields).cast::<()>();
                if open.contains(&id) {
                    out.push_str("{...}");
                    return;
                }
                open.push(id);
                out.push('{');
                for (i, (key, value)) in fields.borrow().iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    out.push_str(key.as_str());
                    out.push_str(": ");
                    ensure_sufficient_stack(|| value.write_repr(out, open));
                }
                out.push('}');
                open.pop();
            }
            other => out.push_str(&other.leaf_repr()),
        }
    }

    fn leaf_repr(&self) -> String {
        match self {
            Value::Null => "null".into(),
            Value::Bool(b) => b.to_string(),
            Value::Int(n) => n.to_string(),
            Value::Float(f) => format_float(*f),
            Value::Str(s) => format!("{:?}", &**s),
            Value::List(_) | Value::Record(_) => self.repr(),
            Value::Function(closure) => format!("<fn {}>", closure.qualified_name),
            Value::Native(native) => format!("<native fn {}>", native.name),
            Value::BoundMethod(bound) => format!("<bound method {}>", bound.method.qualified_name),
            Value::Class(class) => format!("<class {}>", class.name),
            Value::Instance(instance) => format!("<{} instance>", instance.class.name),
            Value::Module(module) => format!("<module {}>", module.name),
            Value::Task(task) => format!("<task {}>", task.name()),
            Value::Exception(exc) => format!("{}: {}", exc.type_name, exc.message),
        }
    }
}

fn format_float(f: f64) -> String {
    if f.is_finite() && f.fract() == 0.0 && f.abs() < 1e16 {
        format!("{f:.1}")
    } else {
        f.to_string()
    }
}

/// Widen an integer for mixed arithmetic and comparison.
#[expect(clippy::cast_precision_loss, reason = "mixed int/float math widens to f64")]
pub(crate) fn int_to_float(n: i64) -> f64 {
    n as f64
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        values_equal(self, other, &mut Vec::new())
    }
}

/// Structural equality for containers, identity for everything else.
///
/// `open` holds the container pairs already being compared; meeting one
/// again means the two cycles line up, so it counts as equal.
#[allow(clippy::float_cmp, reason = "value equality is exact")]
fn values_equal(a: &Value, b: &Value, open: &mut Vec<(*const (), *const ())>) -> bool {
    match (a, b) {
        (Value::Null, Value::Null) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        (Value::Int(a), Value::Int(b)) => a == b,
        (Value::Float(a), Value::Float(b)) => a == b,
        (Value::Int(a), Value::Float(b)) | (Value::Float(b), Value::Int(a)) => {
            int_to_float(*a) == *b
        }
        (Value::Str(a), Value::Str(b)) => a == b,
        (Value::List(a), Value::List(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>());
            if open.contains(&pair) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }
            open.push(pair);
            let equal = a
                .iter()
                .zip(b.iter())
                .all(|(x, y)| ensure_sufficient_stack(|| values_equal(x, y, open)));
            open.pop();
            equal
        }
        (Value::Record(a), Value::Record(b)) => {
            if Rc::ptr_eq(a, b) {
                return true;
            }
            let pair = (Rc::as_ptr(a).cast::<()>(), Rc::as_ptr(b).cast::<()>());
            if open.contains(&pair) {
                return true;
            }
            let (a, b) = (a.borrow(), b.borrow());
            if a.len() != b.len() {
                return false;
            }
            open.push(pair);
            let equal = a.iter().zip(b.iter()).all(|((ka, va), (kb, vb))| {
                ka == kb && ensure_sufficient_stack(|| values_equal(va, vb, open))
            });
            open.pop();
            equal
        }
        (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
        (Value::Native(a), Value::Native(b)) => Rc::ptr_eq(a, b),
        (Value::BoundMethod(a), Value::BoundMethod(b)) => {
            Rc::ptr_eq(&a.method, &b.method) && values_equal(&a.receiver, &b.receiver, open)
        }
        (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
        (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
        (Value::Module(a), Value::Module(b)) => Rc::ptr_eq(a, b),
        (Value::Task(a), Value::Task(b)) => Rc::ptr_eq(a, b),
        (Value::Exception(a), Value::Exception(b)) => Rc::ptr_eq(a, b),
        _ => false,
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(n) => write!(f, "Int({n})"),
            Value::Float(x) => write!(f, "Float({x})"),
            Value::Str(s) => write!(f, "Str({:?})", &**s),
            other => write!(f, "{}", other.repr()),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::Float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

#[cfg(test)]
mod tests;
