//! Runtime fault factories.
//!
//! Each function names one failure and fixes its category and message text.
//! The interpreter attaches the location and stack when it raises the fault.
//! Message wording matters: `format_exception` keys its suggestions on it,
//! and message-based catch matching reads it.

use corp_ir::TypeRef;

use crate::exception::Category;
use crate::module::ResolveError;
use crate::Value;

/// A failure detected by the engine, not yet raised.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct Fault {
    pub category: Category,
    pub message: String,
}

impl Fault {
    fn new(category: Category, message: String) -> Self {
        Fault { category, message }
    }
}

// Names

#[cold]
pub(crate) fn undefined_variable(name: &str) -> Fault {
    Fault::new(Category::ReferenceError, format!("undefined variable '{name}'"))
}

#[cold]
pub(crate) fn assign_undefined(name: &str) -> Fault {
    Fault::new(
        Category::ReferenceError,
        format!("cannot assign to undefined variable '{name}'"),
    )
}

#[cold]
pub(crate) fn assign_constant(name: &str) -> Fault {
    Fault::new(Category::TypeError, format!("cannot assign to constant '{name}'"))
}

// Type contracts

#[cold]
pub(crate) fn variable_contract(name: &str, expected: &TypeRef, value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!(
            "type mismatch: '{name}' is declared as {expected} but got {}",
            value.type_name()
        ),
    )
}

#[cold]
pub(crate) fn argument_contract(function: &str, param: &str, expected: &TypeRef, value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!(
            "type mismatch: argument '{param}' of {function}() expects {expected}, got {}",
            value.type_name()
        ),
    )
}

#[cold]
pub(crate) fn return_contract(function: &str, expected: &TypeRef, value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!(
            "type mismatch: {function}() must return {expected}, got {}",
            value.type_name()
        ),
    )
}

// Calls

#[cold]
pub(crate) fn not_callable(value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("'{}' value is not callable", value.type_name()),
    )
}

#[cold]
pub(crate) fn too_many_arguments(function: &str, expected: usize, got: usize) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("{function}() takes {expected} argument(s) but {got} were given"),
    )
}

#[cold]
pub(crate) fn unknown_argument(function: &str, name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("{function}() got an unexpected argument '{name}'"),
    )
}

#[cold]
pub(crate) fn duplicate_argument(function: &str, name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("{function}() got multiple values for argument '{name}'"),
    )
}

#[cold]
pub(crate) fn missing_argument(function: &str, name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("{function}() missing required argument '{name}'"),
    )
}

#[cold]
pub(crate) fn named_argument_to_native(function: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("{function}() does not accept named arguments"),
    )
}

#[cold]
pub(crate) fn recursion_limit(max: usize) -> Fault {
    Fault::new(
        Category::MemoryError,
        format!("maximum recursion depth exceeded ({max})"),
    )
}

#[cold]
pub(crate) fn result_too_large(operation: &str, limit: usize) -> Fault {
    Fault::new(
        Category::MemoryError,
        format!("{operation} result exceeds {limit} elements"),
    )
}

#[cold]
pub(crate) fn control_outside_loop(keyword: &str) -> Fault {
    Fault::new(
        Category::RuntimeError,
        format!("'{keyword}' outside of a loop"),
    )
}

// Operators

#[cold]
pub(crate) fn division_by_zero() -> Fault {
    Fault::new(Category::RuntimeError, "division by zero".to_string())
}

#[cold]
pub(crate) fn integer_overflow(op: &str) -> Fault {
    Fault::new(Category::RuntimeError, format!("integer overflow in '{op}'"))
}

#[cold]
pub(crate) fn invalid_operands(op: &str, left: &Value, right: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!(
            "type mismatch: cannot apply '{op}' to {} and {}",
            left.type_name(),
            right.type_name()
        ),
    )
}

#[cold]
pub(crate) fn invalid_operand(op: &str, value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("type mismatch: cannot apply '{op}' to {}", value.type_name()),
    )
}

// Access

#[cold]
pub(crate) fn no_property(owner: &str, name: &str) -> Fault {
    Fault::new(
        Category::ReferenceError,
        format!("'{owner}' has no property '{name}'"),
    )
}

#[cold]
pub(crate) fn property_of_null(name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("cannot read property '{name}' of null"),
    )
}

#[cold]
pub(crate) fn cannot_set_property(value: &Value, name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("cannot set property '{name}' on {}", value.type_name()),
    )
}

#[cold]
pub(crate) fn index_out_of_range(index: i64, len: usize) -> Fault {
    Fault::new(
        Category::RuntimeError,
        format!("index {index} out of range for length {len}"),
    )
}

#[cold]
pub(crate) fn invalid_index(container: &Value, index: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!(
            "type mismatch: cannot index {} with {}",
            container.type_name(),
            index.type_name()
        ),
    )
}

#[cold]
pub(crate) fn delete_constant(name: &str) -> Fault {
    Fault::new(Category::TypeError, format!("cannot delete constant '{name}'"))
}

#[cold]
pub(crate) fn cannot_delete_property(value: &Value, name: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("cannot delete property '{name}' of {}", value.type_name()),
    )
}

#[cold]
pub(crate) fn invalid_delete_target() -> Fault {
    Fault::new(Category::TypeError, "invalid delete target".to_string())
}

#[cold]
pub(crate) fn invalid_assign_target() -> Fault {
    Fault::new(Category::TypeError, "invalid assignment target".to_string())
}

#[cold]
pub(crate) fn not_iterable(value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("'{}' value is not iterable", value.type_name()),
    )
}

// Classes

#[cold]
pub(crate) fn this_outside_method() -> Fault {
    Fault::new(
        Category::ReferenceError,
        "'this' is not defined outside a method".to_string(),
    )
}

#[cold]
pub(crate) fn super_outside_method() -> Fault {
    Fault::new(
        Category::ReferenceError,
        "'super' is not defined outside a method".to_string(),
    )
}

#[cold]
pub(crate) fn no_superclass(class: &str) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("class '{class}' has no superclass"),
    )
}

#[cold]
pub(crate) fn superclass_not_class(value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("type mismatch: superclass must be a class, got {}", value.type_name()),
    )
}

#[cold]
pub(crate) fn not_a_class(value: &Value) -> Fault {
    Fault::new(
        Category::TypeError,
        format!("type mismatch: 'new' expects a class, got {}", value.type_name()),
    )
}

#[cold]
pub(crate) fn class_member_outside_class() -> Fault {
    Fault::new(
        Category::RuntimeError,
        "internal error: method or field declaration outside a class body".to_string(),
    )
}

#[cold]
pub(crate) fn invalid_class_member(class: &str) -> Fault {
    Fault::new(
        Category::RuntimeError,
        format!("internal error: unexpected statement in the body of class '{class}'"),
    )
}

// Modules

#[cold]
pub(crate) fn circular_import(module: &str) -> Fault {
    Fault::new(
        Category::ReferenceError,
        format!("circular import of module '{module}'"),
    )
}

#[cold]
pub(crate) fn missing_export(module: &str, name: &str) -> Fault {
    Fault::new(
        Category::ReferenceError,
        format!("module '{module}' has no export '{name}'"),
    )
}

#[cold]
pub(crate) fn no_resolver(module: &str) -> Fault {
    Fault::new(
        Category::IoError,
        format!("cannot import '{module}': no module resolver configured"),
    )
}

#[cold]
pub(crate) fn unresolved_module(err: &ResolveError) -> Fault {
    Fault::new(Category::IoError, err.to_string())
}

// Tasks

#[cold]
pub(crate) fn await_running_task(task: &str) -> Fault {
    Fault::new(
        Category::ConcurrencyError,
        format!("deadlock: task '{task}' awaited while it is still running"),
    )
}
