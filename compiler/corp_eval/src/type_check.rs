//! Runtime checks for declared types.
//!
//! Annotations on variables, parameters, and return values are contracts
//! checked when a value flows into them. `null` satisfies every contract.
//! Generic arguments are checked one level deep for lists and records.

use corp_ir::TypeRef;

use crate::Value;

/// Does `value` satisfy the declared type `ty`?
pub fn conforms(value: &Value, ty: &TypeRef) -> bool {
    if matches!(value, Value::Null) {
        return true;
    }
    match ty.name.as_str() {
        "any" | "dynamic" => true,
        "int" => matches!(value, Value::Int(_)),
        "float" | "number" => matches!(value, Value::Int(_) | Value::Float(_)),
        "str" | "string" => matches!(value, Value::Str(_)),
        "bool" => matches!(value, Value::Bool(_)),
        "list" | "array" => match value {
            Value::List(items) => ty
                .args
                .first()
                .map_or(true, |elem| items.borrow().iter().all(|item| conforms(item, elem))),
            _ => false,
        },
        "record" | "map" | "dict" => match value {
            Value::Record(fields) => ty
                .args
                .last()
                .map_or(true, |elem| fields.borrow().iter().all(|(_, v)| conforms(v, elem))),
            _ => false,
        },
        "function" | "fn" | "callable" => value.is_callable(),
        "task" | "Future" => matches!(value, Value::Task(_)),
        "class" => matches!(value, Value::Class(_)),
        "module" => matches!(value, Value::Module(_)),
        class_name => match value {
            Value::Instance(instance) => instance.class.has_ancestor_named(class_name),
            Value::Exception(exc) => exc.type_name.as_str() == class_name || exc.kind.name() == class_name,
            _ => false,
        },
    }
}
