//! Built-in functions and methods.
//!
//! Global functions are defined as constants in the root environment.
//! Methods on lists, strings, and records are natives bound to their
//! receiver at property-access time; a bound receiver arrives as the first
//! argument, so a method and its global twin share one implementation.

use std::rc::Rc;

use crate::exception::HostFault;
use crate::value::{int_to_float, NativeFunction};
use crate::{Environment, Interpreter, Value};

type Builtin = fn(&mut Interpreter, &[Value]) -> Result<Value, HostFault>;

/// Largest list `range` will build.
/// Largest list or string a single builtin or operator may build.
pub(crate) const MAX_SEQUENCE_LEN: usize = 10_000_000;

const GLOBALS: &[(&str, Builtin)] = &[
    ("print", print),
    ("len", len),
    ("str", to_str),
    ("int", to_int),
    ("float", to_float),
    ("type_of", type_of),
    ("assert", assert),
    ("range", range),
    ("keys", keys),
    ("values", values),
    ("push", push),
    ("map", map),
    ("filter", filter),
];

const LIST_METHODS: &[(&str, Builtin)] = &[
    ("push", push),
    ("pop", pop),
    ("contains", contains),
    ("join", join),
    ("map", map),
    ("filter", filter),
];

const STR_METHODS: &[(&str, Builtin)] = &[
    ("upper", upper),
    ("lower", lower),
    ("trim", trim),
    ("split", split),
    ("contains", contains),
];

const RECORD_METHODS: &[(&str, Builtin)] = &[("keys", keys), ("values", values), ("has", has)];

/// Define the global built-in functions in `root`.
pub(crate) fn install(root: &Environment) {
    for (name, func) in GLOBALS {
        root.define_const(*name, Value::native(*name, *func));
    }
}

/// Built-in property of a list, string, or record: `length`, or a method
/// bound to `receiver`.
pub(crate) fn property(receiver: &Value, name: &str) -> Option<Value> {
    let table = match receiver {
        Value::List(_) => LIST_METHODS,
        Value::Str(_) => STR_METHODS,
        Value::Record(_) => RECORD_METHODS,
        _ => return None,
    };
    if name == "length" {
        return length(receiver).map(int_value);
    }
    let (name, func) = table.iter().find(|(method, _)| *method == name)?;
    let native = NativeFunction::new(*name, *func).bind(receiver.clone());
    Some(Value::Native(Rc::new(native)))
}

fn length(value: &Value) -> Option<usize> {
    match value {
        Value::Str(text) => Some(text.chars().count()),
        Value::List(items) => Some(items.borrow().len()),
        Value::Record(fields) => Some(fields.borrow().len()),
        _ => None,
    }
}

fn int_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

// Argument validation

fn require_args(name: &str, expected: usize, args: &[Value]) -> Result<(), HostFault> {
    if args.len() == expected {
        Ok(())
    } else {
        Err(HostFault::TypeContract(format!(
            "{name}() takes {expected} argument(s), got {}",
            args.len()
        )))
    }
}

fn wrong_arg_type(name: &str, expected: &str, got: &Value) -> HostFault {
    HostFault::TypeContract(format!("{name}() expects {expected}, got {}", got.type_name()))
}

fn require_str<'a>(name: &str, args: &'a [Value], index: usize) -> Result<&'a str, HostFault> {
    match &args[index] {
        Value::Str(text) => Ok(&**text),
        other => Err(wrong_arg_type(name, "str", other)),
    }
}

fn require_int(name: &str, args: &[Value], index: usize) -> Result<i64, HostFault> {
    match &args[index] {
        Value::Int(n) => Ok(*n),
        other => Err(wrong_arg_type(name, "int", other)),
    }
}

fn require_list(name: &str, args: &[Value], index: usize) -> Result<Vec<Value>, HostFault> {
    match &args[index] {
        Value::List(items) => Ok(items.borrow().clone()),
        other => Err(wrong_arg_type(name, "list", other)),
    }
}

// Global functions

#[allow(clippy::unnecessary_wraps, reason = "uniform builtin signature")]
fn print(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    let line = args.iter().map(Value::display).collect::<Vec<_>>().join(" ");
    interpreter.print_handler().write_line(&line);
    Ok(Value::Null)
}

fn len(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("len", 1, args)?;
    length(&args[0])
        .map(int_value)
        .ok_or_else(|| wrong_arg_type("len", "str, list or record", &args[0]))
}

fn to_str(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("str", 1, args)?;
    Ok(Value::str(args[0].display()))
}

fn to_int(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("int", 1, args)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Int(*n)),
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Float(f) => float_to_int(*f)
            .map(Value::Int)
            .ok_or_else(|| HostFault::Runtime(format!("cannot convert {f} to int"))),
        Value::Str(text) => text
            .trim()
            .parse::<i64>()
            .map(Value::Int)
            .map_err(|_| HostFault::TypeContract(format!("cannot convert '{text}' to int"))),
        other => Err(wrong_arg_type("int", "number, bool or str", other)),
    }
}

#[expect(
    clippy::cast_possible_truncation,
    reason = "range is checked before the cast"
)]
fn float_to_int(f: f64) -> Option<i64> {
    let limit = 2f64.powi(63);
    let truncated = f.trunc();
    (truncated.is_finite() && truncated.abs() < limit).then(|| truncated as i64)
}

fn to_float(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("float", 1, args)?;
    match &args[0] {
        Value::Int(n) => Ok(Value::Float(int_to_float(*n))),
        Value::Float(f) => Ok(Value::Float(*f)),
        Value::Str(text) => text
            .trim()
            .parse::<f64>()
            .map(Value::Float)
            .map_err(|_| HostFault::TypeContract(format!("cannot convert '{text}' to float"))),
        other => Err(wrong_arg_type("float", "number or str", other)),
    }
}

fn type_of(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("type_of", 1, args)?;
    Ok(Value::str(args[0].type_name()))
}

/// `assert(condition)` or `assert(condition, message)`.
fn assert(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    let (condition, message) = match args {
        [condition] => (condition, None),
        [condition, message] => (condition, Some(message.display())),
        _ => return require_args("assert", 2, args).map(|()| Value::Null),
    };
    if condition.is_truthy() {
        Ok(Value::Null)
    } else {
        Err(HostFault::Assertion(
            message.unwrap_or_else(|| "condition is false".to_string()),
        ))
    }
}

/// `range(end)`, `range(start, end)`, or `range(start, end, step)`.
fn range(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    let (start, end, step) = match args.len() {
        1 => (0, require_int("range", args, 0)?, 1),
        2 => (require_int("range", args, 0)?, require_int("range", args, 1)?, 1),
        3 => (
            require_int("range", args, 0)?,
            require_int("range", args, 1)?,
            require_int("range", args, 2)?,
        ),
        _ => return require_args("range", 3, args).map(|()| Value::Null),
    };
    if step == 0 {
        return Err(HostFault::Runtime("range() step must not be zero".to_string()));
    }

    let span = if step > 0 {
        i128::from(end) - i128::from(start)
    } else {
        i128::from(start) - i128::from(end)
    };
    let step_size = i128::from(step).abs();
    let count = if span <= 0 { 0 } else { (span + step_size - 1) / step_size };
    if count > i128::try_from(MAX_SEQUENCE_LEN).unwrap_or(i128::MAX) {
        return Err(HostFault::OutOfMemory(format!(
            "range() would produce {count} elements (limit {MAX_SEQUENCE_LEN})"
        )));
    }

    let mut items = Vec::new();
    let mut current = start;
    while (step > 0 && current < end) || (step < 0 && current > end) {
        items.push(Value::Int(current));
        match current.checked_add(step) {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(Value::list(items))
}

fn keys(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("keys", 1, args)?;
    match &args[0] {
        Value::Record(fields) => Ok(Value::list(
            fields.borrow().iter().map(|(key, _)| Value::str(key)).collect(),
        )),
        other => Err(wrong_arg_type("keys", "record", other)),
    }
}

fn values(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("values", 1, args)?;
    match &args[0] {
        Value::Record(fields) => Ok(Value::list(
            fields.borrow().iter().map(|(_, value)| value.clone()).collect(),
        )),
        other => Err(wrong_arg_type("values", "record", other)),
    }
}

/// Append to a list in place.
fn push(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("push", 2, args)?;
    match &args[0] {
        Value::List(items) => {
            items.borrow_mut().push(args[1].clone());
            Ok(Value::Null)
        }
        other => Err(wrong_arg_type("push", "list", other)),
    }
}

fn map(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("map", 2, args)?;
    let items = require_list("map", args, 0)?;
    let mut mapped = Vec::with_capacity(items.len());
    for item in items {
        mapped.push(interpreter.call(&args[1], vec![item])?);
    }
    Ok(Value::list(mapped))
}

fn filter(interpreter: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("filter", 2, args)?;
    let items = require_list("filter", args, 0)?;
    let mut kept = Vec::new();
    for item in items {
        if interpreter.call(&args[1], vec![item.clone()])?.is_truthy() {
            kept.push(item);
        }
    }
    Ok(Value::list(kept))
}

// Methods

/// Remove and return the last element, or null when empty.
fn pop(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("pop", 1, args)?;
    match &args[0] {
        Value::List(items) => Ok(items.borrow_mut().pop().unwrap_or(Value::Null)),
        other => Err(wrong_arg_type("pop", "list", other)),
    }
}

fn contains(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("contains", 2, args)?;
    match (&args[0], &args[1]) {
        (Value::List(items), needle) => Ok(Value::Bool(items.borrow().contains(needle))),
        (Value::Str(text), Value::Str(needle)) => Ok(Value::Bool(text.contains(&**needle))),
        (Value::Str(_), other) => Err(wrong_arg_type("contains", "str", other)),
        (other, _) => Err(wrong_arg_type("contains", "list or str", other)),
    }
}

fn join(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("join", 2, args)?;
    let items = require_list("join", args, 0)?;
    let separator = require_str("join", args, 1)?;
    let parts: Vec<String> = items.iter().map(Value::display).collect();
    Ok(Value::str(parts.join(separator)))
}

fn upper(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("upper", 1, args)?;
    Ok(Value::str(require_str("upper", args, 0)?.to_uppercase()))
}

fn lower(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("lower", 1, args)?;
    Ok(Value::str(require_str("lower", args, 0)?.to_lowercase()))
}

fn trim(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("trim", 1, args)?;
    Ok(Value::str(require_str("trim", args, 0)?.trim()))
}

fn split(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("split", 2, args)?;
    let text = require_str("split", args, 0)?;
    let separator = require_str("split", args, 1)?;
    let parts = if separator.is_empty() {
        text.chars().map(|c| Value::str(c.to_string())).collect()
    } else {
        text.split(separator).map(Value::str).collect()
    };
    Ok(Value::list(parts))
}

fn has(_: &mut Interpreter, args: &[Value]) -> Result<Value, HostFault> {
    require_args("has", 2, args)?;
    let key = require_str("has", args, 1)?;
    match &args[0] {
        Value::Record(fields) => Ok(Value::Bool(
            fields.borrow().iter().any(|(name, _)| name.as_str() == key),
        )),
        other => Err(wrong_arg_type("has", "record", other)),
    }
}
