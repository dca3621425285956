//! Binary and unary operators.
//!
//! Integer arithmetic is checked; overflow raises instead of wrapping.
//! Mixed int and float operands promote to float, and `/` always yields
//! a float.

use std::cmp::Ordering;

use corp_ir::{BinaryOp, Node, Span, UnaryOp};

use super::{EvalResult, Interpreter};
use crate::builtins::MAX_SEQUENCE_LEN;
use crate::errors::{self, Fault};
use crate::value::int_to_float;
use crate::{Environment, Value};

impl Interpreter {
    pub(super) fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Node,
        right: &Node,
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        if op.is_short_circuit() {
            let left = self.eval(left, env)?.is_truthy();
            let result = match op {
                BinaryOp::And => left && self.eval(right, env)?.is_truthy(),
                _ => left || self.eval(right, env)?.is_truthy(),
            };
            return Ok(Value::Bool(result));
        }
        let left = self.eval(left, env)?;
        let right = self.eval(right, env)?;
        binary(op, &left, &right).map_err(|fault| self.raise(fault, span))
    }

    pub(super) fn eval_unary(&mut self, op: UnaryOp, value: &Value, span: &Span) -> EvalResult {
        match (op, value) {
            (UnaryOp::Not, value) => Ok(Value::Bool(!value.is_truthy())),
            (UnaryOp::Neg, Value::Int(n)) => n
                .checked_neg()
                .map(Value::Int)
                .ok_or_else(|| self.raise(errors::integer_overflow(op.as_symbol()), span)),
            (UnaryOp::Neg, Value::Float(f)) => Ok(Value::Float(-f)),
            (UnaryOp::Neg, value) => Err(self.raise(errors::invalid_operand(op.as_symbol(), value), span)),
        }
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Result<Value, Fault> {
    match op {
        BinaryOp::Add => add(left, right),
        BinaryOp::Sub => arithmetic(op, left, right, i64::checked_sub, |a, b| a - b),
        BinaryOp::Mul => match (left, right) {
            (Value::Str(text), Value::Int(n)) | (Value::Int(n), Value::Str(text)) => {
                repeat(text, *n)
            }
            _ => arithmetic(op, left, right, i64::checked_mul, |a, b| a * b),
        },
        BinaryOp::Div => divide(left, right),
        BinaryOp::Mod => modulo(left, right),
        BinaryOp::Eq => Ok(Value::Bool(left == right)),
        BinaryOp::NotEq => Ok(Value::Bool(left != right)),
        BinaryOp::Lt | BinaryOp::LtEq | BinaryOp::Gt | BinaryOp::GtEq => {
            let ordering = compare(op, left, right)?;
            let holds = ordering.is_some_and(|ord| match op {
                BinaryOp::Lt => ord.is_lt(),
                BinaryOp::LtEq => ord.is_le(),
                BinaryOp::Gt => ord.is_gt(),
                _ => ord.is_ge(),
            });
            Ok(Value::Bool(holds))
        }
        BinaryOp::And => Ok(Value::Bool(left.is_truthy() && right.is_truthy())),
        BinaryOp::Or => Ok(Value::Bool(left.is_truthy() || right.is_truthy())),
    }
}

/// `str * int`: a negative count yields the empty string.
fn repeat(text: &str, count: i64) -> Result<Value, Fault> {
    let count = usize::try_from(count).unwrap_or(0);
    match text.len().checked_mul(count) {
        Some(len) if len <= MAX_SEQUENCE_LEN => Ok(Value::str(text.repeat(count))),
        _ => Err(errors::result_too_large("string repetition", MAX_SEQUENCE_LEN)),
    }
}

fn as_float(value: &Value) -> Option<f64> {
    match value {
        Value::Int(n) => Some(int_to_float(*n)),
        Value::Float(f) => Some(*f),
        _ => None,
    }
}

fn arithmetic(
    op: BinaryOp,
    left: &Value,
    right: &Value,
    int_op: fn(i64, i64) -> Option<i64>,
    float_op: fn(f64, f64) -> f64,
) -> Result<Value, Fault> {
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        return int_op(*a, *b)
            .map(Value::Int)
            .ok_or_else(|| errors::integer_overflow(op.as_symbol()));
    }
    match (as_float(left), as_float(right)) {
        (Some(a), Some(b)) => Ok(Value::Float(float_op(a, b))),
        _ => Err(errors::invalid_operands(op.as_symbol(), left, right)),
    }
}

/// `+` also concatenates strings (with any value) and lists.
fn add(left: &Value, right: &Value) -> Result<Value, Fault> {
    match (left, right) {
        (Value::Str(_), _) | (_, Value::Str(_)) => {
            Ok(Value::str(format!("{}{}", left.display(), right.display())))
        }
        (Value::List(a), Value::List(b)) => {
            let mut items = a.borrow().clone();
            items.extend(b.borrow().iter().cloned());
            Ok(Value::list(items))
        }
        _ => arithmetic(BinaryOp::Add, left, right, i64::checked_add, |a, b| a + b),
    }
}

fn divide(left: &Value, right: &Value) -> Result<Value, Fault> {
    match (as_float(left), as_float(right)) {
        (Some(_), Some(b)) if b == 0.0 => Err(errors::division_by_zero()),
        (Some(a), Some(b)) => Ok(Value::Float(a / b)),
        _ => Err(errors::invalid_operands(BinaryOp::Div.as_symbol(), left, right)),
    }
}

fn modulo(left: &Value, right: &Value) -> Result<Value, Fault> {
    let op = BinaryOp::Mod.as_symbol();
    if let (Value::Int(a), Value::Int(b)) = (left, right) {
        if *b == 0 {
            return Err(errors::division_by_zero());
        }
        return a
            .checked_rem_euclid(*b)
            .map(Value::Int)
            .ok_or_else(|| errors::integer_overflow(op));
    }
    match (as_float(left), as_float(right)) {
        (Some(_), Some(b)) if b == 0.0 => Err(errors::division_by_zero()),
        (Some(a), Some(b)) => Ok(Value::Float(a.rem_euclid(b))),
        _ => Err(errors::invalid_operands(op, left, right)),
    }
}

/// Ordering of two numbers or two strings. `None` when a NaN is involved.
fn compare(op: BinaryOp, left: &Value, right: &Value) -> Result<Option<Ordering>, Fault> {
    match (left, right) {
        (Value::Int(a), Value::Int(b)) => Ok(Some(a.cmp(b))),
        (Value::Str(a), Value::Str(b)) => Ok(Some(a.cmp(b))),
        _ => match (as_float(left), as_float(right)) {
            (Some(a), Some(b)) => Ok(a.partial_cmp(&b)),
            _ => Err(errors::invalid_operands(op.as_symbol(), left, right)),
        },
    }
}
