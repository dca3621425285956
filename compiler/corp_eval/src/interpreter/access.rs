//! Property and index access, assignment, and `delete`.

use std::cell::RefCell;
use std::rc::Rc;

use corp_ir::{Name, Node, NodeKind, Span};

use super::{ControlAction, EvalResult, Interpreter};
use crate::builtins;
use crate::class::{ClassObject, InstanceObject};
use crate::errors;
use crate::exception::ExceptionObject;
use crate::value::{BoundMethod, RecordFields};
use crate::{AssignError, Environment, Value};

impl Interpreter {
    pub(super) fn get_property(&mut self, object: &Value, name: &Name, span: &Span) -> EvalResult {
        let found = match object {
            Value::Instance(instance) => instance_member(object, instance, name),
            Value::Class(class) => ClassObject::find_static(class, name)
                .map(Value::Function)
                .or_else(|| (name.as_str() == "name").then(|| Value::str(&class.name))),
            Value::Record(fields) => {
                let value = record_get(fields, name).or_else(|| builtins::property(object, name));
                return Ok(value.unwrap_or(Value::Null));
            }
            Value::Module(module) => match module.get(name) {
                Some(value) => Some(value),
                None => return Err(self.raise(errors::missing_export(&module.name, name), span)),
            },
            Value::Exception(exc) => exception_property(exc, name),
            Value::Task(task) => match name.as_str() {
                "id" => Some(Value::Int(i64::try_from(task.id()).unwrap_or(i64::MAX))),
                "name" => Some(Value::str(task.name())),
                "done" => Some(Value::Bool(task.is_finished())),
                _ => None,
            },
            Value::Null => return Err(self.raise(errors::property_of_null(name), span)),
            _ => builtins::property(object, name),
        };
        found.ok_or_else(|| self.raise(errors::no_property(&object.type_name(), name), span))
    }

    pub(super) fn get_index(&mut self, object: &Value, index: &Value, span: &Span) -> EvalResult {
        match (object, index) {
            (Value::List(items), Value::Int(i)) => {
                let items = items.borrow();
                match resolve_index(*i, items.len()) {
                    Some(at) => Ok(items[at].clone()),
                    None => Err(self.raise(errors::index_out_of_range(*i, items.len()), span)),
                }
            }
            (Value::Str(text), Value::Int(i)) => {
                let chars: Vec<char> = text.chars().collect();
                match resolve_index(*i, chars.len()) {
                    Some(at) => Ok(Value::str(chars[at].to_string())),
                    None => Err(self.raise(errors::index_out_of_range(*i, chars.len()), span)),
                }
            }
            (Value::Record(fields), Value::Str(key)) => Ok(record_get(fields, key).unwrap_or(Value::Null)),
            _ => Err(self.raise(errors::invalid_index(object, index), span)),
        }
    }

    /// Assign to a variable, property, or index. Yields the assigned value.
    pub(super) fn eval_assign(
        &mut self,
        target: &Node,
        value: &Node,
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        match &target.kind {
            NodeKind::Identifier(name) => {
                let value = self.eval(value, env)?;
                if let Err(err) = env.assign(name, value.clone()) {
                    let fault = match err {
                        AssignError::Undefined => errors::assign_undefined(name),
                        AssignError::Immutable => errors::assign_constant(name),
                        AssignError::Contract { expected } => {
                            errors::variable_contract(name, &expected, &value)
                        }
                    };
                    return Err(self.raise(fault, span));
                }
                Ok(value)
            }
            NodeKind::Property { object, name } => {
                let object = self.eval(object, env)?;
                let value = self.eval(value, env)?;
                self.set_property(&object, name, value.clone(), span)?;
                Ok(value)
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                let value = self.eval(value, env)?;
                self.set_index(&object, &index, value.clone(), span)?;
                Ok(value)
            }
            _ => Err(self.raise(errors::invalid_assign_target(), span)),
        }
    }

    fn set_property(&self, object: &Value, name: &Name, value: Value, span: &Span) -> Result<(), ControlAction> {
        match object {
            Value::Instance(instance) => instance.set_field(name, value),
            Value::Record(fields) => record_set(fields, name, value),
            Value::Exception(exc) => match &exc.payload {
                Value::Instance(instance) => instance.set_field(name, value),
                _ => return Err(self.raise(errors::cannot_set_property(object, name), span)),
            },
            _ => return Err(self.raise(errors::cannot_set_property(object, name), span)),
        }
        Ok(())
    }

    fn set_index(&self, object: &Value, index: &Value, value: Value, span: &Span) -> Result<(), ControlAction> {
        match (object, index) {
            (Value::List(items), Value::Int(i)) => {
                // Raising snapshots locals, which may include this list.
                let len = items.borrow().len();
                let Some(at) = resolve_index(*i, len) else {
                    return Err(self.raise(errors::index_out_of_range(*i, len), span));
                };
                items.borrow_mut()[at] = value;
            }
            (Value::Record(fields), Value::Str(key)) => record_set(fields, &Name::new(key), value),
            _ => return Err(self.raise(errors::invalid_index(object, index), span)),
        }
        Ok(())
    }

    /// `delete` a variable, a field, or a list element. Yields null.
    pub(super) fn eval_delete(&mut self, target: &Node, env: &Environment, span: &Span) -> EvalResult {
        match &target.kind {
            NodeKind::Identifier(name) => match env.remove(name) {
                Ok(_) => {}
                Err(AssignError::Immutable) => return Err(self.raise(errors::delete_constant(name), span)),
                Err(_) => return Err(self.raise(errors::undefined_variable(name), span)),
            },
            NodeKind::Property { object, name } => {
                let object = self.eval(object, env)?;
                self.remove_field(&object, name, span)?;
            }
            NodeKind::Index { object, index } => {
                let object = self.eval(object, env)?;
                let index = self.eval(index, env)?;
                match (&object, &index) {
                    (Value::List(items), Value::Int(i)) => {
                        let len = items.borrow().len();
                        let Some(at) = resolve_index(*i, len) else {
                            return Err(self.raise(errors::index_out_of_range(*i, len), span));
                        };
                        items.borrow_mut().remove(at);
                    }
                    (Value::Record(_), Value::Str(key)) => self.remove_field(&object, &Name::new(key), span)?,
                    _ => return Err(self.raise(errors::invalid_index(&object, &index), span)),
                }
            }
            _ => return Err(self.raise(errors::invalid_delete_target(), span)),
        }
        Ok(Value::Null)
    }

    fn remove_field(&self, object: &Value, name: &Name, span: &Span) -> Result<(), ControlAction> {
        let removed = match object {
            Value::Instance(instance) => instance.remove_field(name),
            Value::Record(fields) => {
                let mut fields = fields.borrow_mut();
                let at = fields.iter().position(|(field, _)| field == name);
                at.map(|at| fields.remove(at).1)
            }
            _ => return Err(self.raise(errors::cannot_delete_property(object, name), span)),
        };
        match removed {
            Some(_) => Ok(()),
            None => Err(self.raise(errors::no_property(&object.type_name(), name), span)),
        }
    }
}

/// First callable member of `object` among `names`.
pub(super) fn find_hook(object: &Value, names: &[&str]) -> Option<Value> {
    names.iter().find_map(|name| {
        let member = match object {
            Value::Instance(instance) => instance_member(object, instance, name),
            Value::Record(fields) => record_get(fields, name),
            _ => None,
        };
        member.filter(Value::is_callable)
    })
}

/// Field, else method bound to `this`.
fn instance_member(this: &Value, instance: &InstanceObject, name: &str) -> Option<Value> {
    instance.get_field(name).or_else(|| {
        ClassObject::find_method(&instance.class, name).map(|(method, owner)| {
            Value::BoundMethod(Rc::new(BoundMethod {
                receiver: this.clone(),
                method,
                owner,
            }))
        })
    })
}

/// Members of a caught exception. Members of the payload win over the
/// built-in ones.
fn exception_property(exc: &ExceptionObject, name: &str) -> Option<Value> {
    let from_payload = match &exc.payload {
        Value::Instance(instance) => instance_member(&exc.payload, instance, name),
        Value::Record(fields) => record_get(fields, name),
        _ => None,
    };
    if from_payload.is_some() {
        return from_payload;
    }
    match name {
        "message" => Some(Value::str(&exc.message)),
        "type" => Some(Value::str(&exc.type_name)),
        "kind" => Some(Value::str(exc.kind.name())),
        "code" => Some(Value::str(exc.error_code().as_str())),
        "payload" => Some(exc.payload.clone()),
        "stack" => {
            let frames = exc
                .mp_stack
                .iter()
                .map(|frame| {
                    Value::record(vec![
                        (Name::new("function"), Value::str(&frame.function)),
                        (Name::new("file"), Value::str(&frame.file)),
                        (Name::new("line"), Value::Int(i64::from(frame.line))),
                    ])
                })
                .collect();
            Some(Value::list(frames))
        }
        _ => None,
    }
}

fn record_get(fields: &RefCell<RecordFields>, key: &str) -> Option<Value> {
    fields
        .borrow()
        .iter()
        .find(|(name, _)| name.as_str() == key)
        .map(|(_, value)| value.clone())
}

fn record_set(fields: &RefCell<RecordFields>, key: &Name, value: Value) {
    let mut fields = fields.borrow_mut();
    match fields.iter_mut().find(|(name, _)| name == key) {
        Some(slot) => slot.1 = value,
        None => fields.push((key.clone(), value)),
    }
}

/// Resolve a possibly negative index against `len`.
fn resolve_index(index: i64, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(usize::try_from(index.unsigned_abs()).ok()?)?
    } else {
        usize::try_from(index).ok()?
    };
    (resolved < len).then_some(resolved)
}
