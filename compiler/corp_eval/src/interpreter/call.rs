//! Calls, classes, `new`, `super`, and native functions.
//!
//! Every call of a user function creates exactly one environment, a child
//! of the closure's defining environment. `this` and the declaring class
//! (for `super`) are defined directly in it, followed by the parameters.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::rc::Rc;
use std::sync::Arc;

use smallvec::SmallVec;
use tracing::{debug, trace, warn};

use corp_ir::{Arg, ClassDef, Name, Node, NodeKind, Span};

use super::{ControlAction, EvalResult, FrameGuard, Interpreter};
use crate::class::{ClassObject, InstanceObject};
use crate::diagnostics::CallFrame;
use crate::errors;
use crate::exception::HostFault;
use crate::tasks::PendingCall;
use crate::type_check::conforms;
use crate::value::{Closure, NativeFunction};
use crate::{Environment, Mutability, Value};

/// An evaluated argument: optional name and value.
pub(crate) type ArgValue = (Option<Name>, Value);

/// Evaluated arguments of one call.
pub(crate) type Args = SmallVec<[ArgValue; 4]>;

/// `this` and the class that declares the running method.
#[derive(Clone)]
pub(crate) struct MethodReceiver {
    pub this: Value,
    pub owner: Rc<ClassObject>,
}

/// Name under which the declaring class of a method is bound in its call
/// environment.
const CLASS_BINDING: &str = "__class__";

impl Interpreter {
    fn eval_args(&mut self, args: &[Arg], env: &Environment) -> Result<Args, ControlAction> {
        let mut values = Args::with_capacity(args.len());
        for arg in args {
            let value = self.eval(&arg.value, env)?;
            values.push((arg.name.clone(), value));
        }
        Ok(values)
    }

    pub(super) fn eval_call(
        &mut self,
        callee: &Node,
        args: &[Arg],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let callee = self.eval(callee, env)?;
        let args = self.eval_args(args, env)?;
        self.call_value(&callee, args, span)
    }

    pub(super) fn call_value(&mut self, callee: &Value, args: Args, span: &Span) -> EvalResult {
        match callee {
            Value::Function(closure) => self.call_closure(closure, None, args, span),
            Value::BoundMethod(bound) => {
                let receiver = MethodReceiver {
                    this: bound.receiver.clone(),
                    owner: Rc::clone(&bound.owner),
                };
                self.call_closure(&bound.method, Some(receiver), args, span)
            }
            Value::Native(native) => self.call_native(native, args, span),
            Value::Class(class) => self.instantiate(class, args, span),
            other => Err(self.raise(errors::not_callable(other), span)),
        }
    }

    /// Call a closure, or schedule it when it is `async`.
    fn call_closure(
        &mut self,
        closure: &Rc<Closure>,
        receiver: Option<MethodReceiver>,
        args: Args,
        span: &Span,
    ) -> EvalResult {
        if closure.def.is_async {
            let task = self.tasks.spawn(PendingCall {
                closure: Rc::clone(closure),
                receiver,
                args: args.into_vec(),
            });
            debug!(
                task = task.id(),
                function = %task.name(),
                queued = self.tasks.len(),
                "task scheduled"
            );
            return Ok(Value::Task(task));
        }
        self.invoke_closure(closure, receiver, args, span)
    }

    /// Run a closure body to completion in a fresh call environment.
    pub(super) fn invoke_closure(
        &mut self,
        closure: &Closure,
        receiver: Option<MethodReceiver>,
        args: Args,
        span: &Span,
    ) -> EvalResult {
        trace!(function = %closure.qualified_name, depth = self.call_stack.depth(), "call");
        let call_env = Environment::call(&closure.defining_env);
        if let Some(receiver) = receiver {
            call_env.define_const("this", receiver.this);
            call_env.define_const(CLASS_BINDING, Value::Class(receiver.owner));
        }
        self.bind_arguments(closure, args, &call_env, span)?;

        let result = self.run_body(closure, &call_env, span);
        if call_env.release_local_closures() {
            trace!(function = %closure.qualified_name, "released call scope");
        }
        result
    }

    /// Execute the body under its own frame and check the return contract.
    fn run_body(&mut self, closure: &Closure, call_env: &Environment, span: &Span) -> EvalResult {
        let def = &closure.def;
        let frame = CallFrame::new(closure.qualified_name.clone(), def.span.clone(), call_env.clone());
        let mut guard = FrameGuard::enter(self, frame, span)?;
        let value = match guard.exec_block(&def.body, call_env) {
            Ok(_) => Value::Null,
            Err(ControlAction::Return(value)) => value,
            Err(ControlAction::Break) => {
                return Err(guard.raise(errors::control_outside_loop("break"), span))
            }
            Err(ControlAction::Continue) => {
                return Err(guard.raise(errors::control_outside_loop("continue"), span))
            }
            Err(raised) => return Err(raised),
        };
        if let Some(expected) = &def.return_type {
            if !conforms(&value, expected) {
                let fault = errors::return_contract(&closure.qualified_name, expected, &value);
                return Err(guard.raise(fault, span));
            }
        }
        Ok(value)
    }

    /// Bind positional arguments, then named ones, then defaults.
    fn bind_arguments(
        &mut self,
        closure: &Closure,
        args: Args,
        call_env: &Environment,
        span: &Span,
    ) -> Result<(), ControlAction> {
        let params = &closure.def.params;
        let function = closure.qualified_name.as_str();
        let positional_count = args.iter().filter(|(name, _)| name.is_none()).count();
        if positional_count > params.len() {
            let fault = errors::too_many_arguments(function, params.len(), positional_count);
            return Err(self.raise(fault, span));
        }

        let mut slots: SmallVec<[Option<Value>; 4]> = params.iter().map(|_| None).collect();
        let mut next_positional = 0;
        for (name, value) in args {
            let index = match name {
                None => {
                    next_positional += 1;
                    next_positional - 1
                }
                Some(name) => match params.iter().position(|p| p.name == name) {
                    Some(index) => index,
                    None => return Err(self.raise(errors::unknown_argument(function, &name), span)),
                },
            };
            if slots[index].is_some() {
                let fault = errors::duplicate_argument(function, &params[index].name);
                return Err(self.raise(fault, span));
            }
            slots[index] = Some(value);
        }

        for (param, slot) in params.iter().zip(slots) {
            let value = match (slot, &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval(default, call_env)?,
                (None, None) => {
                    return Err(self.raise(errors::missing_argument(function, &param.name), span))
                }
            };
            if let Some(ty) = &param.ty {
                if !conforms(&value, ty) {
                    let fault = errors::argument_contract(function, &param.name, ty, &value);
                    return Err(self.raise(fault, span));
                }
            }
            call_env.define_with(param.name.clone(), value, Mutability::Mutable, param.ty.clone());
        }
        Ok(())
    }

    /// Call a host function behind a panic boundary.
    fn call_native(&mut self, native: &NativeFunction, args: Args, span: &Span) -> EvalResult {
        if args.iter().any(|(name, _)| name.is_some()) {
            return Err(self.raise(errors::named_argument_to_native(&native.name), span));
        }
        let values: Vec<Value> = args.into_iter().map(|(_, value)| value).collect();
        trace!(native = %native.name, "native call");
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| native.invoke(self, &values)));
        match outcome {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => Err(self.raise_host_fault(&fault, span)),
            Err(payload) => {
                let message = panic_message(payload.as_ref());
                warn!(native = %native.name, %message, "native function panicked");
                Err(self.raise_host_fault(&HostFault::Panic(message), span))
            }
        }
    }

    pub(super) fn eval_new(
        &mut self,
        class: &Node,
        args: &[Arg],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let class = self.eval(class, env)?;
        let Value::Class(class) = &class else {
            return Err(self.raise(errors::not_a_class(&class), span));
        };
        let args = self.eval_args(args, env)?;
        self.instantiate(class, args, span)
    }

    /// Create an instance: fields base class first, then the constructor.
    fn instantiate(&mut self, class: &Rc<ClassObject>, args: Args, span: &Span) -> EvalResult {
        let instance = Rc::new(InstanceObject::new(Rc::clone(class)));
        for ancestor in ClassObject::chain(class).iter().rev() {
            for field in &ancestor.fields {
                let value = match &field.init {
                    Some(init) => self.eval(init, &ancestor.anchor)?,
                    None => Value::Null,
                };
                if let Some(ty) = &field.ty {
                    if !conforms(&value, ty) {
                        return Err(self.raise(errors::variable_contract(&field.name, ty, &value), span));
                    }
                }
                instance.set_field(&field.name, value);
            }
        }

        let this = Value::Instance(instance);
        match ClassObject::find_method(class, "constructor") {
            Some((constructor, owner)) => {
                let receiver = MethodReceiver {
                    this: this.clone(),
                    owner,
                };
                self.invoke_closure(&constructor, Some(receiver), args, span)?;
            }
            None if !args.is_empty() => {
                return Err(self.raise(errors::too_many_arguments(&class.name, 0, args.len()), span));
            }
            None => {}
        }
        Ok(this)
    }

    /// `super(args)` or `super.method(args)`: dispatch starting at the
    /// superclass of the class that declares the running method.
    pub(super) fn eval_super(
        &mut self,
        method: Option<&Name>,
        args: &[Arg],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let (Some(this), Some(Value::Class(owner))) = (env.lookup("this"), env.lookup(CLASS_BINDING))
        else {
            return Err(self.raise(errors::super_outside_method(), span));
        };
        let Some(parent) = owner.superclass.clone() else {
            return Err(self.raise(errors::no_superclass(&owner.name), span));
        };
        let method_name = method.map_or("constructor", Name::as_str);
        let args = self.eval_args(args, env)?;
        match ClassObject::find_method(&parent, method_name) {
            Some((closure, holder)) => {
                let receiver = MethodReceiver {
                    this,
                    owner: holder,
                };
                self.invoke_closure(&closure, Some(receiver), args, span)
            }
            // Implicit base constructor.
            None if method.is_none() => Ok(Value::Null),
            None => Err(self.raise(errors::no_property(&parent.name, method_name), span)),
        }
    }

    /// Execute a class declaration. The class anchors to `env`.
    pub(super) fn declare_class(&mut self, def: &Arc<ClassDef>, env: &Environment, span: &Span) -> EvalResult {
        let superclass = match &def.superclass {
            Some(expr) => match self.eval(expr, env)? {
                Value::Class(class) => Some(class),
                other => return Err(self.raise(errors::superclass_not_class(&other), span)),
            },
            None => None,
        };

        let mut class = ClassObject::new(def.name.clone(), superclass, env.clone());
        for member in &def.members {
            match &member.kind {
                NodeKind::MethodDecl { def: method, is_static } => {
                    class.add_method(Arc::clone(method), *is_static);
                }
                NodeKind::FunctionDecl(method) => class.add_method(Arc::clone(method), false),
                NodeKind::FieldDecl(field) => class.add_field(field.clone()),
                _ => return Err(self.raise(errors::invalid_class_member(&def.name), &member.span)),
            }
        }

        let class = Rc::new(class);
        env.define(def.name.clone(), Value::Class(Rc::clone(&class)));
        self.classes.register(Rc::clone(&class));
        debug!(
            class = %class.name,
            superclass = ?class.superclass.as_ref().map(|s| s.name.clone()),
            "class declared"
        );
        Ok(Value::Null)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
