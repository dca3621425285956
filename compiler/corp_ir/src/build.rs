//! Terse tree constructors.
//!
//! The engine receives trees from an external parser; these helpers let
//! hosts and tests assemble the same trees by hand. Every helper produces a
//! node with an unknown span. Use [`at`] to place a node on a source line.

use std::sync::Arc;

use crate::ast::{
    Arg, CatchClause, ClassDef, FieldDef, ForEachMode, FunctionDef, ImportItem, Literal, Node,
    NodeKind, Param, TypeRef, WithItem,
};
use crate::{BinaryOp, Name, Span, UnaryOp};

fn node(kind: NodeKind) -> Node {
    Node::new(kind, Span::default())
}

/// Place `node` at `file:line` (column 1).
pub fn at(file: &str, line: u32, mut node: Node) -> Node {
    node.span = Span::new(file, line, 1);
    node
}

pub fn program(statements: Vec<Node>) -> Node {
    node(NodeKind::Program(statements))
}

pub fn null() -> Node {
    node(NodeKind::Literal(Literal::Null))
}

pub fn bool(value: bool) -> Node {
    node(NodeKind::Literal(Literal::Bool(value)))
}

pub fn int(value: i64) -> Node {
    node(NodeKind::Literal(Literal::Int(value)))
}

pub fn float(value: f64) -> Node {
    node(NodeKind::Literal(Literal::float(value)))
}

pub fn str(value: &str) -> Node {
    node(NodeKind::Literal(Literal::Str(Arc::from(value))))
}

pub fn ident(name: &str) -> Node {
    node(NodeKind::Identifier(Name::new(name)))
}

pub fn binary(op: BinaryOp, left: Node, right: Node) -> Node {
    node(NodeKind::Binary {
        op,
        left: Box::new(left),
        right: Box::new(right),
    })
}

pub fn unary(op: UnaryOp, operand: Node) -> Node {
    node(NodeKind::Unary {
        op,
        operand: Box::new(operand),
    })
}

pub fn ternary(condition: Node, then_value: Node, else_value: Node) -> Node {
    node(NodeKind::Ternary {
        condition: Box::new(condition),
        then_value: Box::new(then_value),
        else_value: Box::new(else_value),
    })
}

pub fn interpolated(parts: Vec<Node>) -> Node {
    node(NodeKind::Interpolated(parts))
}

pub fn list(items: Vec<Node>) -> Node {
    node(NodeKind::List(items))
}

pub fn record(entries: Vec<(&str, Node)>) -> Node {
    node(NodeKind::Record(
        entries
            .into_iter()
            .map(|(key, value)| (Name::new(key), value))
            .collect(),
    ))
}

pub fn prop(object: Node, name: &str) -> Node {
    node(NodeKind::Property {
        object: Box::new(object),
        name: Name::new(name),
    })
}

pub fn index(object: Node, index: Node) -> Node {
    node(NodeKind::Index {
        object: Box::new(object),
        index: Box::new(index),
    })
}

/// Positional argument.
pub fn arg(value: Node) -> Arg {
    Arg { name: None, value }
}

/// `name: value` argument.
pub fn named(name: &str, value: Node) -> Arg {
    Arg {
        name: Some(Name::new(name)),
        value,
    }
}

/// Call with positional arguments only.
pub fn call(callee: Node, args: Vec<Node>) -> Node {
    call_with(callee, args.into_iter().map(arg).collect())
}

pub fn call_with(callee: Node, args: Vec<Arg>) -> Node {
    node(NodeKind::Call {
        callee: Box::new(callee),
        args,
    })
}

/// `name(args)`.
pub fn call_fn(name: &str, args: Vec<Node>) -> Node {
    call(ident(name), args)
}

/// `object.method(args)`.
pub fn call_method(object: Node, method: &str, args: Vec<Node>) -> Node {
    call(prop(object, method), args)
}

/// `new Class(args)`.
pub fn new(class: &str, args: Vec<Node>) -> Node {
    node(NodeKind::New {
        class: Box::new(ident(class)),
        args: args.into_iter().map(arg).collect(),
    })
}

pub fn this() -> Node {
    node(NodeKind::This)
}

/// `super(args)`.
pub fn super_call(args: Vec<Node>) -> Node {
    node(NodeKind::SuperCall {
        method: None,
        args: args.into_iter().map(arg).collect(),
    })
}

/// `super.method(args)`.
pub fn super_method(method: &str, args: Vec<Node>) -> Node {
    node(NodeKind::SuperCall {
        method: Some(Name::new(method)),
        args: args.into_iter().map(arg).collect(),
    })
}

pub fn await_(value: Node) -> Node {
    node(NodeKind::Await(Box::new(value)))
}

/// `var name = init`.
pub fn var(name: &str, init: Node) -> Node {
    node(NodeKind::VarDecl {
        name: Name::new(name),
        ty: None,
        init: Some(Box::new(init)),
        constant: false,
    })
}

/// `var name: ty = init`.
pub fn var_typed(name: &str, ty: TypeRef, init: Option<Node>) -> Node {
    node(NodeKind::VarDecl {
        name: Name::new(name),
        ty: Some(ty),
        init: init.map(Box::new),
        constant: false,
    })
}

/// `var name` with no initializer.
pub fn var_uninit(name: &str) -> Node {
    node(NodeKind::VarDecl {
        name: Name::new(name),
        ty: None,
        init: None,
        constant: false,
    })
}

/// `const name = init`.
pub fn constant(name: &str, init: Node) -> Node {
    node(NodeKind::VarDecl {
        name: Name::new(name),
        ty: None,
        init: Some(Box::new(init)),
        constant: true,
    })
}

/// `name = value`.
pub fn assign(name: &str, value: Node) -> Node {
    assign_to(ident(name), value)
}

/// `target = value` for property and index targets.
pub fn assign_to(target: Node, value: Node) -> Node {
    node(NodeKind::Assign {
        target: Box::new(target),
        value: Box::new(value),
    })
}

pub fn block(statements: Vec<Node>) -> Node {
    node(NodeKind::Block(statements))
}

pub fn if_(condition: Node, then_branch: Vec<Node>, else_branch: Option<Vec<Node>>) -> Node {
    node(NodeKind::If {
        condition: Box::new(condition),
        then_branch,
        else_branch,
    })
}

pub fn while_(condition: Node, body: Vec<Node>) -> Node {
    node(NodeKind::While {
        condition: Box::new(condition),
        body,
    })
}

pub fn for_(init: Option<Node>, condition: Option<Node>, update: Option<Node>, body: Vec<Node>) -> Node {
    node(NodeKind::For {
        init: init.map(Box::new),
        condition: condition.map(Box::new),
        update: update.map(Box::new),
        body,
    })
}

/// `for binding in iterable { body }`.
pub fn for_in(binding: &str, iterable: Node, body: Vec<Node>) -> Node {
    node(NodeKind::ForEach {
        binding: Name::new(binding),
        mode: ForEachMode::Values,
        iterable: Box::new(iterable),
        body,
    })
}

/// `for binding of iterable { body }`.
pub fn for_of(binding: &str, iterable: Node, body: Vec<Node>) -> Node {
    node(NodeKind::ForEach {
        binding: Name::new(binding),
        mode: ForEachMode::Keys,
        iterable: Box::new(iterable),
        body,
    })
}

pub fn brk() -> Node {
    node(NodeKind::Break)
}

pub fn cont() -> Node {
    node(NodeKind::Continue)
}

pub fn ret(value: Node) -> Node {
    node(NodeKind::Return(Some(Box::new(value))))
}

pub fn ret_void() -> Node {
    node(NodeKind::Return(None))
}

pub fn throw(value: Node) -> Node {
    node(NodeKind::Throw(Box::new(value)))
}

/// Parameter without annotation or default.
pub fn param(name: &str) -> Param {
    Param {
        name: Name::new(name),
        ty: None,
        default: None,
    }
}

/// Parameter with a default value.
pub fn param_default(name: &str, default: Node) -> Param {
    Param {
        name: Name::new(name),
        ty: None,
        default: Some(default),
    }
}

/// Parameter with a type annotation.
pub fn param_typed(name: &str, ty: TypeRef) -> Param {
    Param {
        name: Name::new(name),
        ty: Some(ty),
        default: None,
    }
}

pub fn function_def(name: &str, params: Vec<Param>, body: Vec<Node>) -> FunctionDef {
    FunctionDef {
        name: Name::new(name),
        params,
        body,
        is_async: false,
        return_type: None,
        span: Span::default(),
    }
}

/// `fn name(params) { body }` with plain parameters.
pub fn func(name: &str, params: &[&str], body: Vec<Node>) -> Node {
    let params = params.iter().map(|p| param(p)).collect();
    node(NodeKind::FunctionDecl(Arc::new(function_def(name, params, body))))
}

/// `fn` declaration from a full definition.
pub fn func_def(def: FunctionDef) -> Node {
    node(NodeKind::FunctionDecl(Arc::new(def)))
}

/// `async fn name(params) { body }`.
pub fn async_func(name: &str, params: &[&str], body: Vec<Node>) -> Node {
    let params = params.iter().map(|p| param(p)).collect();
    let mut def = function_def(name, params, body);
    def.is_async = true;
    node(NodeKind::FunctionDecl(Arc::new(def)))
}

/// `(params) => { body }`.
pub fn lambda(params: &[&str], body: Vec<Node>) -> Node {
    let params = params.iter().map(|p| param(p)).collect();
    node(NodeKind::Lambda(Arc::new(function_def("<lambda>", params, body))))
}

/// `class name extends superclass { members }`.
pub fn class(name: &str, superclass: Option<&str>, members: Vec<Node>) -> Node {
    node(NodeKind::ClassDecl(Arc::new(ClassDef {
        name: Name::new(name),
        superclass: superclass.map(ident),
        members,
        span: Span::default(),
    })))
}

pub fn method(name: &str, params: &[&str], body: Vec<Node>) -> Node {
    let params = params.iter().map(|p| param(p)).collect();
    node(NodeKind::MethodDecl {
        def: Arc::new(function_def(name, params, body)),
        is_static: false,
    })
}

pub fn static_method(name: &str, params: &[&str], body: Vec<Node>) -> Node {
    let params = params.iter().map(|p| param(p)).collect();
    node(NodeKind::MethodDecl {
        def: Arc::new(function_def(name, params, body)),
        is_static: true,
    })
}

pub fn field(name: &str, init: Option<Node>) -> Node {
    node(NodeKind::FieldDecl(FieldDef {
        name: Name::new(name),
        ty: None,
        init: init.map(Box::new),
    }))
}

/// `catch (binding: types) { body }`; empty `types` is an untyped catch.
pub fn catch(binding: &str, types: &[&str], body: Vec<Node>) -> CatchClause {
    CatchClause {
        binding: Some(Name::new(binding)),
        types: types.iter().map(|t| TypeRef::named(*t)).collect(),
        body,
        span: Span::default(),
    }
}

pub fn try_(body: Vec<Node>, catches: Vec<CatchClause>, finally: Option<Vec<Node>>) -> Node {
    node(NodeKind::Try {
        body,
        catches,
        finally,
    })
}

pub fn with_(items: Vec<WithItem>, body: Vec<Node>) -> Node {
    node(NodeKind::With { items, body })
}

/// `manager [as binding]` inside a `with`.
pub fn with_item(manager: Node, binding: Option<&str>) -> WithItem {
    WithItem {
        manager,
        binding: binding.map(Name::new),
    }
}

pub fn delete(target: Node) -> Node {
    node(NodeKind::Delete(Box::new(target)))
}

/// `import module [as alias]`.
pub fn import(module: &str, alias: Option<&str>) -> Node {
    node(NodeKind::Import {
        module: Name::new(module),
        alias: alias.map(Name::new),
    })
}

/// `from module import name [as alias], ...`.
pub fn from_import(module: &str, items: &[(&str, Option<&str>)]) -> Node {
    node(NodeKind::FromImport {
        module: Name::new(module),
        items: items
            .iter()
            .map(|(name, alias)| ImportItem {
                name: Name::new(name),
                alias: alias.map(Name::new),
            })
            .collect(),
    })
}
