//! Definitions shared between the tree and runtime values.

use crate::{Name, Node, Span, TypeRef};

/// A function, method or lambda.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FunctionDef {
    pub name: Name,
    pub params: Vec<Param>,
    pub body: Vec<Node>,
    pub is_async: bool,
    pub return_type: Option<TypeRef>,
    pub span: Span,
}

/// A declared parameter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Param {
    pub name: Name,
    pub ty: Option<TypeRef>,
    /// Evaluated in the callee's environment when the argument is omitted.
    pub default: Option<Node>,
}

/// A call argument, positional or `name: value`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct Arg {
    pub name: Option<Name>,
    pub value: Node,
}

/// `class Name extends Base { members }`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ClassDef {
    pub name: Name,
    pub superclass: Option<Node>,
    /// `FieldDecl` and `MethodDecl` nodes.
    pub members: Vec<Node>,
    pub span: Span,
}

/// A field declared in a class body.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct FieldDef {
    pub name: Name,
    pub ty: Option<TypeRef>,
    pub init: Option<Box<Node>>,
}

/// `catch (binding: A | B) { body }`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct CatchClause {
    pub binding: Option<Name>,
    /// Empty for an untyped catch; more than one entry for a union.
    pub types: Vec<TypeRef>,
    pub body: Vec<Node>,
    pub span: Span,
}

/// One manager of a `with` statement.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct WithItem {
    pub manager: Node,
    /// `as name`: bound to whatever entering the manager returned.
    pub binding: Option<Name>,
}

/// `name as alias` inside `from m import ...`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct ImportItem {
    pub name: Name,
    pub alias: Option<Name>,
}

impl ImportItem {
    /// Name the item is bound to in the importing scope.
    pub fn local_name(&self) -> &Name {
        self.alias.as_ref().unwrap_or(&self.name)
    }
}
