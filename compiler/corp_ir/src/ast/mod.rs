//! Abstract syntax tree.
//!
//! The tree is handed in by an external parser, already validated. Every
//! node carries a [`Span`]. Children are owned (`Box`/`Vec`); function and
//! class definitions are `Arc`-shared so that callable values can keep a
//! body alive without cloning it.
//!
//! Statements and expressions share one `NodeKind` enum: any node may appear
//! in a statement list, and statement-like nodes evaluate to `null`.

mod items;
mod operators;

use std::fmt;
use std::sync::Arc;

pub use items::{Arg, CatchClause, ClassDef, FieldDef, FunctionDef, ImportItem, Param, WithItem};
pub use operators::{BinaryOp, UnaryOp};

use crate::{Name, Span};

/// One AST node.
#[derive(Clone, Eq, PartialEq, Hash)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

impl Node {
    #[inline]
    pub fn new(kind: NodeKind, span: Span) -> Self {
        Node { kind, span }
    }

    /// Name declared by this node when it is a `VarDecl`.
    pub fn declared_name(&self) -> Option<&Name> {
        match &self.kind {
            NodeKind::VarDecl { name, .. } => Some(name),
            _ => None,
        }
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} @ {:?}", self.kind, self.span)
    }
}

/// Iteration style of a `for x in xs` loop.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum ForEachMode {
    /// `for x in xs`: list elements, string characters, record values.
    Values,
    /// `for k of xs`: record keys, list indices.
    Keys,
}

/// Node variants.
///
/// Every variant has exactly one handler in the interpreter.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum NodeKind {
    /// Root of a file: its top-level statements.
    Program(Vec<Node>),

    // Expressions
    Literal(Literal),
    Identifier(Name),
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Node>,
    },
    /// `cond ? a : b`
    Ternary {
        condition: Box<Node>,
        then_value: Box<Node>,
        else_value: Box<Node>,
    },
    /// String interpolation; parts are concatenated by their display form.
    Interpolated(Vec<Node>),
    List(Vec<Node>),
    Record(Vec<(Name, Node)>),
    Property {
        object: Box<Node>,
        name: Name,
    },
    Index {
        object: Box<Node>,
        index: Box<Node>,
    },
    Call {
        callee: Box<Node>,
        args: Vec<Arg>,
    },
    New {
        class: Box<Node>,
        args: Vec<Arg>,
    },
    This,
    /// `super(args)` when `method` is `None`, `super.method(args)` otherwise.
    SuperCall {
        method: Option<Name>,
        args: Vec<Arg>,
    },
    Lambda(Arc<FunctionDef>),
    Await(Box<Node>),

    // Declarations
    VarDecl {
        name: Name,
        ty: Option<TypeRef>,
        init: Option<Box<Node>>,
        constant: bool,
    },
    FunctionDecl(Arc<FunctionDef>),
    ClassDecl(Arc<ClassDef>),
    /// Only valid as a member of a class body.
    MethodDecl {
        def: Arc<FunctionDef>,
        is_static: bool,
    },
    /// Only valid as a member of a class body.
    FieldDecl(FieldDef),

    // Statements
    Assign {
        target: Box<Node>,
        value: Box<Node>,
    },
    Block(Vec<Node>),
    If {
        condition: Box<Node>,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },
    While {
        condition: Box<Node>,
        body: Vec<Node>,
    },
    For {
        init: Option<Box<Node>>,
        condition: Option<Box<Node>>,
        update: Option<Box<Node>>,
        body: Vec<Node>,
    },
    ForEach {
        binding: Name,
        mode: ForEachMode,
        iterable: Box<Node>,
        body: Vec<Node>,
    },
    Break,
    Continue,
    Return(Option<Box<Node>>),
    Try {
        body: Vec<Node>,
        catches: Vec<CatchClause>,
        finally: Option<Vec<Node>>,
    },
    Throw(Box<Node>),
    /// `with (m1 as a, m2) { body }`: each manager is entered in order and
    /// exited in reverse, however the body finishes.
    With {
        items: Vec<WithItem>,
        body: Vec<Node>,
    },
    /// `delete x`, `delete obj.field`, `delete xs[i]`.
    Delete(Box<Node>),
    Import {
        module: Name,
        alias: Option<Name>,
    },
    FromImport {
        module: Name,
        items: Vec<ImportItem>,
    },
}

/// Literal values.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub enum Literal {
    Null,
    Bool(bool),
    Int(i64),
    /// `f64` bits.
    Float(u64),
    Str(Arc<str>),
}

impl Literal {
    pub fn float(value: f64) -> Self {
        Literal::Float(value.to_bits())
    }

    /// Coarse kind used when comparing unannotated declarations.
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Literal::Null => "null",
            Literal::Bool(_) => "bool",
            Literal::Int(_) => "int",
            Literal::Float(_) => "float",
            Literal::Str(_) => "str",
        }
    }
}

/// A written type annotation: `int`, `list<str>`, `Shape`.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
pub struct TypeRef {
    pub name: Name,
    pub args: Vec<TypeRef>,
}

impl TypeRef {
    pub fn named(name: impl Into<Name>) -> Self {
        TypeRef {
            name: name.into(),
            args: Vec::new(),
        }
    }

    pub fn generic(name: impl Into<Name>, args: Vec<TypeRef>) -> Self {
        TypeRef {
            name: name.into(),
            args,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some((first, rest)) = self.args.split_first() {
            write!(f, "<{first}")?;
            for arg in rest {
                write!(f, ", {arg}")?;
            }
            write!(f, ">")?;
        }
        Ok(())
    }
}
