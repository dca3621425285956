//! Corp IR - the tree handed to the execution engine.
//!
//! This crate contains the data structures shared by the analyzer and the
//! interpreter:
//! - `Name` for identifiers
//! - `Span` for source locations (file, line, column)
//! - AST nodes (`Node`, `NodeKind`, `FunctionDef`, `ClassDef`, ...)
//! - A `Visitor` for read-only traversal
//! - `build` helpers for assembling trees without a parser
//!
//! # Design Philosophy
//!
//! - **Closed variants**: every construct is a `NodeKind` variant so handlers
//!   are checked for exhaustiveness at compile time.
//! - **Immutable trees**: passes produce new trees, they never patch one in
//!   place. Function and class definitions sit behind `Arc` so closures can
//!   share a body with the tree that declared it.
//!
//! Float literals are stored as u64 bits for `Eq`/`Hash` compatibility.

pub mod ast;
pub mod build;
mod name;
mod span;
pub mod visitor;

pub use ast::{
    Arg, BinaryOp, CatchClause, ClassDef, FieldDef, ForEachMode, FunctionDef, ImportItem, Literal,
    Node, NodeKind, Param, TypeRef, UnaryOp, WithItem,
};
pub use name::Name;
pub use span::Span;
