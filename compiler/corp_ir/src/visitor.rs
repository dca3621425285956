//! AST Visitor Pattern
//!
//! Read-only traversal of the tree. The visitor can mutate its own state
//! during traversal, but the AST remains immutable.
//!
//! Default implementations call `walk_*` functions that traverse children.
//! Override `visit_*` methods to add custom behavior at specific nodes, and
//! call the matching `walk_*` to keep descending.
//!
//! # Example
//!
//! ```
//! use corp_ir::visitor::{walk_node, Visitor};
//! use corp_ir::{build, Node, NodeKind};
//!
//! struct CountIdents(usize);
//!
//! impl<'ast> Visitor<'ast> for CountIdents {
//!     fn visit_node(&mut self, node: &'ast Node) {
//!         if let NodeKind::Identifier(_) = node.kind {
//!             self.0 += 1;
//!         }
//!         walk_node(self, node);
//!     }
//! }
//!
//! let tree = build::binary(corp_ir::BinaryOp::Add, build::ident("a"), build::ident("b"));
//! let mut counter = CountIdents(0);
//! counter.visit_node(&tree);
//! assert_eq!(counter.0, 2);
//! ```

use crate::ast::{Arg, CatchClause, ClassDef, FunctionDef, Node, NodeKind};

/// AST Visitor trait.
pub trait Visitor<'ast> {
    /// Visit any node.
    fn visit_node(&mut self, node: &'ast Node) {
        walk_node(self, node);
    }

    /// Visit a statement list (a body, an arm, a block).
    fn visit_block(&mut self, statements: &'ast [Node]) {
        walk_block(self, statements);
    }

    /// Visit a function, method or lambda definition.
    fn visit_function(&mut self, function: &'ast FunctionDef) {
        walk_function(self, function);
    }

    /// Visit a class definition.
    fn visit_class(&mut self, class: &'ast ClassDef) {
        walk_class(self, class);
    }

    /// Visit a catch clause.
    fn visit_catch(&mut self, clause: &'ast CatchClause) {
        walk_block(self, &clause.body);
    }
}

/// Visit every statement of a list in order.
pub fn walk_block<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, statements: &'ast [Node]) {
    for statement in statements {
        visitor.visit_node(statement);
    }
}

/// Visit parameter defaults, then the body.
pub fn walk_function<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, function: &'ast FunctionDef) {
    for param in &function.params {
        if let Some(default) = &param.default {
            visitor.visit_node(default);
        }
    }
    visitor.visit_block(&function.body);
}

/// Visit the superclass expression, then every member.
pub fn walk_class<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, class: &'ast ClassDef) {
    if let Some(superclass) = &class.superclass {
        visitor.visit_node(superclass);
    }
    for member in &class.members {
        visitor.visit_node(member);
    }
}

fn walk_args<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, args: &'ast [Arg]) {
    for arg in args {
        visitor.visit_node(&arg.value);
    }
}

/// Visit the children of a node.
pub fn walk_node<'ast, V: Visitor<'ast> + ?Sized>(visitor: &mut V, node: &'ast Node) {
    match &node.kind {
        NodeKind::Program(statements) | NodeKind::Block(statements) => {
            visitor.visit_block(statements);
        }
        NodeKind::List(items) | NodeKind::Interpolated(items) => walk_block(visitor, items),
        NodeKind::Literal(_)
        | NodeKind::Identifier(_)
        | NodeKind::This
        | NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Import { .. }
        | NodeKind::FromImport { .. } => {}
        NodeKind::Binary { left, right, .. } => {
            visitor.visit_node(left);
            visitor.visit_node(right);
        }
        NodeKind::Unary { operand, .. } => visitor.visit_node(operand),
        NodeKind::Ternary {
            condition,
            then_value,
            else_value,
        } => {
            visitor.visit_node(condition);
            visitor.visit_node(then_value);
            visitor.visit_node(else_value);
        }
        NodeKind::Record(entries) => {
            for (_, value) in entries {
                visitor.visit_node(value);
            }
        }
        NodeKind::Property { object, .. } => visitor.visit_node(object),
        NodeKind::Index { object, index } => {
            visitor.visit_node(object);
            visitor.visit_node(index);
        }
        NodeKind::Call { callee, args } => {
            visitor.visit_node(callee);
            walk_args(visitor, args);
        }
        NodeKind::New { class, args } => {
            visitor.visit_node(class);
            walk_args(visitor, args);
        }
        NodeKind::SuperCall { args, .. } => walk_args(visitor, args),
        NodeKind::Lambda(def)
        | NodeKind::FunctionDecl(def)
        | NodeKind::MethodDecl { def, .. } => visitor.visit_function(def),
        NodeKind::ClassDecl(class) => visitor.visit_class(class),
        NodeKind::FieldDecl(field) => {
            if let Some(init) = &field.init {
                visitor.visit_node(init);
            }
        }
        NodeKind::Await(inner) | NodeKind::Throw(inner) | NodeKind::Delete(inner) => {
            visitor.visit_node(inner);
        }
        NodeKind::With { items, body } => {
            for item in items {
                visitor.visit_node(&item.manager);
            }
            visitor.visit_block(body);
        }
        NodeKind::Return(value) => {
            if let Some(value) = value {
                visitor.visit_node(value);
            }
        }
        NodeKind::VarDecl { init, .. } => {
            if let Some(init) = init {
                visitor.visit_node(init);
            }
        }
        NodeKind::Assign { target, value } => {
            visitor.visit_node(target);
            visitor.visit_node(value);
        }
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => {
            visitor.visit_node(condition);
            visitor.visit_block(then_branch);
            if let Some(else_branch) = else_branch {
                visitor.visit_block(else_branch);
            }
        }
        NodeKind::While { condition, body } => {
            visitor.visit_node(condition);
            visitor.visit_block(body);
        }
        NodeKind::For {
            init,
            condition,
            update,
            body,
        } => {
            for part in [init, condition, update].into_iter().flatten() {
                visitor.visit_node(part);
            }
            visitor.visit_block(body);
        }
        NodeKind::ForEach { iterable, body, .. } => {
            visitor.visit_node(iterable);
            visitor.visit_block(body);
        }
        NodeKind::Try {
            body,
            catches,
            finally,
        } => {
            visitor.visit_block(body);
            for clause in catches {
                visitor.visit_catch(clause);
            }
            if let Some(finally) = finally {
                visitor.visit_block(finally);
            }
        }
    }
}
