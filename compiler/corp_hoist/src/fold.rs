//! Rebuilding traversal.
//!
//! The read-only `Visitor` in `corp_ir` cannot produce a new tree, so the
//! analyzer folds: every `fold_*` returns a rebuilt copy of its input.
//! Override `fold_block` to rewrite statement lists and `fold_function` to
//! change how bodies are treated; the defaults rebuild children unchanged.

use std::sync::Arc;

use corp_ir::{
    Arg, CatchClause, ClassDef, FieldDef, FunctionDef, Node, NodeKind, Param, WithItem,
};

pub(crate) trait Folder {
    fn fold_node(&mut self, node: &Node) -> Node {
        fold_children(self, node)
    }

    /// Fold a statement list (body, arm, loop body, try block).
    fn fold_block(&mut self, statements: &[Node]) -> Vec<Node> {
        statements.iter().map(|s| self.fold_node(s)).collect()
    }

    fn fold_function(&mut self, def: &FunctionDef) -> FunctionDef {
        fold_function_def(self, def)
    }
}

pub(crate) fn fold_function_def<F: Folder + ?Sized>(folder: &mut F, def: &FunctionDef) -> FunctionDef {
    let params = def
        .params
        .iter()
        .map(|param| Param {
            name: param.name.clone(),
            ty: param.ty.clone(),
            default: param.default.as_ref().map(|d| folder.fold_node(d)),
        })
        .collect();
    FunctionDef {
        name: def.name.clone(),
        params,
        body: folder.fold_block(&def.body),
        is_async: def.is_async,
        return_type: def.return_type.clone(),
        span: def.span.clone(),
    }
}

fn fold_box<F: Folder + ?Sized>(folder: &mut F, node: &Node) -> Box<Node> {
    Box::new(folder.fold_node(node))
}

fn fold_opt<F: Folder + ?Sized>(folder: &mut F, node: Option<&Node>) -> Option<Box<Node>> {
    node.map(|n| fold_box(folder, n))
}

fn fold_args<F: Folder + ?Sized>(folder: &mut F, args: &[Arg]) -> Vec<Arg> {
    args.iter()
        .map(|arg| Arg {
            name: arg.name.clone(),
            value: folder.fold_node(&arg.value),
        })
        .collect()
}

fn fold_exprs<F: Folder + ?Sized>(folder: &mut F, items: &[Node]) -> Vec<Node> {
    items.iter().map(|item| folder.fold_node(item)).collect()
}

fn fold_class<F: Folder + ?Sized>(folder: &mut F, class: &ClassDef) -> ClassDef {
    ClassDef {
        name: class.name.clone(),
        superclass: class.superclass.as_ref().map(|s| folder.fold_node(s)),
        members: fold_exprs(folder, &class.members),
        span: class.span.clone(),
    }
}

/// Rebuild `node` with every child folded.
pub(crate) fn fold_children<F: Folder + ?Sized>(folder: &mut F, node: &Node) -> Node {
    let kind = match &node.kind {
        NodeKind::Program(statements) => NodeKind::Program(folder.fold_block(statements)),
        NodeKind::Block(statements) => NodeKind::Block(folder.fold_block(statements)),
        NodeKind::Literal(_)
        | NodeKind::Identifier(_)
        | NodeKind::This
        | NodeKind::Break
        | NodeKind::Continue
        | NodeKind::Import { .. }
        | NodeKind::FromImport { .. } => node.kind.clone(),
        NodeKind::Binary { op, left, right } => NodeKind::Binary {
            op: *op,
            left: fold_box(folder, left),
            right: fold_box(folder, right),
        },
        NodeKind::Unary { op, operand } => NodeKind::Unary {
            op: *op,
            operand: fold_box(folder, operand),
        },
        NodeKind::Ternary {
            condition,
            then_value,
            else_value,
        } => NodeKind::Ternary {
            condition: fold_box(folder, condition),
            then_value: fold_box(folder, then_value),
            else_value: fold_box(folder, else_value),
        },
        NodeKind::Interpolated(parts) => NodeKind::Interpolated(fold_exprs(folder, parts)),
        NodeKind::List(items) => NodeKind::List(fold_exprs(folder, items)),
        NodeKind::Record(entries) => NodeKind::Record(
            entries
                .iter()
                .map(|(key, value)| (key.clone(), folder.fold_node(value)))
                .collect(),
        ),
        NodeKind::Property { object, name } => NodeKind::Property {
            object: fold_box(folder, object),
            name: name.clone(),
        },
        NodeKind::Index { object, index } => NodeKind::Index {
            object: fold_box(folder, object),
            index: fold_box(folder, index),
        },
        NodeKind::Call { callee, args } => NodeKind::Call {
            callee: fold_box(folder, callee),
            args: fold_args(folder, args),
        },
        NodeKind::New { class, args } => NodeKind::New {
            class: fold_box(folder, class),
            args: fold_args(folder, args),
        },
        NodeKind::SuperCall { method, args } => NodeKind::SuperCall {
            method: method.clone(),
            args: fold_args(folder, args),
        },
        NodeKind::Lambda(def) => NodeKind::Lambda(Arc::new(folder.fold_function(def))),
        NodeKind::FunctionDecl(def) => {
            NodeKind::FunctionDecl(Arc::new(folder.fold_function(def)))
        }
        NodeKind::MethodDecl { def, is_static } => NodeKind::MethodDecl {
            def: Arc::new(folder.fold_function(def)),
            is_static: *is_static,
        },
        NodeKind::ClassDecl(class) => NodeKind::ClassDecl(Arc::new(fold_class(folder, class))),
        NodeKind::FieldDecl(field) => NodeKind::FieldDecl(FieldDef {
            name: field.name.clone(),
            ty: field.ty.clone(),
            init: fold_opt(folder, field.init.as_deref()),
        }),
        NodeKind::Await(inner) => NodeKind::Await(fold_box(folder, inner)),
        NodeKind::Throw(inner) => NodeKind::Throw(fold_box(folder, inner)),
        NodeKind::Delete(inner) => NodeKind::Delete(fold_box(folder, inner)),
        NodeKind::With { items, body } => NodeKind::With {
            items: items
                .iter()
                .map(|item| WithItem {
                    manager: folder.fold_node(&item.manager),
                    binding: item.binding.clone(),
                })
                .collect(),
            body: folder.fold_block(body),
        },
        NodeKind::Return(value) => NodeKind::Return(fold_opt(folder, value.as_deref())),
        NodeKind::VarDecl {
            name,
            ty,
            init,
            constant,
        } => NodeKind::VarDecl {
            name: name.clone(),
            ty: ty.clone(),
            init: fold_opt(folder, init.as_deref()),
            constant: *constant,
        },
        NodeKind::Assign { target, value } => NodeKind::Assign {
            target: fold_box(folder, target),
            value: fold_box(folder, value),
        },
        NodeKind::If {
            condition,
            then_branch,
            else_branch,
        } => NodeKind::If {
            condition: fold_box(folder, condition),
            then_branch: folder.fold_block(then_branch),
            else_branch: else_branch.as_ref().map(|arm| folder.fold_block(arm)),
        },
        NodeKind::While { condition, body } => NodeKind::While {
            condition: fold_box(folder, condition),
            body: folder.fold_block(body),
        },
        NodeKind::For {
            init,
            condition,
            update,
            body,
        } => NodeKind::For {
            init: fold_opt(folder, init.as_deref()),
            condition: fold_opt(folder, condition.as_deref()),
            update: fold_opt(folder, update.as_deref()),
            body: folder.fold_block(body),
        },
        NodeKind::ForEach {
            binding,
            mode,
            iterable,
            body,
        } => NodeKind::ForEach {
            binding: binding.clone(),
            mode: *mode,
            iterable: fold_box(folder, iterable),
            body: folder.fold_block(body),
        },
        NodeKind::Try {
            body,
            catches,
            finally,
        } => NodeKind::Try {
            body: folder.fold_block(body),
            catches: catches
                .iter()
                .map(|clause| CatchClause {
                    binding: clause.binding.clone(),
                    types: clause.types.clone(),
                    body: folder.fold_block(&clause.body),
                    span: clause.span.clone(),
                })
                .collect(),
            finally: finally.as_ref().map(|block| folder.fold_block(block)),
        },
    };
    Node::new(kind, node.span.clone())
}
