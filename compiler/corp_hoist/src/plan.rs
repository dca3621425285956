//! Per-conditional hoisting decisions.

use corp_ir::visitor::{walk_node, Visitor};
use corp_ir::{BinaryOp, Literal, Name, Node, NodeKind, Span, TypeRef, UnaryOp};

/// Names promoted out of one conditional, plus the statements that replace
/// it (the new declarations followed by the rewritten `if`).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HoistPlan {
    pub names: Vec<(Name, Option<TypeRef>)>,
    pub statements: Vec<Node>,
}

/// Why a branch-declared name was not hoisted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Declared in one arm only, or the `if` has no `else`.
    NotInAllBranches,
    /// Both arms declare it, with different types.
    TypeMismatch { then_type: String, else_type: String },
    /// An arm reads it before declaring it.
    UsedBeforeDeclaration,
}

/// Static type of a declaration as far as hoisting is concerned.
#[derive(Clone, Debug, PartialEq, Eq)]
enum DeclType {
    Annotated(TypeRef),
    Inferred(String),
    Unknown,
}

impl DeclType {
    fn of(ty: Option<&TypeRef>, init: Option<&Node>) -> Self {
        match (ty, init) {
            (Some(ty), _) => DeclType::Annotated(ty.clone()),
            (None, None) => DeclType::Inferred("null".to_string()),
            (None, Some(init)) => infer_kind(init).map_or(DeclType::Unknown, DeclType::Inferred),
        }
    }

    fn agrees_with(&self, other: &DeclType) -> bool {
        match (self, other) {
            (DeclType::Annotated(a), DeclType::Annotated(b)) => a == b,
            (DeclType::Inferred(a), DeclType::Inferred(b)) => a == b,
            _ => false,
        }
    }

    fn annotation(&self) -> Option<TypeRef> {
        match self {
            DeclType::Annotated(ty) => Some(ty.clone()),
            DeclType::Inferred(_) | DeclType::Unknown => None,
        }
    }

    fn describe(&self) -> String {
        match self {
            DeclType::Annotated(ty) => ty.to_string(),
            DeclType::Inferred(kind) => kind.clone(),
            DeclType::Unknown => "<unknown>".to_string(),
        }
    }
}

/// Kind of an unannotated initializer, when it is statically obvious.
fn infer_kind(init: &Node) -> Option<String> {
    let kind = match &init.kind {
        NodeKind::Literal(literal) => literal.kind_name().to_string(),
        NodeKind::List(_) => "list".to_string(),
        NodeKind::Record(_) => "record".to_string(),
        NodeKind::Interpolated(_) => "str".to_string(),
        NodeKind::Lambda(_) => "function".to_string(),
        NodeKind::New { class, .. } => match &class.kind {
            NodeKind::Identifier(name) => name.to_string(),
            _ => return None,
        },
        NodeKind::Unary {
            op: UnaryOp::Not, ..
        } => "bool".to_string(),
        NodeKind::Unary {
            op: UnaryOp::Neg,
            operand,
        } => match &operand.kind {
            NodeKind::Literal(lit @ (Literal::Int(_) | Literal::Float(_))) => {
                lit.kind_name().to_string()
            }
            _ => return None,
        },
        NodeKind::Binary { op, .. }
            if matches!(
                op,
                BinaryOp::Eq
                    | BinaryOp::NotEq
                    | BinaryOp::Lt
                    | BinaryOp::LtEq
                    | BinaryOp::Gt
                    | BinaryOp::GtEq
                    | BinaryOp::And
                    | BinaryOp::Or
            ) =>
        {
            "bool".to_string()
        }
        _ => return None,
    };
    Some(kind)
}

/// One name's declarations inside one arm.
struct ArmDecl<'a> {
    name: &'a Name,
    /// Span of the first declaring statement.
    span: &'a Span,
    types: Vec<DeclType>,
    read_early: bool,
}

/// Direct declarations of an arm, in order of first appearance.
fn arm_decls(arm: &[Node]) -> Vec<ArmDecl<'_>> {
    let mut decls: Vec<ArmDecl<'_>> = Vec::new();
    for (index, statement) in arm.iter().enumerate() {
        let NodeKind::VarDecl { name, ty, init, .. } = &statement.kind else {
            continue;
        };
        let ty = match (ty, init.as_deref()) {
            (None, Some(init)) if is_null(init) => arm
                .get(index + 1)
                .and_then(|next| assigned_type(std::slice::from_ref(next), name))
                .unwrap_or_else(|| DeclType::Inferred("null".to_string())),
            _ => DeclType::of(ty.as_ref(), init.as_deref()),
        };
        if let Some(existing) = decls.iter_mut().find(|d| d.name == name) {
            existing.types.push(ty);
            continue;
        }
        let read_early = arm[..index].iter().any(|s| reads_name(s, name))
            || init.as_deref().is_some_and(|init| reads_name(init, name));
        decls.push(ArmDecl {
            name,
            span: &statement.span,
            types: vec![ty],
            read_early,
        });
    }
    decls
}

fn is_null(node: &Node) -> bool {
    matches!(node.kind, NodeKind::Literal(Literal::Null))
}

/// Type of the value `statements` definitely leave in `name`.
///
/// A `var r = null` directly followed by an `if`/`else` that assigns `r` on
/// every path is what an already-hoisted inner conditional looks like; its
/// type is the one the assignments agree on. Later statements win; an
/// assignment on only some paths makes the type unknown.
fn assigned_type(statements: &[Node], name: &Name) -> Option<DeclType> {
    for statement in statements.iter().rev() {
        match &statement.kind {
            NodeKind::Assign { target, value } => {
                if matches!(&target.kind, NodeKind::Identifier(target) if target == name) {
                    return Some(DeclType::of(None, Some(value)));
                }
            }
            NodeKind::If {
                then_branch,
                else_branch,
                ..
            } => {
                let then_type = assigned_type(then_branch, name);
                let else_type = else_branch.as_deref().and_then(|arm| assigned_type(arm, name));
                match (then_type, else_type) {
                    (Some(a), Some(b)) if a.agrees_with(&b) => return Some(a),
                    (None, None) => {}
                    _ => return Some(DeclType::Unknown),
                }
            }
            _ => {}
        }
    }
    None
}

/// Outcome of comparing the arms of one conditional.
pub(crate) struct ArmAnalysis<'a> {
    pub hoistable: Vec<(Name, Option<TypeRef>)>,
    /// Rejected names with the span of their first declaration.
    pub rejected: Vec<(Name, Rejection, &'a Span)>,
}

/// Decide, for every name declared directly in either arm, whether it can be
/// hoisted.
pub(crate) fn analyze_arms<'a>(then_branch: &'a [Node], else_branch: Option<&'a [Node]>) -> ArmAnalysis<'a> {
    let then_decls = arm_decls(then_branch);
    let else_decls = else_branch.map(arm_decls).unwrap_or_default();
    let mut analysis = ArmAnalysis {
        hoistable: Vec::new(),
        rejected: Vec::new(),
    };

    for decl in &then_decls {
        let Some(other) = else_decls.iter().find(|d| d.name == decl.name) else {
            analysis
                .rejected
                .push((decl.name.clone(), Rejection::NotInAllBranches, decl.span));
            continue;
        };
        if decl.read_early || other.read_early {
            analysis.rejected.push((
                decl.name.clone(),
                Rejection::UsedBeforeDeclaration,
                decl.span,
            ));
            continue;
        }
        let first = &decl.types[0];
        let mismatch = decl
            .types
            .iter()
            .chain(&other.types)
            .find(|ty| !first.agrees_with(ty));
        if let Some(other_type) = mismatch {
            analysis.rejected.push((
                decl.name.clone(),
                Rejection::TypeMismatch {
                    then_type: first.describe(),
                    else_type: other_type.describe(),
                },
                decl.span,
            ));
            continue;
        }
        analysis.hoistable.push((decl.name.clone(), first.annotation()));
    }

    for decl in &else_decls {
        if !then_decls.iter().any(|d| d.name == decl.name) {
            analysis
                .rejected
                .push((decl.name.clone(), Rejection::NotInAllBranches, decl.span));
        }
    }
    analysis
}

/// Build the plan for `node` if it is an `if`/`else` with hoistable names.
pub(crate) fn plan_conditional(node: &Node) -> Option<HoistPlan> {
    let NodeKind::If {
        condition,
        then_branch,
        else_branch: Some(else_branch),
    } = &node.kind
    else {
        return None;
    };
    let analysis = analyze_arms(then_branch, Some(else_branch));
    if analysis.hoistable.is_empty() {
        return None;
    }

    let mut statements = Vec::with_capacity(analysis.hoistable.len() + 1);
    for (name, ty) in &analysis.hoistable {
        let span = then_branch
            .iter()
            .find(|s| s.declared_name() == Some(name))
            .map_or_else(|| node.span.clone(), |s| s.span.clone());
        tracing::trace!(name = %name, at = ?span, "hoisting branch declaration");
        statements.push(Node::new(
            NodeKind::VarDecl {
                name: name.clone(),
                ty: ty.clone(),
                init: Some(Box::new(Node::new(
                    NodeKind::Literal(Literal::Null),
                    span.clone(),
                ))),
                constant: false,
            },
            span,
        ));
    }

    let names: Vec<&Name> = analysis.hoistable.iter().map(|(name, _)| name).collect();
    statements.push(Node::new(
        NodeKind::If {
            condition: condition.clone(),
            then_branch: rewrite_arm(then_branch, &names),
            else_branch: Some(rewrite_arm(else_branch, &names)),
        },
        node.span.clone(),
    ));

    Some(HoistPlan {
        names: analysis.hoistable,
        statements,
    })
}

/// Replace declarations of `names` with assignments.
fn rewrite_arm(arm: &[Node], names: &[&Name]) -> Vec<Node> {
    arm.iter()
        .map(|statement| match &statement.kind {
            NodeKind::VarDecl { name, init, .. } if names.contains(&name) => {
                let value = init.clone().unwrap_or_else(|| {
                    Box::new(Node::new(
                        NodeKind::Literal(Literal::Null),
                        statement.span.clone(),
                    ))
                });
                Node::new(
                    NodeKind::Assign {
                        target: Box::new(Node::new(
                            NodeKind::Identifier(name.clone()),
                            statement.span.clone(),
                        )),
                        value,
                    },
                    statement.span.clone(),
                )
            }
            _ => statement.clone(),
        })
        .collect()
}

/// Whether `node` mentions `name` anywhere, nested functions included.
///
/// Shadowing is ignored, which can only make the answer more conservative.
pub(crate) fn reads_name(node: &Node, name: &Name) -> bool {
    struct Reads<'n> {
        name: &'n Name,
        found: bool,
    }

    impl<'ast> Visitor<'ast> for Reads<'_> {
        fn visit_node(&mut self, node: &'ast Node) {
            if self.found {
                return;
            }
            if let NodeKind::Identifier(ident) = &node.kind {
                if ident == self.name {
                    self.found = true;
                    return;
                }
            }
            walk_node(self, node);
        }
    }

    let mut reads = Reads { name, found: false };
    reads.visit_node(node);
    reads.found
}
