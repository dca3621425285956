//! Post-hoist scope check.
//!
//! Walks the rewritten program with a lexical scope stack. When a
//! conditional closes inside a function, every name its arms declared that
//! was not hoisted is remembered together with the reason it was left
//! behind. A later read of such a name that no enclosing scope declares is
//! reported.

use corp_diagnostic::{Diagnostic, ErrorCode};
use corp_ir::visitor::{walk_block, walk_class, walk_node, Visitor};
use corp_ir::{CatchClause, FunctionDef, Name, Node, NodeKind, Span};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::plan::{analyze_arms, Rejection};

/// Report reads of branch-local names that escaped their conditional.
pub fn check_scopes(program: &Node) -> Vec<Diagnostic> {
    let mut checker = ScopeChecker {
        scopes: vec![Scope::default()],
        function_depth: 0,
        diagnostics: Vec::new(),
    };
    checker.visit_node(program);
    checker.diagnostics
}

#[derive(Clone)]
struct LeftBehind {
    reason: Rejection,
    declared_at: Span,
}

#[derive(Default)]
struct Scope {
    declared: FxHashSet<Name>,
    left_behind: FxHashMap<Name, LeftBehind>,
    function_boundary: bool,
}

struct ScopeChecker {
    scopes: Vec<Scope>,
    function_depth: usize,
    diagnostics: Vec<Diagnostic>,
}

impl ScopeChecker {
    fn push(&mut self, function_boundary: bool) {
        self.scopes.push(Scope {
            function_boundary,
            ..Scope::default()
        });
    }

    /// Pop a scope; branch-local names it collected stay visible to the
    /// enclosing block of the same function.
    fn pop(&mut self) {
        let Some(scope) = self.scopes.pop() else {
            return;
        };
        if scope.function_boundary {
            return;
        }
        if let Some(parent) = self.scopes.last_mut() {
            for (name, entry) in scope.left_behind {
                parent.left_behind.entry(name).or_insert(entry);
            }
        }
    }

    fn declare(&mut self, name: &Name) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.left_behind.remove(name);
            scope.declared.insert(name.clone());
        }
    }

    fn is_visible(&self, name: &Name) -> bool {
        self.scopes.iter().any(|scope| scope.declared.contains(name))
    }

    fn left_behind(&self, name: &Name) -> Option<&LeftBehind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.left_behind.get(name))
    }

    fn check_read(&mut self, name: &Name, span: &Span) {
        if self.function_depth == 0 || self.is_visible(name) {
            return;
        }
        if let Some(entry) = self.left_behind(name).cloned() {
            self.diagnostics.push(report(name, span, &entry));
        }
    }

    fn scoped_block(&mut self, statements: &[Node]) {
        self.push(false);
        walk_block(self, statements);
        self.pop();
    }

    /// Remember names an `if` left inside its arms.
    fn close_conditional(&mut self, then_branch: &[Node], else_branch: Option<&[Node]>) {
        if self.function_depth == 0 {
            return;
        }
        let analysis = analyze_arms(then_branch, else_branch);
        for (name, reason, span) in analysis.rejected {
            if self.is_visible(&name) {
                continue;
            }
            if let Some(scope) = self.scopes.last_mut() {
                scope.left_behind.entry(name).or_insert(LeftBehind {
                    reason,
                    declared_at: span.clone(),
                });
            }
        }
    }
}

impl<'ast> Visitor<'ast> for ScopeChecker {
    fn visit_node(&mut self, node: &'ast Node) {
        match &node.kind {
            NodeKind::Identifier(name) => self.check_read(name, &node.span),
            NodeKind::VarDecl { name, init, .. } => {
                if let Some(init) = init {
                    self.visit_node(init);
                }
                self.declare(name);
            }
            NodeKind::FunctionDecl(def) => {
                self.declare(&def.name);
                self.visit_function(def);
            }
            NodeKind::ClassDecl(class) => {
                self.declare(&class.name);
                walk_class(self, class);
            }
            NodeKind::Import { module, alias } => {
                self.declare(alias.as_ref().unwrap_or(module));
            }
            NodeKind::FromImport { items, .. } => {
                for item in items {
                    self.declare(item.local_name());
                }
            }
            NodeKind::Block(statements) => self.scoped_block(statements),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.visit_node(condition);
                self.scoped_block(then_branch);
                if let Some(else_branch) = else_branch {
                    self.scoped_block(else_branch);
                }
                self.close_conditional(then_branch, else_branch.as_deref());
            }
            NodeKind::While { condition, body } => {
                self.visit_node(condition);
                self.scoped_block(body);
            }
            NodeKind::For {
                init,
                condition,
                update,
                body,
            } => {
                self.push(false);
                for part in [init, condition, update].into_iter().flatten() {
                    self.visit_node(part);
                }
                walk_block(self, body);
                self.pop();
            }
            NodeKind::ForEach {
                binding,
                iterable,
                body,
                ..
            } => {
                self.visit_node(iterable);
                self.push(false);
                self.declare(binding);
                walk_block(self, body);
                self.pop();
            }
            NodeKind::With { items, body } => {
                self.push(false);
                for item in items {
                    self.visit_node(&item.manager);
                    if let Some(binding) = &item.binding {
                        self.declare(binding);
                    }
                }
                walk_block(self, body);
                self.pop();
            }
            NodeKind::Try {
                body,
                catches,
                finally,
            } => {
                self.scoped_block(body);
                for clause in catches {
                    self.visit_catch(clause);
                }
                if let Some(finally) = finally {
                    self.scoped_block(finally);
                }
            }
            _ => walk_node(self, node),
        }
    }

    fn visit_function(&mut self, function: &'ast FunctionDef) {
        self.push(true);
        self.function_depth += 1;
        for param in &function.params {
            if let Some(default) = &param.default {
                self.visit_node(default);
            }
            self.declare(&param.name);
        }
        walk_block(self, &function.body);
        self.function_depth -= 1;
        self.pop();
    }

    fn visit_catch(&mut self, clause: &'ast CatchClause) {
        self.push(false);
        if let Some(binding) = &clause.binding {
            self.declare(binding);
        }
        walk_block(self, &clause.body);
        self.pop();
    }
}

#[cold]
fn report(name: &Name, span: &Span, entry: &LeftBehind) -> Diagnostic {
    let diag = match &entry.reason {
        Rejection::NotInAllBranches => Diagnostic::error(ErrorCode::E1001)
            .with_message(format!("Variable not declared in all branches: `{name}`"))
            .with_note(format!(
                "`{name}` is declared inside a conditional that does not declare it on every path"
            ))
            .with_suggestion(format!(
                "declare `{name}` in every branch, or once before the `if`"
            )),
        Rejection::TypeMismatch {
            then_type,
            else_type,
        } => Diagnostic::error(ErrorCode::E1002)
            .with_message(format!("Type mismatch in hoisting: `{name}`"))
            .with_note(format!(
                "the branches declare `{name}` as `{then_type}` and `{else_type}`"
            ))
            .with_suggestion(format!("give `{name}` the same type in both branches")),
        Rejection::UsedBeforeDeclaration => Diagnostic::error(ErrorCode::E1003)
            .with_message(format!("Reference to undefined variable: `{name}`"))
            .with_note(format!(
                "a branch reads `{name}` before declaring it, so the declaration cannot be hoisted"
            ))
            .with_suggestion(format!("move the declaration of `{name}` above its first use")),
    };
    diag.with_label(span.clone(), format!("`{name}` is not in scope here"))
        .with_secondary_label(entry.declared_at.clone(), "declared inside this branch")
}
