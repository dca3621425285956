//! Hoisting Analyzer
//!
//! A pure tree-to-tree rewrite that runs once per program, before execution.
//! Inside every function, method and lambda body, an `if`/`else` whose two
//! arms declare the same variable with the same type is rewritten so that
//! the variable is declared once before the `if` and assigned in each arm:
//!
//! ```text
//! if c { var r = 1 } else { var r = 2 }     var r = null
//! print(r)                               => if c { r = 1 } else { r = 2 }
//!                                           print(r)
//! ```
//!
//! # Rules
//!
//! A name is hoisted when it is declared as a direct statement of both arms,
//! the declarations agree on type, and neither arm reads the name before its
//! own declaration. Conditionals are processed innermost first and the new
//! declaration is inserted into the same statement list as the `if`, so a
//! name never escapes the conditional's parent block. Module top level is
//! never hoisted and hoisting never crosses a function boundary.
//!
//! # Type agreement
//!
//! Annotated declarations agree when their annotations are equal.
//! Unannotated declarations agree when the static kind of both initializers
//! is known and identical (literal kinds, list and record literals,
//! interpolated strings, lambdas, comparisons, `new C`). Mixed or unknown
//! cases do not agree.
//!
//! # Diagnostics
//!
//! After rewriting, [`check_scopes`] reports reads of names that were left
//! inside closed arms: `E1001` (declared in only one arm), `E1002` (types
//! disagree) and `E1003` (read before declaration inside an arm).
//!
//! The rewrite is idempotent: running it on its own output changes nothing.

mod fold;
mod plan;
mod scope_check;

use corp_diagnostic::Diagnostic;
use corp_ir::{FunctionDef, Node};

use fold::{fold_function_def, Folder};

pub use plan::{HoistPlan, Rejection};
pub use scope_check::check_scopes;

/// Result of analyzing a whole program.
#[derive(Clone, Debug)]
pub struct HoistOutput {
    /// The rewritten program.
    pub program: Node,
    /// Scope diagnostics for the rewritten program.
    pub diagnostics: Vec<Diagnostic>,
    /// Number of conditionals that were rewritten.
    pub rewritten: usize,
}

impl HoistOutput {
    /// Whether any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics.iter().any(Diagnostic::is_error)
    }
}

/// Hoist every function, method and lambda body in `program`, then check
/// the result for references to branch-local names.
pub fn hoist_program(program: &Node) -> HoistOutput {
    let mut module = ModuleHoister::default();
    let program = module.fold_node(program);
    let diagnostics = check_scopes(&program);
    tracing::debug!(
        rewritten = module.rewritten,
        diagnostics = diagnostics.len(),
        "hoisting finished"
    );
    HoistOutput {
        program,
        diagnostics,
        rewritten: module.rewritten,
    }
}

/// Hoist a single function body, returning the new body and the plan for
/// every conditional that was rewritten (innermost first).
pub fn hoist_body(body: &[Node]) -> (Vec<Node>, Vec<HoistPlan>) {
    let mut hoister = BodyHoister::default();
    let body = hoister.fold_block(body);
    (body, hoister.plans)
}

/// Walks module top level without hoisting; hands each function to a
/// [`BodyHoister`].
#[derive(Default)]
struct ModuleHoister {
    rewritten: usize,
}

impl Folder for ModuleHoister {
    fn fold_function(&mut self, def: &FunctionDef) -> FunctionDef {
        let mut body = BodyHoister::default();
        let def = fold_function_def(&mut body, def);
        self.rewritten += body.plans.len();
        def
    }
}

/// Hoists every statement list it folds, including those of nested
/// functions.
#[derive(Default)]
struct BodyHoister {
    plans: Vec<HoistPlan>,
}

impl Folder for BodyHoister {
    fn fold_block(&mut self, statements: &[Node]) -> Vec<Node> {
        let mut out = Vec::with_capacity(statements.len());
        for statement in statements {
            let folded = self.fold_node(statement);
            match plan::plan_conditional(&folded) {
                Some(plan) => {
                    out.extend(plan.statements.iter().cloned());
                    self.plans.push(plan);
                }
                None => out.push(folded),
            }
        }
        out
    }
}
