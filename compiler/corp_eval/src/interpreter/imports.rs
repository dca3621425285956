//! `import` and `from ... import`.
//!
//! A module is resolved, hoisted, and run at most once per interpreter.
//! Its body runs in a fresh module environment whose parent is the root
//! environment, so modules see builtins but never the importer's globals.

use std::rc::Rc;

use tracing::{debug, trace, warn};

use corp_ir::{ImportItem, Name, Span};

use super::{ControlAction, EvalResult, Interpreter, ModuleSlot};
use crate::errors;
use crate::module::{ModuleObject, ResolvedModule};
use crate::{Environment, Value};

impl Interpreter {
    /// `import a.b` binds the module as `b`; `import a.b as c` binds `c`.
    pub(super) fn eval_import(
        &mut self,
        module: &Name,
        alias: Option<&Name>,
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let loaded = self.load_module(module, span)?;
        let local = match alias {
            Some(alias) => alias.clone(),
            None => Name::new(module.rsplit('.').next().unwrap_or(module)),
        };
        env.define(local, Value::Module(loaded));
        Ok(Value::Null)
    }

    pub(super) fn eval_from_import(
        &mut self,
        module: &Name,
        items: &[ImportItem],
        env: &Environment,
        span: &Span,
    ) -> EvalResult {
        let loaded = self.load_module(module, span)?;
        for item in items {
            let Some(value) = loaded.get(&item.name) else {
                return Err(self.raise(errors::missing_export(module, &item.name), span));
            };
            env.define(item.local_name().clone(), value);
        }
        Ok(Value::Null)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(module = %name))]
    fn load_module(&mut self, name: &Name, span: &Span) -> Result<Rc<ModuleObject>, ControlAction> {
        match self.modules.get(name) {
            Some(ModuleSlot::Loaded(module)) => {
                trace!("module cache hit");
                return Ok(Rc::clone(module));
            }
            Some(ModuleSlot::Loading) => return Err(self.raise(errors::circular_import(name), span)),
            None => {}
        }

        let resolved = match self.resolver.as_mut().map(|resolver| resolver.resolve(name)) {
            None => return Err(self.raise(errors::no_resolver(name), span)),
            Some(Err(err)) => {
                warn!(%err, "module resolution failed");
                return Err(self.raise(errors::unresolved_module(&err), span));
            }
            Some(Ok(resolved)) => resolved,
        };

        let env = Environment::module(&self.root);
        match resolved {
            ResolvedModule::Program(program) => {
                let hoisted = corp_hoist::hoist_program(&program);
                if hoisted.has_errors() {
                    return Err(ControlAction::Raise(
                        self.analysis_failure(&hoisted.diagnostics, &program),
                    ));
                }
                self.modules.insert(name.clone(), ModuleSlot::Loading);
                let frame_name = Name::new(format!("<module {name}>"));
                if let Err(action) = self.run_module_body(&hoisted.program, &env, frame_name) {
                    self.modules.remove(name);
                    return Err(action);
                }
            }
            ResolvedModule::Bindings(bindings) => {
                for (binding, value) in bindings {
                    env.define(binding, value);
                }
            }
        }

        let module = Rc::new(ModuleObject::new(name.clone(), env));
        self.modules
            .insert(name.clone(), ModuleSlot::Loaded(Rc::clone(&module)));
        debug!(exports = module.exported_bindings().len(), "module loaded");
        Ok(module)
    }
}
