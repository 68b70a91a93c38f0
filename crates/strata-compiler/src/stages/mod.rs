//! Per-stage processing.
//!
//! - `lex`, `parse`: source text to tree
//! - `import`: specifiers to dependencies; binds exports once the gate opens
//! - `disambiguate`: `x = e`, `fn` and `type` into explicit declarations
//! - `syntax_macro`: name resolution, then hoisting
//! - `define`: named types and `match` desugaring
//! - `types`: shape inference and definite type errors
//! - `function_macro`, `export`, `run`: interpretive stages
//! - `query`: lint-style warnings
//!
//! GenerateCode is a barrier across modules and is run by the advancer.

mod define;
mod disambiguate;
mod export;
mod function_macro;
mod import;
mod lex;
mod parse;
mod query;
mod run;
mod syntax_macro;
mod types;

use rustc_hash::FxHashMap;
use strata_core::{ModuleName, Stage};

use crate::config::StagingContext;
use crate::log::ModuleLog;
use crate::module::Module;
use crate::outputs::Exports;
use crate::runner::interpret;

/// What one stage step may read besides its own module.
pub(crate) struct StepContext<'a> {
    pub cx: &'a StagingContext,
    pub log: &'a ModuleLog<'a>,
    /// Every module in the advancing set.
    pub modules: &'a [ModuleName],
    /// Exports of this module's dependencies, once they completed Export.
    pub dependency_exports: &'a FxHashMap<ModuleName, Exports>,
}

/// Process `stage` for `module`. Failures are logged through `step.log`.
pub(crate) fn process(stage: Stage, module: &mut Module, step: &StepContext<'_>) {
    match stage {
        Stage::Lex => lex::run(module, step),
        Stage::Parse => parse::run(module, step),
        Stage::Import => import::run(module, step),
        Stage::Disambiguate => {
            import::bind(module, step);
            disambiguate::run(module);
        }
        Stage::SyntaxMacro => syntax_macro::run(module, step),
        Stage::Define => define::run(module, step),
        Stage::Type => types::run(module, step),
        Stage::FunctionMacro => interpret::<function_macro::FunctionMacro>(module, step),
        Stage::Export => interpret::<export::Publish>(module, step),
        Stage::Query => query::run(module, step),
        // Run by the advancer for every ready module at once.
        Stage::GenerateCode => {}
        Stage::Run => interpret::<run::Run>(module, step),
    }
}

#[cfg(test)]
pub(crate) mod testing {
    //! Drive single modules through stages without the advancer.

    use std::sync::Arc;

    use rustc_hash::FxHashMap;
    use strata_core::{Diagnostics, ModuleName, Stage};

    use super::{StepContext, process};
    use crate::config::{StagingConfig, StagingContext};
    use crate::log::ModuleLog;
    use crate::module::Module;

    pub struct Bench {
        pub cx: StagingContext,
        pub diagnostics: Arc<Diagnostics>,
    }

    impl Bench {
        pub fn new() -> Self {
            Self::with_context(|cx| cx)
        }

        pub fn with_context(configure: impl FnOnce(StagingContext) -> StagingContext) -> Self {
            let diagnostics = Arc::new(Diagnostics::new());
            let cx = StagingContext::new(StagingConfig::new().with_parallel(false))
                .unwrap()
                .with_log(diagnostics.clone());
            Self {
                cx: configure(cx),
                diagnostics,
            }
        }

        pub fn module(&self, source: &str) -> Module {
            Module::new(ModuleName::from("test"), vec![Arc::from(source)])
        }

        /// Advance `module` through `stage` inclusive; returns whether every step succeeded.
        pub fn advance_through(&self, module: &mut Module, stage: Stage) -> bool {
            let modules = [module.name().clone()];
            let exports = FxHashMap::default();
            while let Some(next) = module.next_stage().filter(|next| *next <= stage) {
                let log = ModuleLog::new(module.name().clone(), self.cx.log.as_ref());
                let step = StepContext {
                    cx: &self.cx,
                    log: &log,
                    modules: &modules,
                    dependency_exports: &exports,
                };
                process(next, module, &step);
                if log.error_count() > 0 || module.is_failed() {
                    module.fail();
                    return false;
                }
                module.complete(next);
            }
            true
        }

        pub fn errors(&self) -> Vec<String> {
            self.diagnostics
                .errors()
                .into_iter()
                .map(|d| d.message)
                .collect()
        }

        pub fn warnings(&self) -> Vec<String> {
            self.diagnostics
                .warnings()
                .into_iter()
                .map(|d| d.message)
                .collect()
        }
    }
}
