//! Advancing a set of modules through the stages.
//!
//! Work proceeds in rounds. Each round every module that may advance takes
//! exactly one stage step; independent modules step in parallel. A module
//! may advance when:
//!
//! - it has not failed and has not reached its stop limit
//! - before its imports are bound (first step after Import), every
//!   dependency has completed Export
//! - before Run, every dependency has completed Run or stopped advancing
//!
//! GenerateCode is a barrier: it runs once, for every module still
//! advancing, when all of them are waiting on it.
//!
//! When nothing can advance while modules are still waiting, the build is
//! stuck: either the pending modules import each other in a cycle or one of
//! them waits on a dependency that stopped early. Both are fatal.

use std::sync::Arc;

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use strata_core::{AdvanceError, Diagnostic, Level, ModuleName, Stage};
use strata_registry::ModuleGraph;

use crate::backend::{GenerateError, GeneratedFile};
use crate::config::StagingContext;
use crate::log::ModuleLog;
use crate::module::Module;
use crate::outputs::Exports;
use crate::stages::{StepContext, process};
use crate::trace::{TraceEvent, TraceKind};

/// Where one module ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleStatus {
    pub name: ModuleName,
    /// Last completed stage.
    pub stage: Option<Stage>,
    pub ok: bool,
}

/// Result of [`ModuleAdvancer::advance_all`].
#[derive(Debug, Clone, Default)]
pub struct AdvanceSummary {
    /// In the order modules were added.
    pub modules: Vec<ModuleStatus>,
    pub trace: Vec<TraceEvent>,
    pub generated: Vec<GeneratedFile>,
}

impl AdvanceSummary {
    pub fn module(&self, name: &str) -> Option<&ModuleStatus> {
        self.modules.iter().find(|m| m.name.as_str() == name)
    }

    pub fn is_ok(&self) -> bool {
        self.modules.iter().all(|m| m.ok)
    }
}

pub struct ModuleAdvancer<'cx> {
    cx: &'cx StagingContext,
    modules: Vec<Module>,
    index: FxHashMap<ModuleName, usize>,
    graph: ModuleGraph,
    /// Modules whose import edges are in `graph`.
    linked: FxHashSet<ModuleName>,
    generated: Vec<GeneratedFile>,
}

impl<'cx> ModuleAdvancer<'cx> {
    pub fn new(cx: &'cx StagingContext) -> Self {
        Self {
            cx,
            modules: Vec::new(),
            index: FxHashMap::default(),
            graph: ModuleGraph::new(),
            linked: FxHashSet::default(),
            generated: Vec::new(),
        }
    }

    /// Add a module made of `sources`, which are parsed as one.
    pub fn add_module<S>(
        &mut self,
        name: impl Into<ModuleName>,
        sources: impl IntoIterator<Item = S>,
    ) -> Result<&Module, AdvanceError>
    where
        S: Into<Arc<str>>,
    {
        let name = name.into();
        if self.index.contains_key(&name) {
            return Err(AdvanceError::DuplicateModule(name));
        }
        self.graph.add_module(&name);
        self.index.insert(name.clone(), self.modules.len());
        self.modules
            .push(Module::new(name, sources.into_iter().map(Into::into).collect()));
        Ok(&self.modules[self.modules.len() - 1])
    }

    pub fn module(&self, name: &str) -> Option<&Module> {
        self.index
            .get(&ModuleName::from(name))
            .map(|&i| &self.modules[i])
    }

    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    pub fn graph(&self) -> &ModuleGraph {
        &self.graph
    }

    /// Exporters before their importers, as far as imports are known.
    pub fn modules_in_dependency_order(&self) -> Vec<&Module> {
        self.graph
            .dependency_order()
            .iter()
            .filter_map(|name| self.index.get(name).map(|&i| &self.modules[i]))
            .collect()
    }

    /// Advance every module as far as it can go.
    ///
    /// Stage failures are logged and stop only the failing module. A
    /// dependency cycle or a permanently blocked module is fatal.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn advance_all(&mut self) -> Result<AdvanceSummary, AdvanceError> {
        let _span = tracing::info_span!("advance", modules = self.modules.len()).entered();
        loop {
            let plan: Vec<Option<Stage>> = self.modules.iter().map(|m| self.next_step(m)).collect();
            if plan.iter().any(Option::is_some) {
                self.round(&plan);
                self.link();
                continue;
            }

            let pending: Vec<usize> = (0..self.modules.len())
                .filter(|&i| !self.is_done(&self.modules[i]))
                .collect();
            if pending.is_empty() {
                break;
            }
            if pending
                .iter()
                .all(|&i| self.modules[i].next_stage() == Some(Stage::GenerateCode))
            {
                self.generate(&pending);
                continue;
            }

            let error = self.stalled(&pending);
            let mut fatal = Diagnostic::new(Level::Fatal, error.to_string());
            if let AdvanceError::PermanentlyBlocked { module, .. } = &error {
                fatal = fatal.in_module(module.clone());
            }
            self.cx.log.log(fatal);
            tracing::error!(%error, "advancement stalled");
            return Err(error);
        }
        Ok(self.summary())
    }

    pub fn summary(&self) -> AdvanceSummary {
        AdvanceSummary {
            modules: self
                .modules
                .iter()
                .map(|m| ModuleStatus {
                    name: m.name().clone(),
                    stage: m.stage(),
                    ok: !m.is_failed(),
                })
                .collect(),
            trace: self.cx.trace.events(),
            generated: self.generated.clone(),
        }
    }

    // =========================================
    // Planning
    // =========================================

    fn find(&self, name: &ModuleName) -> Option<&Module> {
        self.index.get(name).map(|&i| &self.modules[i])
    }

    /// Whether `module` will never take another step.
    fn is_done(&self, module: &Module) -> bool {
        let Some(next) = module.next_stage() else {
            return true;
        };
        module.is_failed()
            || self
                .cx
                .config
                .limit_for(module.name())
                .is_some_and(|limit| next >= limit)
    }

    /// The stage `module` takes this round, if it may take one.
    fn next_step(&self, module: &Module) -> Option<Stage> {
        if self.is_done(module) {
            return None;
        }
        let next = module.next_stage()?;
        let ready = match next {
            Stage::GenerateCode => false,
            Stage::Run => module.dependencies().iter().all(|dep| {
                self.find(dep)
                    .is_none_or(|dep| dep.has_completed(Stage::Run) || self.is_done(dep))
            }),
            _ if next.consumes_imports() && !module.imports_bound => {
                module.dependencies().iter().all(|dep| {
                    self.find(dep)
                        .is_some_and(|dep| dep.has_completed(Stage::Export))
                })
            }
            _ => true,
        };
        if !ready {
            tracing::trace!(module = %module.name(), stage = %next, "waiting on dependencies");
        }
        ready.then_some(next)
    }

    // =========================================
    // Stepping
    // =========================================

    fn round(&mut self, plan: &[Option<Stage>]) {
        let names: Vec<ModuleName> = self.modules.iter().map(|m| m.name().clone()).collect();
        let exports: FxHashMap<ModuleName, Exports> = self
            .modules
            .iter()
            .filter(|m| m.has_completed(Stage::Export))
            .map(|m| (m.name().clone(), m.exports().clone()))
            .collect();
        let cx = self.cx;

        let step = |(module, stage): (&mut Module, &Option<Stage>)| {
            if let Some(stage) = *stage {
                advance_one(cx, module, stage, &names, &exports);
            }
        };
        if cx.config.parallel {
            self.modules.par_iter_mut().zip(plan.par_iter()).for_each(step);
        } else {
            self.modules.iter_mut().zip(plan.iter()).for_each(step);
        }
    }

    /// Record import edges of modules that finished Import.
    fn link(&mut self) {
        for module in &self.modules {
            if !module.has_completed(Stage::Import) || self.linked.contains(module.name()) {
                continue;
            }
            for dependency in module.dependencies() {
                self.graph.add_dependency(module.name(), &dependency);
            }
            self.linked.insert(module.name().clone());
        }
    }

    /// Run every code generator over the modules still advancing.
    fn generate(&mut self, pending: &[usize]) {
        let cx = self.cx;
        for &i in pending {
            cx.trace
                .record(self.modules[i].name(), Stage::GenerateCode, TraceKind::StageStarted);
        }

        let mut files = Vec::new();
        let mut failed: FxHashSet<ModuleName> = FxHashSet::default();
        {
            let modules: Vec<&Module> = pending.iter().map(|&i| &self.modules[i]).collect();
            for generator in &cx.generators {
                let _span =
                    tracing::debug_span!("generate", backend = generator.backend_id()).entered();
                match generator.generate(&modules) {
                    Ok(generated) => files.extend(generated),
                    Err(error) => {
                        let GenerateError::Failed { module, .. } = &error;
                        cx.log
                            .log(Diagnostic::error(error.to_string()).in_module(module.clone()));
                        failed.insert(module.clone());
                    }
                }
            }
        }
        tracing::debug!(files = files.len(), "generated code");
        self.generated.extend(files);

        for &i in pending {
            let module = &mut self.modules[i];
            if failed.contains(module.name()) {
                module.fail();
                cx.trace
                    .record(module.name(), Stage::GenerateCode, TraceKind::StageFailed);
            } else {
                module.complete(Stage::GenerateCode);
                cx.trace
                    .record(module.name(), Stage::GenerateCode, TraceKind::StageCompleted);
            }
        }
    }

    // =========================================
    // Stalls
    // =========================================

    fn stalled(&self, pending: &[usize]) -> AdvanceError {
        let waiting: FxHashSet<&ModuleName> =
            pending.iter().map(|&i| self.modules[i].name()).collect();
        if let Some(cycle) = self.graph.find_cycle(|m| waiting.contains(m)) {
            return AdvanceError::DependencyCycle { cycle };
        }

        for &i in pending {
            let module = &self.modules[i];
            let gate = match module.next_stage() {
                Some(Stage::Run) => Stage::Run,
                _ => Stage::Export,
            };
            let blocker = module.dependencies().into_iter().find(|dep| {
                self.find(dep)
                    .is_none_or(|dep| self.is_done(dep) && !dep.has_completed(gate))
            });
            if let Some(dependency) = blocker {
                return AdvanceError::PermanentlyBlocked {
                    module: module.name().clone(),
                    dependency,
                    gate,
                };
            }
        }

        // Every pending module waits on another pending one without a cycle
        // among them, which the gates rule out; report the first.
        let module = self.modules[pending[0]].name().clone();
        let dependency = self.modules[pending[0]]
            .dependencies()
            .into_iter()
            .next()
            .unwrap_or_else(|| module.clone());
        AdvanceError::PermanentlyBlocked {
            module,
            dependency,
            gate: Stage::Export,
        }
    }
}

fn advance_one(
    cx: &StagingContext,
    module: &mut Module,
    stage: Stage,
    names: &[ModuleName],
    exports: &FxHashMap<ModuleName, Exports>,
) {
    let name = module.name().clone();
    let _span = tracing::debug_span!("stage", module = %name, %stage).entered();
    cx.trace.record(&name, stage, TraceKind::StageStarted);

    let log = ModuleLog::new(name.clone(), cx.log.as_ref());
    let step = StepContext {
        cx,
        log: &log,
        modules: names,
        dependency_exports: exports,
    };
    process(stage, module, &step);

    if log.error_count() == 0 && !module.is_failed() {
        module.complete(stage);
        cx.trace.record(&name, stage, TraceKind::StageCompleted);
        tracing::debug!("stage completed");
    } else {
        module.fail();
        cx.trace.record(&name, stage, TraceKind::StageFailed);
        tracing::debug!(errors = log.error_count(), "stage failed");
    }
}
