//! Build configuration and the shared context every stage reads.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use strata_builtins::Builtins;
use strata_core::{LogSink, ModuleName, Stage, TracingLogSink};
use strata_interp::{
    CancellationScope, Capabilities, InterpretOptions, Interpreter, Intrinsic, Resolvers,
    TreeWalker,
};
use strata_parser::LanguageConfig;
use strata_registry::DispatchError;

use crate::backend::CodeGenerator;
use crate::imports::{ImportResolver, ModuleNameResolver};
use crate::snapshot::{NoopSnapshotSink, SnapshotSink};
use crate::trace::OrderingTrace;

// =========================================
// Configuration
// =========================================

/// Options for one build.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Whether the Run stage executes at all.
    pub may_run: bool,
    /// Advance independent modules on the rayon pool.
    pub parallel: bool,
    pub snapshots_enabled: bool,
    pub allow_top_level_await: bool,
    pub step_quota: u64,
    pub max_call_depth: usize,
    pub warn_about_unresolved_tasks: bool,
    pub language: LanguageConfig,
    /// No module starts this stage or any later one.
    pub stop_before: Option<Stage>,
    /// Per-module limits, applied together with `stop_before`.
    pub module_stop_before: FxHashMap<ModuleName, Stage>,
}

impl Default for StagingConfig {
    fn default() -> Self {
        let interp = InterpretOptions::default();
        Self {
            may_run: true,
            parallel: true,
            snapshots_enabled: false,
            allow_top_level_await: interp.allow_top_level_await,
            step_quota: interp.step_quota,
            max_call_depth: interp.max_call_depth,
            warn_about_unresolved_tasks: interp.warn_about_unresolved_tasks,
            language: LanguageConfig::default(),
            stop_before: None,
            module_stop_before: FxHashMap::default(),
        }
    }
}

impl StagingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_may_run(mut self, may_run: bool) -> Self {
        self.may_run = may_run;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_snapshots(mut self, enabled: bool) -> Self {
        self.snapshots_enabled = enabled;
        self
    }

    pub fn with_top_level_await(mut self, allow: bool) -> Self {
        self.allow_top_level_await = allow;
        self
    }

    pub fn with_step_quota(mut self, quota: u64) -> Self {
        self.step_quota = quota;
        self
    }

    pub fn with_max_call_depth(mut self, depth: usize) -> Self {
        self.max_call_depth = depth;
        self
    }

    pub fn with_unresolved_task_warnings(mut self, warn: bool) -> Self {
        self.warn_about_unresolved_tasks = warn;
        self
    }

    pub fn with_language(mut self, language: LanguageConfig) -> Self {
        self.language = language;
        self
    }

    pub fn with_stop_before(mut self, stage: Stage) -> Self {
        self.stop_before = Some(stage);
        self
    }

    pub fn with_module_stop_before(mut self, module: impl Into<ModuleName>, stage: Stage) -> Self {
        self.module_stop_before.insert(module.into(), stage);
        self
    }

    /// The first stage `module` may not start, if any.
    pub fn limit_for(&self, module: &ModuleName) -> Option<Stage> {
        let run_limit = (!self.may_run).then_some(Stage::Run);
        [self.stop_before, self.module_stop_before.get(module).copied(), run_limit]
            .into_iter()
            .flatten()
            .min()
    }

    /// Interpreter options for `stage`.
    pub fn interpret_options(&self, stage: Stage) -> InterpretOptions {
        InterpretOptions {
            allow_top_level_await: self.allow_top_level_await,
            step_quota: self.step_quota,
            max_call_depth: self.max_call_depth,
            warn_about_unresolved_tasks: self.warn_about_unresolved_tasks,
            // Macro-time bindings must not be consumed by later stages.
            durable_bindings: stage != Stage::FunctionMacro,
        }
    }
}

// =========================================
// Context
// =========================================

/// Everything stages share, built once per build and borrowed by every step.
pub struct StagingContext {
    pub config: StagingConfig,
    pub log: Arc<dyn LogSink>,
    pub snapshots: Arc<dyn SnapshotSink>,
    pub builtins: Arc<Builtins>,
    pub interpreter: Arc<dyn Interpreter>,
    pub capabilities: Capabilities,
    pub resolvers: Resolvers,
    pub generators: Vec<Arc<dyn CodeGenerator>>,
    pub import_resolver: Arc<dyn ImportResolver>,
    pub cancel: CancellationScope,
    pub trace: OrderingTrace,
}

impl StagingContext {
    /// A context with the standard builtins, the tree-walking interpreter and
    /// diagnostics forwarded to `tracing`.
    pub fn new(config: StagingConfig) -> Result<Self, DispatchError> {
        Ok(Self {
            config,
            log: Arc::new(TracingLogSink::new()),
            snapshots: Arc::new(NoopSnapshotSink),
            builtins: Arc::new(strata_builtins::standard()?),
            interpreter: Arc::new(TreeWalker),
            capabilities: Capabilities::new(),
            resolvers: Resolvers::new(),
            generators: Vec::new(),
            import_resolver: Arc::new(ModuleNameResolver),
            cancel: CancellationScope::new(),
            trace: OrderingTrace::new(),
        })
    }

    pub fn with_log(mut self, log: Arc<dyn LogSink>) -> Self {
        self.log = log;
        self
    }

    pub fn with_snapshots(mut self, snapshots: Arc<dyn SnapshotSink>) -> Self {
        self.snapshots = snapshots;
        self
    }

    pub fn with_interpreter(mut self, interpreter: Arc<dyn Interpreter>) -> Self {
        self.interpreter = interpreter;
        self
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_resolvers(mut self, resolvers: Resolvers) -> Self {
        self.resolvers = resolvers;
        self
    }

    pub fn with_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.generators.push(generator);
        self
    }

    pub fn with_import_resolver(mut self, resolver: Arc<dyn ImportResolver>) -> Self {
        self.import_resolver = resolver;
        self
    }

    /// Whether snapshots should be taken at all.
    pub fn snapshots_enabled(&self) -> bool {
        self.config.snapshots_enabled && self.snapshots.enabled()
    }

    /// Whether `text` names something that needs no declaration.
    pub fn is_global(&self, text: &str) -> bool {
        self.capabilities.contains(text)
            || Intrinsic::from_name(text).is_some()
            || strata_builtins::function_names(&self.builtins).any(|name| name == text)
    }
}
