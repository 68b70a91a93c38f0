//! Per-module pipeline state.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use rustc_hash::FxHashMap;
use strata_core::{
    BindingId, BindingIdAllocator, ModuleName, PartialResult, Span, Stage, TypeShape,
};
use strata_interp::Environment;
use strata_parser::Token;
use strata_parser::ast::{Block, Name};

use crate::outputs::{Exports, StageOutputs};

/// An `import` statement after the Import stage resolved its specifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ImportRecord {
    pub module: ModuleName,
    /// Imported names; their bindings were allocated by the Import stage.
    pub names: Vec<Name>,
    pub span: Span,
}

/// One module advancing through the stages.
///
/// Only the advancer mutates a module, and only one stage of it at a time.
#[derive(Debug)]
pub struct Module {
    name: ModuleName,
    sources: Vec<Arc<str>>,
    completed: Option<Stage>,
    failed: bool,

    // =========================================
    // Stage products
    // =========================================
    /// Token streams between Lex and Parse, one per source.
    pub(crate) tokens: Vec<Vec<Token>>,
    pub(crate) tree: Block,
    pub(crate) ids: BindingIdAllocator,
    pub(crate) env: Environment,
    pub(crate) imports: Vec<ImportRecord>,
    pub(crate) imports_bound: bool,
    /// Shapes of imported bindings, for the Type stage.
    pub(crate) import_shapes: FxHashMap<BindingId, TypeShape>,
    /// Imported type definitions by local name, for Define.
    pub(crate) import_types: FxHashMap<Arc<str>, TypeShape>,
    pub(crate) declared_types: BTreeMap<Arc<str>, TypeShape>,
    pub(crate) exports: Exports,
    pub(crate) outputs: Option<StageOutputs>,
    pub(crate) run_result: Option<PartialResult>,
}

impl Module {
    pub fn new(name: ModuleName, sources: Vec<Arc<str>>) -> Self {
        Self {
            name,
            sources,
            completed: None,
            failed: false,
            tokens: Vec::new(),
            tree: Block::default(),
            ids: BindingIdAllocator::new(),
            env: Environment::new(),
            imports: Vec::new(),
            imports_bound: false,
            import_shapes: FxHashMap::default(),
            import_types: FxHashMap::default(),
            declared_types: BTreeMap::new(),
            exports: Arc::from(Vec::new()),
            outputs: None,
            run_result: None,
        }
    }

    pub fn name(&self) -> &ModuleName {
        &self.name
    }

    pub fn sources(&self) -> &[Arc<str>] {
        &self.sources
    }

    /// The last stage this module completed.
    pub fn stage(&self) -> Option<Stage> {
        self.completed
    }

    /// The stage this module would process next.
    pub fn next_stage(&self) -> Option<Stage> {
        Stage::after_opt(self.completed)
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    pub fn has_completed(&self, stage: Stage) -> bool {
        self.completed.is_some_and(|done| done >= stage)
    }

    pub fn tree(&self) -> &Block {
        &self.tree
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn imports(&self) -> &[ImportRecord] {
        &self.imports
    }

    /// Modules this one imports from, without duplicates.
    pub fn dependencies(&self) -> BTreeSet<ModuleName> {
        self.imports.iter().map(|i| i.module.clone()).collect()
    }

    pub fn exports(&self) -> &Exports {
        &self.exports
    }

    pub fn declared_types(&self) -> &BTreeMap<Arc<str>, TypeShape> {
        &self.declared_types
    }

    /// Outputs of the most recent interpretive stage.
    pub fn outputs(&self) -> Option<&StageOutputs> {
        self.outputs.as_ref()
    }

    /// Result of the Run stage, once it ran.
    pub fn run_result(&self) -> Option<&PartialResult> {
        self.run_result.as_ref()
    }

    pub(crate) fn complete(&mut self, stage: Stage) {
        debug_assert_eq!(self.next_stage(), Some(stage));
        self.completed = Some(stage);
    }

    pub(crate) fn fail(&mut self) {
        self.failed = true;
    }
}
