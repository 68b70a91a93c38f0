//! The interpreter contract used by interpretive stages.

use strata_builtins::Builtins;
use strata_core::{LogSink, PartialResult, ReadinessClock};
use strata_parser::ast::Block;

use crate::cancel::CancellationScope;
use crate::environment::Environment;
use crate::host::{Capabilities, Resolvers};
use crate::promises::Promises;

/// How much of the tree to evaluate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mode {
    /// Evaluate everything, performing host effects.
    Full,
    /// Evaluate what is knowable without effects and fold `comptime(...)`
    /// calls into value leaves; everything else yields `NotYet`.
    Partial,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterpretOptions {
    /// Allow `await` among the top-level statements.
    pub allow_top_level_await: bool,
    /// Evaluation steps allowed per interpretation.
    pub step_quota: u64,
    /// Nested script function calls allowed before failing.
    pub max_call_depth: usize,
    /// Warn about tasks still parked when an owned registry is drained.
    pub warn_about_unresolved_tasks: bool,
    /// Whether bindings made by this interpretation outlive the current
    /// readiness checkpoint.
    pub durable_bindings: bool,
}

impl Default for InterpretOptions {
    fn default() -> Self {
        Self {
            allow_top_level_await: false,
            step_quota: 1_000_000,
            max_call_depth: 64,
            warn_about_unresolved_tasks: true,
            durable_bindings: true,
        }
    }
}

/// Everything one interpretation reads.
pub struct InterpretRequest<'a> {
    /// Statements to evaluate. `Partial` mode rewrites folded `comptime`
    /// calls in place.
    pub root: &'a mut Block,
    /// The module's top-level bindings.
    pub env: &'a Environment,
    pub mode: Mode,
    pub clock: &'a ReadinessClock,
    pub builtins: &'a Builtins,
    pub capabilities: &'a Capabilities,
    pub resolvers: &'a Resolvers,
    /// Registry owned by the caller. When `None` the interpreter creates,
    /// drains and settles its own.
    pub promises: Option<&'a Promises>,
    pub cancel: &'a CancellationScope,
    pub log: &'a dyn LogSink,
    pub options: InterpretOptions,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Interpretation {
    /// Value of the last top-level statement, `NotYet`, or the failure.
    pub result: PartialResult,
    /// Tasks that never completed in a registry this interpretation owned.
    pub unresolved_tasks: usize,
    /// Evaluation steps taken.
    pub steps: u64,
}

/// Executes a tree against a binding environment.
pub trait Interpreter: Send + Sync {
    fn interpret(&self, request: InterpretRequest<'_>) -> Interpretation;
}
