//! Tree-walking [`Interpreter`].
//!
//! Evaluates top-level statements in order against the module environment.
//! In `Partial` mode the walker then folds every computable `comptime(...)`
//! call into a value leaf. Async tasks run in a drain loop owned by the same
//! interpretation; a registry the interpretation created is settled before
//! it returns.

use strata_core::{Diagnostic, Fail};
use strata_parser::ast::visitor::walk_expr_mut;
use strata_parser::ast::{Expr, ExprKind, VisitMut};

use crate::environment::Environment;
use crate::eval::{Evaluator, Halt, into_partial};
use crate::interpreter::{InterpretRequest, Interpretation, Interpreter, Mode};
use crate::promises::Promises;

#[derive(Debug, Default, Clone, Copy)]
pub struct TreeWalker;

impl TreeWalker {
    pub fn new() -> Self {
        Self
    }
}

impl Interpreter for TreeWalker {
    #[cfg_attr(feature = "profiling", profiling::function)]
    fn interpret(&self, request: InterpretRequest<'_>) -> Interpretation {
        let InterpretRequest {
            root,
            env,
            mode,
            clock,
            builtins,
            capabilities,
            resolvers,
            promises,
            cancel,
            log,
            options,
        } = request;

        let owned = Promises::new();
        let (promises, owns_promises) = match promises {
            Some(shared) => (shared, false),
            None => (&owned, true),
        };
        let warn_unresolved = options.warn_about_unresolved_tasks;
        let _span = tracing::debug_span!("interpret", ?mode, stage = %clock.stage()).entered();

        let mut eval = Evaluator {
            mode,
            clock,
            builtins,
            capabilities,
            resolvers,
            promises,
            cancel,
            log,
            options,
            steps: 0,
            depth: 0,
        };

        let mut result = eval.top_level(root, env);

        if mode == Mode::Partial && !matches!(result, Err(Halt::Fail(_))) {
            let mut folder = Folder {
                eval: &mut eval,
                env,
                folded: 0,
                failed: false,
            };
            folder.visit_block_mut(root);
            let (folded, failed) = (folder.folded, folder.failed);
            tracing::trace!(folded, "folded comptime calls");
            if failed {
                result = Err(Halt::Fail(Fail::bubble()));
            }
        }

        if !matches!(result, Err(Halt::Fail(_))) {
            if let Err(halt) = eval.drain() {
                result = Err(halt);
            }
        }

        let unresolved_tasks = if owns_promises {
            let abandoned = promises.abandon_tasks();
            if abandoned > 0 && warn_unresolved {
                tracing::warn!(unresolved = abandoned, "async tasks never completed");
                log.log(Diagnostic::warn(format!(
                    "{abandoned} async task(s) never completed"
                )));
            }
            abandoned
        } else {
            0
        };

        tracing::debug!(steps = eval.steps, "interpretation finished");
        Interpretation {
            result: into_partial(result),
            unresolved_tasks,
            steps: eval.steps,
        }
    }
}

/// Replaces `comptime(e)` with the value of `e` wherever it is computable.
struct Folder<'e, 'a> {
    eval: &'e mut Evaluator<'a>,
    env: &'e Environment,
    folded: usize,
    failed: bool,
}

impl VisitMut for Folder<'_, '_> {
    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        let ExprKind::Comptime(inner) = &expr.kind else {
            return;
        };
        match self.eval.expr(inner, self.env) {
            Ok(value) => {
                expr.kind = ExprKind::Value(value);
                self.folded += 1;
            }
            Err(Halt::NotYet) => {}
            Err(Halt::Fail(fail)) => {
                if let Some(diagnostic) = fail.to_diagnostic() {
                    self.eval.log.log(diagnostic);
                }
                self.failed = true;
            }
        }
    }
}
