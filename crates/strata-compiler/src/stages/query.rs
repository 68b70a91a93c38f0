//! Post-type analyses. Only logs; never edits the tree.

use rustc_hash::FxHashSet;
use strata_core::{BindingId, Diagnostic, LogSink};
use strata_parser::ast::visitor::walk_expr;
use strata_parser::ast::{DeclFlags, Expr, ExprKind, Visit};

use super::StepContext;
use crate::module::Module;

pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    struct Reads(FxHashSet<BindingId>);

    impl Visit for Reads {
        fn visit_expr(&mut self, expr: &Expr) {
            if let ExprKind::Name(name) = &expr.kind
                && let Some(id) = name.binding
            {
                self.0.insert(id);
            }
            walk_expr(self, expr);
        }
    }

    let mut reads = Reads(FxHashSet::default());
    reads.visit_block(&module.tree);

    let skip = DeclFlags::SYNTHETIC | DeclFlags::TYPE_DEF;
    for decl in module.tree.decls() {
        if decl.is_exported() || decl.flags.intersects(skip) || decl.name.text.starts_with('_') {
            continue;
        }
        if decl.name.binding.is_some_and(|id| !reads.0.contains(&id)) {
            step.log.log(
                Diagnostic::warn(format!("`{}` is never used", decl.name.text)).at(decl.name.span),
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::Stage;

    use crate::stages::testing::Bench;

    #[test]
    fn warns_about_unused_private_declarations() {
        let bench = Bench::new();
        let mut module = bench.module(
            "let used = 1; let unused = 2; let _quiet = 3; export let shared = used; \
             fn helper() { 0 } type Id = Int32; let n: Id = 4; n",
        );
        assert!(bench.advance_through(&mut module, Stage::Query), "{:?}", bench.errors());
        assert_eq!(
            bench.warnings(),
            ["`helper` is never used", "`unused` is never used"]
        );
    }
}
