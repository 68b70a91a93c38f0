//! Name resolution followed by hoisting.
//!
//! Every declaration receives a [`BindingId`] and every reference is pointed
//! at one. A reference resolves, innermost scope first, to:
//!
//! 1. the nearest declaration of the name before it in the same block
//!    (a hoisted declaration also sees itself, so functions can recurse)
//! 2. otherwise the nearest hoisted declaration after it in the same block
//! 3. otherwise the same search in the enclosing block, from the statement
//!    that contains the reference; function parameters form their own scope
//!
//! Names that are still unresolved must be capabilities, intrinsics or
//! builtins. They keep no binding and are looked up by name when evaluated.
//!
//! Resolution happens before hoisting moves anything, so references keep
//! pointing at the declaration that was textually visible. A reference that
//! resolved forward (rule 2) is only valid if hoisting then moved the
//! declaration ahead of it; one pinned behind a conflicting statement
//! leaves the reference undeclared.

use std::sync::Arc;

use rustc_hash::FxHashSet;
use strata_core::{BindingId, BindingIdAllocator, Diagnostic, LogSink};
use strata_parser::ast::visitor::{walk_expr, walk_expr_mut, walk_stmt, walk_stmt_mut};
use strata_parser::ast::{Block, DeclFlags, Expr, ExprKind, Name, Stmt, Visit, VisitMut};

use super::StepContext;
use crate::hoist::hoist;
use crate::module::Module;

pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let mut resolver = Resolver {
        frames: Vec::new(),
        ids: &mut module.ids,
        forward: FxHashSet::default(),
        step,
    };
    resolver.visit_block_mut(&mut module.tree);
    let forward = resolver.forward;
    let moved = hoist(&mut module.tree);
    tracing::trace!(module = %step.log.module(), moved, "hoisted declarations");

    if !forward.is_empty() {
        let mut order = OrderCheck {
            forward: &forward,
            declared: FxHashSet::default(),
            fn_depth: 0,
            step,
        };
        order.visit_block(&module.tree);
    }
}

struct Entry {
    text: Arc<str>,
    id: BindingId,
    index: usize,
    hoisted: bool,
    /// Bound by an import, so not subject to statement order.
    imported: bool,
}

/// Declarations of one block, or the parameters of one function.
struct Frame {
    entries: Vec<Entry>,
    /// Index of the statement being resolved.
    cursor: usize,
}

impl Frame {
    /// The visible declaration of `text`, and whether it lies ahead of the
    /// cursor and must be hoisted past it.
    fn find(&self, text: &str) -> Option<(BindingId, bool)> {
        let named = || self.entries.iter().filter(move |e| &*e.text == text);
        let preceding = named()
            .filter(|e| e.index < self.cursor || (e.index == self.cursor && e.hoisted))
            .max_by_key(|e| e.index);
        if let Some(entry) = preceding {
            return Some((entry.id, false));
        }
        named()
            .filter(|e| e.hoisted && e.index > self.cursor)
            .min_by_key(|e| e.index)
            .map(|e| (e.id, !e.imported))
    }
}

struct Resolver<'a, 'b> {
    frames: Vec<Frame>,
    ids: &'a mut BindingIdAllocator,
    /// Declarations some reference reached by looking ahead.
    forward: FxHashSet<BindingId>,
    step: &'a StepContext<'b>,
}

impl Resolver<'_, '_> {
    fn lookup(&mut self, text: &str) -> Option<BindingId> {
        let (id, ahead) = self.frames.iter().rev().find_map(|frame| frame.find(text))?;
        if ahead {
            self.forward.insert(id);
        }
        Some(id)
    }

    fn resolve_use(&mut self, name: &mut Name) {
        if name.binding.is_some() {
            return;
        }
        name.binding = self.lookup(&name.text);
        if name.binding.is_none() && !self.step.cx.is_global(&name.text) {
            self.step.log.log(
                Diagnostic::error(format!("`{}` is not declared", name.text)).at(name.span),
            );
        }
    }

    fn resolve_target(&mut self, target: &mut Name) {
        if target.binding.is_some() {
            return;
        }
        target.binding = self.lookup(&target.text);
        if target.binding.is_none() {
            self.step.log.log(
                Diagnostic::error(format!("cannot assign to undeclared `{}`", target.text))
                    .at(target.span),
            );
        }
    }

    /// Give every declaration in `block` a binding and record it.
    fn declare(&mut self, block: &mut Block) -> Vec<Entry> {
        let mut entries = Vec::new();
        for (index, stmt) in block.stmts.iter_mut().enumerate() {
            let (names, hoisted, imported): (Vec<&mut Name>, bool, bool) = match stmt {
                Stmt::Decl(decl) => {
                    let hoisted = decl.flags.contains(DeclFlags::HOIST_LEFT);
                    (vec![&mut decl.name], hoisted, false)
                }
                Stmt::Await(wait) => (wait.bind.iter_mut().collect(), false, false),
                // Imported names are visible throughout the module.
                Stmt::Import(import) => (import.names.iter_mut().collect(), true, true),
                _ => continue,
            };
            for name in names {
                let id = *name.binding.get_or_insert_with(|| self.ids.fresh());
                entries.push(Entry {
                    text: name.text.clone(),
                    id,
                    index,
                    hoisted,
                    imported,
                });
            }
        }
        entries
    }
}

impl VisitMut for Resolver<'_, '_> {
    fn visit_block_mut(&mut self, block: &mut Block) {
        let entries = self.declare(block);
        self.frames.push(Frame { entries, cursor: 0 });
        for (index, stmt) in block.stmts.iter_mut().enumerate() {
            if let Some(frame) = self.frames.last_mut() {
                frame.cursor = index;
            }
            self.visit_stmt_mut(stmt);
        }
        self.frames.pop();
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        match stmt {
            Stmt::Assign(assign) => self.resolve_target(&mut assign.target),
            Stmt::Ambiguous(ambiguous) => self.resolve_target(&mut ambiguous.name),
            _ => {}
        }
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        match &mut expr.kind {
            ExprKind::Name(name) => self.resolve_use(name),
            ExprKind::Fn(func) => {
                let entries = func
                    .params
                    .iter_mut()
                    .map(|param| Entry {
                        text: param.name.text.clone(),
                        id: *param.name.binding.get_or_insert_with(|| self.ids.fresh()),
                        index: 0,
                        hoisted: false,
                        imported: false,
                    })
                    .collect();
                self.frames.push(Frame {
                    entries,
                    cursor: usize::MAX,
                });
                walk_expr_mut(self, expr);
                self.frames.pop();
            }
            _ => walk_expr_mut(self, expr),
        }
    }
}

// =========================================
// Order check
// =========================================

/// Reports references evaluated before the declaration they resolved to.
///
/// Function bodies are skipped: they run only once called, by which time
/// the whole enclosing block has been declared.
struct OrderCheck<'a, 'b> {
    forward: &'a FxHashSet<BindingId>,
    declared: FxHashSet<BindingId>,
    fn_depth: usize,
    step: &'a StepContext<'b>,
}

impl OrderCheck<'_, '_> {
    fn premature(&self, name: &Name) -> bool {
        self.fn_depth == 0
            && name
                .binding
                .is_some_and(|id| self.forward.contains(&id) && !self.declared.contains(&id))
    }
}

impl Visit for OrderCheck<'_, '_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Decl(decl) => {
                if let Some(id) = decl.name.binding {
                    self.declared.insert(id);
                }
            }
            Stmt::Assign(assign) if self.premature(&assign.target) => {
                self.step.log.log(
                    Diagnostic::error(format!(
                        "cannot assign to undeclared `{}`",
                        assign.target.text
                    ))
                    .at(assign.target.span),
                );
            }
            Stmt::Ambiguous(ambiguous) if self.premature(&ambiguous.name) => {
                self.step.log.log(
                    Diagnostic::error(format!(
                        "cannot assign to undeclared `{}`",
                        ambiguous.name.text
                    ))
                    .at(ambiguous.name.span),
                );
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        match &expr.kind {
            ExprKind::Name(name) if self.premature(name) => {
                self.step.log.log(
                    Diagnostic::error(format!("`{}` is not declared", name.text)).at(name.span),
                );
            }
            ExprKind::Fn(_) => {
                self.fn_depth += 1;
                walk_expr(self, expr);
                self.fn_depth -= 1;
            }
            _ => walk_expr(self, expr),
        }
    }
}

#[cfg(test)]
mod tests {
    use strata_core::{Stage, TypeShape, Value};
    use strata_interp::{Capabilities, HostFunction};

    use crate::stages::testing::Bench;

    fn resolved(bench: &Bench, source: &str) -> String {
        let mut module = bench.module(source);
        assert!(bench.advance_through(&mut module, Stage::SyntaxMacro), "{:?}", bench.errors());
        module.tree().to_string()
    }

    #[test]
    fn hoisted_functions_keep_their_textual_bindings() {
        let bench = Bench::new();
        assert_eq!(
            resolved(&bench, "let foo = 0; fn bar() { foo() } fn foo() { bar() }"),
            "(block (let bar#1) (let foo#0 0) (let foo#2) \
             (:= bar#1 (fn bar () (block (call foo#0)))) \
             (:= foo#2 (fn foo () (block (call bar#1)))))"
        );
    }

    #[test]
    fn functions_see_later_siblings_and_themselves() {
        let bench = Bench::new();
        let tree = resolved(
            &bench,
            "fn even(n) { if (n == 0) { true } else { odd(n - 1) } } \
             fn odd(n) { if (n == 0) { false } else { even(n - 1) } }",
        );
        assert!(tree.contains("(call odd#1"), "{tree}");
        assert!(tree.contains("(call even#0"), "{tree}");
    }

    #[test]
    fn shadowing_picks_the_nearest_preceding_declaration() {
        let bench = Bench::new();
        assert_eq!(
            resolved(&bench, "let x = 1; let y = x; let x = 2; let z = x;"),
            "(block (let x#0 1) (let y#1 x#0) (let x#2 2) (let z#3 x#2))"
        );
    }

    #[test]
    fn parameters_shadow_outer_names() {
        let bench = Bench::new();
        let tree = resolved(&bench, "let n = 1; let f = fn(n) { n };");
        assert!(tree.contains("(fn (n#2) (block n#2))"), "{tree}");
    }

    #[test]
    fn globals_stay_unbound() {
        let print = HostFunction::new(
            "print",
            TypeShape::function(vec![TypeShape::Any], TypeShape::VOID),
            |_| Ok(Value::Void),
        );
        let bench = Bench::with_context(|cx| {
            cx.with_capabilities(Capabilities::new().with("print", Value::function(print)))
        });
        let tree = resolved(&bench, "print(len(\"abc\"));");
        assert_eq!(tree, "(block (call print (call len \"abc\")))");
    }

    #[test]
    fn unknown_names_are_errors() {
        let bench = Bench::new();
        let mut module = bench.module("let a = b; c := 1;");
        assert!(!bench.advance_through(&mut module, Stage::SyntaxMacro));
        assert_eq!(module.stage(), Some(Stage::Disambiguate));
        let errors = bench.errors();
        assert_eq!(errors.len(), 2, "{errors:?}");
        assert!(errors[0].contains("`b`"));
        assert!(errors[1].contains("`c`"));
    }

    #[test]
    fn forward_reference_needs_the_hoist_to_happen() {
        let bench = Bench::new();
        let mut module = bench.module("let r = f(); let f = 1; fn f() { 2 } r");
        assert!(!bench.advance_through(&mut module, Stage::SyntaxMacro));
        assert_eq!(module.stage(), Some(Stage::Disambiguate));
        let errors = bench.errors();
        assert_eq!(errors.len(), 1, "{errors:?}");
        assert!(errors[0].contains("`f` is not declared"), "{errors:?}");
    }

    #[test]
    fn forward_references_inside_function_bodies_are_deferred() {
        let bench = Bench::new();
        let tree = resolved(&bench, "let g = fn() { f() }; let f = 1; fn f() { 2 }");
        assert!(tree.contains("(call f#"), "{tree}");
    }
}
