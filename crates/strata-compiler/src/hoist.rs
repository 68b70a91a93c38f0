//! Moving declarations left within their block.
//!
//! A declaration flagged `HOIST_LEFT` moves as far left as it can without
//! crossing a statement that declares or assigns the same name, and never
//! past a declaration hoisted earlier in the same block. Unless it is also
//! flagged `HOIST_INIT`, its initializer stays behind as an assignment:
//!
//! ```text
//! let foo = 0;               let bar;
//! fn bar() { foo() }   =>    let foo = 0;
//! fn foo() { bar() }         let foo;
//!                            bar := fn() { foo() };
//!                            foo := fn() { bar() };
//! ```
//!
//! Hoisting runs after name resolution, so moving a declaration never
//! changes what a reference resolves to.

use strata_parser::ast::visitor::{walk_block_mut, walk_expr, walk_stmt};
use strata_parser::ast::{Assign, Block, DeclFlags, Expr, ExprKind, Stmt, Visit, VisitMut};

/// Hoist every block in `root`. Returns how many declarations moved.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn hoist(root: &mut Block) -> usize {
    let mut hoister = Hoister { moved: 0 };
    hoister.visit_block_mut(root);
    hoister.moved
}

struct Hoister {
    moved: usize,
}

impl VisitMut for Hoister {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
        self.moved += hoist_block(block);
    }
}

fn hoist_block(block: &mut Block) -> usize {
    let span = block.span;
    let stmts = &mut block.stmts;
    // Parallel to `stmts`: assignments left behind by hoisting.
    let mut hoist_inits = vec![false; stmts.len()];
    let mut limit = 0;
    let mut moved = 0;
    let mut i = 0;

    while i < stmts.len() {
        let (text, keeps_init) = match &mut stmts[i] {
            Stmt::Decl(decl) if decl.flags.contains(DeclFlags::HOIST_LEFT) => {
                decl.flags.remove(DeclFlags::HOIST_LEFT);
                let keeps_init =
                    decl.init.is_none() || decl.flags.contains(DeclFlags::HOIST_INIT);
                (decl.name.text.clone(), keeps_init)
            }
            _ => {
                i += 1;
                continue;
            }
        };

        let mut target = i;
        while target > limit && (hoist_inits[target - 1] || !conflicts(&stmts[target - 1], &text))
        {
            target -= 1;
        }
        if target == i {
            limit = i + 1;
            i += 1;
            continue;
        }

        let mut stmt = stmts.remove(i);
        hoist_inits.remove(i);
        let left_behind = match &mut stmt {
            Stmt::Decl(decl) if !keeps_init => decl.init.take().map(|value| {
                Stmt::Assign(Assign {
                    target: decl.name.clone(),
                    value,
                    span: decl.span,
                })
            }),
            _ => None,
        };
        let step = match left_behind {
            Some(assign) => {
                stmts.insert(i, assign);
                hoist_inits.insert(i, true);
                2
            }
            None => {
                // The block's value must not change.
                if i == stmts.len() {
                    stmts.push(Stmt::Expr(Expr::void(span.right_edge())));
                    hoist_inits.push(false);
                }
                1
            }
        };
        stmts.insert(target, stmt);
        hoist_inits.insert(target, false);

        moved += 1;
        limit = target + 1;
        i += step;
    }
    moved
}

// =========================================
// Conflicts
// =========================================

/// Whether `stmt` declares or assigns `text` anywhere inside it.
fn conflicts(stmt: &Stmt, text: &str) -> bool {
    let mut finder = ConflictFinder { text, found: false };
    finder.visit_stmt(stmt);
    finder.found
}

struct ConflictFinder<'a> {
    text: &'a str,
    found: bool,
}

impl ConflictFinder<'_> {
    fn check(&mut self, text: &str) {
        self.found |= text == self.text;
    }
}

impl Visit for ConflictFinder<'_> {
    fn visit_stmt(&mut self, stmt: &Stmt) {
        if self.found {
            return;
        }
        for name in stmt.declared_names() {
            self.check(&name.text);
        }
        match stmt {
            Stmt::Decl(decl) => {
                if let Some(export) = &decl.export {
                    self.check(export.base_name());
                }
            }
            Stmt::Assign(assign) => self.check(&assign.target.text),
            Stmt::Ambiguous(ambiguous) => self.check(&ambiguous.name.text),
            Stmt::FnDef(def) => {
                for param in &def.func.params {
                    self.check(&param.name.text);
                }
            }
            _ => {}
        }
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        if self.found {
            return;
        }
        if let ExprKind::Fn(func) = &expr.kind {
            for param in &func.params {
                self.check(&param.name.text);
            }
        }
        walk_expr(self, expr);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::sync::Arc;
    use strata_core::{BindingId, ExportedName, ModuleName, Span, TypeShape, Value};
    use strata_parser::ast::{Decl, FnExpr, Name, TypeRef};

    fn name(text: &str, id: u32) -> Name {
        Name {
            text: Arc::from(text),
            binding: Some(BindingId(id)),
            span: Span::UNKNOWN,
        }
    }

    fn decl(text: &str, id: u32, init: Option<Expr>, flags: DeclFlags) -> Stmt {
        Stmt::Decl(Decl::new(name(text, id), init, flags, Span::UNKNOWN))
    }

    fn int(v: i32) -> Expr {
        Expr::value(Value::Int32(v), Span::UNKNOWN)
    }

    fn calling(fn_name: &str, callee: Name) -> Expr {
        let call = Expr::new(
            ExprKind::Call {
                callee: Box::new(Expr::name(callee)),
                args: Vec::new(),
            },
            Span::UNKNOWN,
        );
        Expr::new(
            ExprKind::Fn(FnExpr {
                name: Some(Arc::from(fn_name)),
                params: Vec::new(),
                ret: None,
                body: Block::new(vec![Stmt::Expr(call)], Span::UNKNOWN),
            }),
            Span::UNKNOWN,
        )
    }

    fn function() -> DeclFlags {
        DeclFlags::HOIST_LEFT | DeclFlags::FUNCTION
    }

    #[test]
    fn functions_hoist_past_unrelated_declarations() {
        let mut block = Block::new(
            vec![
                decl("foo", 0, Some(int(0)), DeclFlags::empty()),
                decl("bar", 1, Some(calling("bar", name("foo", 0))), function()),
                decl("foo", 2, Some(calling("foo", name("bar", 1))), function()),
            ],
            Span::UNKNOWN,
        );
        assert_eq!(hoist(&mut block), 2);
        assert_eq!(
            block.to_string(),
            "(block (let bar#1) (let foo#0 0) (let foo#2) \
             (:= bar#1 (fn bar () (block (call foo#0)))) \
             (:= foo#2 (fn foo () (block (call bar#1)))))"
        );
    }

    #[test]
    fn type_definitions_keep_their_initializer() {
        let ty = Expr::value(Value::Type(TypeShape::INT32), Span::UNKNOWN);
        let mut block = Block::new(
            vec![
                Stmt::Expr(int(1)),
                decl(
                    "T",
                    0,
                    Some(ty),
                    DeclFlags::HOIST_LEFT | DeclFlags::HOIST_INIT | DeclFlags::TYPE_DEF,
                ),
            ],
            Span::UNKNOWN,
        );
        hoist(&mut block);
        assert_eq!(block.len(), 3);
        assert!(block.stmts[0].as_decl().is_some_and(|d| d.init.is_some()));
        assert_eq!(block.stmts[1], Stmt::Expr(int(1)));
        // Appended so the block still evaluates to void, not to `1`.
        assert!(matches!(&block.stmts[2], Stmt::Expr(e) if e.as_value() == Some(&Value::Void)));
    }

    #[test]
    fn stays_put_when_blocked_immediately() {
        let mut block = Block::new(
            vec![
                decl("f", 0, Some(int(1)), DeclFlags::MUTABLE),
                decl("f", 1, Some(calling("f", name("f", 1))), function()),
            ],
            Span::UNKNOWN,
        );
        assert_eq!(hoist(&mut block), 0);
        assert_eq!(block.len(), 2);
        let hoisted = block.stmts[1].as_decl().unwrap();
        assert!(hoisted.init.is_some());
        assert!(!hoisted.flags.contains(DeclFlags::HOIST_LEFT));
    }

    #[test]
    fn exported_names_block_their_base_name() {
        let mut exported = Decl::new(name("x", 0), Some(int(1)), DeclFlags::empty(), Span::UNKNOWN);
        exported.export = Some(ExportedName::new(ModuleName::from("m"), "x"));
        let mut block = Block::new(
            vec![
                Stmt::Expr(int(0)),
                Stmt::Decl(exported),
                decl("x", 1, Some(calling("x", name("x", 1))), function()),
            ],
            Span::UNKNOWN,
        );
        assert_eq!(hoist(&mut block), 0);
        assert_eq!(block.stmts[2].as_decl().map(|d| d.name.binding), Some(Some(BindingId(1))));
    }

    #[test]
    fn parameters_count_as_declarations() {
        let mut block = Block::new(
            vec![
                Stmt::Expr(Expr::new(
                    ExprKind::Fn(FnExpr {
                        name: None,
                        params: vec![strata_parser::ast::Param {
                            name: name("g", 5),
                            ty: Some(TypeRef::new(TypeShape::INT32, Span::UNKNOWN)),
                        }],
                        ret: None,
                        body: Block::default(),
                    }),
                    Span::UNKNOWN,
                )),
                decl("g", 0, Some(calling("g", name("g", 0))), function()),
            ],
            Span::UNKNOWN,
        );
        assert_eq!(hoist(&mut block), 0);
    }

    #[test]
    fn nested_blocks_are_hoisted() {
        let body = Block::new(
            vec![
                Stmt::Expr(int(7)),
                decl("inner", 1, Some(calling("inner", name("inner", 1))), function()),
            ],
            Span::UNKNOWN,
        );
        let outer = Expr::new(
            ExprKind::Fn(FnExpr {
                name: Some(Arc::from("outer")),
                params: Vec::new(),
                ret: None,
                body,
            }),
            Span::UNKNOWN,
        );
        let mut block = Block::new(vec![decl("outer", 0, Some(outer), DeclFlags::empty())], Span::UNKNOWN);
        assert_eq!(hoist(&mut block), 1);
        let func = block.stmts[0].as_decl().and_then(|d| d.init.as_ref()).and_then(Expr::as_fn).unwrap();
        assert!(func.body.stmts[0].as_decl().is_some_and(|d| &*d.name.text == "inner"));
    }

    // =========================================
    // Properties
    // =========================================

    const NAMES: [&str; 3] = ["a", "b", "c"];
    /// Binding ids of written assignments start here; hoisting copies a
    /// declaration's id onto the assignment it leaves behind.
    const ASSIGN_BASE: u32 = 1000;

    fn build(ops: &[(usize, u8)]) -> Block {
        let stmts = ops
            .iter()
            .enumerate()
            .map(|(index, &(n, kind))| {
                let text = NAMES[n];
                let id = index as u32;
                match kind {
                    0 => decl(text, id, Some(int(0)), DeclFlags::MUTABLE),
                    1 => decl(text, id, Some(calling(text, name(text, id))), function()),
                    2 => Stmt::Assign(Assign {
                        target: name(text, ASSIGN_BASE + id),
                        value: int(1),
                        span: Span::UNKNOWN,
                    }),
                    _ => Stmt::Expr(Expr::name(name(text, id))),
                }
            })
            .collect();
        Block::new(stmts, Span::UNKNOWN)
    }

    /// Original positions of the written statements that claim `text`, in output order.
    fn claims(block: &Block, text: &str) -> Vec<u32> {
        block
            .stmts
            .iter()
            .filter_map(|stmt| match stmt {
                Stmt::Decl(d) if &*d.name.text == text => d.name.binding.map(|b| b.0),
                Stmt::Assign(a) if &*a.target.text == text => a
                    .target
                    .binding
                    .and_then(|b| b.0.checked_sub(ASSIGN_BASE)),
                _ => None,
            })
            .collect()
    }

    proptest! {
        #[test]
        fn never_reorders_claims_on_a_name(
            ops in prop::collection::vec((0usize..3, 0u8..4), 0..14)
        ) {
            let mut block = build(&ops);
            let before = block.len();
            hoist(&mut block);

            for text in NAMES {
                let order = claims(&block, text);
                prop_assert!(order.windows(2).all(|w| w[0] < w[1]), "{text}: {order:?}");
            }

            let hoisted = ops.iter().filter(|(_, kind)| *kind == 1).count();
            prop_assert!(block.len() <= before + hoisted + 1);
            prop_assert!(block.decls().all(|d| !d.flags.contains(DeclFlags::HOIST_LEFT)));
        }
    }
}
