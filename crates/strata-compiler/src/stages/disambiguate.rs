//! Turn grammar-level shorthand into explicit declarations.
//!
//! - `x = e` declares `x` unless a declaration of `x` is already visible,
//!   in which case it assigns
//! - `fn f() {}` declares `f` with a function initializer, hoisted left
//! - `type T = S` declares `T` with a type initializer, hoisted together
//!   with its initializer

use std::mem;
use std::sync::Arc;

use rustc_hash::FxHashSet;
use strata_parser::ast::visitor::{walk_block_mut, walk_expr_mut, walk_stmt_mut};
use strata_parser::ast::{
    Ambiguous, Assign, Block, Decl, DeclFlags, Expr, ExprKind, FnDef, Stmt, TypeDef, VisitMut,
};

use crate::module::Module;

pub(crate) fn run(module: &mut Module) {
    let mut scopes = Disambiguator { scopes: Vec::new() };
    scopes.visit_block_mut(&mut module.tree);
}

struct Disambiguator {
    scopes: Vec<FxHashSet<Arc<str>>>,
}

impl Disambiguator {
    fn is_visible(&self, text: &str) -> bool {
        self.scopes.iter().any(|scope| scope.contains(text))
    }

    fn declare(&mut self, text: &Arc<str>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(text.clone());
        }
    }
}

impl VisitMut for Disambiguator {
    fn visit_block_mut(&mut self, block: &mut Block) {
        self.scopes.push(FxHashSet::default());
        walk_block_mut(self, block);
        self.scopes.pop();
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        let placeholder = Stmt::Expr(Expr::void(stmt.span()));
        match mem::replace(stmt, placeholder) {
            Stmt::Ambiguous(Ambiguous {
                name,
                mut value,
                span,
            }) => {
                self.visit_expr_mut(&mut value);
                *stmt = if self.is_visible(&name.text) {
                    Stmt::Assign(Assign {
                        target: name,
                        value,
                        span,
                    })
                } else {
                    self.declare(&name.text);
                    Stmt::Decl(Decl::new(name, Some(value), DeclFlags::MUTABLE, span))
                };
            }
            Stmt::FnDef(FnDef {
                name,
                export,
                mut func,
                span,
            }) => {
                // Visible in its own body and to earlier siblings once hoisted.
                self.declare(&name.text);
                func.name.get_or_insert_with(|| name.text.clone());
                let init = Expr::new(ExprKind::Fn(func), span);
                let mut decl = Decl::new(
                    name,
                    Some(init),
                    DeclFlags::HOIST_LEFT | DeclFlags::FUNCTION,
                    span,
                );
                decl.export = export;
                *stmt = Stmt::Decl(decl);
                walk_stmt_mut(self, stmt);
            }
            Stmt::TypeDef(TypeDef {
                name,
                export,
                ty,
                span,
            }) => {
                self.declare(&name.text);
                let init = Expr::new(ExprKind::TypeValue(ty.clone()), ty.span);
                let mut decl = Decl::new(
                    name,
                    Some(init),
                    DeclFlags::HOIST_LEFT | DeclFlags::HOIST_INIT | DeclFlags::TYPE_DEF,
                    span,
                );
                decl.export = export;
                *stmt = Stmt::Decl(decl);
            }
            other => {
                *stmt = other;
                walk_stmt_mut(self, stmt);
                let declared: Vec<Arc<str>> =
                    stmt.declared_names().into_iter().map(|n| n.text.clone()).collect();
                for text in &declared {
                    self.declare(text);
                }
            }
        }
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        if let ExprKind::Fn(func) = &expr.kind {
            let params = func.params.iter().map(|p| p.name.text.clone()).collect();
            self.scopes.push(params);
            walk_expr_mut(self, expr);
            self.scopes.pop();
        } else {
            walk_expr_mut(self, expr);
        }
    }
}
