//! Visitor traits for tree traversal.
//!
//! [`Visit`] walks the tree by shared reference for analyses; [`VisitMut`]
//! walks it by mutable reference for rewrites. Override a method to
//! intercept a node and call the matching `walk_*` function to continue into
//! its children.

use super::expr::{Expr, ExprKind};
use super::node::{Block, Stmt};

pub trait Visit {
    fn visit_block(&mut self, block: &Block) {
        walk_block(self, block);
    }

    fn visit_stmt(&mut self, stmt: &Stmt) {
        walk_stmt(self, stmt);
    }

    fn visit_expr(&mut self, expr: &Expr) {
        walk_expr(self, expr);
    }
}

pub fn walk_block<V: Visit + ?Sized>(v: &mut V, block: &Block) {
    for stmt in &block.stmts {
        v.visit_stmt(stmt);
    }
}

pub fn walk_stmt<V: Visit + ?Sized>(v: &mut V, stmt: &Stmt) {
    match stmt {
        Stmt::Import(_) | Stmt::TypeDef(_) => {}
        Stmt::Decl(d) => {
            if let Some(init) = &d.init {
                v.visit_expr(init);
            }
        }
        Stmt::Assign(a) => v.visit_expr(&a.value),
        Stmt::Ambiguous(a) => v.visit_expr(&a.value),
        Stmt::FnDef(d) => v.visit_block(&d.func.body),
        Stmt::Await(a) => v.visit_expr(&a.promise),
        Stmt::Expr(e) => v.visit_expr(e),
    }
}

pub fn walk_expr<V: Visit + ?Sized>(v: &mut V, expr: &Expr) {
    match &expr.kind {
        ExprKind::Value(_) | ExprKind::Name(_) | ExprKind::TypeValue(_) => {}
        ExprKind::Call { callee, args } => {
            v.visit_expr(callee);
            for arg in args {
                v.visit_expr(arg);
            }
        }
        ExprKind::Unary { operand, .. } => v.visit_expr(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr(lhs);
            v.visit_expr(rhs);
        }
        ExprKind::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr(cond);
            v.visit_block(then);
            if let Some(otherwise) = otherwise {
                v.visit_expr(otherwise);
            }
        }
        ExprKind::Fn(func) => v.visit_block(&func.body),
        ExprKind::Match { scrutinee, arms } => {
            v.visit_expr(scrutinee);
            for arm in arms {
                v.visit_expr(&arm.body);
            }
        }
        ExprKind::Async(body) | ExprKind::Block(body) => v.visit_block(body),
        ExprKind::Comptime(inner) => v.visit_expr(inner),
    }
}

pub trait VisitMut {
    fn visit_block_mut(&mut self, block: &mut Block) {
        walk_block_mut(self, block);
    }

    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
    }
}

pub fn walk_block_mut<V: VisitMut + ?Sized>(v: &mut V, block: &mut Block) {
    for stmt in &mut block.stmts {
        v.visit_stmt_mut(stmt);
    }
}

pub fn walk_stmt_mut<V: VisitMut + ?Sized>(v: &mut V, stmt: &mut Stmt) {
    match stmt {
        Stmt::Import(_) | Stmt::TypeDef(_) => {}
        Stmt::Decl(d) => {
            if let Some(init) = &mut d.init {
                v.visit_expr_mut(init);
            }
        }
        Stmt::Assign(a) => v.visit_expr_mut(&mut a.value),
        Stmt::Ambiguous(a) => v.visit_expr_mut(&mut a.value),
        Stmt::FnDef(d) => v.visit_block_mut(&mut d.func.body),
        Stmt::Await(a) => v.visit_expr_mut(&mut a.promise),
        Stmt::Expr(e) => v.visit_expr_mut(e),
    }
}

pub fn walk_expr_mut<V: VisitMut + ?Sized>(v: &mut V, expr: &mut Expr) {
    match &mut expr.kind {
        ExprKind::Value(_) | ExprKind::Name(_) | ExprKind::TypeValue(_) => {}
        ExprKind::Call { callee, args } => {
            v.visit_expr_mut(callee);
            for arg in args {
                v.visit_expr_mut(arg);
            }
        }
        ExprKind::Unary { operand, .. } => v.visit_expr_mut(operand),
        ExprKind::Binary { lhs, rhs, .. } => {
            v.visit_expr_mut(lhs);
            v.visit_expr_mut(rhs);
        }
        ExprKind::If {
            cond,
            then,
            otherwise,
        } => {
            v.visit_expr_mut(cond);
            v.visit_block_mut(then);
            if let Some(otherwise) = otherwise {
                v.visit_expr_mut(otherwise);
            }
        }
        ExprKind::Fn(func) => v.visit_block_mut(&mut func.body),
        ExprKind::Match { scrutinee, arms } => {
            v.visit_expr_mut(scrutinee);
            for arm in arms {
                v.visit_expr_mut(&mut arm.body);
            }
        }
        ExprKind::Async(body) | ExprKind::Block(body) => v.visit_block_mut(body),
        ExprKind::Comptime(inner) => v.visit_expr_mut(inner),
    }
}
