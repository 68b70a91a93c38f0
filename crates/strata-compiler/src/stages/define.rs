//! Reify type definitions and desugar pattern matches.
//!
//! Named types are replaced by the shape they were defined as, `type`
//! initializers become type values, and
//!
//! ```text
//! match (s) { 1 => a, _ => b }
//! ```
//!
//! becomes a block binding `s` to a synthetic name followed by an `if`
//! chain over `same(...)`, ending in `raise(...)` when no arm is a wildcard.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use strata_core::{BindingIdAllocator, Diagnostic, LogSink, Span, TypeShape, Value};
use strata_parser::ast::visitor::{walk_expr_mut, walk_stmt_mut};
use strata_parser::ast::{
    BinaryOp, Block, Decl, DeclFlags, Expr, ExprKind, MatchArm, Name, Pattern, Stmt, TypeRef, VisitMut,
};

use super::StepContext;
use crate::module::Module;

pub(crate) fn run(module: &mut Module, step: &StepContext<'_>) {
    let mut table: FxHashMap<Arc<str>, TypeShape> = module.import_types.clone();
    let mut defined = Vec::new();
    for decl in module.tree.decls() {
        if !decl.flags.contains(DeclFlags::TYPE_DEF) {
            continue;
        }
        if let Some(ExprKind::TypeValue(ty)) = decl.init.as_ref().map(|init| &init.kind) {
            table.insert(decl.name.text.clone(), ty.shape.clone());
            defined.push((decl.name.text.clone(), decl.span));
        }
    }

    // Definitions may refer to each other; resolve them against the raw table first.
    let mut resolved = table.clone();
    for (name, span) in defined {
        let Some(shape) = table.get(&name) else {
            continue;
        };
        let shape = reify(shape, &table, &mut vec![name.clone()]).unwrap_or_else(|message| {
            step.log.log(Diagnostic::error(message).at(span));
            TypeShape::Any
        });
        resolved.insert(name, shape);
    }

    let mut definer = Definer {
        types: &resolved,
        ids: &mut module.ids,
        step,
    };
    definer.visit_block_mut(&mut module.tree);
}

/// Replace every named type inside `shape`. `visiting` holds the
/// definitions being expanded.
fn reify(
    shape: &TypeShape,
    table: &FxHashMap<Arc<str>, TypeShape>,
    visiting: &mut Vec<Arc<str>>,
) -> Result<TypeShape, String> {
    Ok(match shape {
        TypeShape::Named(name) => {
            if visiting.contains(name) {
                return Err(format!("type `{name}` is defined in terms of itself"));
            }
            let Some(target) = table.get(name) else {
                return Err(format!("unknown type `{name}`"));
            };
            visiting.push(name.clone());
            let reified = reify(target, table, visiting);
            visiting.pop();
            reified?
        }
        TypeShape::Function(func) => {
            let params = func
                .params
                .iter()
                .map(|p| reify(p, table, visiting))
                .collect::<Result<_, _>>()?;
            TypeShape::function(params, reify(&func.result, table, visiting)?)
        }
        TypeShape::Promise(of) => TypeShape::promise(reify(of, table, visiting)?),
        other => other.clone(),
    })
}

struct Definer<'a, 'b> {
    types: &'a FxHashMap<Arc<str>, TypeShape>,
    ids: &'a mut BindingIdAllocator,
    step: &'a StepContext<'b>,
}

impl Definer<'_, '_> {
    fn reify_ref(&self, ty: &mut TypeRef) {
        match reify(&ty.shape, self.types, &mut Vec::new()) {
            Ok(shape) => ty.shape = shape,
            Err(message) => {
                self.step.log.log(Diagnostic::error(message).at(ty.span));
                ty.shape = TypeShape::Any;
            }
        }
    }

    fn desugar_match(&mut self, scrutinee: Expr, arms: Vec<MatchArm>, span: Span) -> Expr {
        let temp = Name {
            text: Arc::from("match"),
            binding: Some(self.ids.fresh()),
            span: scrutinee.span,
        };
        let bind = Decl::new(temp.clone(), Some(scrutinee), DeclFlags::SYNTHETIC, span);

        let no_match = {
            let message = Expr::new(
                ExprKind::Binary {
                    op: BinaryOp::Add,
                    lhs: Box::new(Expr::value(Value::str("no match arm accepts "), span)),
                    rhs: Box::new(call("toString", vec![Expr::name(temp.clone())], span)),
                },
                span,
            );
            call("raise", vec![message], span)
        };

        let chain = arms.into_iter().rev().fold(no_match, |otherwise, arm| {
            match arm.pattern {
                // Later arms are unreachable.
                Pattern::Wildcard(_) => arm.body,
                Pattern::Value(value, pattern_span) => {
                    let cond = call(
                        "same",
                        vec![Expr::name(temp.clone()), Expr::value(value, pattern_span)],
                        arm.span,
                    );
                    let otherwise = match otherwise.kind {
                        ExprKind::If { .. } | ExprKind::Block(_) => otherwise,
                        _ => {
                            let span = otherwise.span;
                            Expr::new(
                                ExprKind::Block(Block::new(vec![Stmt::Expr(otherwise)], span)),
                                span,
                            )
                        }
                    };
                    Expr::new(
                        ExprKind::If {
                            cond: Box::new(cond),
                            then: Block::new(vec![Stmt::Expr(arm.body)], arm.span),
                            otherwise: Some(Box::new(otherwise)),
                        },
                        arm.span,
                    )
                }
            }
        });

        Expr::new(
            ExprKind::Block(Block::new(vec![Stmt::Decl(bind), Stmt::Expr(chain)], span)),
            span,
        )
    }
}

/// A call to a global function.
fn call(function: &str, args: Vec<Expr>, span: Span) -> Expr {
    Expr::new(
        ExprKind::Call {
            callee: Box::new(Expr::name(Name::new(function, span))),
            args,
        },
        span,
    )
}

impl VisitMut for Definer<'_, '_> {
    fn visit_stmt_mut(&mut self, stmt: &mut Stmt) {
        if let Stmt::Decl(decl) = stmt
            && let Some(ty) = &mut decl.ty
        {
            self.reify_ref(ty);
        }
        walk_stmt_mut(self, stmt);
    }

    fn visit_expr_mut(&mut self, expr: &mut Expr) {
        walk_expr_mut(self, expr);
        match &mut expr.kind {
            ExprKind::Fn(func) => {
                for param in &mut func.params {
                    if let Some(ty) = &mut param.ty {
                        self.reify_ref(ty);
                    }
                }
                if let Some(ret) = &mut func.ret {
                    self.reify_ref(ret);
                }
            }
            ExprKind::TypeValue(ty) => {
                self.reify_ref(ty);
                expr.kind = ExprKind::Value(Value::Type(ty.shape.clone()));
            }
            ExprKind::Match { .. } => {
                let span = expr.span;
                let placeholder = ExprKind::Value(Value::Void);
                if let ExprKind::Match { scrutinee, arms } =
                    std::mem::replace(&mut expr.kind, placeholder)
                {
                    *expr = self.desugar_match(*scrutinee, arms, span);
                }
            }
            _ => {}
        }
    }
}
