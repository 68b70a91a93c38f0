//! Expression nodes.

use std::sync::Arc;

use strata_core::{Span, TypeShape, Value};

use super::node::{Block, Name, TypeRef, params_shape};
use super::ops::{BinaryOp, UnaryOp};

#[derive(Debug, Clone, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A literal, or a value folded in by partial evaluation.
    Value(Value),
    Name(Name),
    Call {
        callee: Box<Expr>,
        args: Vec<Expr>,
    },
    Unary {
        op: UnaryOp,
        operand: Box<Expr>,
    },
    Binary {
        op: BinaryOp,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    If {
        cond: Box<Expr>,
        then: Block,
        /// Either a block or another `if`.
        otherwise: Option<Box<Expr>>,
    },
    Fn(FnExpr),
    Match {
        scrutinee: Box<Expr>,
        arms: Vec<MatchArm>,
    },
    /// Body of an asynchronous task; evaluates to a promise.
    Async(Block),
    /// Evaluated during partial interpretation and replaced by its value.
    Comptime(Box<Expr>),
    Block(Block),
    /// A type in expression position; reified into a type value by Define.
    TypeValue(TypeRef),
}

impl Expr {
    pub fn new(kind: ExprKind, span: Span) -> Self {
        Self { kind, span }
    }

    pub fn value(value: Value, span: Span) -> Self {
        Self::new(ExprKind::Value(value), span)
    }

    pub fn void(span: Span) -> Self {
        Self::value(Value::Void, span)
    }

    pub fn name(name: Name) -> Self {
        let span = name.span;
        Self::new(ExprKind::Name(name), span)
    }

    pub fn as_value(&self) -> Option<&Value> {
        match &self.kind {
            ExprKind::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn as_name(&self) -> Option<&Name> {
        match &self.kind {
            ExprKind::Name(n) => Some(n),
            _ => None,
        }
    }

    pub fn as_fn(&self) -> Option<&FnExpr> {
        match &self.kind {
            ExprKind::Fn(f) => Some(f),
            _ => None,
        }
    }

    /// Whether the expression ends in a block, so a following `;` is optional.
    pub fn ends_with_block(&self) -> bool {
        matches!(
            self.kind,
            ExprKind::If { .. }
                | ExprKind::Fn(_)
                | ExprKind::Match { .. }
                | ExprKind::Async(_)
                | ExprKind::Block(_)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    pub name: Name,
    pub ty: Option<TypeRef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FnExpr {
    /// Name of the definition this came from, for diagnostics and rendering.
    pub name: Option<Arc<str>>,
    pub params: Vec<Param>,
    pub ret: Option<TypeRef>,
    pub body: Block,
}

impl FnExpr {
    /// Declared signature; unannotated positions are `Any`.
    pub fn shape(&self) -> TypeShape {
        TypeShape::function(
            params_shape(&self.params),
            self.ret.as_ref().map_or(TypeShape::Any, |t| t.shape.clone()),
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MatchArm {
    pub pattern: Pattern,
    pub body: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Pattern {
    Value(Value, Span),
    /// `_`
    Wildcard(Span),
}

impl Pattern {
    pub fn span(&self) -> Span {
        match self {
            Pattern::Value(_, span) | Pattern::Wildcard(span) => *span,
        }
    }
}
