//! S-expression rendering of the tree, used by snapshots, tree dumps and tests.
//!
//! ```text
//! (block (let bar @hoist) (let foo 0) (:= bar (fn bar () (block (call foo#0)))))
//! ```

use std::fmt::{self, Display, Formatter};

use super::expr::{Expr, ExprKind, FnExpr, MatchArm, Param, Pattern};
use super::node::{Block, Decl, DeclFlags, Name, Stmt};

impl Display for Name {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.binding {
            Some(id) => write!(f, "{}{id}", self.text),
            None => f.write_str(&self.text),
        }
    }
}

impl Display for Block {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("(block")?;
        for stmt in &self.stmts {
            write!(f, " {stmt}")?;
        }
        f.write_str(")")
    }
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let keyword = if self.flags.contains(DeclFlags::TYPE_DEF) {
            "type"
        } else if self.flags.contains(DeclFlags::EXTERN) {
            "extern"
        } else if self.is_mutable() {
            "var"
        } else {
            "let"
        };
        write!(f, "({keyword} {}", self.name)?;
        if let Some(ty) = &self.ty {
            write!(f, ": {}", ty.shape)?;
        }
        if let Some(init) = &self.init {
            write!(f, " {init}")?;
        }
        if self.flags.contains(DeclFlags::HOIST_LEFT) {
            f.write_str(" @hoist")?;
        }
        if let Some(export) = &self.export {
            write!(f, " @export({export})")?;
        }
        f.write_str(")")
    }
}

impl Display for Stmt {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Stmt::Import(i) => {
                write!(f, "(import {:?}", i.specifier)?;
                for name in &i.names {
                    write!(f, " {name}")?;
                }
                f.write_str(")")
            }
            Stmt::Decl(d) => write!(f, "{d}"),
            Stmt::Assign(a) => write!(f, "(:= {} {})", a.target, a.value),
            Stmt::Ambiguous(a) => write!(f, "(= {} {})", a.name, a.value),
            Stmt::FnDef(d) => {
                write!(f, "(fndef {} {})", d.name, FnDisplay(&d.func))
            }
            Stmt::TypeDef(t) => write!(f, "(typedef {} {})", t.name, t.ty.shape),
            Stmt::Await(a) => match &a.bind {
                Some(name) => write!(f, "(let {name} (await {}))", a.promise),
                None => write!(f, "(await {})", a.promise),
            },
            Stmt::Expr(e) => write!(f, "{e}"),
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ExprKind::Value(v) => write!(f, "{v}"),
            ExprKind::Name(n) => write!(f, "{n}"),
            ExprKind::Call { callee, args } => {
                write!(f, "(call {callee}")?;
                for arg in args {
                    write!(f, " {arg}")?;
                }
                f.write_str(")")
            }
            ExprKind::Unary { op, operand } => write!(f, "({op} {operand})"),
            ExprKind::Binary { op, lhs, rhs } => write!(f, "({op} {lhs} {rhs})"),
            ExprKind::If {
                cond,
                then,
                otherwise,
            } => {
                write!(f, "(if {cond} {then}")?;
                if let Some(otherwise) = otherwise {
                    write!(f, " {otherwise}")?;
                }
                f.write_str(")")
            }
            ExprKind::Fn(func) => write!(f, "{}", FnDisplay(func)),
            ExprKind::Match { scrutinee, arms } => {
                write!(f, "(match {scrutinee}")?;
                for MatchArm { pattern, body, .. } in arms {
                    match pattern {
                        Pattern::Value(v, _) => write!(f, " ({v} {body})")?,
                        Pattern::Wildcard(_) => write!(f, " (_ {body})")?,
                    }
                }
                f.write_str(")")
            }
            ExprKind::Async(body) => write!(f, "(async {body})"),
            ExprKind::Comptime(e) => write!(f, "(comptime {e})"),
            ExprKind::Block(b) => write!(f, "{b}"),
            ExprKind::TypeValue(t) => write!(f, "(type {})", t.shape),
        }
    }
}

struct FnDisplay<'a>(&'a FnExpr);

impl Display for FnDisplay<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let func = self.0;
        f.write_str("(fn ")?;
        if let Some(name) = &func.name {
            write!(f, "{name} ")?;
        }
        f.write_str("(")?;
        for (i, Param { name, ty }) in func.params.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{name}")?;
            if let Some(ty) = ty {
                write!(f, ": {}", ty.shape)?;
            }
        }
        f.write_str(")")?;
        if let Some(ret) = &func.ret {
            write!(f, " -> {}", ret.shape)?;
        }
        write!(f, " {})", func.body)
    }
}
