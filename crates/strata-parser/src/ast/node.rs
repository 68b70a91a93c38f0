//! Blocks, statements and declarations.
//!
//! The tree is owned and mutable: every stage edits it in place and hands
//! it on to the next.

use std::sync::Arc;

use bitflags::bitflags;
use strata_core::{BindingId, ExportedName, ModuleName, Span, TypeShape};

use super::expr::{Expr, FnExpr, Param};

/// An identifier occurrence. `binding` is filled in by name resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct Name {
    pub text: Arc<str>,
    pub binding: Option<BindingId>,
    pub span: Span,
}

impl Name {
    pub fn new(text: impl Into<Arc<str>>, span: Span) -> Self {
        Self {
            text: text.into(),
            binding: None,
            span,
        }
    }

    pub fn is_resolved(&self) -> bool {
        self.binding.is_some()
    }

    /// Same text and binding, different position.
    pub fn with_span(&self, span: Span) -> Self {
        Self {
            span,
            ..self.clone()
        }
    }
}

/// A written type with its position.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeRef {
    pub shape: TypeShape,
    pub span: Span,
}

impl TypeRef {
    pub fn new(shape: TypeShape, span: Span) -> Self {
        Self { shape, span }
    }
}

bitflags! {
    /// Properties of a declaration.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u16 {
        /// Move left within the block so siblings may reference it.
        const HOIST_LEFT = 1 << 0;
        /// Move the initializer with the declaration instead of leaving an
        /// assignment behind.
        const HOIST_INIT = 1 << 1;
        /// Declared with `var`.
        const MUTABLE = 1 << 2;
        /// Introduced by `type Name = ...`.
        const TYPE_DEF = 1 << 3;
        /// Introduced by `fn name(...) {}`.
        const FUNCTION = 1 << 4;
        /// Made by a stage rather than written in source.
        const SYNTHETIC = 1 << 5;
        /// `extern fn`; bound through a signature resolver.
        const EXTERN = 1 << 6;
    }
}

/// A declaration in a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Decl {
    /// Locally resolved name.
    pub name: Name,
    /// Externally visible name, distinct from the local one.
    pub export: Option<ExportedName>,
    pub ty: Option<TypeRef>,
    pub init: Option<Expr>,
    pub flags: DeclFlags,
    pub span: Span,
}

impl Decl {
    pub fn new(name: Name, init: Option<Expr>, flags: DeclFlags, span: Span) -> Self {
        Self {
            name,
            export: None,
            ty: None,
            init,
            flags,
            span,
        }
    }

    pub fn is_mutable(&self) -> bool {
        self.flags.contains(DeclFlags::MUTABLE)
    }

    pub fn is_exported(&self) -> bool {
        self.export.is_some()
    }
}

/// `name := value;`
#[derive(Debug, Clone, PartialEq)]
pub struct Assign {
    pub target: Name,
    pub value: Expr,
    pub span: Span,
}

/// `name = value;`, which is a declaration or an assignment depending on
/// what is in scope. Only present before Disambiguate.
#[derive(Debug, Clone, PartialEq)]
pub struct Ambiguous {
    pub name: Name,
    pub value: Expr,
    pub span: Span,
}

/// `fn name(params) -> T { ... }`. Only present before Disambiguate.
#[derive(Debug, Clone, PartialEq)]
pub struct FnDef {
    pub name: Name,
    pub export: Option<ExportedName>,
    pub func: FnExpr,
    pub span: Span,
}

/// `type Name = T;`. Only present before Disambiguate.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDef {
    pub name: Name,
    pub export: Option<ExportedName>,
    pub ty: TypeRef,
    pub span: Span,
}

/// `import a, b from "specifier";`
#[derive(Debug, Clone, PartialEq)]
pub struct Import {
    pub names: Vec<Name>,
    pub specifier: String,
    /// Filled in by the Import stage.
    pub module: Option<ModuleName>,
    pub span: Span,
}

/// `await promise;` or `let name = await promise;`
#[derive(Debug, Clone, PartialEq)]
pub struct AwaitStmt {
    pub bind: Option<Name>,
    pub promise: Expr,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Stmt {
    Import(Import),
    Decl(Decl),
    Assign(Assign),
    Ambiguous(Ambiguous),
    FnDef(FnDef),
    TypeDef(TypeDef),
    Await(AwaitStmt),
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> Span {
        match self {
            Stmt::Import(s) => s.span,
            Stmt::Decl(s) => s.span,
            Stmt::Assign(s) => s.span,
            Stmt::Ambiguous(s) => s.span,
            Stmt::FnDef(s) => s.span,
            Stmt::TypeDef(s) => s.span,
            Stmt::Await(s) => s.span,
            Stmt::Expr(e) => e.span,
        }
    }

    pub fn as_decl(&self) -> Option<&Decl> {
        match self {
            Stmt::Decl(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_decl_mut(&mut self) -> Option<&mut Decl> {
        match self {
            Stmt::Decl(d) => Some(d),
            _ => None,
        }
    }

    /// Names this statement itself introduces into its block.
    pub fn declared_names(&self) -> Vec<&Name> {
        match self {
            Stmt::Decl(d) => vec![&d.name],
            Stmt::FnDef(f) => vec![&f.name],
            Stmt::TypeDef(t) => vec![&t.name],
            Stmt::Import(i) => i.names.iter().collect(),
            Stmt::Await(a) => a.bind.iter().collect(),
            Stmt::Assign(_) | Stmt::Ambiguous(_) | Stmt::Expr(_) => Vec::new(),
        }
    }
}

/// A sequence of statements. Its value is the value of the last statement;
/// declarations and assignments evaluate to void.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub span: Span,
}

impl Block {
    pub fn new(stmts: Vec<Stmt>, span: Span) -> Self {
        Self { stmts, span }
    }

    pub fn len(&self) -> usize {
        self.stmts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stmts.is_empty()
    }

    pub fn decls(&self) -> impl Iterator<Item = &Decl> {
        self.stmts.iter().filter_map(Stmt::as_decl)
    }

    /// Top-level declaration named `text`, if any.
    pub fn find_decl(&self, text: &str) -> Option<&Decl> {
        self.decls().find(|d| &*d.name.text == text)
    }
}

/// Build the function parameter list shape used by `extern fn` and `fn` definitions.
pub fn params_shape(params: &[Param]) -> Vec<TypeShape> {
    params
        .iter()
        .map(|p| p.ty.as_ref().map_or(TypeShape::Any, |t| t.shape.clone()))
        .collect()
}
