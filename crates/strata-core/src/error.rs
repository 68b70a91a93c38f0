//! Unified error types for strata.
//!
//! Every phase that can fail has its own error enum; [`StrataError`] wraps
//! them for callers that want one type.
//!
//! ## Error Hierarchy
//!
//! ```text
//! StrataError (top-level wrapper)
//! ├── LexError        - tokenization errors
//! ├── ParseError      - parser errors (with ParseErrorKind)
//! ├── ReadinessError  - consuming an unusable binding
//! ├── ImportError     - unresolvable import specifiers and names
//! └── AdvanceError    - fatal scheduler faults (cycles, blocked modules)
//! ```
//!
//! Hoisting and decision-tree construction are total and have no error type.
//! Interpretation failures are values (see [`crate::Fail`]), not errors.

use thiserror::Error;

use crate::{ModuleName, Readiness, Span, Stage};

// ============================================================================
// Lexer Errors
// ============================================================================

/// Errors that occur during tokenization.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LexError {
    #[error("unexpected character '{ch}' at {span}")]
    UnexpectedChar { ch: char, span: Span },

    #[error("unterminated string at {span}")]
    UnterminatedString { span: Span },

    #[error("unterminated comment at {span}")]
    UnterminatedComment { span: Span },

    #[error("invalid number at {span}: {detail}")]
    InvalidNumber { span: Span, detail: String },

    #[error("identifier longer than {max} bytes at {span}")]
    IdentifierTooLong { max: usize, span: Span },
}

impl LexError {
    pub fn span(&self) -> Span {
        match self {
            LexError::UnexpectedChar { span, .. } => *span,
            LexError::UnterminatedString { span } => *span,
            LexError::UnterminatedComment { span } => *span,
            LexError::InvalidNumber { span, .. } => *span,
            LexError::IdentifierTooLong { span, .. } => *span,
        }
    }
}

// ============================================================================
// Parse Errors
// ============================================================================

/// Categories of parse errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParseErrorKind {
    ExpectedToken,
    UnexpectedToken,
    UnexpectedEof,
    ExpectedExpression,
    ExpectedType,
    ExpectedStatement,
    ExpectedIdentifier,
    ExpectedPattern,
    InvalidLiteral,
    /// `await` used somewhere other than statement position.
    MisplacedAwait,
}

impl ParseErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParseErrorKind::ExpectedToken => "expected token",
            ParseErrorKind::UnexpectedToken => "unexpected token",
            ParseErrorKind::UnexpectedEof => "unexpected end of file",
            ParseErrorKind::ExpectedExpression => "expected expression",
            ParseErrorKind::ExpectedType => "expected type",
            ParseErrorKind::ExpectedStatement => "expected statement",
            ParseErrorKind::ExpectedIdentifier => "expected identifier",
            ParseErrorKind::ExpectedPattern => "expected pattern",
            ParseErrorKind::InvalidLiteral => "invalid literal",
            ParseErrorKind::MisplacedAwait => "misplaced await",
        }
    }
}

impl std::fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A parse error with location and context.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind} at {span}: {message}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
    pub message: String,
}

impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span, message: impl Into<String>) -> Self {
        Self {
            kind,
            span,
            message: message.into(),
        }
    }

    pub fn expected_token(span: Span, expected: &str, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedToken,
            span,
            format!("expected {expected}, found {found}"),
        )
    }

    pub fn unexpected_eof(span: Span) -> Self {
        Self::new(ParseErrorKind::UnexpectedEof, span, "unexpected end of file")
    }

    pub fn expected_identifier(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedIdentifier,
            span,
            format!("expected identifier, found {found}"),
        )
    }

    pub fn expected_expression(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedExpression,
            span,
            format!("expected expression, found {found}"),
        )
    }

    pub fn expected_type(span: Span, found: &str) -> Self {
        Self::new(
            ParseErrorKind::ExpectedType,
            span,
            format!("expected type, found {found}"),
        )
    }
}

// ============================================================================
// Readiness Errors
// ============================================================================

/// Rejected attempt to consume a binding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReadinessError {
    /// The binding's window of use closed at an earlier checkpoint.
    #[error("binding `{name}` evaporated before its use at {span}")]
    Evaporated { name: String, span: Span },

    /// The binding has not been given a value yet.
    #[error("binding `{name}` used at {span} before it was initialized")]
    Unready { name: String, span: Span },
}

impl ReadinessError {
    pub fn span(&self) -> Span {
        match self {
            ReadinessError::Evaporated { span, .. } | ReadinessError::Unready { span, .. } => {
                *span
            }
        }
    }

    pub fn readiness(&self) -> Readiness {
        match self {
            ReadinessError::Evaporated { .. } => Readiness::Evaporated,
            ReadinessError::Unready { .. } => Readiness::Unready,
        }
    }
}

// ============================================================================
// Import Errors
// ============================================================================

/// Failure to bind an import into the importing module.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("no module matches import specifier \"{specifier}\" at {span}")]
    UnknownModule { specifier: String, span: Span },

    #[error("module `{module}` does not export `{name}` (imported at {span})")]
    MissingExport {
        module: ModuleName,
        name: String,
        span: Span,
    },

    #[error("module `{module}` imports itself at {span}")]
    SelfImport { module: ModuleName, span: Span },
}

impl ImportError {
    pub fn span(&self) -> Span {
        match self {
            ImportError::UnknownModule { span, .. }
            | ImportError::MissingExport { span, .. }
            | ImportError::SelfImport { span, .. } => *span,
        }
    }
}

// ============================================================================
// Scheduler Errors
// ============================================================================

/// Fatal faults of the module advancement scheduler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AdvanceError {
    /// Modules that transitively import themselves. Membership is listed in
    /// dependency order starting from the lowest-named member.
    #[error("dependency cycle: {}", format_cycle(.cycle))]
    DependencyCycle { cycle: Vec<ModuleName> },

    /// `module` waits on `dependency`, which can never complete `gate`.
    #[error("module `{module}` is permanently blocked: `{dependency}` can never complete {gate}")]
    PermanentlyBlocked {
        module: ModuleName,
        dependency: ModuleName,
        gate: Stage,
    },

    #[error("module `{0}` was added twice")]
    DuplicateModule(ModuleName),
}

fn format_cycle(cycle: &[ModuleName]) -> String {
    let mut out = String::new();
    for module in cycle {
        out.push_str(module.as_str());
        out.push_str(" -> ");
    }
    if let Some(first) = cycle.first() {
        out.push_str(first.as_str());
    }
    out
}

// ============================================================================
// Unified Error
// ============================================================================

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StrataError {
    #[error(transparent)]
    Lex(#[from] LexError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Readiness(#[from] ReadinessError),

    #[error(transparent)]
    Import(#[from] ImportError),

    #[error(transparent)]
    Advance(#[from] AdvanceError),
}

impl StrataError {
    /// Position of the error, if it has one.
    pub fn span(&self) -> Option<Span> {
        match self {
            StrataError::Lex(e) => Some(e.span()),
            StrataError::Parse(e) => Some(e.span),
            StrataError::Readiness(e) => Some(e.span()),
            StrataError::Import(e) => Some(e.span()),
            StrataError::Advance(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_message_closes_the_loop() {
        let err = AdvanceError::DependencyCycle {
            cycle: vec![ModuleName::from("a"), ModuleName::from("b")],
        };
        assert_eq!(err.to_string(), "dependency cycle: a -> b -> a");
    }

    #[test]
    fn parse_error_display() {
        let err = ParseError::expected_token(Span::new(2, 4, 1), "';'", "'}'");
        assert_eq!(err.to_string(), "expected token at 2:4: expected ';', found '}'");
    }

    #[test]
    fn wrapper_keeps_span() {
        let err: StrataError = ReadinessError::Evaporated {
            name: "x".into(),
            span: Span::new(1, 2, 1),
        }
        .into();
        assert_eq!(err.span(), Some(Span::new(1, 2, 1)));
        assert!(err.to_string().contains("evaporated"));
    }
}
