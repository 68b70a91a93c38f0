//! Runtime values produced by the embedded interpreter.
//!
//! Interpretation never lets an internal fault escape untyped: every
//! evaluation produces a [`PartialResult`], which is a [`Value`], a
//! [`Fail`] marker, or [`PartialResult::NotYet`] when partial evaluation
//! could not compute a result yet.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use ordered_float::OrderedFloat;

use crate::{Diagnostic, Level, PrimitiveKind, ReadinessError, Span, TypeShape};

/// Host- or script-defined function value.
///
/// Implemented by the interpreter for closures and by the host for
/// capabilities and builtins.
pub trait Callable: Send + Sync + fmt::Debug {
    fn name(&self) -> &str;

    fn shape(&self) -> TypeShape;

    fn as_any(&self) -> &dyn Any;
}

/// Identity of a promise in a `Promises` registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PromiseId(pub u32);

/// A runtime value.
#[derive(Clone)]
pub enum Value {
    Void,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Float64(OrderedFloat<f64>),
    Str(Arc<str>),
    Function(Arc<dyn Callable>),
    /// A reified type.
    Type(TypeShape),
    Promise(PromiseId),
}

impl Value {
    pub fn str(s: impl Into<Arc<str>>) -> Self {
        Value::Str(s.into())
    }

    pub fn float(f: f64) -> Self {
        Value::Float64(OrderedFloat(f))
    }

    pub fn function(f: impl Callable + 'static) -> Self {
        Value::Function(Arc::new(f))
    }

    pub fn shape(&self) -> TypeShape {
        match self {
            Value::Void => TypeShape::VOID,
            Value::Bool(_) => TypeShape::BOOL,
            Value::Int32(_) => TypeShape::INT32,
            Value::Int64(_) => TypeShape::INT64,
            Value::Float64(_) => TypeShape::FLOAT64,
            Value::Str(_) => TypeShape::STRING,
            Value::Function(f) => f.shape(),
            Value::Type(_) => TypeShape::Type,
            Value::Promise(_) => TypeShape::promise(TypeShape::Any),
        }
    }

    pub fn primitive_kind(&self) -> Option<PrimitiveKind> {
        self.shape().as_primitive()
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_function(&self) -> Option<&Arc<dyn Callable>> {
        match self {
            Value::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_void(&self) -> bool {
        matches!(self, Value::Void)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Void, Value::Void) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int32(a), Value::Int32(b)) => a == b,
            (Value::Int64(a), Value::Int64(b)) => a == b,
            (Value::Float64(a), Value::Float64(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Type(a), Value::Type(b)) => a == b,
            (Value::Promise(a), Value::Promise(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Void => f.write_str("void"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int32(i) => write!(f, "{i}"),
            Value::Int64(i) => write!(f, "{i}i64"),
            Value::Float64(x) => {
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{:.1}", x.0)
                } else {
                    write!(f, "{}", x.0)
                }
            }
            Value::Str(s) => write!(f, "{s:?}"),
            Value::Function(func) => write!(f, "fn {}", func.name()),
            Value::Type(t) => write!(f, "type({t})"),
            Value::Promise(id) => write!(f, "promise#{}", id.0),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int32(i)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int64(i)
    }
}

impl From<f64> for Value {
    fn from(x: f64) -> Self {
        Value::float(x)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::str(s)
    }
}

// ============================================================================
// Failure
// ============================================================================

/// Why an interpretation failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailKind {
    TypeMismatch,
    NoOverload,
    AmbiguousOverload,
    DivisionByZero,
    NotCallable,
    WrongArity,
    EvaporatedBinding,
    Uninitialized,
    AssignToImmutable,
    UnresolvedName,
    MissingResolver,
    AwaitNotAllowed,
    Cancelled,
    StepQuotaExceeded,
    /// Script calls nested deeper than the interpreter allows.
    StackOverflow,
    /// Raised by script code, e.g. a `match` with no matching arm.
    Raised,
}

/// Details of a failure that have not been reported yet.
#[derive(Debug, Clone, PartialEq)]
pub struct FailInfo {
    pub kind: FailKind,
    pub message: String,
    pub span: Span,
}

/// Structured failure marker.
///
/// A failure with `info: None` is a bubble: it was already reported and is
/// only being propagated.
#[derive(Debug, Clone, PartialEq)]
pub struct Fail {
    pub info: Option<FailInfo>,
}

impl Fail {
    pub fn new(kind: FailKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            info: Some(FailInfo {
                kind,
                message: message.into(),
                span,
            }),
        }
    }

    pub fn bubble() -> Self {
        Self { info: None }
    }

    pub fn is_bubble(&self) -> bool {
        self.info.is_none()
    }

    pub fn kind(&self) -> Option<FailKind> {
        self.info.as_ref().map(|info| info.kind)
    }

    /// The diagnostic to log for this failure; bubbles log nothing.
    pub fn to_diagnostic(&self) -> Option<Diagnostic> {
        self.info
            .as_ref()
            .map(|info| Diagnostic::new(Level::Error, info.message.clone()).at(info.span))
    }
}

impl From<ReadinessError> for Fail {
    fn from(err: ReadinessError) -> Self {
        let kind = match err {
            ReadinessError::Evaporated { .. } => FailKind::EvaporatedBinding,
            ReadinessError::Unready { .. } => FailKind::Uninitialized,
        };
        let span = err.span();
        Fail::new(kind, err.to_string(), span)
    }
}

impl fmt::Display for Fail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.info {
            Some(info) => write!(f, "fail({:?} at {}: {})", info.kind, info.span, info.message),
            None => f.write_str("bubble"),
        }
    }
}

/// Outcome of evaluating one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum PartialResult {
    Value(Value),
    /// Partial evaluation could not compute this yet.
    NotYet,
    Fail(Fail),
}

impl PartialResult {
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            PartialResult::Value(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_result(self) -> Result<Value, Fail> {
        match self {
            PartialResult::Value(v) => Ok(v),
            PartialResult::NotYet => Ok(Value::Void),
            PartialResult::Fail(f) => Err(f),
        }
    }
}

impl From<Value> for PartialResult {
    fn from(v: Value) -> Self {
        PartialResult::Value(v)
    }
}

impl From<Fail> for PartialResult {
    fn from(f: Fail) -> Self {
        PartialResult::Fail(f)
    }
}
