//! Native function plumbing shared by every builtin module.

use std::any::Any;
use std::sync::Arc;

use strata_core::{Callable, FailKind, TypeShape, Value};
use strata_registry::OverloadRegistry;
use thiserror::Error;

/// Error raised by a native implementation. The interpreter attaches the
/// call-site span and reports it as a `Fail`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct NativeError {
    pub kind: FailKind,
    pub message: String,
}

impl NativeError {
    pub fn new(kind: FailKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn type_mismatch(expected: &str, found: &Value) -> Self {
        Self::new(
            FailKind::TypeMismatch,
            format!("expected {expected}, found {}", found.shape()),
        )
    }

    pub fn division_by_zero() -> Self {
        Self::new(FailKind::DivisionByZero, "division by zero")
    }
}

pub type NativeResult = Result<Value, NativeError>;

/// Implementation of one builtin overload.
pub type NativeFn = fn(&[Value]) -> NativeResult;

/// Registry of builtin operations.
pub type Builtins = OverloadRegistry<NativeFn>;

/// A builtin operation used as a first-class function value.
///
/// Calling it dispatches on the runtime shapes of the arguments.
#[derive(Debug, Clone)]
pub struct BuiltinFunction {
    name: Arc<str>,
    shape: TypeShape,
}

impl BuiltinFunction {
    /// Function value for `name`, if the registry has it. The static shape
    /// is the signature when there is a single overload and `Any` otherwise.
    pub fn lookup(builtins: &Builtins, name: &str) -> Option<Self> {
        let shape = match builtins.overloads(name) {
            [] => return None,
            [only] => only.signature.shape(),
            _ => TypeShape::Any,
        };
        Some(Self {
            name: Arc::from(name),
            shape,
        })
    }

    /// Invoke through `builtins`.
    pub fn call(&self, builtins: &Builtins, args: &[Value]) -> NativeResult {
        call(builtins, &self.name, args)
    }
}

impl Callable for BuiltinFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn shape(&self) -> TypeShape {
        self.shape.clone()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Dispatch `name` on the runtime shapes of `args` and invoke the chosen overload.
pub fn call(builtins: &Builtins, name: &str, args: &[Value]) -> NativeResult {
    let shapes: Vec<TypeShape> = args.iter().map(Value::shape).collect();
    let overload = builtins.dispatch(name, &shapes).map_err(|e| {
        let kind = match e {
            strata_registry::DispatchError::Ambiguous { .. } => FailKind::AmbiguousOverload,
            _ => FailKind::NoOverload,
        };
        NativeError::new(kind, e.to_string())
    })?;
    (overload.implementation)(args)
}

// =========================================
// Argument access
// =========================================

pub(crate) fn arg(args: &[Value], index: usize) -> Result<&Value, NativeError> {
    args.get(index).ok_or_else(|| {
        NativeError::new(
            FailKind::WrongArity,
            format!("missing argument {index}"),
        )
    })
}

pub(crate) fn int32(args: &[Value], index: usize) -> Result<i32, NativeError> {
    match arg(args, index)? {
        Value::Int32(v) => Ok(*v),
        other => Err(NativeError::type_mismatch("Int32", other)),
    }
}

pub(crate) fn int64(args: &[Value], index: usize) -> Result<i64, NativeError> {
    match arg(args, index)? {
        Value::Int64(v) => Ok(*v),
        other => Err(NativeError::type_mismatch("Int64", other)),
    }
}

pub(crate) fn float64(args: &[Value], index: usize) -> Result<f64, NativeError> {
    match arg(args, index)? {
        Value::Float64(v) => Ok(v.into_inner()),
        other => Err(NativeError::type_mismatch("Float64", other)),
    }
}

pub(crate) fn boolean(args: &[Value], index: usize) -> Result<bool, NativeError> {
    match arg(args, index)? {
        Value::Bool(v) => Ok(*v),
        other => Err(NativeError::type_mismatch("Bool", other)),
    }
}

pub(crate) fn string(args: &[Value], index: usize) -> Result<&str, NativeError> {
    match arg(args, index)? {
        Value::Str(v) => Ok(v),
        other => Err(NativeError::type_mismatch("String", other)),
    }
}
