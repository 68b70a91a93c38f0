//! Strata core types.
//!
//! Shared by every other strata crate:
//! - [`Span`], the unified error hierarchy and diagnostic sinks
//! - [`Stage`], the ordered compilation phases
//! - [`Readiness`] and binding lifespans
//! - runtime [`Value`] / [`Fail`] / [`PartialResult`]
//! - [`TypeShape`] and deterministic [`TypeHash`] identity
//! - module, binding and export names

pub mod diagnostics;
pub mod error;
pub mod names;
pub mod readiness;
pub mod span;
pub mod stage;
pub mod type_hash;
pub mod type_shape;
pub mod value;

pub use diagnostics::{Diagnostic, Diagnostics, Level, LogSink, NullLogSink, TracingLogSink};
pub use error::{
    AdvanceError, ImportError, LexError, ParseError, ParseErrorKind, ReadinessError, StrataError,
};
pub use names::{BindingId, BindingIdAllocator, ExportedName, ModuleName};
pub use readiness::{Binding, Lifespan, Readiness, ReadinessClock};
pub use span::Span;
pub use stage::Stage;
pub use type_hash::TypeHash;
pub use type_shape::{FunctionShape, PrimitiveKind, TypeShape};
pub use value::{Callable, Fail, FailInfo, FailKind, PartialResult, PromiseId, Value};
