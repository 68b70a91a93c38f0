//! Embedded interpreter for strata's interpretive stages.
//!
//! The compiler talks to the [`Interpreter`] trait; [`TreeWalker`] is the
//! implementation it ships with. An interpretation reads:
//!
//! - the tree and the module's top-level [`Environment`]
//! - a [`Mode`]: `Full` performs host effects, `Partial` folds `comptime`
//! - host [`Capabilities`] and [`Resolvers`] for `extern fn` declarations
//! - an optional caller-owned [`Promises`] registry
//! - a [`CancellationScope`] and a step quota
//!
//! and always answers with a typed [`PartialResult`](strata_core::PartialResult).

pub mod cancel;
pub mod closure;
pub mod environment;
mod eval;
pub mod host;
pub mod interpreter;
pub mod promises;
pub mod tree_walker;

pub use cancel::CancellationScope;
pub use closure::Closure;
pub use environment::{AssignError, Environment};
pub use host::{Capabilities, HostFunction, Intrinsic, Resolvers, SignatureResolver};
pub use interpreter::{InterpretOptions, InterpretRequest, Interpretation, Interpreter, Mode};
pub use promises::{PromiseState, Promises};
pub use tree_walker::TreeWalker;
