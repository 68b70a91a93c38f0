//! Staged compilation core.
//!
//! A build is a set of modules that advance through twelve fixed stages,
//! three of which run an embedded interpreter over the tree. This crate
//! re-exports the workspace crates:
//!
//! - [`core`]: stages, readiness, values, diagnostics and errors
//! - [`parser`]: lexer and AST for the surface language
//! - [`registry`]: decision trees, overload dispatch, the module graph
//! - [`builtins`]: the standard overloaded operations
//! - [`interp`]: the interpreter contract and tree-walking implementation
//! - [`compiler`]: modules, stage processors, hoisting and the advancer
//!
//! ```ignore
//! use strata::prelude::*;
//!
//! let cx = StagingContext::new(StagingConfig::new())?;
//! let mut advancer = ModuleAdvancer::new(&cx);
//! advancer.add_module("lib", ["export fn double(n) { n * 2 }"])?;
//! advancer.add_module("app", ["import double from \"lib\"; double(21)"])?;
//! let summary = advancer.advance_all()?;
//! assert!(summary.is_ok());
//! ```

pub use strata_builtins as builtins;
pub use strata_compiler as compiler;
pub use strata_core as core;
pub use strata_interp as interp;
pub use strata_parser as parser;
pub use strata_registry as registry;

pub mod prelude {
    pub use strata_compiler::{
        AdvanceSummary, CodeGenerator, Export, GeneratedFile, Module, ModuleAdvancer,
        ModuleStatus, StageOutputs, StagingConfig, StagingContext, TraceKind, TreeDumpBackend,
    };
    pub use strata_core::{
        AdvanceError, Diagnostic, Diagnostics, Level, LogSink, ModuleName, PartialResult,
        Readiness, Stage, StrataError, TypeShape, Value,
    };
    pub use strata_interp::{Capabilities, HostFunction, Mode, Resolvers};
}
