//! Staged compilation of a set of modules.
//!
//! Each module walks the fixed sequence of [`Stage`](strata_core::Stage)s
//! under the control of a [`ModuleAdvancer`]. Three stages run the embedded
//! interpreter against the tree (FunctionMacro, Export and Run); between
//! them, hoisting moves finalized declarations ahead of the code that reads
//! them.
//!
//! ```ignore
//! let cx = StagingContext::new(StagingConfig::new())?;
//! let mut advancer = ModuleAdvancer::new(&cx);
//! advancer.add_module("lib", ["export let answer = 42;"])?;
//! advancer.add_module("app", ["import answer from \"lib\"; answer"])?;
//! let summary = advancer.advance_all()?;
//! ```

pub mod advancer;
pub mod backend;
pub mod config;
pub mod hoist;
pub mod imports;
pub mod log;
pub mod module;
pub mod outputs;
mod runner;
pub mod snapshot;
mod stages;
pub mod trace;

pub use advancer::{AdvanceSummary, ModuleAdvancer, ModuleStatus};
pub use backend::{CodeGenerator, GenerateError, GeneratedFile, TreeDumpBackend};
pub use config::{StagingConfig, StagingContext};
pub use hoist::hoist;
pub use imports::{ImportResolver, ModuleNameResolver};
pub use log::ModuleLog;
pub use module::{ImportRecord, Module};
pub use outputs::{Export, Exports, StageOutputs};
pub use snapshot::{NoopSnapshotSink, RecordingSnapshotSink, SnapshotKey, SnapshotPhase, SnapshotSink};
pub use trace::{OrderingTrace, TraceEvent, TraceKind};
