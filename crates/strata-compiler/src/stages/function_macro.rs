//! Macros that need type information: `comptime(...)` calls are folded into
//! values. Bindings made here are transient.

use strata_core::Stage;
use strata_interp::Mode;

use crate::runner::InterpretiveStage;

pub(crate) struct FunctionMacro;

impl InterpretiveStage for FunctionMacro {
    const STAGE: Stage = Stage::FunctionMacro;
    const MODE: Mode = Mode::Partial;
}
