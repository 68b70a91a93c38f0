//! Evaluate the finished module with effects.

use strata_core::{PartialResult, Stage};
use strata_interp::Mode;

use super::StepContext;
use crate::module::Module;
use crate::runner::InterpretiveStage;

pub(crate) struct Run;

impl InterpretiveStage for Run {
    const STAGE: Stage = Stage::Run;
    const MODE: Mode = Mode::Full;

    fn publish(module: &mut Module, _step: &StepContext<'_>, result: &PartialResult) {
        module.run_result = Some(result.clone());
    }
}
