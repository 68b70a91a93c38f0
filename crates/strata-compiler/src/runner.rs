//! Protocol shared by the stages that execute the tree.
//!
//! 1. snapshot the tree (before)
//! 2. interpret it against the module's top-level environment
//! 3. close the readiness window
//! 4. hoist whatever the interpretation left to finalize
//! 5. snapshot the tree (after)
//! 6. let the stage publish, then assemble its [`StageOutputs`]

use strata_core::{Fail, LogSink, PartialResult, ReadinessClock, Stage};
use strata_interp::{InterpretRequest, Mode};

use crate::hoist::hoist;
use crate::module::Module;
use crate::outputs::StageOutputs;
use crate::snapshot::{SnapshotKey, SnapshotPhase};
use crate::stages::StepContext;

/// A stage that runs the interpreter over the module.
pub(crate) trait InterpretiveStage {
    const STAGE: Stage;
    const MODE: Mode;

    /// Runs after hoisting, before the outputs are assembled.
    fn publish(_module: &mut Module, _step: &StepContext<'_>, _result: &PartialResult) {}
}

#[cfg_attr(feature = "profiling", profiling::function)]
pub(crate) fn interpret<S: InterpretiveStage>(module: &mut Module, step: &StepContext<'_>) {
    let cx = step.cx;
    snapshot(module, step, S::STAGE, SnapshotPhase::Before);

    let mut clock = ReadinessClock::new(S::STAGE);
    let interpretation = cx.interpreter.interpret(InterpretRequest {
        root: &mut module.tree,
        env: &module.env,
        mode: S::MODE,
        clock: &clock,
        builtins: &cx.builtins,
        capabilities: &cx.capabilities,
        resolvers: &cx.resolvers,
        promises: None,
        cancel: &cx.cancel,
        log: step.log,
        options: cx.config.interpret_options(S::STAGE),
    });
    clock.checkpoint();

    let moved = hoist(&mut module.tree);
    snapshot(module, step, S::STAGE, SnapshotPhase::After);

    let result = match interpretation.result {
        PartialResult::Fail(fail) => {
            if let Some(diagnostic) = fail.to_diagnostic() {
                step.log.log(diagnostic);
            }
            module.fail();
            PartialResult::Fail(Fail::bubble())
        }
        other => other,
    };
    tracing::debug!(
        module = %module.name(),
        stage = %S::STAGE,
        steps = interpretation.steps,
        moved,
        ok = !module.is_failed(),
        "interpretation finished"
    );

    S::publish(module, step, &result);
    module.outputs = Some(StageOutputs {
        stage: S::STAGE,
        root: module.tree.clone(),
        result,
        exports: module.exports.clone(),
        declared_types: module.declared_types.clone(),
    });
}

fn snapshot(module: &Module, step: &StepContext<'_>, stage: Stage, phase: SnapshotPhase) {
    if !step.cx.snapshots_enabled() {
        return;
    }
    let key = SnapshotKey::new(module.name().clone(), stage, phase);
    step.cx.snapshots.record(key, &|| module.tree.to_string());
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_core::{Lifespan, PartialResult, Readiness, ReadinessClock, Stage, Value};

    use crate::snapshot::{RecordingSnapshotSink, SnapshotKey, SnapshotPhase};
    use crate::stages::testing::Bench;

    #[test]
    fn outputs_carry_the_result_and_tree() {
        let bench = Bench::new();
        let mut module = bench.module("let x = comptime(2 * 21); x");
        assert!(bench.advance_through(&mut module, Stage::FunctionMacro), "{:?}", bench.errors());

        let outputs = module.outputs().unwrap();
        assert_eq!(outputs.stage, Stage::FunctionMacro);
        assert!(outputs.is_ok());
        assert_eq!(outputs.root.to_string(), "(block (let x#0 42) x#0)");
        assert_eq!(outputs.result, PartialResult::Value(Value::Int32(42)));
    }

    #[test]
    fn failures_are_logged_once_and_bubble() {
        let bench = Bench::new();
        let mut module = bench.module("let x = comptime(1 / 0);");
        assert!(!bench.advance_through(&mut module, Stage::FunctionMacro));
        assert_eq!(bench.errors().len(), 1, "{:?}", bench.errors());

        let outputs = module.outputs().unwrap();
        assert!(!outputs.is_ok());
        assert!(matches!(&outputs.result, PartialResult::Fail(fail) if fail.is_bubble()));
    }

    #[test]
    fn macro_time_bindings_evaporate_before_export() {
        let bench = Bench::new();
        let mut module = bench.module("let x = 1; x");
        assert!(bench.advance_through(&mut module, Stage::FunctionMacro));

        let x = module.tree().find_decl("x").and_then(|d| d.name.binding).unwrap();
        let made = module.env().lookup(x).unwrap();
        assert!(matches!(
            made.lifespan,
            Lifespan::Transient { stage: Stage::FunctionMacro, .. }
        ));
        assert_eq!(
            ReadinessClock::new(Stage::Export).readiness(made.lifespan, true),
            Readiness::Evaporated
        );

        assert!(bench.advance_through(&mut module, Stage::Export), "{:?}", bench.errors());
        assert_eq!(module.env().lookup(x).unwrap().lifespan, Lifespan::Durable);
    }

    #[test]
    fn snapshots_bracket_each_interpretation() {
        let sink = Arc::new(RecordingSnapshotSink::new());
        let snapshots = sink.clone();
        let bench = Bench::with_context(move |cx| {
            let mut cx = cx.with_snapshots(snapshots);
            cx.config.snapshots_enabled = true;
            cx
        });
        let mut module = bench.module("let x = comptime(1 + 1);");
        assert!(bench.advance_through(&mut module, Stage::FunctionMacro));

        let key = |phase| SnapshotKey::new(module.name().clone(), Stage::FunctionMacro, phase);
        assert_eq!(
            sink.get(&key(SnapshotPhase::Before)).as_deref(),
            Some("(block (let x#0 (comptime (+ 1 1))))")
        );
        assert_eq!(
            sink.get(&key(SnapshotPhase::After)).as_deref(),
            Some("(block (let x#0 2))")
        );
        assert_eq!(sink.len(), 2);
    }
}
