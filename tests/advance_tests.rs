//! Multi-module builds driven through the public advancer API.

use std::sync::Arc;

use parking_lot::Mutex;
use strata::compiler::{RecordingSnapshotSink, SnapshotKey, SnapshotPhase};
use strata::prelude::*;

struct Build {
    cx: StagingContext,
    diagnostics: Arc<Diagnostics>,
}

impl Build {
    fn new(config: StagingConfig) -> Self {
        Self::with(config, |cx| cx)
    }

    fn with(config: StagingConfig, configure: impl FnOnce(StagingContext) -> StagingContext) -> Self {
        let diagnostics = Arc::new(Diagnostics::new());
        let cx = StagingContext::new(config)
            .expect("standard builtins register")
            .with_log(diagnostics.clone());
        Self {
            cx: configure(cx),
            diagnostics,
        }
    }

    fn advancer(&self, modules: &[(&str, &str)]) -> ModuleAdvancer<'_> {
        let mut advancer = ModuleAdvancer::new(&self.cx);
        for (name, source) in modules {
            advancer.add_module(*name, [*source]).expect("unique module names");
        }
        advancer
    }
}

fn seq(summary: &AdvanceSummary, module: &str, stage: Stage, kind: TraceKind) -> u64 {
    summary
        .trace
        .iter()
        .find(|e| e.module.as_str() == module && e.stage == stage && e.kind == kind)
        .map(|e| e.seq)
        .unwrap_or_else(|| panic!("no {kind:?} event for {module} at {stage}"))
}

fn run_result<'a>(advancer: &'a ModuleAdvancer<'_>, module: &str) -> Option<&'a PartialResult> {
    advancer.module(module).and_then(Module::run_result)
}

// =========================================
// Ordering
// =========================================

#[test]
fn exports_are_observed_before_macro_time_use() {
    for parallel in [false, true] {
        let build = Build::new(StagingConfig::new().with_parallel(parallel));
        let mut advancer = build.advancer(&[
            ("M2", "import X from \"M1\"; let y = comptime(X * 2); y"),
            ("M1", "export let X = comptime(20 + 22);"),
        ]);
        let summary = advancer.advance_all().unwrap();
        assert!(summary.is_ok(), "{}", build.diagnostics);

        let exported = seq(&summary, "M1", Stage::Export, TraceKind::StageCompleted);
        let bound = seq(&summary, "M2", Stage::Disambiguate, TraceKind::StageStarted);
        let folded = seq(&summary, "M2", Stage::FunctionMacro, TraceKind::StageStarted);
        assert!(exported < bound);
        assert!(bound < folded);

        assert_eq!(
            run_result(&advancer, "M2"),
            Some(&PartialResult::Value(Value::Int32(84)))
        );
        let m1 = advancer.module("M1").unwrap();
        assert_eq!(m1.exports().len(), 1);
        assert_eq!(m1.exports()[0].value, Some(Value::Int32(42)));
    }
}

#[test]
fn independent_modules_need_no_ordering() {
    let build = Build::new(StagingConfig::new());
    let mut advancer = build.advancer(&[("a", "1 + 1"), ("b", "2 * 3")]);
    let summary = advancer.advance_all().unwrap();

    assert!(summary.is_ok());
    for module in ["a", "b"] {
        assert_eq!(summary.module(module).unwrap().stage, Some(Stage::Run));
    }
    // Every module started and finished all twelve stages.
    assert_eq!(summary.trace.len(), 2 * 2 * Stage::ALL.len());
}

#[test]
fn functions_cross_module_boundaries() {
    let build = Build::new(StagingConfig::new());
    let mut advancer = build.advancer(&[
        ("lib", "export fn double(n) { n * 2 } export type Count = Int32;"),
        ("app", "import double, Count from \"./lib\"; let n: Count = double(21); n"),
    ]);
    let summary = advancer.advance_all().unwrap();
    assert!(summary.is_ok(), "{}", build.diagnostics);
    assert_eq!(
        run_result(&advancer, "app"),
        Some(&PartialResult::Value(Value::Int32(42)))
    );
}

#[test]
fn parallel_and_serial_builds_agree() {
    let modules = [
        ("top", "import l, r from \"left\"; l + r"),
        ("left", "import base from \"base\"; export let l = base + 1; export let r = base + 2;"),
        ("right", "import base from \"base\"; export let unused = base;"),
        ("base", "export let base = 10;"),
    ];
    let outcome = |parallel: bool| {
        let build = Build::new(StagingConfig::new().with_parallel(parallel));
        let mut advancer = build.advancer(&modules);
        let summary = advancer.advance_all().unwrap();
        let results: Vec<_> = modules
            .iter()
            .map(|(name, _)| run_result(&advancer, name).cloned())
            .collect();
        (summary.modules, results)
    };
    let serial = outcome(false);
    assert_eq!(serial, outcome(true));
    assert_eq!(serial.1[0], Some(PartialResult::Value(Value::Int32(23))));
}

// =========================================
// Failures
// =========================================

#[test]
fn import_cycles_are_fatal() {
    let build = Build::new(StagingConfig::new());
    let mut advancer = build.advancer(&[
        ("b", "import a from \"a\"; export let b = a;"),
        ("a", "import b from \"b\"; export let a = b;"),
    ]);
    let error = advancer.advance_all().unwrap_err();
    assert_eq!(error.to_string(), "dependency cycle: a -> b -> a");

    let fatal: Vec<_> = build
        .diagnostics
        .all()
        .into_iter()
        .filter(|d| d.level == Level::Fatal)
        .collect();
    assert_eq!(fatal.len(), 1);
    assert_eq!(fatal[0].message, error.to_string());
}

#[test]
fn failed_dependencies_block_importers() {
    let build = Build::new(StagingConfig::new());
    let mut advancer = build.advancer(&[
        ("lib", "export let x: Bool = 1;"),
        ("app", "import x from \"lib\"; x"),
    ]);
    assert_eq!(
        advancer.advance_all().unwrap_err(),
        AdvanceError::PermanentlyBlocked {
            module: ModuleName::from("app"),
            dependency: ModuleName::from("lib"),
            gate: Stage::Export,
        }
    );
    let lib = advancer.module("lib").unwrap();
    assert!(lib.is_failed());
    assert_eq!(lib.stage(), Some(Stage::Define));
}

#[test]
fn stage_errors_do_not_stop_other_modules() {
    let build = Build::new(StagingConfig::new());
    let mut advancer = build.advancer(&[
        ("lib", "export let x = 1;"),
        ("typo", "import y from \"lib\"; y"),
        ("fine", "import x from \"lib\"; x + 1"),
    ]);
    let summary = advancer.advance_all().unwrap();

    assert!(!summary.is_ok());
    let typo = summary.module("typo").unwrap();
    assert_eq!((typo.stage, typo.ok), (Some(Stage::Import), false));
    assert_eq!(
        run_result(&advancer, "fine"),
        Some(&PartialResult::Value(Value::Int32(2)))
    );

    let errors = build.diagnostics.errors();
    assert_eq!(errors.len(), 1, "{}", build.diagnostics);
    assert_eq!(errors[0].module, Some(ModuleName::from("typo")));
    assert!(errors[0].message.contains("`y`"));
}

#[test]
fn runtime_failures_are_reported_at_run() {
    let zero = HostFunction::new("zero", TypeShape::function(vec![], TypeShape::INT32), |_| {
        Ok(Value::Int32(0))
    });
    let build = Build::with(StagingConfig::new(), |cx| {
        cx.with_capabilities(Capabilities::new().with("zero", Value::function(zero)))
    });
    let mut advancer = build.advancer(&[("m", "let d = zero(); 10 / d")]);
    let summary = advancer.advance_all().unwrap();

    let status = summary.module("m").unwrap();
    assert!(!status.ok);
    assert_eq!(status.stage, Some(Stage::GenerateCode));
    assert!(matches!(
        run_result(&advancer, "m"),
        Some(PartialResult::Fail(fail)) if fail.is_bubble()
    ));
    assert_eq!(build.diagnostics.error_count(), 1, "{}", build.diagnostics);
}

// =========================================
// Configuration
// =========================================

#[test]
fn per_module_limits_hold_back_only_their_module() {
    let config = StagingConfig::new().with_module_stop_before("slow", Stage::Type);
    let build = Build::new(config);
    let mut advancer = build.advancer(&[("slow", "1"), ("fast", "2")]);
    let summary = advancer.advance_all().unwrap();

    assert_eq!(summary.module("slow").unwrap().stage, Some(Stage::Define));
    assert_eq!(summary.module("fast").unwrap().stage, Some(Stage::Run));
}

#[test]
fn host_effects_happen_once_and_only_at_run() {
    let printed = Arc::new(Mutex::new(Vec::new()));
    let capabilities = {
        let printed = printed.clone();
        let print = HostFunction::new(
            "print",
            TypeShape::function(vec![TypeShape::Any], TypeShape::VOID),
            move |args| {
                printed.lock().push(args[0].to_string());
                Ok(Value::Void)
            },
        );
        Capabilities::new().with("print", Value::function(print))
    };

    for may_run in [false, true] {
        printed.lock().clear();
        let build = Build::with(StagingConfig::new().with_may_run(may_run), |cx| {
            cx.with_capabilities(capabilities.clone())
        });
        let mut advancer = build.advancer(&[("m", "let x = comptime(6 * 7); print(x);")]);
        advancer.advance_all().unwrap();

        let expected: Vec<String> = if may_run { vec!["42".into()] } else { Vec::new() };
        assert_eq!(*printed.lock(), expected);
    }
}

#[test]
fn snapshots_bracket_every_interpretive_stage() {
    let sink = Arc::new(RecordingSnapshotSink::new());
    let snapshots = sink.clone();
    let build = Build::with(StagingConfig::new().with_snapshots(true), |cx| {
        cx.with_snapshots(snapshots)
    });
    let mut advancer = build.advancer(&[("m", "let x = comptime(1 + 2); x")]);
    advancer.advance_all().unwrap();

    assert_eq!(sink.len(), 6);
    let before = SnapshotKey::new(ModuleName::from("m"), Stage::FunctionMacro, SnapshotPhase::Before);
    let after = SnapshotKey::new(ModuleName::from("m"), Stage::FunctionMacro, SnapshotPhase::After);
    assert!(sink.get(&before).unwrap().contains("(comptime (+ 1 2))"));
    assert!(sink.get(&after).unwrap().contains("(let x#0 3)"));
}

#[test]
fn tree_dumps_are_generated_for_finished_modules() {
    let build = Build::with(StagingConfig::new(), |cx| {
        cx.with_generator(Arc::new(TreeDumpBackend))
    });
    let mut advancer = build.advancer(&[("a", "fn f() { 1 } f()"), ("b", "comptime(2 + 2)")]);
    let summary = advancer.advance_all().unwrap();

    let files: Vec<_> = summary
        .generated
        .iter()
        .map(|f| (f.path.as_str(), f.contents.as_str()))
        .collect();
    assert_eq!(
        files,
        [
            ("a.tree", "(block (let f#0 (fn f () (block 1))) (call f#0))"),
            ("b.tree", "(block 4)"),
        ]
    );
}
