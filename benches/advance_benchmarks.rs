//! Benchmarks for advancing module sets through every stage.
//!
//! - Single modules of growing size
//! - Import chains, which serialize on the export gate
//! - Wide sets of independent modules, serial against the rayon pool
//!
//! ## Profiling with Puffin
//!
//! ```bash
//! cargo bench --bench advance_benchmarks --features profile-with-puffin
//! ```

use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;

use strata::prelude::*;

#[cfg(feature = "profile-with-puffin")]
static FRAME_VIEW: std::sync::OnceLock<puffin::GlobalFrameView> = std::sync::OnceLock::new();

#[cfg(feature = "profile-with-puffin")]
fn setup_profiler() {
    puffin::set_scopes_on(true);
    FRAME_VIEW.get_or_init(puffin::GlobalFrameView::default);
}

#[cfg(not(feature = "profile-with-puffin"))]
fn setup_profiler() {}

#[cfg(feature = "profile-with-puffin")]
fn end_profiling_frame() {
    puffin::GlobalProfiler::lock().new_frame();
}

#[cfg(not(feature = "profile-with-puffin"))]
fn end_profiling_frame() {}

/// A module with `functions` mutually visible functions and a comptime fold each.
fn module_source(functions: usize) -> String {
    let mut source = String::new();
    for i in 0..functions {
        let next = (i + 1) % functions;
        source.push_str(&format!(
            "fn f{i}(n: Int32) -> Int32 {{ if (n <= 0) {{ {i} }} else {{ f{next}(n - 1) }} }}\n\
             let c{i} = comptime(f{i}(3) * 2);\n"
        ));
    }
    source.push_str("c0 + f0(10)\n");
    source
}

fn advance(config: &StagingConfig, modules: &[(String, String)]) -> AdvanceSummary {
    let cx = StagingContext::new(config.clone()).unwrap();
    let mut advancer = ModuleAdvancer::new(&cx);
    for (name, source) in modules {
        advancer.add_module(name.as_str(), [source.as_str()]).unwrap();
    }
    let summary = advancer.advance_all().unwrap();
    end_profiling_frame();
    summary
}

fn module_sizes(c: &mut Criterion) {
    setup_profiler();
    let config = StagingConfig::new().with_parallel(false);
    let mut group = c.benchmark_group("advance/module_size");

    for functions in [1, 10, 100] {
        let modules = vec![("main".to_string(), module_source(functions))];
        group.throughput(Throughput::Bytes(modules[0].1.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(functions), &modules, |b, modules| {
            b.iter(|| black_box(advance(&config, black_box(modules))));
        });
    }
    group.finish();
}

fn import_chains(c: &mut Criterion) {
    setup_profiler();
    let config = StagingConfig::new();
    let mut group = c.benchmark_group("advance/import_chain");

    for length in [2, 8, 32] {
        let modules: Vec<(String, String)> = (0..length)
            .map(|i| {
                let source = if i == 0 {
                    "export let v0 = 1;".to_string()
                } else {
                    let prev = i - 1;
                    format!("import v{prev} from \"m{prev}\"; export let v{i} = comptime(v{prev} + 1);")
                };
                (format!("m{i}"), source)
            })
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(length), &modules, |b, modules| {
            b.iter(|| black_box(advance(&config, black_box(modules))));
        });
    }
    group.finish();
}

fn independent_modules(c: &mut Criterion) {
    setup_profiler();
    let mut group = c.benchmark_group("advance/independent");
    let modules: Vec<(String, String)> = (0..32)
        .map(|i| (format!("m{i}"), module_source(8)))
        .collect();

    for parallel in [false, true] {
        let config = StagingConfig::new().with_parallel(parallel);
        let label = if parallel { "parallel" } else { "serial" };
        group.bench_function(label, |b| {
            b.iter(|| black_box(advance(&config, black_box(&modules))));
        });
    }
    group.finish();
}

criterion_group!(benches, module_sizes, import_chains, independent_modules);
criterion_main!(benches);
