//! Benchmarks for decision-tree construction and overload dispatch.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use strata::core::TypeShape;
use strata::registry::build_decision_tree;

/// Words of `len` letters over a small alphabet, switched on by character position.
fn words(count: usize, len: usize) -> Vec<String> {
    (0..count)
        .map(|i| {
            let mut n = i;
            (0..len)
                .map(|_| {
                    let c = char::from(b'a' + (n % 7) as u8);
                    n /= 7;
                    c
                })
                .collect()
        })
        .collect()
}

fn construction(c: &mut Criterion) {
    let mut group = c.benchmark_group("decision_tree/build");
    for count in [16, 256, 2048] {
        let cases = words(count, 6);
        group.bench_with_input(BenchmarkId::new("switch_on_chars", count), &cases, |b, cases| {
            b.iter(|| {
                let tree = build_decision_tree(
                    black_box(cases.clone()),
                    (0..6).collect::<Vec<usize>>(),
                    |case: &String, &index| case.chars().nth(index).into_iter().collect::<Vec<_>>(),
                );
                black_box(tree.depth())
            });
        });
    }

    // Every case lists several categories, which duplicates it across buckets.
    let cases: Vec<u32> = (0..512).collect();
    group.bench_function("ambiguous_categories", |b| {
        b.iter(|| {
            let tree = build_decision_tree(
                black_box(cases.clone()),
                vec![3u32, 5, 7, 11],
                |case, &modulus| vec![case % modulus, (case + 1) % modulus],
            );
            black_box(tree.leaves().len())
        });
    });
    group.finish();
}

fn dispatch(c: &mut Criterion) {
    let builtins = strata::builtins::standard().unwrap();
    let mut group = c.benchmark_group("decision_tree/dispatch");

    let inputs = [
        ("int32_add", "+", vec![TypeShape::INT32, TypeShape::INT32]),
        ("float_compare", "<", vec![TypeShape::FLOAT64, TypeShape::FLOAT64]),
        ("string_concat", "+", vec![TypeShape::STRING, TypeShape::STRING]),
        ("to_string_any", "toString", vec![TypeShape::INT64]),
    ];
    for (label, name, args) in &inputs {
        group.bench_function(*label, |b| {
            b.iter(|| black_box(builtins.dispatch(black_box(name), black_box(args)).is_ok()));
        });
    }
    group.finish();
}

criterion_group!(benches, construction, dispatch);
criterion_main!(benches);
