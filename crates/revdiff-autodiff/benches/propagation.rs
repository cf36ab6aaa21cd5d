//! Benchmarks for the reverse pass: recursive vs topological, with and
//! without chain flattening.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use revdiff_autodiff::prelude::*;

/// Sum of `n` shared quadratic terms: a long left-leaning chain.
fn chain(xs: &[Variable<f64>]) -> Expr<f64> {
    xs[1..]
        .iter()
        .fold(xs[0].expr().clone(), |acc, x| acc + x * sin(x))
}

fn bench_strategies(c: &mut Criterion) {
    let mut group = c.benchmark_group("propagation");

    for &n in &[16usize, 128, 1024] {
        let xs: Vec<_> = (0..n).map(|i| Variable::new(0.001 * i as f64)).collect();
        let refs: Vec<&Variable<f64>> = xs.iter().collect();
        let s = chain(&xs);
        // Reconverging graph: every term is reached twice.
        let y = &s * &s;

        let recursive = PropagationConfig::default();
        group.bench_with_input(BenchmarkId::new("recursive", n), &n, |b, _| {
            b.iter(|| black_box(derivatives_dyn(&y, &refs, &recursive)));
        });

        let topological = PropagationConfig::builder()
            .strategy(PropagationStrategy::Topological)
            .build();
        group.bench_with_input(BenchmarkId::new("topological", n), &n, |b, _| {
            b.iter(|| black_box(derivatives_dyn(&y, &refs, &topological)));
        });

        let flattened = chain(&xs);
        let flattened = flattened.rewrite().unwrap_or(flattened);
        let y = &flattened * &flattened;
        group.bench_with_input(BenchmarkId::new("rewritten_topological", n), &n, |b, _| {
            b.iter(|| black_box(derivatives_dyn(&y, &refs, &topological)));
        });
    }

    group.finish();
}

fn bench_symbolic(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbolic");

    for &n in &[4usize, 16, 64] {
        let xs: Vec<_> = (0..n).map(|i| Variable::new(0.1 + 0.01 * i as f64)).collect();
        let y = exp(&chain(&xs));

        group.bench_with_input(BenchmarkId::new("hessian", n), &n, |b, _| {
            b.iter(|| black_box(hessian(&y, &xs)));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_strategies, bench_symbolic);
criterion_main!(benches);
