use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use lazytaylor::{Expansion, TaylorVar};

fn composite(x: &TaylorVar<f64>) -> TaylorVar<f64> {
    (x.sin() * x.exp() + x.square()).sqrt() / (x.atan() + 2.0)
}

fn bench_fresh_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("fresh_expansion");
    for order in [4, 16, 64] {
        group.bench_with_input(BenchmarkId::new("composite", order), &order, |b, &order| {
            b.iter(|| {
                let x = TaylorVar::variable(black_box(0.7));
                black_box(composite(&x).coefficients(order))
            })
        });
        group.bench_with_input(BenchmarkId::new("powi_7", order), &order, |b, &order| {
            b.iter(|| {
                let x = TaylorVar::variable(black_box(0.7));
                black_box(x.powi(7).coefficients(order))
            })
        });
        group.bench_with_input(BenchmarkId::new("x_pow_x", order), &order, |b, &order| {
            b.iter(|| {
                let x = TaylorVar::variable(black_box(1.3));
                black_box(x.powf(&x).coefficients(order))
            })
        });
    }
    group.finish();
}

fn bench_recorded_expansion(c: &mut Criterion) {
    let mut group = c.benchmark_group("recorded_expansion");
    for order in [4, 16, 64] {
        let expansion = Expansion::record(composite, 0.7);
        group.bench_with_input(BenchmarkId::new("composite", order), &order, |b, &order| {
            b.iter(|| black_box(expansion.coefficients_at(black_box(0.7), order)))
        });
    }
    group.finish();
}

fn bench_incremental(c: &mut Criterion) {
    let mut group = c.benchmark_group("incremental");
    // Extend an already evaluated series by one order at a time.
    group.bench_function("composite_order_by_order_32", |b| {
        b.iter(|| {
            let x = TaylorVar::variable(black_box(0.7));
            let y = composite(&x);
            for order in 0..=32 {
                black_box(y.evaluate(order).ok());
            }
        })
    });
    group.finish();
}

fn bench_deep_chain(c: &mut Criterion) {
    let mut group = c.benchmark_group("deep_chain");
    for depth in [10, 100, 1000] {
        group.bench_with_input(BenchmarkId::new("sin_chain", depth), &depth, |b, &depth| {
            b.iter(|| {
                let x = TaylorVar::variable(black_box(0.1));
                let mut y = x.clone();
                for _ in 0..depth {
                    y = y.sin();
                }
                black_box(y.coefficients(8))
            })
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_fresh_expansion,
    bench_recorded_expansion,
    bench_incremental,
    bench_deep_chain
);
criterion_main!(benches);
