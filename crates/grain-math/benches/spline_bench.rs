use criterion::{criterion_group, criterion_main, Criterion};
use grain_math::spline::MonotoneSpline;
use std::hint::black_box;

fn bench_spline_eval(c: &mut Criterion) {
    let x: Vec<f64> = (0..200).map(|i| -4.6 + 0.125 * i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| 4.0 * v - 0.3 * v.sin()).collect();
    let spline = MonotoneSpline::new(&x, &y).unwrap();

    c.bench_function("monotone_spline_eval_200", |b| {
        b.iter(|| {
            let mut acc = 0.0;
            for k in 0..1000 {
                acc += spline.eval(black_box(-4.0 + 0.02 * k as f64));
            }
            black_box(acc)
        })
    });
}

fn bench_spline_fit(c: &mut Criterion) {
    let x: Vec<f64> = (0..200).map(|i| i as f64).collect();
    let y: Vec<f64> = x.iter().map(|v| v.sqrt()).collect();

    c.bench_function("monotone_spline_fit_200", |b| {
        b.iter(|| black_box(MonotoneSpline::new(black_box(&x), black_box(&y)).unwrap()))
    });
}

criterion_group!(benches, bench_spline_eval, bench_spline_fit);
criterion_main!(benches);
