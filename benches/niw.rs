use criterion::{black_box, criterion_group, criterion_main, Criterion};
use matvariate::prelude::*;
use nalgebra::{DMatrix, DVector};

fn bench_niw_draw(c: &mut Criterion) {
    let niw = NormalInvWishart::new(
        DVector::zeros(10),
        1.0,
        12,
        DMatrix::identity(10, 10),
    )
    .unwrap();
    let mut rng = rand::thread_rng();
    c.bench_function("niw draw 10x10", |b| {
        b.iter(|| black_box(niw.draw(&mut rng)))
    });
}

fn bench_niw_ln_f(c: &mut Criterion) {
    let niw = NormalInvWishart::new(
        DVector::zeros(10),
        1.0,
        12,
        DMatrix::identity(10, 10),
    )
    .unwrap();
    let mut rng = rand::thread_rng();
    let x: MvGaussian = niw.draw(&mut rng);
    c.bench_function("niw ln_f 10x10", |b| {
        b.iter(|| black_box(niw.ln_f(&x)))
    });
}

criterion_group!(benches, bench_niw_draw, bench_niw_ln_f);
criterion_main!(benches);
