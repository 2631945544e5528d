use criterion::{Criterion, black_box, criterion_group, criterion_main};
use ndarray::Array1;
use stemma::{DemographicSchedule, kin_stable_from_schedule};

/// A smooth synthetic single-year schedule: survival easing off with age,
/// fertility concentrated around the late twenties.
fn synthetic_schedule(a: usize) -> DemographicSchedule {
    let age = Array1::from_iter(0..a as i64);
    let px = Array1::from_shape_fn(a, |i| {
        let x = i as f64 / a as f64;
        (0.999 - 0.9 * x.powi(4)).clamp(0.0, 1.0)
    });
    let fx = Array1::from_shape_fn(a, |i| {
        let centred = (i as f64 - 28.0) / 6.0;
        1e-6 + 0.14 * (-0.5 * centred * centred).exp()
    });
    DemographicSchedule::new(age, px, fx, 1.0 / 2.04).expect("valid synthetic schedule")
}

fn bench_full_pipeline(c: &mut Criterion) {
    let schedule = synthetic_schedule(111);
    c.bench_function("kin_stable_111_age_classes", |b| {
        b.iter(|| kin_stable_from_schedule(black_box(&schedule), true).expect("pipeline succeeds"))
    });
}

criterion_group!(benches, bench_full_pipeline);
criterion_main!(benches);
