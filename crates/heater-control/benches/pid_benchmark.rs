use criterion::{black_box, criterion_group, criterion_main, Criterion};
use fixed_time::Fixed1616;
use heater_control::{FixedPid, HeaterController};

fn bench_pid_update(c: &mut Criterion) {
    let mut pid = FixedPid::new(Fixed1616::from_f32(10.0), Fixed1616::from_f32(0.1), Fixed1616::from_f32(5.0), Fixed1616::ONE);
    let dt = Fixed1616::from_f32(0.5);
    c.bench_function("fixed_pid_update", |b| {
        b.iter(|| black_box(pid.update(black_box(Fixed1616::from_f32(12.5)), black_box(dt))))
    });
}

criterion_group!(benches, bench_pid_update);
criterion_main!(benches);
