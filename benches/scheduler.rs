use costack::Scheduler;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

fn switch_round_trip(c: &mut Criterion) {
    let mut sched = Scheduler::new();
    let id = sched.spawn(|yielder| loop {
        yielder.suspend()
    });

    c.bench_function("switch_round_trip", |b| {
        b.iter(|| sched.resume(black_box(id)))
    });
}

fn spawn_to_completion(c: &mut Criterion) {
    let mut sched = Scheduler::new();

    c.bench_function("spawn_to_completion", |b| {
        b.iter(|| {
            let id = sched.spawn(|_| {});
            sched.resume(id);
        })
    });
}

criterion_group!(benches, switch_round_trip, spawn_to_completion);
criterion_main!(benches);
