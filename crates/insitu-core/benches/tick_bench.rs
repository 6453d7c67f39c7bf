//! Criterion benchmarks for the In Situ production pass.
//!
//! Two benchmark groups:
//! - `sample_economy`: the built-in sample catalog with extra machines bought
//! - `contention`: many converters draining one shared input

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use insitu_core::format::format_amount;
use insitu_core::session::Session;
use insitu_core::test_utils::*;

fn sample_with_machines(extra_miners: usize) -> Session {
    let mut session = sample_session();
    let cat = session.catalog_handle();
    let iron = resource(&cat, "iron");
    let miner = machine_type(&cat, "miner");
    for _ in 0..extra_miners {
        session.harvest(iron, 20.0);
        let _ = session.build(miner);
    }
    activate_all(&mut session);
    session
}

fn bench_sample_economy(c: &mut Criterion) {
    let mut group = c.benchmark_group("sample_economy");

    for machines in [10usize, 100, 1000] {
        let mut session = sample_with_machines(machines);
        group.bench_function(format!("tick_{machines}_machines"), |b| {
            b.iter(|| session.tick(black_box(0.1)));
        });
    }

    let session = sample_with_machines(10);
    let ore = resource(session.catalog(), "iron_ore");
    group.bench_function("display_string", |b| {
        b.iter(|| session.display_string(black_box(ore)));
    });
    group.bench_function("format_amount", |b| {
        b.iter(|| format_amount(black_box(1_234_567.0), black_box("g")));
    });

    group.finish();
}

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contention");

    group.bench_function("starved_500_converters", |b| {
        b.iter_batched(
            || {
                let mut session = session_from(converter_catalog(1000.0, 10.0, 500));
                activate_all(&mut session);
                session
            },
            |mut session| {
                session.tick(1.0);
                session
            },
            criterion::BatchSize::LargeInput,
        );
    });

    group.finish();
}

criterion_group!(benches, bench_sample_economy, bench_contention);
criterion_main!(benches);
