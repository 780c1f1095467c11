use criterion::*;
use std::hint::black_box;

use packed_ecs::Ecs;

mod common;
use common::*;

fn spawn_benchmark(c: &mut Criterion) {
    init_components();

    let mut group = c.benchmark_group("spawn");
    group.sample_size(20);

    group.bench_function("spawn_100k", |b| {
        b.iter(|| {
            let ecs = Ecs::new(1);
            let ty = movable_type(&ecs);
            for _ in 0..AGENTS_MED {
                black_box(ecs.create_entity(&ty, 0));
            }
            black_box(ecs.entity_count())
        })
    });

    group.bench_function("spawn_and_compact_10k", |b| {
        b.iter(|| {
            let ecs = Ecs::new(1);
            let ty = movable_type(&ecs);
            for _ in 0..AGENTS_SMALL {
                black_box(ecs.create_entity(&ty, 0));
            }
            ecs.update();
            black_box(ecs.entity_count())
        })
    });

    group.finish();
}

criterion_group!(benches, spawn_benchmark);
criterion_main!(benches);
