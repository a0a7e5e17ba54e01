//! Steady-state evaluation cost per tick.
//!
//! Run with: cargo bench

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use spriter_core::{read_document, Config, Engine};

fn bench_single(c: &mut Criterion) {
    let text = spriter_test_fixtures::documents::text("basic").expect("basic fixture");
    let doc = read_document(&text).expect("read basic");
    let walk = doc.animation("hero", "walk").expect("walk");
    let mut engine = Engine::new(Config::default());

    let mut group = c.benchmark_group("frame_step");
    group.throughput(Throughput::Elements(1));

    let mut t = 0.0f32;
    group.bench_function("evaluate_walk", |b| {
        b.iter(|| {
            t = (t + 16.0) % 1000.0;
            let frame = engine.evaluate(walk, black_box(t), 16.0).expect("evaluate");
            frame.sprites.len()
        })
    });

    group.finish();
}

fn bench_blended(c: &mut Criterion) {
    let text = spriter_test_fixtures::documents::text("basic").expect("basic fixture");
    let doc = read_document(&text).expect("read basic");
    let walk = doc.animation("hero", "walk").expect("walk");
    let idle = doc.animation("hero", "idle").expect("idle");
    let mut engine = Engine::new(Config::default());

    let mut group = c.benchmark_group("frame_step");
    group.throughput(Throughput::Elements(1));

    let mut t = 0.0f32;
    group.bench_function("evaluate_blended_walk_idle", |b| {
        b.iter(|| {
            t = (t + 16.0) % 1000.0;
            let frame = engine
                .evaluate_blended(walk, idle, black_box(t), 16.0, None, 0.5)
                .expect("evaluate");
            frame.sprites.len()
        })
    });

    group.finish();
}

fn bench_nested(c: &mut Criterion) {
    let text = spriter_test_fixtures::documents::text("nested").expect("nested fixture");
    let doc = read_document(&text).expect("read nested");
    let carry = doc.animation("holder", "carry").expect("carry");
    let mut engine = Engine::new(Config::default());

    c.bench_function("frame_step/evaluate_nested", |b| {
        b.iter(|| engine.evaluate(carry, black_box(250.0), 16.0).expect("evaluate").sprites.len())
    });
}

criterion_group!(benches, bench_single, bench_blended, bench_nested);
criterion_main!(benches);
