use criterion::{criterion_group, criterion_main, Criterion};
use scene_render_queue::{InMemoryHost, LogReporter, QueueConfig, RenderBatchRequest, RenderQueueController};
use std::sync::Arc;

// Run with:
//    cargo bench

fn scene_names(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("Scene.{:03}", i)).collect()
}

/// Bench: full batch of 32 scenes against the in-memory host
fn bench_full_batch(c: &mut Criterion) {
    let names = scene_names(32);
    c.bench_function("batch_32_scenes", |b| {
        b.iter(|| {
            let mut host = InMemoryHost::new(names.iter().cloned()).with_resolution(8, 8);
            let mut ctl = RenderQueueController::new(QueueConfig::default(), Arc::new(LogReporter));
            ctl.start(&mut host, RenderBatchRequest::new(names.iter().cloned(), "Scene.000"))
                .unwrap();
            while host.complete_next().is_some() {
                ctl.process_events(&mut host).unwrap();
            }
        })
    });
}

/// Bench: re-rendering into existing slots
fn bench_rerender(c: &mut Criterion) {
    let names = scene_names(32);
    let mut host = InMemoryHost::new(names.iter().cloned()).with_resolution(8, 8);
    let mut ctl = RenderQueueController::new(QueueConfig::default(), Arc::new(LogReporter));

    c.bench_function("rerender_32_existing_slots", |b| {
        b.iter(|| {
            ctl.start(&mut host, RenderBatchRequest::new(names.iter().cloned(), "Scene.000"))
                .unwrap();
            while host.complete_next().is_some() {
                ctl.process_events(&mut host).unwrap();
            }
            host.clear_journal();
        })
    });
}

criterion_group!(benches, bench_full_batch, bench_rerender);
criterion_main!(benches);
