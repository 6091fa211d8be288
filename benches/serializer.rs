//! Performance benchmarks for document rendering.
//!
//! Run with: `cargo bench --bench serializer`
//!
//! ## Performance Targets
//!
//! | Operation | Target | Notes |
//! |-----------|--------|-------|
//! | Render 50 slices | <100µs | Typical page |
//! | Publish + drop | <5µs | One mount cycle |
//! | Contended render | Linear scaling | Readers share the state lock |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::thread;

use machine_view::{MarkdownSerializer, Registry, SliceDescriptor, SliceKind};

/// Registry holding `count` slices with mixed explicit and default orders.
fn populated_registry(count: usize) -> (Registry, Vec<machine_view::SliceHandle>) {
    let registry = Registry::in_memory();
    let handles = (0..count)
        .map(|i| {
            let mut descriptor = SliceDescriptor::new(
                SliceKind::Section,
                format!("Paragraph {} with a little **Markdown** and a [link](/p/{}).", i, i),
            )
            .with_title(format!("Section {}", i));
            if i % 3 != 0 {
                descriptor = descriptor.with_order(((count - i) * 10) as f64);
            }
            registry.publish(descriptor, &i)
        })
        .collect();
    (registry, handles)
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render");
    let serializer = MarkdownSerializer::default();

    for count in [0usize, 10, 50, 250] {
        let (registry, _handles) = populated_registry(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, _| {
            b.iter(|| black_box(serializer.render(&registry, "/")))
        });
    }

    group.finish();
}

fn bench_mount_cycle(c: &mut Criterion) {
    let (registry, _handles) = populated_registry(50);
    let descriptor = SliceDescriptor::new(SliceKind::Hero, "Headline").with_title("Hero");

    c.bench_function("publish_and_drop", |b| {
        b.iter(|| {
            let handle = registry.publish(black_box(descriptor.clone()), &());
            drop(handle);
        })
    });
}

fn bench_contended_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_render");
    let (registry, _handles) = populated_registry(50);

    for threads in [1usize, 4, 8] {
        group.bench_with_input(BenchmarkId::from_parameter(threads), &threads, |b, &threads| {
            b.iter(|| {
                let workers: Vec<_> = (0..threads)
                    .map(|_| {
                        let registry = registry.clone();
                        thread::spawn(move || {
                            let serializer = MarkdownSerializer::default();
                            for _ in 0..10 {
                                black_box(serializer.render(&registry, "/"));
                            }
                        })
                    })
                    .collect();
                for worker in workers {
                    let _ = worker.join();
                }
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_render, bench_mount_cycle, bench_contended_render);
criterion_main!(benches);
