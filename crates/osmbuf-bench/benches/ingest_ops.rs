//! Criterion micro-benchmarks for record building, reading, and parsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use crossbeam_channel::unbounded;

use osmbuf_arena::{ArenaBuffer, Builder};
use osmbuf_bench::node_document;
use osmbuf_core::{EntityFilter, ItemKind, Location};
use osmbuf_xml::{run, ReaderConfig};

const BUFFER_CAPACITY: usize = 2_000_000;

/// Fill one arena with tagged node records through the typed builder.
fn build_nodes(count: usize) -> ArenaBuffer {
    let mut builder = Builder::new(ArenaBuffer::with_capacity(BUFFER_CAPACITY));
    for i in 0..count {
        let h = builder.start_node().unwrap();
        builder.set_id(h, i as i64 + 1);
        builder.set_location(h, Location::from_degrees(13.4, 52.5));
        builder.append_user(h, "bench").unwrap();
        builder.open_record(ItemKind::TagList).unwrap();
        builder.add_tag("name", "somewhere").unwrap();
        builder.close_record().unwrap();
        builder.finish_entity().unwrap();
    }
    builder.replace_buffer(ArenaBuffer::with_capacity(0))
}

/// Benchmark: write 10K tagged nodes into a fresh arena.
fn bench_build_10k_nodes(c: &mut Criterion) {
    c.bench_function("build_10k_nodes", |b| {
        b.iter(|| black_box(build_nodes(10_000)));
    });
}

/// Benchmark: iterate 10K records and touch every tag.
fn bench_read_10k_nodes(c: &mut Criterion) {
    let buffer = build_nodes(10_000);
    c.bench_function("read_10k_nodes", |b| {
        b.iter(|| {
            let mut tags = 0usize;
            for record in buffer.records() {
                let node = record.as_node().unwrap();
                black_box(node.id());
                tags += node.tags().count();
            }
            black_box(tags);
        });
    });
}

/// Benchmark: full parse of a 10K-node event stream, buffers drained
/// on the same thread.
fn bench_parse_10k_nodes(c: &mut Criterion) {
    let events = node_document(10_000);
    c.bench_function("parse_10k_nodes", |b| {
        b.iter(|| {
            let (event_tx, event_rx) = unbounded();
            for event in &events {
                event_tx.send(event.clone()).unwrap();
            }
            drop(event_tx);
            let (buffer_tx, buffer_rx) = unbounded();
            let (header_tx, _header_rx) = unbounded();
            run(
                event_rx,
                EntityFilter::ALL,
                ReaderConfig::default(),
                buffer_tx,
                header_tx,
            )
            .unwrap();
            let total: usize = buffer_rx.try_iter().map(|b| b.records().count()).sum();
            black_box(total);
        });
    });
}

criterion_group!(
    benches,
    bench_build_10k_nodes,
    bench_read_10k_nodes,
    bench_parse_10k_nodes
);
criterion_main!(benches);
