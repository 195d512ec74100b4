//! Benchmarks for authorization response interpretation.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench interpret_bench
//! ```

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use interlock_network::interpret;
use std::hint::black_box;

const GRANTED: &str = "HTTP/1.1 200 OK\r\nDate: Sat, 17 Oct 2026 18:00:00 GMT\r\n\
Content-Type: application/json\r\nConnection: close\r\n\r\n\
{\"authorized\":true,\"timeout\":3600,\"badge\":2870096982,\"tool\":1}";

const DENIED: &str = "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"authorized\":false}";

fn bench_interpret(c: &mut Criterion) {
    let mut group = c.benchmark_group("interpret");
    group.throughput(Throughput::Elements(1));

    group.bench_function("granted", |b| {
        b.iter(|| black_box(interpret(black_box(GRANTED))));
    });

    group.bench_function("denied", |b| {
        b.iter(|| black_box(interpret(black_box(DENIED))));
    });

    let noise = "x".repeat(1024);
    group.bench_function("no_markers_1k", |b| {
        b.iter(|| black_box(interpret(black_box(&noise))));
    });

    group.finish();
}

criterion_group!(benches, bench_interpret);
criterion_main!(benches);
