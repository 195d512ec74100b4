//! Benchmarks for badge frame decoding.
//!
//! Run benchmarks with:
//! ```sh
//! cargo bench --bench decode_bench
//! ```

use bytes::BytesMut;
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use interlock_hardware::{BadgeFrameCodec, decode_frame};
use std::hint::black_box;
use tokio_util::codec::Decoder;

const FRAME: &[u8] = b"\x0A01AB123456";

/// Reader output for `count` taps, with the stop byte and some line noise.
fn create_stream(count: usize) -> Vec<u8> {
    let mut stream = Vec::with_capacity(count * 14);
    for _ in 0..count {
        stream.extend_from_slice(b"\xFF");
        stream.extend_from_slice(FRAME);
        stream.extend_from_slice(b"\x0D\x00");
    }
    stream
}

fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    group.throughput(Throughput::Elements(1));

    group.bench_function("valid", |b| {
        b.iter(|| black_box(decode_frame(black_box(FRAME)).unwrap()));
    });

    group.bench_function("rejected", |b| {
        b.iter(|| black_box(decode_frame(black_box(b"\x0A01ABZZ3456")).is_err()));
    });

    group.finish();
}

fn bench_codec_stream(c: &mut Criterion) {
    let mut group = c.benchmark_group("codec_stream");

    for count in [1usize, 16, 256] {
        let stream = create_stream(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_with_input(BenchmarkId::from_parameter(count), &stream, |b, stream| {
            b.iter(|| {
                let mut codec = BadgeFrameCodec::new();
                let mut buffer = BytesMut::from(&stream[..]);
                let mut decoded = 0;
                loop {
                    match codec.decode(&mut buffer) {
                        Ok(Some(_)) => decoded += 1,
                        Ok(None) => break,
                        Err(_) => {}
                    }
                }
                black_box(decoded)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_decode_frame, bench_codec_stream);
criterion_main!(benches);
