//! Benchmarks for frame decoding.
//!
//! Run with: cargo bench

use battlog_core::frame::encode_frame;
use battlog_core::{EventDecoder, RawSample};
use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use std::io::Cursor;

fn decode_frame_benchmark(c: &mut Criterion) {
    // Largest frame the logger can send
    let raw: Vec<RawSample> = (0..255u8).map(|i| RawSample::new(i % 5 + 1, 255 - i)).collect();
    let bytes = encode_frame(&raw).unwrap();

    let mut group = c.benchmark_group("decode_frame");
    group.throughput(Throughput::Bytes(bytes.len() as u64));

    group.bench_function("full_frame_255", |b| {
        b.iter(|| {
            let mut decoder = EventDecoder::new(Cursor::new(black_box(&bytes)));
            let event = decoder.read_event().unwrap();
            black_box(event.len())
        })
    });

    group.finish();
}

fn decode_stream_benchmark(c: &mut Criterion) {
    // 1000 back-to-back frames, as seen when following a logger
    let mut stream = Vec::new();
    for n in 0..1000usize {
        let len = n % 200;
        let raw: Vec<RawSample> = (0..len)
            .map(|i| RawSample::new(1, (255 - i) as u8))
            .collect();
        stream.extend(encode_frame(&raw).unwrap());
    }

    let mut group = c.benchmark_group("decode_stream");
    group.throughput(Throughput::Bytes(stream.len() as u64));

    group.bench_function("frames_1000", |b| {
        b.iter(|| {
            let mut decoder = EventDecoder::new(Cursor::new(black_box(&stream)));
            let mut samples = 0;
            while let Ok(event) = decoder.read_event() {
                samples += event.len();
            }
            black_box(samples)
        })
    });

    group.finish();
}

criterion_group!(benches, decode_frame_benchmark, decode_stream_benchmark);
criterion_main!(benches);
