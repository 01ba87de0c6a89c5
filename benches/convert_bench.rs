// Conversion Benchmarks
// Performance benchmarks for RGB565 expansion and raw frame conversion

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use retro_canvas::display::{convert_raw_frame, expand_rgb565};
use retro_canvas::pipeline::RawFrame;
use std::hint::black_box;

/// Build a raw frame filled with a repeating sample pattern
fn create_test_frame(width: usize, height: usize, stride: usize) -> RawFrame {
    let bytes: Vec<u8> = (0..height * stride).map(|i| (i * 7) as u8).collect();
    RawFrame::new(Some(&bytes[..]), width, height, stride, 0).expect("valid frame")
}

/// Benchmark the per-sample bit replication
fn bench_expand(c: &mut Criterion) {
    c.bench_function("expand_rgb565_all_samples", |b| {
        b.iter(|| {
            let mut acc = 0u32;
            for sample in 0..=u16::MAX {
                acc ^= expand_rgb565(black_box(sample));
            }
            black_box(acc)
        });
    });
}

/// Benchmark whole-frame conversion at common handheld resolutions
fn bench_convert_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("convert_raw_frame");

    // (width, height, stride)
    for (width, height, stride) in [(160, 144, 320), (160, 144, 512), (240, 160, 480)] {
        let frame = create_test_frame(width, height, stride);
        let mut dest = vec![0u32; width * height];

        group.bench_with_input(
            BenchmarkId::from_parameter(format!("{}x{}_stride{}", width, height, stride)),
            &frame,
            |b, frame| {
                b.iter(|| black_box(convert_raw_frame(frame, &mut dest)));
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_expand, bench_convert_frame);
criterion_main!(benches);
