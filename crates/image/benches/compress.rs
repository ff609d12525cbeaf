//! Benchmarks for image compression.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use image::{DynamicImage, ImageOutputFormat, Rgb, RgbImage};
use shrink_image::{compress_image, detect_format, CompressionOptions, CompressionRate};
use std::io::Cursor;

fn sample_jpeg(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, ((x ^ y) % 256) as u8])
    });
    let mut buffer = Cursor::new(Vec::new());
    DynamicImage::ImageRgb8(img)
        .write_to(&mut buffer, ImageOutputFormat::Jpeg(95))
        .unwrap();
    buffer.into_inner()
}

fn bench_format_detection(c: &mut Criterion) {
    let jpeg_data = vec![0xFF, 0xD8, 0xFF, 0xE0, 0x00, 0x10, 0x4A, 0x46, 0x49, 0x46];

    c.bench_function("detect_jpeg", |b| {
        b.iter(|| detect_format(black_box(&jpeg_data)))
    });
}

fn bench_compress(c: &mut Criterion) {
    let small = sample_jpeg(640, 480);
    let oversized = sample_jpeg(2560, 1440);
    let options = CompressionOptions::for_rate(CompressionRate::default());

    c.bench_function("compress_jpeg_640", |b| {
        b.iter(|| compress_image(black_box(&small), black_box(&options)))
    });

    c.bench_function("compress_jpeg_2560_capped", |b| {
        b.iter(|| compress_image(black_box(&oversized), black_box(&options)))
    });
}

criterion_group!(benches, bench_format_detection, bench_compress);
criterion_main!(benches);
