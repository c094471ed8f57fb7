#![deny(warnings)]

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use fracture::*;
use std::time::Duration;

fn circle(x: Scalar, y: Scalar, radius: Scalar) -> Path {
    let mut builder = Path::builder();
    builder.move_to((x, y)).circle(radius);
    builder.build()
}

fn squares(count: usize) -> Vec<Element> {
    (0..count)
        .map(|index| {
            let offset = index as Scalar * 0.75;
            let mut builder = Path::builder();
            builder.move_to((offset, offset)).rect((2.0, 2.0));
            Element::Path {
                id: ShapeId(index as u64),
                path: builder.build(),
                fill_rule: FillRule::NonZero,
                style: Style::default(),
            }
        })
        .collect()
}

fn boolean_benchmark(c: &mut Criterion) {
    let a = circle(0.0, 0.0, 1.5);
    let b = circle(2.0, 0.0, 1.5);
    let fallback = BoolOptions {
        fallback_only: true,
        ..Default::default()
    };

    let mut group = c.benchmark_group("boolean");
    group
        .throughput(Throughput::Elements(1))
        .bench_function("circles union", |bench| {
            bench.iter_with_large_drop(|| {
                boolean(
                    black_box(&a),
                    FillRule::NonZero,
                    &b,
                    FillRule::NonZero,
                    BoolOp::Union,
                )
            })
        })
        .bench_function("circles union fallback", |bench| {
            bench.iter_with_large_drop(|| {
                boolean_with(
                    black_box(&a),
                    FillRule::NonZero,
                    &b,
                    FillRule::NonZero,
                    BoolOp::Union,
                    fallback,
                )
            })
        })
        .bench_function("circles intersection", |bench| {
            bench.iter_with_large_drop(|| {
                boolean(
                    black_box(&a),
                    FillRule::NonZero,
                    &b,
                    FillRule::NonZero,
                    BoolOp::Intersection,
                )
            })
        })
        .bench_function("circle flatten", |bench| {
            bench.iter_with_large_drop(|| flatten(black_box(&a), FillRule::NonZero))
        });
    group.finish();
}

fn extract_benchmark(c: &mut Criterion) {
    let config = MosaicConfig::default();

    let mut group = c.benchmark_group("extract");
    for count in [2usize, 4, 6] {
        let elements = squares(count);
        group.throughput(Throughput::Elements(count as u64));
        group.bench_function(format!("mosaic {}", count), |bench| {
            bench.iter_with_large_drop(|| build_mosaic(black_box(&elements), &config))
        });
        group.bench_function(format!("flatten {}", count), |bench| {
            bench.iter_with_large_drop(|| build_flatten(black_box(&elements)))
        });
    }
    group.finish();
}

criterion_group!(
    name = boolop;
    config = Criterion::default().sample_size(10).warm_up_time(Duration::new(1, 0));
    targets = boolean_benchmark, extract_benchmark
);
criterion_main!(boolop);
