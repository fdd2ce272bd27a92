// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Scalar-vs-SIMD comparison for the SumThreshold kernel, and a pass over
//! the SIR operator, on image sizes representative of one baseline's
//! time/frequency data.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use rfi_flagger::{Image, Mask};

fn bright_image(width: usize, height: usize) -> Image {
    let mut data = vec![1.0f32; width * height];
    for (i, v) in data.iter_mut().enumerate() {
        if i % 97 == 0 {
            *v = 50.0;
        }
    }
    Image::from_vec(width, height, &data)
}

fn bench_sum_threshold(c: &mut Criterion) {
    let mut group = c.benchmark_group("sum_threshold_horizontal");
    for &(width, height) in &[(256usize, 256usize), (1024, 1024)] {
        let image = bright_image(width, height);

        group.bench_with_input(BenchmarkId::new("scalar", width), &image, |b, image| {
            b.iter(|| {
                let mut mask = Mask::unflagged(width, height);
                rfi_flagger::algorithms::sum_threshold::horizontal(
                    black_box(image),
                    &mut mask,
                    black_box(8),
                    black_box(2.0),
                );
                black_box(mask);
            });
        });

        group.bench_with_input(BenchmarkId::new("simd8", width), &image, |b, image| {
            b.iter(|| {
                let mut mask = Mask::unflagged(width, height);
                rfi_flagger::algorithms::sum_threshold::horizontal_simd8(
                    black_box(image),
                    &mut mask,
                    black_box(8),
                    black_box(2.0),
                );
                black_box(mask);
            });
        });
    }
    group.finish();
}

fn bench_sir(c: &mut Criterion) {
    let mut group = c.benchmark_group("sir_horizontal");
    for &(width, height) in &[(256usize, 256usize), (1024, 1024)] {
        group.bench_with_input(BenchmarkId::new("scalar", width), &(width, height), |b, &(w, h)| {
            b.iter(|| {
                let mut mask = Mask::unflagged(w, h);
                for x in (0..w).step_by(11) {
                    for y in 0..h {
                        mask.set_value(x, y, true);
                    }
                }
                rfi_flagger::algorithms::sir::operate_horizontally(black_box(&mut mask), black_box(0.4));
                black_box(mask);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sum_threshold, bench_sir);
criterion_main!(benches);
