// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use tableau_geom::{Matrix, WorldBounds, polygon_collision, rect_polygon};

#[derive(Clone)]
struct Rng(u64);

impl Rng {
    fn new(seed: u64) -> Self {
        Self(seed)
    }
    fn next_u64(&mut self) -> u64 {
        let mut x = self.0;
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        self.0 = x;
        x
    }
    fn next_f64(&mut self) -> f64 {
        let v = self.next_u64() >> 11;
        (v as f64) / ((1u64 << 53) as f64)
    }
}

/// Randomly placed, rotated and scaled rectangles within a `size x size` area.
fn gen_bounds(count: usize, size: f64, seed: u64) -> Vec<WorldBounds> {
    let mut rng = Rng::new(seed);
    let mut out = Vec::with_capacity(count);
    for _ in 0..count {
        let w = 8.0 + rng.next_f64() * 40.0;
        let h = 8.0 + rng.next_f64() * 40.0;
        let mut m = Matrix::identity();
        m.translate(-w * 0.5, -h * 0.5)
            .rotate(rng.next_f64() * core::f64::consts::TAU)
            .scale(0.5 + rng.next_f64(), 0.5 + rng.next_f64())
            .translate(rng.next_f64() * size, rng.next_f64() * size);
        out.push(WorldBounds::from_local(&m, &rect_polygon(w, h)));
    }
    out
}

fn gen_points(count: usize, size: f64, seed: u64) -> Vec<Point> {
    let mut rng = Rng::new(seed);
    (0..count)
        .map(|_| Point::new(rng.next_f64() * size, rng.next_f64() * size))
        .collect()
}

fn bench_sat(c: &mut Criterion) {
    let mut group = c.benchmark_group("sat");
    for &n in &[64usize, 256] {
        let bounds = gen_bounds(n, 1000.0, 0xCAFE_F00D_DEAD_BEEF);
        group.throughput(Throughput::Elements((n * n) as u64));
        group.bench_function(format!("all_pairs_polygon_n{n}"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for a in &bounds {
                    for o in &bounds {
                        if polygon_collision(&a.vertices, &o.vertices).is_some() {
                            hits += 1;
                        }
                    }
                }
                black_box(hits);
            });
        });
        group.bench_function(format!("all_pairs_aabb_then_polygon_n{n}"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for a in &bounds {
                    for o in &bounds {
                        if a.collides(o).is_some() {
                            hits += 1;
                        }
                    }
                }
                black_box(hits);
            });
        });
    }
    group.finish();
}

fn bench_contains(c: &mut Criterion) {
    let mut group = c.benchmark_group("contains");
    let bounds = gen_bounds(256, 1000.0, 0xBADC_F00D_1234_5678);
    let points = gen_points(1024, 1000.0, 0xC1A5_7E55_9999_ABCD);
    group.throughput(Throughput::Elements((bounds.len() * points.len()) as u64));
    for use_polygon in [false, true] {
        group.bench_function(format!("points_polygon_{use_polygon}"), |b| {
            b.iter(|| {
                let mut hits = 0_usize;
                for p in &points {
                    for wb in &bounds {
                        if wb.contains(*p, use_polygon).is_hit() {
                            hits += 1;
                        }
                    }
                }
                black_box(hits);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_sat, bench_contains);
criterion_main!(benches);
