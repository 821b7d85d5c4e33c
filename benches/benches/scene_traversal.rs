// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

use criterion::{BatchSize, Criterion, Throughput, black_box, criterion_group, criterion_main};
use kurbo::Point;
use tableau_scene::{DisplayProps, NodeId, NodeKind, RecordingTarget, Scene, TickInfo};

/// A root holding `groups` containers of `per_group` shapes laid out on a grid.
fn build_scene(groups: usize, per_group: usize) -> (Scene, NodeId) {
    let mut scene = Scene::new();
    let root = scene.insert(NodeKind::Container, DisplayProps::default());
    for g in 0..groups {
        let group = scene.insert(
            NodeKind::Container,
            DisplayProps {
                x: (g % 8) as f64 * 200.0,
                y: (g / 8) as f64 * 200.0,
                rotation: (g * 7 % 360) as f64,
                ..Default::default()
            },
        );
        scene.add_child(root, group).unwrap();
        for i in 0..per_group {
            let x = (i % 10) as f64 * 16.0;
            let y = (i / 10) as f64 * 16.0;
            let leaf = scene.insert(NodeKind::Shape, DisplayProps::rect(x, y, 14.0, 14.0));
            scene.add_child(group, leaf).unwrap();
        }
    }
    (scene, root)
}

fn bench_picking(c: &mut Criterion) {
    let mut group = c.benchmark_group("picking");
    for &(groups, per_group) in &[(8usize, 50usize), (32, 100)] {
        let (scene, root) = build_scene(groups, per_group);
        group.throughput(Throughput::Elements((groups * per_group) as u64));
        group.bench_function(format!("object_under_point_{groups}x{per_group}"), |b| {
            let mut i = 0_u32;
            b.iter(|| {
                i = i.wrapping_add(37);
                let p = Point::new(f64::from(i % 1600), f64::from(i / 3 % 800));
                black_box(scene.object_under_point(root, p, true));
            });
        });
    }
    group.finish();
}

fn bench_update_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("traversal");
    let (groups, per_group) = (32usize, 100usize);
    group.throughput(Throughput::Elements((groups * per_group) as u64));
    group.bench_function("update", |b| {
        b.iter_batched(
            || build_scene(groups, per_group),
            |(mut scene, root)| {
                scene.update(root, &TickInfo::new(0.0, 16.0));
                black_box(scene.depth(root));
            },
            BatchSize::LargeInput,
        );
    });
    group.bench_function("render_recording", |b| {
        let (mut scene, root) = build_scene(groups, per_group);
        let mut target = RecordingTarget::new();
        b.iter(|| {
            target.reset();
            scene.render(root, &mut target);
            black_box(target.ops.len());
        });
    });
    group.bench_function("bounds_all", |b| {
        let (scene, root) = build_scene(groups, per_group);
        let ids: Vec<NodeId> = scene
            .children(root)
            .iter()
            .flat_map(|g| scene.children(*g).iter().copied())
            .collect();
        b.iter(|| {
            for id in &ids {
                black_box(scene.bounds(*id));
            }
        });
    });
    group.finish();
}

criterion_group!(benches, bench_picking, bench_update_render);
criterion_main!(benches);
