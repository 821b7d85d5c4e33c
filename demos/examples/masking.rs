// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Masking a container with a circle, then caching one of its children.
//!
//! The masked result is printed as ASCII art before and after caching; both
//! renders match.
//!
//! Run:
//! - `cargo run -p tableau_demos --example masking`

use std::sync::Arc;

use tableau_scene::{
    Backend, CanvasTarget, Color, DisplayProps, Graphics, NodeKind, Pixmap, RasterBackend, Scene,
};

const SIZE: u32 = 24;

fn render(scene: &mut Scene, root: tableau_scene::NodeId) -> Pixmap {
    let mut target = CanvasTarget::new(RasterBackend::new(SIZE, SIZE));
    scene.render(root, &mut target);
    target.into_backend().snapshot()
}

fn ascii(p: &Pixmap) -> String {
    let mut out = String::new();
    for y in 0..p.height() {
        for x in 0..p.width() {
            let ch = match p.color(x, y) {
                Some(c) if c.a == 0.0 => '.',
                Some(c) if c.r > c.b => 'R',
                Some(_) => 'B',
                None => '?',
            };
            out.push(ch);
        }
        out.push('\n');
    }
    out
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut scene = Scene::new();
    let root = scene.insert(NodeKind::Container, DisplayProps::default());
    let group = scene.insert(NodeKind::Container, DisplayProps::rect(2.0, 2.0, 20.0, 20.0));
    let stripes = scene.insert_bitmap(
        Arc::new(Pixmap::filled(20, 10, Color::rgb(0.9, 0.1, 0.1))),
        None,
        DisplayProps::default(),
    );
    let lower = scene.insert_bitmap(
        Arc::new(Pixmap::filled(20, 10, Color::rgb(0.1, 0.1, 0.9))),
        None,
        DisplayProps::rect(0.0, 10.0, 0.0, 0.0),
    );
    scene.add_child(root, group).expect("root is a container");
    scene
        .add_children(group, &[stripes, lower])
        .expect("group is a container");

    let mut circle = Graphics::new();
    circle.begin_fill(Color::BLACK, 1.0).draw_circle(0.0, 0.0, 10.0).end_fill();
    let mask = scene.insert(NodeKind::Graphics(circle), DisplayProps::rect(0.0, 0.0, 20.0, 20.0));
    if let Some(props) = scene.props_mut(group) {
        props.mask = Some(mask);
    }

    let live = render(&mut scene, root);
    println!("== Masked ==\n{}", ascii(&live));

    let backend = RasterBackend::new(1, 1);
    scene.cache(lower, &backend).expect("child has an area");
    let cached = render(&mut scene, root);
    println!("== Masked, lower half cached ==\n{}", ascii(&cached));
    assert_eq!(live, cached, "caching a child must not change the output");
}
