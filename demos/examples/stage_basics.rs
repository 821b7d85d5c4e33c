// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A stage with a spinning vector shape and an animated clip, driven by a ticker.
//!
//! Run:
//! - `cargo run -p tableau_demos --example stage_basics`

use std::sync::Arc;

use kurbo::Rect;
use tableau_scene::timer::Ticker;
use tableau_scene::{
    AnimatedSequence, CanvasTarget, Color, DisplayProps, Frame, Graphics, NodeKind, Pixmap,
    RasterBackend, StageBuilder, StageConfig, StrokeStyle, TickerConfig,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let config: StageConfig =
        serde_json::from_str(r#"{ "width": 64, "height": 48 }"#).expect("valid stage config");
    let mut stage = StageBuilder::new(config)
        .target(CanvasTarget::new(RasterBackend::new(64, 48)))
        .build()
        .expect("stage has a target");
    let root = stage.root();

    let mut g = Graphics::new();
    g.line_style(StrokeStyle::new(2.0, Color::BLACK))
        .begin_fill(Color::rgb(0.9, 0.3, 0.2), 1.0)
        .draw_round_rect(0.0, 0.0, 20.0, 20.0, 4.0)
        .end_fill();
    let scene = stage.scene_mut();
    let spinner = scene.insert(
        NodeKind::Graphics(g),
        DisplayProps {
            x: 16.0,
            y: 24.0,
            reg_x: 10.0,
            reg_y: 10.0,
            width: 20.0,
            height: 20.0,
            ..Default::default()
        },
    );
    scene.add_child(root, spinner).expect("root is a container");
    scene.on_update(spinner, |cx| {
        let step = cx.tick.delta_time * 0.09;
        if let Some(props) = cx.scene.props_mut(cx.node) {
            props.rotation = (props.rotation + step) % 360.0;
        }
        true
    });

    // Two 8x8 frames side by side on one sheet.
    let mut sheet = Pixmap::new(16, 8);
    for y in 0..8 {
        for x in 0..16 {
            let c = if x < 8 { Color::rgb(0.2, 0.4, 0.9) } else { Color::rgb(0.2, 0.8, 0.3) };
            sheet.set_pixel(x, y, c);
        }
    }
    let clip = scene
        .insert_clip(
            Arc::new(sheet),
            AnimatedSequence::new([
                Frame::new(Rect::new(0.0, 0.0, 8.0, 8.0)).with_label("blue"),
                Frame::new(Rect::new(8.0, 0.0, 16.0, 8.0)).with_label("green"),
            ])
            .with_use_frames(true)
            .with_interval(3.0),
            DisplayProps {
                x: 44.0,
                y: 20.0,
                ..Default::default()
            },
        )
        .expect("sequence has frames");
    scene.add_child(root, clip).expect("root is a container");

    let mut ticker = Ticker::new(TickerConfig { interval_ms: 16.0 });
    let mut frames = 0;
    ticker.run(|tick| {
        stage.step(tick);
        frames += 1;
        frames < 30
    });

    let pixels = stage.target().backend().pixmap();
    let covered = pixels.data().chunks_exact(4).filter(|p| p[3] > 0).count();
    println!("== After {frames} frames ==");
    println!("  covered pixels: {covered}");
    println!(
        "  spinner rotation: {:.1} deg",
        stage.scene().props(spinner).map_or(0.0, |p| p.rotation)
    );
    if let Some(NodeKind::Clip(seq)) = stage.scene().kind(clip) {
        println!("  clip frame: {}", seq.current_frame());
    }
    println!("  path: {}", stage.scene().display_path(clip).unwrap_or_default());
}
