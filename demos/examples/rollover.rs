// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Pointer dispatch across two buttons, printing each delivery.
//!
//! Run:
//! - `cargo run -p tableau_demos --example rollover`

use tableau_events::{PointerEvent, PointerKind};
use tableau_scene::{
    DisplayProps, NodeFlags, NodeKind, RecordingTarget, StageBuilder, StageConfig,
};

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    let mut stage = StageBuilder::new(StageConfig {
        width: 200.0,
        height: 100.0,
        ..Default::default()
    })
    .target(RecordingTarget::new())
    .build()
    .expect("stage has a target");
    let root = stage.root();

    let scene = stage.scene_mut();
    let left = scene.insert(NodeKind::Shape, DisplayProps::rect(10.0, 10.0, 80.0, 80.0));
    let right = scene.insert(NodeKind::Shape, DisplayProps::rect(110.0, 10.0, 80.0, 80.0));
    scene.add_children(root, &[left, right]).expect("root is a container");
    for id in [left, right] {
        if let Some(props) = scene.props_mut(id) {
            props.flags.insert(NodeFlags::HAND_CURSOR);
        }
    }

    let moves = [
        PointerEvent::new(PointerKind::Move, (50.0, 50.0)),
        PointerEvent::new(PointerKind::Move, (150.0, 50.0)),
        PointerEvent::new(PointerKind::Down, (150.0, 50.0)),
        PointerEvent::new(PointerKind::Move, (100.0, 50.0)),
        PointerEvent::new(PointerKind::Move, (60.0, 40.0)),
        PointerEvent::leave((250.0, 40.0)),
    ];
    for event in moves {
        println!("== {:?} at {:?} ==", event.kind, event.page);
        for d in stage.dispatch_event(event) {
            let name = stage
                .scene()
                .uid(d.target)
                .unwrap_or("?")
                .to_owned();
            println!("  {:>8} <- {:?}", name, d.event.kind);
        }
        println!("  cursor: {:?}", stage.target().cursor());
    }
}
