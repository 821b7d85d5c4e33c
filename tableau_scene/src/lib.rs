// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Scene: an arena-backed 2D display list.
//!
//! Tableau Scene holds a tree of transformable display nodes, updates it once per
//! tick, and renders it through a pluggable [`RenderTarget`].
//!
//! - [`Scene`]: the arena. Nodes are addressed by generational [`NodeId`]s and carry
//!   [`DisplayProps`] (position, registration point, scale, rotation, alpha, flags,
//!   optional hit polygon and mask) plus a [`NodeKind`] with kind-specific content.
//! - [`Stage`]: a scene rooted in a stage node, bound to one target, with
//!   [`Stage::step`] for update-then-render and [`Stage::dispatch_event`] for pointer
//!   routing and rollover.
//! - [`CanvasTarget`]: draws through any [`Backend`], compositing masks offscreen
//!   and blitting cached nodes. [`RasterBackend`] is the bundled tiny-skia software backend.
//! - [`RecordingTarget`]: records the call stream, for tests and retained-mode
//!   consumers that diff with [`Scene::prop_changed`].
//! - [`Graphics`], [`Text`] and [`AnimatedSequence`]: vector drawing, text blocks and
//!   frame animation.
//! - [`Ticker`]: a pausable tick source producing [`TickInfo`].
//!
//! ## Traversal order
//!
//! Update is bottom-up: each container updates its children in order, assigning
//! their depth, before running its own [`Behavior`]. Render is top-down: a node
//! draws its own content, then its children back to front inside its transform
//! scope, unless the draw already flattened them (cache or mask).
//!
//! Geometry lives in [`tableau_geom`]; pointer events and rollover in
//! [`tableau_events`].
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use tableau_scene::{
//!     CanvasTarget, Color, DisplayProps, NodeKind, Pixmap, RasterBackend, StageBuilder,
//!     StageConfig, TickInfo,
//! };
//!
//! let config = StageConfig { width: 32.0, height: 32.0, ..Default::default() };
//! let mut stage = StageBuilder::new(config)
//!     .target(CanvasTarget::new(RasterBackend::new(32, 32)))
//!     .build()
//!     .unwrap();
//!
//! let root = stage.root();
//! let scene = stage.scene_mut();
//! let square = scene.insert_bitmap(
//!     Arc::new(Pixmap::filled(8, 8, Color::WHITE)),
//!     None,
//!     DisplayProps { x: 4.0, y: 4.0, ..Default::default() },
//! );
//! scene.add_child(root, square).unwrap();
//! scene.on_update(square, |cx| {
//!     if let Some(props) = cx.scene.props_mut(cx.node) {
//!         props.x += 1.0;
//!     }
//!     true
//! });
//!
//! stage.step(&TickInfo::new(0.0, 50.0));
//!
//! let pixels = stage.target().backend().pixmap();
//! assert_eq!(pixels.color(5, 4), Some(Color::WHITE));
//! assert_eq!(pixels.color(4, 4), Some(Color::TRANSPARENT));
//! ```

pub mod backend;
pub mod behavior;
pub mod canvas;
pub mod clip;
pub mod config;
pub mod error;
pub mod graphics;
pub mod paint;
pub mod raster;
pub mod render;
pub mod scene;
pub mod stage;
pub mod text;
pub mod timer;
pub mod types;

pub use backend::{Backend, Composite, DrawingApi, Font, FontMetrics, StrokeStyle, TextAlign};
pub use behavior::{Behavior, UpdateCx};
pub use canvas::CanvasTarget;
pub use clip::{AnimatedSequence, Frame, FrameRef};
pub use config::{StageConfig, TickerConfig};
pub use error::SceneError;
pub use graphics::Graphics;
pub use paint::{Color, GradientStop, Image, Paint, Pixmap, Repeat};
pub use raster::RasterBackend;
pub use render::{DrawResult, RecordingTarget, RenderOp, RenderTarget};
pub use scene::Scene;
pub use stage::{Stage, StageBuilder};
pub use text::Text;
pub use timer::{TickInfo, Ticker};
pub use types::{DisplayProps, NodeFlags, NodeId, NodeKind, TrackedProp};
