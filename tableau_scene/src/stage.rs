// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The stage: the root of a display tree bound to one render target.
//!
//! ## Usage
//!
//! 1) Build with [`StageBuilder`], giving it a config and a target.
//! 2) Add nodes under [`Stage::root`] through [`Stage::scene_mut`].
//! 3) Drive it with [`Stage::step`] once per tick, and feed host pointer input to
//!    [`Stage::dispatch_event`].
//!
//! ```
//! use tableau_scene::{DisplayProps, NodeKind, RecordingTarget, StageBuilder, StageConfig};
//! use tableau_scene::timer::TickInfo;
//!
//! let mut stage = StageBuilder::new(StageConfig::default())
//!     .target(RecordingTarget::new())
//!     .build()
//!     .unwrap();
//! let root = stage.root();
//! let box_id = stage.scene_mut().insert(NodeKind::Shape, DisplayProps::rect(10.0, 10.0, 20.0, 20.0));
//! stage.scene_mut().add_child(root, box_id).unwrap();
//! stage.step(&TickInfo::new(0.0, 50.0));
//! assert_eq!(stage.target().drawn(), vec![root, box_id]);
//! ```

use kurbo::{Point, Rect};
use tableau_events::{Cursor, Dispatch, ListenerId, PointerEvent, PointerKind, Rollover};
use tracing::{debug, trace};

use crate::config::StageConfig;
use crate::error::SceneError;
use crate::render::RenderTarget;
use crate::scene::Scene;
use crate::timer::TickInfo;
use crate::types::{DisplayProps, NodeFlags, NodeId, NodeKind};

/// Builder for [`Stage`].
#[derive(Debug)]
pub struct StageBuilder<T> {
    config: StageConfig,
    target: Option<T>,
}

impl<T: RenderTarget> StageBuilder<T> {
    /// Start from `config`.
    pub fn new(config: StageConfig) -> Self {
        Self {
            config,
            target: None,
        }
    }

    /// Set the render target. Required.
    pub fn target(mut self, target: T) -> Self {
        self.target = Some(target);
        self
    }

    /// Build the stage, or fail if no target was given.
    pub fn build(self) -> Result<Stage<T>, SceneError> {
        let target = self.target.ok_or(SceneError::MissingRenderTarget)?;
        let mut scene = Scene::new();
        let root = scene.insert(
            NodeKind::Stage,
            DisplayProps {
                width: self.config.width,
                height: self.config.height,
                scale_x: self.config.scale_x,
                scale_y: self.config.scale_y,
                ..Default::default()
            },
        );
        let mut stage = Stage {
            scene,
            root,
            target,
            rollover: Rollover::new(),
            stage_x: 0.0,
            stage_y: 0.0,
            paused: self.config.paused,
        };
        stage.update_position();
        debug!(
            width = self.config.width,
            height = self.config.height,
            "stage built"
        );
        Ok(stage)
    }
}

/// A display tree rooted in a stage node, with its render target and pointer
/// state.
#[derive(Debug)]
pub struct Stage<T> {
    scene: Scene,
    root: NodeId,
    target: T,
    rollover: Rollover<NodeId>,
    stage_x: f64,
    stage_y: f64,
    paused: bool,
}

impl<T: RenderTarget> Stage<T> {
    /// The scene holding the tree.
    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// The scene, mutably.
    pub fn scene_mut(&mut self) -> &mut Scene {
        &mut self.scene
    }

    /// The stage node.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// The render target.
    pub fn target(&self) -> &T {
        &self.target
    }

    /// The render target, mutably.
    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    /// Stop updating and rendering in [`Stage::step`].
    pub fn pause(&mut self) {
        self.paused = true;
    }

    /// Undo [`Stage::pause`].
    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Whether [`Stage::step`] is skipped.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Set the display scale applied by the target and to pointer input.
    pub fn set_scale(&mut self, scale_x: f64, scale_y: f64) {
        if let Some(props) = self.scene.props_mut(self.root) {
            props.scale_x = scale_x;
            props.scale_y = scale_y;
        }
    }

    /// Offset of the surface within the page.
    pub fn stage_position(&self) -> Point {
        Point::new(self.stage_x, self.stage_y)
    }

    /// The node that last accepted a pointer event.
    pub fn event_target(&self) -> Option<NodeId> {
        self.rollover.current()
    }

    /// Subscribe to pointer events reaching the stage itself.
    pub fn on(
        &mut self,
        kind: PointerKind,
        callback: impl FnMut(&PointerEvent) + 'static,
    ) -> Option<ListenerId> {
        self.scene.on(self.root, kind, callback)
    }

    /// Update then render, unless paused.
    pub fn step(&mut self, tick: &TickInfo) {
        if self.paused {
            return;
        }
        self.scene.update(self.root, tick);
        self.render();
        trace!(time = tick.current_time, delta = tick.delta_time, "stage step");
    }

    /// Clear the stage area and render the tree.
    pub fn render(&mut self) {
        if let Some(props) = self.scene.props(self.root) {
            self.target
                .clear(Rect::new(0.0, 0.0, props.width, props.height));
        }
        self.scene.render(self.root, &mut self.target);
    }

    /// Recompute the page offset from the target's offset chain. Call again after
    /// the host layout changes.
    pub fn update_position(&mut self) {
        let offset = self
            .target
            .surface_offsets()
            .into_iter()
            .fold(Point::ZERO, |p, v| p + v);
        self.stage_x = offset.x;
        self.stage_y = offset.y;
    }

    /// Route a host pointer event through the tree.
    ///
    /// The previous target hears about the pointer leaving it first, then the node
    /// under the pointer gets the event, then the stage's own listeners (except for
    /// an out event that stayed on the surface). Returns the deliveries in order.
    pub fn dispatch_event(&mut self, mut event: PointerEvent) -> Vec<Dispatch<NodeId>> {
        let (scale_x, scale_y) = self
            .scene
            .props(self.root)
            .map_or((1.0, 1.0), |p| (p.scale_x, p.scale_y));
        event.stage = Point::new(
            (event.page.x - self.stage_x) / scale_x,
            (event.page.y - self.stage_y) / scale_y,
        );
        let hit = self.scene.object_under_point(self.root, event.stage, true);
        let mut out = Vec::new();

        if let Some(exit) = self.rollover.exit(hit, &event) {
            let notice = event.derived(exit.kind);
            self.scene.emit(exit.target, &notice);
            out.push(Dispatch {
                target: exit.target,
                event: notice,
            });
        }

        if let Some(hit) = hit {
            let enabled = self
                .scene
                .props(hit)
                .is_some_and(|p| p.flags.contains(NodeFlags::EVENT_ENABLED));
            if enabled && event.kind != PointerKind::Out {
                self.rollover.enter(hit);
                self.scene.emit(hit, &event);
                out.push(Dispatch { target: hit, event });
            }
        }

        let cursor = match self.rollover.current() {
            Some(current) if self.scene.wants_hand_cursor(current) => Cursor::Pointer,
            _ => Cursor::Default,
        };
        self.target.set_cursor(cursor);

        if event.leaves_surface() || event.kind != PointerKind::Out {
            self.scene.emit(self.root, &event);
            out.push(Dispatch {
                target: self.root,
                event,
            });
        }
        out
    }
}
