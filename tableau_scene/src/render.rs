// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Render targets and the top-down paint traversal.
//!
//! A [`RenderTarget`] receives, for every shown node, `start_draw`, `transform`,
//! `draw` and `end_draw`, with the children of a container painted between its
//! `draw` and `end_draw` so they inherit its transform scope. Hidden nodes only
//! get [`RenderTarget::hide`].
//!
//! A node with its own target (see
//! [`Scene::set_render_target`](crate::Scene::set_render_target)) paints itself and
//! its subtree there instead of the inherited one.

use kurbo::{Affine, Rect, Vec2};
use tableau_events::Cursor;

use crate::scene::Scene;
use crate::types::NodeId;

/// What a [`RenderTarget::draw`] call covered.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum DrawResult {
    /// The node's own content was drawn; children still need painting.
    Content,
    /// The node and its whole subtree were drawn flattened (cache or mask).
    Subtree,
    /// Nothing was drawn for the node itself.
    Skipped,
}

/// A surface that display nodes paint into.
pub trait RenderTarget {
    /// Open a drawing scope for one node.
    fn start_draw(&mut self);

    /// Apply the node's transform and alpha to the current scope.
    fn transform(&mut self, scene: &Scene, id: NodeId);

    /// Draw the node's content, `src` of its image into `dst` of its local space.
    fn draw(&mut self, scene: &Scene, id: NodeId, src: Rect, dst: Rect) -> DrawResult;

    /// Close the scope opened by [`RenderTarget::start_draw`].
    fn end_draw(&mut self);

    /// Erase a region in surface coordinates.
    fn clear(&mut self, rect: Rect) {
        let _ = rect;
    }

    /// Called instead of drawing for hidden nodes.
    fn hide(&mut self, scene: &Scene, id: NodeId) {
        let _ = (scene, id);
    }

    /// Offsets of the surface and its positioned ancestors within the page.
    fn surface_offsets(&self) -> Vec<Vec2> {
        Vec::new()
    }

    /// Show `cursor` over the surface.
    fn set_cursor(&mut self, cursor: Cursor) {
        let _ = cursor;
    }
}

/// Paint `id` and its subtree, recording `(node, hidden)` for each node visited.
pub(crate) fn paint(
    scene: &Scene,
    id: NodeId,
    target: &mut dyn RenderTarget,
    painted: &mut Vec<(NodeId, bool)>,
) {
    let Some(node) = scene.node_opt(id) else {
        return;
    };
    if let Some(own) = node.target() {
        // Already borrowed means we are inside this node's own pass.
        if let Ok(mut own) = own.try_borrow_mut() {
            paint_scoped(scene, id, &mut **own, painted);
            return;
        }
    }
    paint_scoped(scene, id, target, painted);
}

fn paint_scoped(
    scene: &Scene,
    id: NodeId,
    target: &mut dyn RenderTarget,
    painted: &mut Vec<(NodeId, bool)>,
) {
    let Some(props) = scene.props(id) else {
        return;
    };
    if !props.is_shown() {
        target.hide(scene, id);
        painted.push((id, true));
        return;
    }
    target.start_draw();
    target.transform(scene, id);
    paint_content(scene, id, target, painted);
    target.end_draw();
    painted.push((id, false));
}

/// Draw the node's content in the current scope, then its children unless the
/// draw flattened them.
pub(crate) fn paint_content(
    scene: &Scene,
    id: NodeId,
    target: &mut dyn RenderTarget,
    painted: &mut Vec<(NodeId, bool)>,
) {
    let Some(node) = scene.node_opt(id) else {
        return;
    };
    let dst = node.props().local_rect();
    let src = node.kind().source_rect().unwrap_or(dst);
    let result = target.draw(scene, id, src, dst);
    if node.kind().is_container() && result != DrawResult::Subtree {
        for &child in node.children() {
            paint(scene, child, target, painted);
        }
    }
}

/// One call received by a [`RecordingTarget`].
#[derive(Clone, Debug, PartialEq)]
pub enum RenderOp {
    /// [`RenderTarget::start_draw`].
    StartDraw,
    /// [`RenderTarget::transform`], with the node's local transform and alpha.
    Transform {
        /// Node.
        node: NodeId,
        /// Local transform.
        affine: Affine,
        /// Node alpha.
        alpha: f64,
    },
    /// [`RenderTarget::draw`].
    Draw {
        /// Node.
        node: NodeId,
        /// Source rectangle.
        src: Rect,
        /// Destination rectangle.
        dst: Rect,
        /// Whether any tracked property changed since the last render.
        changed: bool,
    },
    /// [`RenderTarget::end_draw`].
    EndDraw,
    /// [`RenderTarget::clear`].
    Clear(Rect),
    /// [`RenderTarget::hide`].
    Hide(NodeId),
    /// [`RenderTarget::set_cursor`].
    Cursor(Cursor),
}

/// A target that draws nothing and records the calls it receives.
///
/// Useful for inspecting traversal order and for retained-mode consumers that only
/// want to know which nodes changed.
#[derive(Clone, Debug, Default)]
pub struct RecordingTarget {
    /// Calls in the order received.
    pub ops: Vec<RenderOp>,
    /// Offsets reported by [`RenderTarget::surface_offsets`].
    pub offsets: Vec<Vec2>,
}

impl RecordingTarget {
    /// An empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop recorded calls.
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    /// The nodes drawn, in order.
    pub fn drawn(&self) -> Vec<NodeId> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::Draw { node, .. } => Some(*node),
                _ => None,
            })
            .collect()
    }

    /// The last cursor requested.
    pub fn cursor(&self) -> Option<Cursor> {
        self.ops.iter().rev().find_map(|op| match op {
            RenderOp::Cursor(c) => Some(*c),
            _ => None,
        })
    }
}

impl RenderTarget for RecordingTarget {
    fn start_draw(&mut self) {
        self.ops.push(RenderOp::StartDraw);
    }

    fn transform(&mut self, scene: &Scene, id: NodeId) {
        if let Some(props) = scene.props(id) {
            self.ops.push(RenderOp::Transform {
                node: id,
                affine: props.local_affine(),
                alpha: props.alpha,
            });
        }
    }

    fn draw(&mut self, scene: &Scene, id: NodeId, src: Rect, dst: Rect) -> DrawResult {
        self.ops.push(RenderOp::Draw {
            node: id,
            src,
            dst,
            changed: scene.prop_changed(id, &[]),
        });
        DrawResult::Content
    }

    fn end_draw(&mut self) {
        self.ops.push(RenderOp::EndDraw);
    }

    fn clear(&mut self, rect: Rect) {
        self.ops.push(RenderOp::Clear(rect));
    }

    fn hide(&mut self, _scene: &Scene, id: NodeId) {
        self.ops.push(RenderOp::Hide(id));
    }

    fn surface_offsets(&self) -> Vec<Vec2> {
        self.offsets.clone()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.ops.push(RenderOp::Cursor(cursor));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{DisplayProps, NodeFlags, NodeKind, TrackedProp};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn tree() -> (Scene, NodeId, NodeId, NodeId, NodeId) {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let group = s.insert(NodeKind::Container, DisplayProps::rect(5.0, 5.0, 0.0, 0.0));
        let a = s.insert(NodeKind::Shape, DisplayProps::rect(0.0, 0.0, 4.0, 4.0));
        let b = s.insert(NodeKind::Shape, DisplayProps::rect(1.0, 0.0, 4.0, 4.0));
        s.add_child(root, group).unwrap();
        s.add_children(group, &[a, b]).unwrap();
        (s, root, group, a, b)
    }

    #[test]
    fn children_paint_inside_parent_scope() {
        let (mut s, root, group, a, b) = tree();
        let mut rec = RecordingTarget::new();
        s.render(root, &mut rec);
        assert_eq!(rec.drawn(), vec![root, group, a, b]);

        // The group's scope stays open around both children.
        let group_start = rec
            .ops
            .iter()
            .position(|op| matches!(op, RenderOp::Transform { node, .. } if *node == group))
            .unwrap();
        let ends: Vec<usize> = rec
            .ops
            .iter()
            .enumerate()
            .filter(|(_, op)| **op == RenderOp::EndDraw)
            .map(|(i, _)| i)
            .collect();
        assert_eq!(ends.len(), 4);
        assert!(ends[2] > group_start, "group closes after its children");
        assert_eq!(rec.ops.last(), Some(&RenderOp::EndDraw));
    }

    #[test]
    fn hidden_nodes_only_hide() {
        let (mut s, root, group, a, b) = tree();
        s.props_mut(group).unwrap().flags.remove(NodeFlags::VISIBLE);
        let mut rec = RecordingTarget::new();
        s.render(root, &mut rec);
        assert_eq!(rec.drawn(), vec![root]);
        assert!(rec.ops.contains(&RenderOp::Hide(group)));
        assert!(!rec.ops.contains(&RenderOp::Hide(a)), "subtree is not visited");
        assert_eq!(s.last_state(group, TrackedProp::Visible), Some(0.0));
        assert_eq!(s.last_state(group, TrackedProp::X), None);
        assert_eq!(s.last_state(b, TrackedProp::X), None);
    }

    #[test]
    fn render_saves_state_for_diffing() {
        let (mut s, root, _, a, b) = tree();
        let mut rec = RecordingTarget::new();
        s.render(root, &mut rec);
        assert!(rec.ops.iter().all(|op| !matches!(op, RenderOp::Draw { changed: false, .. })));

        s.props_mut(b).unwrap().x = 2.0;
        rec.reset();
        s.render(root, &mut rec);
        let changed: Vec<NodeId> = rec
            .ops
            .iter()
            .filter_map(|op| match op {
                RenderOp::Draw {
                    node,
                    changed: true,
                    ..
                } => Some(*node),
                _ => None,
            })
            .collect();
        assert_eq!(changed, vec![b]);
        assert!(!s.prop_changed(a, &[]));
    }

    #[test]
    fn bitmap_source_rect_reaches_target() {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let bmp = s.insert(
            NodeKind::Bitmap {
                source: Rect::new(8.0, 0.0, 16.0, 8.0),
            },
            DisplayProps::rect(0.0, 0.0, 16.0, 16.0),
        );
        s.add_child(root, bmp).unwrap();
        let mut rec = RecordingTarget::new();
        s.render(root, &mut rec);
        assert!(rec.ops.contains(&RenderOp::Draw {
            node: bmp,
            src: Rect::new(8.0, 0.0, 16.0, 8.0),
            dst: Rect::new(0.0, 0.0, 16.0, 16.0),
            changed: true,
        }));
    }

    #[derive(Clone, Default)]
    struct Shared(Rc<RefCell<RecordingTarget>>);

    impl RenderTarget for Shared {
        fn start_draw(&mut self) {
            self.0.borrow_mut().start_draw();
        }
        fn transform(&mut self, scene: &Scene, id: NodeId) {
            self.0.borrow_mut().transform(scene, id);
        }
        fn draw(&mut self, scene: &Scene, id: NodeId, src: Rect, dst: Rect) -> DrawResult {
            self.0.borrow_mut().draw(scene, id, src, dst)
        }
        fn end_draw(&mut self) {
            self.0.borrow_mut().end_draw();
        }
    }

    #[test]
    fn node_target_overrides_inherited() {
        let (mut s, root, group, a, b) = tree();
        let own = Shared::default();
        s.set_render_target(group, Some(Box::new(own.clone())));
        let mut rec = RecordingTarget::new();
        s.render(root, &mut rec);
        assert_eq!(rec.drawn(), vec![root]);
        assert_eq!(own.0.borrow().drawn(), vec![group, a, b]);
    }
}
