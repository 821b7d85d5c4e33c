// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The display tree: arena storage, containment, geometry queries, update and
//! render traversal entry points, state diffing and caching.

use std::cell::RefCell;
use std::collections::HashMap;
use std::sync::Arc;

use kurbo::{Point, Rect, Size};
use tableau_events::{EventEmitter, ListenerId, PointerEvent, PointerKind};
use tableau_geom::{Containment, Matrix, WorldBounds, rect_polygon};
use tracing::{debug, trace};

use crate::backend::{Backend, DrawingApi};
use crate::behavior::{Behavior, FnBehavior, UpdateCx};
use crate::canvas::{CanvasTarget, surface_size};
use crate::clip::AnimatedSequence;
use crate::error::SceneError;
use crate::paint::Image;
use crate::render::{self, RenderTarget};
use crate::timer::TickInfo;
use crate::types::{DisplayProps, NodeFlags, NodeId, NodeKind, TrackedProp};

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

/// Arena of display nodes.
///
/// Nodes are created detached with [`Scene::insert`] and linked with
/// [`Scene::add_child`]. Parents own their children's ids in z-order, back to
/// front; children keep a non-owning link to their parent.
pub struct Scene {
    nodes: Vec<Option<Node>>, // slots
    generations: Vec<u32>,    // last generation per slot (persists across frees)
    free_list: Vec<usize>,
    uid_counter: u64,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .field("uid_counter", &self.uid_counter)
            .finish_non_exhaustive()
    }
}

pub(crate) struct Node {
    generation: u32,
    uid: String,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: DisplayProps,
    kind: NodeKind,
    depth: usize,
    drawable: Option<Image>,
    cache: Option<Image>,
    tracked: Vec<TrackedProp>,
    last_state: HashMap<TrackedProp, f64>,
    behavior: Option<Box<dyn Behavior>>,
    emitter: EventEmitter,
    target: Option<RefCell<Box<dyn RenderTarget>>>,
}

impl core::fmt::Debug for Node {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Node")
            .field("uid", &self.uid)
            .field("parent", &self.parent)
            .field("children", &self.children)
            .field("kind", &self.kind)
            .field("depth", &self.depth)
            .field("cached", &self.cache.is_some())
            .field("has_behavior", &self.behavior.is_some())
            .field("has_target", &self.target.is_some())
            .finish_non_exhaustive()
    }
}

impl Node {
    fn new(generation: u32, uid: String, kind: NodeKind, props: DisplayProps) -> Self {
        let mut tracked = TrackedProp::DEFAULT.to_vec();
        if kind.source_rect().is_some() {
            tracked.extend_from_slice(TrackedProp::SOURCE);
        }
        Self {
            generation,
            uid,
            parent: None,
            children: Vec::new(),
            props,
            kind,
            depth: 0,
            drawable: None,
            cache: None,
            tracked,
            last_state: HashMap::new(),
            behavior: None,
            emitter: EventEmitter::new(),
            target: None,
        }
    }

    pub(crate) fn props(&self) -> &DisplayProps {
        &self.props
    }

    pub(crate) fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub(crate) fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub(crate) fn target(&self) -> Option<&RefCell<Box<dyn RenderTarget>>> {
        self.target.as_ref()
    }
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
            uid_counter: 0,
        }
    }

    fn next_uid(&mut self, prefix: &str) -> String {
        let n = self.uid_counter;
        self.uid_counter += 1;
        if prefix.ends_with(|c: char| c.is_ascii_digit()) {
            format!("{prefix}_{n}")
        } else {
            format!("{prefix}{n}")
        }
    }

    /// Insert a detached node.
    pub fn insert(&mut self, kind: NodeKind, props: DisplayProps) -> NodeId {
        let uid = self.next_uid(kind.uid_prefix());
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, uid, kind, props));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slot indices."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, uid, kind, props)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId stores 32-bit slot indices."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Insert a bitmap showing `source` of `image` (the whole image by default).
    /// A zero size in `props` is replaced by the source size.
    pub fn insert_bitmap(
        &mut self,
        image: Image,
        source: Option<Rect>,
        mut props: DisplayProps,
    ) -> NodeId {
        let source = source.unwrap_or_else(|| {
            Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
        });
        if props.width == 0.0 && props.height == 0.0 {
            props.width = source.width();
            props.height = source.height();
        }
        let id = self.insert(NodeKind::Bitmap { source }, props);
        self.set_drawable(id, Some(image));
        id
    }

    /// Insert an animated bitmap sized to its first frame.
    pub fn insert_clip(
        &mut self,
        image: Image,
        sequence: AnimatedSequence,
        mut props: DisplayProps,
    ) -> Result<NodeId, SceneError> {
        let first = sequence.current_rect().ok_or(SceneError::EmptySequence)?;
        props.width = first.width();
        props.height = first.height();
        let id = self.insert(NodeKind::Clip(sequence), props);
        self.set_drawable(id, Some(image));
        Ok(id)
    }

    /// Remove a node and its subtree.
    pub fn destroy(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_parent(id, parent);
        }
        let children = self.node(id).children.clone();
        for child in children {
            self.destroy(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    /// Returns true if `id` refers to a live node.
    ///
    /// A `NodeId` is considered live if its slot exists and its generation matches
    /// the current generation stored in that slot.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    pub(crate) fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        (n.generation == id.1).then_some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node(&self, id: NodeId) -> &Node {
        // Callers check liveness first.
        self.nodes[id.idx()]
            .as_ref()
            .expect("dangling NodeId")
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()]
            .as_mut()
            .expect("dangling NodeId")
    }

    // --- accessors ---

    /// Geometry and flags of a node.
    pub fn props(&self, id: NodeId) -> Option<&DisplayProps> {
        self.node_opt(id).map(|n| &n.props)
    }

    /// Mutable geometry and flags of a node.
    pub fn props_mut(&mut self, id: NodeId) -> Option<&mut DisplayProps> {
        self.node_opt_mut(id).map(|n| &mut n.props)
    }

    /// The node's kind and kind-specific content.
    pub fn kind(&self, id: NodeId) -> Option<&NodeKind> {
        self.node_opt(id).map(|n| &n.kind)
    }

    /// Mutable kind-specific content.
    pub fn kind_mut(&mut self, id: NodeId) -> Option<&mut NodeKind> {
        self.node_opt_mut(id).map(|n| &mut n.kind)
    }

    /// Generated identifier, unique within this scene.
    pub fn uid(&self, id: NodeId) -> Option<&str> {
        self.node_opt(id).map(|n| n.uid.as_str())
    }

    /// Parent container, if attached.
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// Position among siblings, starting at 1, as of the last update.
    pub fn depth(&self, id: NodeId) -> Option<usize> {
        self.node_opt(id).map(|n| n.depth)
    }

    /// The image the node draws.
    pub fn drawable(&self, id: NodeId) -> Option<&Image> {
        self.node_opt(id).and_then(|n| n.drawable.as_ref())
    }

    /// Replace the image the node draws.
    pub fn set_drawable(&mut self, id: NodeId, image: Option<Image>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.drawable = image;
        }
    }

    /// Install the node's update logic, replacing any previous one.
    pub fn set_behavior(&mut self, id: NodeId, behavior: impl Behavior + 'static) {
        if let Some(n) = self.node_opt_mut(id) {
            n.behavior = Some(Box::new(behavior));
        }
    }

    /// Install a closure as the node's update logic.
    pub fn on_update<F>(&mut self, id: NodeId, f: F)
    where
        F: FnMut(&mut UpdateCx<'_>) -> bool + 'static,
    {
        self.set_behavior(id, FnBehavior(f));
    }

    /// Remove the node's update logic.
    pub fn clear_behavior(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.behavior = None;
        }
    }

    /// Subscribe to pointer events delivered to the node.
    pub fn on(
        &mut self,
        id: NodeId,
        kind: PointerKind,
        callback: impl FnMut(&PointerEvent) + 'static,
    ) -> Option<ListenerId> {
        self.node_opt_mut(id).map(|n| n.emitter.on(kind, callback))
    }

    /// Unsubscribe a listener.
    pub fn off(&mut self, id: NodeId, listener: ListenerId) -> bool {
        self.node_opt_mut(id)
            .is_some_and(|n| n.emitter.off(listener))
    }

    /// Deliver `event` to the node's listeners. Returns how many ran.
    pub fn emit(&mut self, id: NodeId, event: &PointerEvent) -> usize {
        self.node_opt_mut(id).map_or(0, |n| n.emitter.emit(event))
    }

    /// Give the node (and the subtree rendered through it) its own render target.
    pub fn set_render_target(&mut self, id: NodeId, target: Option<Box<dyn RenderTarget>>) {
        if let Some(n) = self.node_opt_mut(id) {
            n.target = target.map(RefCell::new);
        }
    }

    /// Replace the list of properties compared by [`Scene::prop_changed`].
    pub fn set_tracked(&mut self, id: NodeId, props: &[TrackedProp]) {
        if let Some(n) = self.node_opt_mut(id) {
            n.tracked = props.to_vec();
        }
    }

    // --- containment ---

    /// Append `child` to `parent`, re-parenting it if needed.
    pub fn add_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), SceneError> {
        self.add_child_at(parent, child, usize::MAX)
    }

    /// Append several children in order.
    pub fn add_children(&mut self, parent: NodeId, children: &[NodeId]) -> Result<(), SceneError> {
        for &child in children {
            self.add_child(parent, child)?;
        }
        Ok(())
    }

    /// Insert `child` into `parent` at `index` (clamped to the child count).
    pub fn add_child_at(
        &mut self,
        parent: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        for id in [parent, child] {
            if !self.is_alive(id) {
                return Err(SceneError::StaleNode(id));
            }
        }
        if !self.node(parent).kind.is_container() {
            return Err(SceneError::NotAContainer(parent));
        }
        if matches!(self.node(child).kind, NodeKind::Stage) {
            return Err(SceneError::StageNotAttachable(child));
        }
        let mut up = Some(parent);
        while let Some(p) = up {
            if p == child {
                return Err(SceneError::WouldCycle { parent, child });
            }
            up = self.node(p).parent;
        }
        if let Some(old) = self.node(child).parent {
            self.unlink_parent(child, old);
        }
        let siblings = &mut self.node_mut(parent).children;
        let index = index.min(siblings.len());
        siblings.insert(index, child);
        self.node_mut(child).parent = Some(parent);
        Ok(())
    }

    /// Detach `child` from `parent`. Returns whether it was a child.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) -> bool {
        if !self.contains(parent, child) {
            return false;
        }
        self.unlink_parent(child, parent);
        true
    }

    /// Detach the child at `index`.
    pub fn remove_child_at(&mut self, parent: NodeId, index: usize) -> Option<NodeId> {
        let child = self.child_at(parent, index)?;
        self.unlink_parent(child, parent);
        Some(child)
    }

    /// Detach every child.
    pub fn remove_all_children(&mut self, parent: NodeId) {
        let Some(n) = self.node_opt_mut(parent) else {
            return;
        };
        for child in core::mem::take(&mut n.children) {
            if let Some(c) = self.node_opt_mut(child) {
                c.parent = None;
            }
        }
    }

    /// Children in z-order, back to front.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node_opt(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The child at `index`.
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.children(id).get(index).copied()
    }

    /// Position of `child` among the children of `id`.
    pub fn child_index(&self, id: NodeId, child: NodeId) -> Option<usize> {
        self.children(id).iter().position(|c| *c == child)
    }

    /// Number of children.
    pub fn num_children(&self, id: NodeId) -> usize {
        self.children(id).len()
    }

    /// Whether `child` is a direct child of `id`.
    pub fn contains(&self, id: NodeId, child: NodeId) -> bool {
        self.children(id).contains(&child)
    }

    fn unlink_parent(&mut self, id: NodeId, parent: NodeId) {
        if let Some(p) = self.node_opt_mut(parent) {
            p.children.retain(|c| *c != id);
        }
        if let Some(n) = self.node_opt_mut(id) {
            n.parent = None;
        }
    }

    /// The frontmost node under `point` (in `id`'s parent space, usually the stage).
    ///
    /// Children are searched last to first, descending into non-empty containers.
    /// Hidden and event-disabled nodes are skipped. A point on a boundary counts
    /// as a hit.
    pub fn object_under_point(&self, id: NodeId, point: Point, use_polygon: bool) -> Option<NodeId> {
        for &child in self.children(id).iter().rev() {
            let Some(n) = self.node_opt(child) else {
                continue;
            };
            if !n.props.is_shown() || !n.props.is_event_enabled() {
                continue;
            }
            if n.kind.is_container() && !n.children.is_empty() {
                if let Some(hit) = self.object_under_point(child, point, use_polygon) {
                    return Some(hit);
                }
            } else if self.hit_test_point(child, point, use_polygon).is_hit() {
                return Some(child);
            }
        }
        None
    }

    // --- geometry ---

    /// The product of the transforms from `id` up to, but excluding, `ancestor`.
    ///
    /// With no ancestor the walk stops below the root, so the root's own transform
    /// is never included.
    pub fn concatenated_matrix(&self, id: NodeId, ancestor: Option<NodeId>) -> Option<Matrix> {
        let mut m = Matrix::identity();
        if ancestor == Some(id) {
            return Some(m);
        }
        let mut o = self.node_opt(id)?;
        while let Some(parent) = o.parent {
            if Some(parent) == ancestor {
                break;
            }
            m.concat(&o.props.local_transform());
            o = self.node_opt(parent)?;
        }
        Some(m)
    }

    /// World polygon and box of the node.
    pub fn bounds(&self, id: NodeId) -> Option<WorldBounds> {
        self.bounds_relative_to(id, None)
    }

    /// Polygon and box of the node in `ancestor`'s space.
    pub fn bounds_relative_to(&self, id: NodeId, ancestor: Option<NodeId>) -> Option<WorldBounds> {
        let n = self.node_opt(id)?;
        let m = self.concatenated_matrix(id, ancestor)?;
        Some(match &n.props.poly_area {
            Some(poly) => WorldBounds::from_local(&m, poly),
            None => WorldBounds::from_local(&m, &rect_polygon(n.props.width, n.props.height)),
        })
    }

    /// Where a world point lies relative to the node.
    pub fn hit_test_point(&self, id: NodeId, point: Point, use_polygon: bool) -> Containment {
        self.bounds(id)
            .map_or(Containment::Outside, |b| b.contains(point, use_polygon))
    }

    /// Whether two nodes overlap: bounding boxes first, then polygons if asked.
    pub fn hit_test_object(&self, a: NodeId, b: NodeId, use_polygon: bool) -> bool {
        let (Some(ba), Some(bb)) = (self.bounds(a), self.bounds(b)) else {
            return false;
        };
        if !ba.overlaps(&bb) {
            return false;
        }
        !use_polygon || ba.collides(&bb).is_some()
    }

    /// Map a local point to world space.
    pub fn local_to_global(&self, id: NodeId, point: Point) -> Option<Point> {
        let m = self.concatenated_matrix(id, None)?;
        Some(m.transform_point(point, false))
    }

    /// Map a world point to local space. Non-finite for degenerate transforms.
    pub fn global_to_local(&self, id: NodeId, point: Point) -> Option<Point> {
        let m = self.concatenated_matrix(id, None)?;
        Some(m.inverted().transform_point(point, false))
    }

    /// Map a point local to `id` into the local space of `target`.
    pub fn local_to_target(&self, id: NodeId, point: Point, target: NodeId) -> Option<Point> {
        let global = self.local_to_global(id, point)?;
        self.global_to_local(target, global)
    }

    /// `|width * scale_x|`.
    pub fn current_width(&self, id: NodeId) -> Option<f64> {
        self.props(id).map(|p| (p.width * p.scale_x).abs())
    }

    /// `|height * scale_y|`.
    pub fn current_height(&self, id: NodeId) -> Option<f64> {
        self.props(id).map(|p| (p.height * p.scale_y).abs())
    }

    /// The stage root above the node, if its tree is rooted in one.
    pub fn stage_of(&self, id: NodeId) -> Option<NodeId> {
        let mut root = id;
        while let Some(p) = self.parent(root) {
            root = p;
        }
        matches!(self.kind(root)?, NodeKind::Stage).then_some(root)
    }

    /// Dotted uids from the root down, for debugging.
    pub fn display_path(&self, id: NodeId) -> Option<String> {
        let mut parts = vec![self.uid(id)?];
        let mut o = id;
        while let Some(p) = self.parent(o) {
            parts.push(self.uid(p)?);
            o = p;
        }
        parts.reverse();
        Some(parts.join("."))
    }

    // --- traversal ---

    /// Update the subtree: children first, in order, then the node itself.
    ///
    /// The child list is snapshotted before iterating, so behaviors may detach
    /// nodes. Nodes destroyed mid-update are skipped.
    pub fn update(&mut self, id: NodeId, tick: &TickInfo) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        let children = n.children.clone();
        for (i, child) in children.into_iter().enumerate() {
            let Some(c) = self.node_opt_mut(child) else {
                continue;
            };
            c.depth = i + 1;
            self.update(child, tick);
        }
        if self.step_clip(id, tick) {
            self.run_behavior(id, tick);
        }
    }

    /// Advance an animated node. Returns false when a stop frame ended the update.
    fn step_clip(&mut self, id: NodeId, tick: &TickInfo) -> bool {
        let Some(n) = self.node_opt_mut(id) else {
            return false;
        };
        let NodeKind::Clip(seq) = &mut n.kind else {
            return true;
        };
        if seq.at_stop_frame() {
            seq.stop();
            return false;
        }
        if !seq.is_paused() {
            let delta = if seq.use_frames { 1.0 } else { tick.delta_time };
            seq.next_frame(delta);
        }
        if let Some(rect) = seq.current_rect() {
            n.props.width = rect.width();
            n.props.height = rect.height();
        }
        true
    }

    fn run_behavior(&mut self, id: NodeId, tick: &TickInfo) {
        let Some(mut behavior) = self.node_opt_mut(id).and_then(|n| n.behavior.take()) else {
            return;
        };
        let mut cx = UpdateCx {
            scene: self,
            node: id,
            tick,
        };
        behavior.update(&mut cx);
        if let Some(n) = self.node_opt_mut(id) {
            if n.behavior.is_none() {
                n.behavior = Some(behavior);
            }
        }
    }

    /// Render the subtree rooted at `root` into `target`, then record each drawn
    /// node's state for [`Scene::prop_changed`].
    pub fn render(&mut self, root: NodeId, target: &mut dyn RenderTarget) {
        let mut painted = Vec::new();
        render::paint(self, root, target, &mut painted);
        trace!(root = ?root, nodes = painted.len(), "rendered");
        for (id, hidden) in painted {
            if hidden {
                self.save_state(id, TrackedProp::HIDDEN);
            } else {
                self.save_state(id, &[]);
            }
        }
    }

    // --- state diffing ---

    /// Current value of a tracked property. Flags read as `1.0` or `0.0`.
    pub fn prop_value(&self, id: NodeId, prop: TrackedProp) -> Option<f64> {
        let n = self.node_opt(id)?;
        let p = &n.props;
        let source = || n.kind.source_rect();
        Some(match prop {
            TrackedProp::X => p.x,
            TrackedProp::Y => p.y,
            TrackedProp::RegX => p.reg_x,
            TrackedProp::RegY => p.reg_y,
            TrackedProp::Width => p.width,
            TrackedProp::Height => p.height,
            TrackedProp::Alpha => p.alpha,
            TrackedProp::ScaleX => p.scale_x,
            TrackedProp::ScaleY => p.scale_y,
            TrackedProp::Rotation => p.rotation,
            TrackedProp::Visible => {
                if p.is_visible() {
                    1.0
                } else {
                    0.0
                }
            }
            TrackedProp::Depth => n.depth as f64,
            TrackedProp::SourceX => source()?.x0,
            TrackedProp::SourceY => source()?.y0,
            TrackedProp::SourceWidth => source()?.width(),
            TrackedProp::SourceHeight => source()?.height(),
        })
    }

    /// Whether any of `props` differs from the last saved state. An empty list
    /// means the node's tracked list. Never-saved properties count as changed.
    pub fn prop_changed(&self, id: NodeId, props: &[TrackedProp]) -> bool {
        let Some(n) = self.node_opt(id) else {
            return false;
        };
        let list = if props.is_empty() {
            n.tracked.as_slice()
        } else {
            props
        };
        list.iter().any(|p| {
            let last = n.last_state.get(p).copied();
            last.is_none() || last != self.prop_value(id, *p)
        })
    }

    /// The value saved for `prop` by the last render.
    pub fn last_state(&self, id: NodeId, prop: TrackedProp) -> Option<f64> {
        self.node_opt(id)?.last_state.get(&prop).copied()
    }

    /// Record current values of `props` (the tracked list when empty).
    pub fn save_state(&mut self, id: NodeId, props: &[TrackedProp]) {
        let Some(n) = self.node_opt(id) else {
            return;
        };
        let list = if props.is_empty() {
            n.tracked.clone()
        } else {
            props.to_vec()
        };
        let values: Vec<(TrackedProp, f64)> = list
            .into_iter()
            .filter_map(|p| self.prop_value(id, p).map(|v| (p, v)))
            .collect();
        let n = self.node_mut(id);
        n.last_state.extend(values);
    }

    // --- caching ---

    /// Render the node's content once into an offscreen surface from `backend` and
    /// draw that instead from now on. The node's own mask is not applied to the
    /// cache.
    pub fn cache<B: Backend>(&mut self, id: NodeId, backend: &B) -> Result<Image, SceneError> {
        let image = self.to_image(id, backend)?;
        debug!(
            uid = self.uid(id).unwrap_or_default(),
            width = image.width(),
            height = image.height(),
            "cached node"
        );
        self.node_mut(id).cache = Some(image.clone());
        Ok(image)
    }

    /// Drop the node's cache.
    pub fn uncache(&mut self, id: NodeId) {
        if let Some(n) = self.node_opt_mut(id) {
            n.cache = None;
        }
    }

    /// The cached surface, if any.
    pub fn cached(&self, id: NodeId) -> Option<&Image> {
        self.node_opt(id).and_then(|n| n.cache.as_ref())
    }

    /// Render the node's content into a new image without caching it.
    pub fn to_image<B: Backend>(&self, id: NodeId, backend: &B) -> Result<Image, SceneError> {
        let props = self.props(id).ok_or(SceneError::StaleNode(id))?;
        let (w, h) = surface_size(props.width, props.height).ok_or(
            SceneError::InvalidSurfaceSize {
                width: props.width,
                height: props.height,
            },
        )?;
        let mut target = CanvasTarget::new(backend.offscreen(w, h)).flattening(id);
        render::paint_content(self, id, &mut target, &mut Vec::new());
        Ok(Arc::new(target.backend().snapshot()))
    }

    /// Lay out a text node with `api` and store the block size in its props.
    pub fn fit_text(&mut self, id: NodeId, api: &dyn DrawingApi) -> Option<Size> {
        let NodeKind::Text(text) = self.kind(id)? else {
            return None;
        };
        let size = text.layout(api).size;
        let props = self.props_mut(id)?;
        props.width = size.width;
        props.height = size.height;
        Some(size)
    }

    /// Whether the node's flags enable the hand cursor.
    pub(crate) fn wants_hand_cursor(&self, id: NodeId) -> bool {
        self.props(id).is_some_and(|p| {
            p.flags
                .contains(NodeFlags::HAND_CURSOR | NodeFlags::EVENT_ENABLED)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::Frame;
    use crate::paint::Pixmap;
    use crate::raster::RasterBackend;
    use crate::text::Text;
    use std::cell::Cell;
    use std::rc::Rc;

    fn container(scene: &mut Scene) -> NodeId {
        scene.insert(NodeKind::Container, DisplayProps::default())
    }

    fn shape(scene: &mut Scene, x: f64, y: f64, w: f64, h: f64) -> NodeId {
        scene.insert(NodeKind::Shape, DisplayProps::rect(x, y, w, h))
    }

    #[test]
    fn uids_are_prefixed_and_unique() {
        let mut s = Scene::new();
        let a = container(&mut s);
        let b = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        assert_eq!(s.uid(a), Some("Container0"));
        assert_eq!(s.uid(b), Some("Shape1"));
        assert_eq!(s.next_uid("Layer2"), "Layer2_2");
    }

    #[test]
    fn stale_ids_do_not_alias() {
        let mut s = Scene::new();
        let a = container(&mut s);
        s.destroy(a);
        let b = container(&mut s);
        assert_eq!(a.idx(), b.idx());
        assert!(!s.is_alive(a));
        assert!(s.is_alive(b));
        assert!(s.props(a).is_none());
    }

    #[test]
    fn add_child_validates() {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Stage, DisplayProps::default());
        let c = container(&mut s);
        let leaf = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        s.add_child(root, c).unwrap();
        s.add_child(c, leaf).unwrap();

        assert!(matches!(
            s.add_child(leaf, c),
            Err(SceneError::NotAContainer(id)) if id == leaf
        ));
        assert!(matches!(
            s.add_child(c, root),
            Err(SceneError::StageNotAttachable(_))
        ));
        let inner = container(&mut s);
        s.add_child(c, inner).unwrap();
        assert!(matches!(
            s.add_child(inner, c),
            Err(SceneError::WouldCycle { .. })
        ));
        assert!(matches!(s.add_child(c, c), Err(SceneError::WouldCycle { .. })));
        let gone = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        s.destroy(gone);
        assert!(matches!(
            s.add_child(c, gone),
            Err(SceneError::StaleNode(id)) if id == gone
        ));
    }

    #[test]
    fn adding_reparents() {
        let mut s = Scene::new();
        let a = container(&mut s);
        let b = container(&mut s);
        let leaf = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        s.add_child(a, leaf).unwrap();
        s.add_child(b, leaf).unwrap();
        assert_eq!(s.num_children(a), 0);
        assert_eq!(s.parent(leaf), Some(b));
        assert!(s.contains(b, leaf));
    }

    #[test]
    fn child_ordering_and_removal() {
        let mut s = Scene::new();
        let p = container(&mut s);
        let [a, b, c] = [0.0, 1.0, 2.0].map(|x| shape(&mut s, x, 0.0, 1.0, 1.0));
        s.add_children(p, &[a, c]).unwrap();
        s.add_child_at(p, b, 1).unwrap();
        assert_eq!(s.children(p), &[a, b, c]);
        assert_eq!(s.child_index(p, c), Some(2));
        assert_eq!(s.remove_child_at(p, 0), Some(a));
        assert_eq!(s.parent(a), None);
        assert!(s.remove_child(p, c));
        assert!(!s.remove_child(p, c));
        s.remove_all_children(p);
        assert_eq!(s.num_children(p), 0);
        assert_eq!(s.parent(b), None);
        assert!(s.is_alive(b), "removal detaches without destroying");
    }

    #[test]
    fn untransformed_bounds_are_translated_rect() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let group = s.insert(NodeKind::Container, DisplayProps::rect(10.0, 20.0, 0.0, 0.0));
        let leaf = shape(&mut s, 5.0, 5.0, 30.0, 40.0);
        s.add_child(root, group).unwrap();
        s.add_child(group, leaf).unwrap();
        let b = s.bounds(leaf).unwrap();
        assert_eq!(b.rect, Rect::new(15.0, 25.0, 45.0, 65.0));
        assert_eq!(s.local_to_global(leaf, Point::ZERO), Some(Point::new(15.0, 25.0)));
        let relative = s.bounds_relative_to(leaf, Some(group)).unwrap();
        assert_eq!(relative.rect, Rect::new(5.0, 5.0, 35.0, 45.0));
    }

    #[test]
    fn rotated_bounds_enclose_polygon() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let leaf = s.insert(
            NodeKind::Shape,
            DisplayProps {
                x: 50.0,
                y: 50.0,
                reg_x: 10.0,
                reg_y: 10.0,
                width: 20.0,
                height: 20.0,
                rotation: 45.0,
                ..Default::default()
            },
        );
        s.add_child(root, leaf).unwrap();
        let b = s.bounds(leaf).unwrap();
        // Half diagonal of a 20x20 square is ~14.14, rounded per vertex.
        assert_eq!(b.rect, Rect::new(36.0, 36.0, 64.0, 64.0));
        assert_eq!(s.hit_test_point(leaf, Point::new(37.0, 37.0), false), Containment::Inside);
        assert_eq!(s.hit_test_point(leaf, Point::new(37.0, 37.0), true), Containment::Outside);
        assert_eq!(s.hit_test_point(leaf, Point::new(50.0, 50.0), true), Containment::Inside);
    }

    #[test]
    fn hit_test_agrees_with_box() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let leaf = shape(&mut s, 10.0, 10.0, 20.0, 20.0);
        s.add_child(root, leaf).unwrap();
        let r = s.bounds(leaf).unwrap().rect;
        for corner in [
            Point::new(r.x0, r.y0),
            Point::new(r.x1, r.y0),
            Point::new(r.x1, r.y1),
            Point::new(r.x0, r.y1),
        ] {
            for poly in [false, true] {
                assert_ne!(s.hit_test_point(leaf, corner, poly), Containment::Outside);
            }
        }
        assert_eq!(s.hit_test_point(leaf, Point::new(9.0, 15.0), true), Containment::Outside);
        assert_eq!(s.hit_test_point(leaf, Point::new(31.0, 15.0), false), Containment::Outside);
    }

    #[test]
    fn later_sibling_wins() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let a = shape(&mut s, 0.0, 0.0, 50.0, 50.0);
        let b = shape(&mut s, 25.0, 25.0, 50.0, 50.0);
        s.add_children(root, &[a, b]).unwrap();
        assert_eq!(s.object_under_point(root, Point::new(30.0, 30.0), true), Some(b));
        assert_eq!(s.object_under_point(root, Point::new(10.0, 10.0), true), Some(a));
        assert_eq!(s.object_under_point(root, Point::new(90.0, 90.0), true), None);

        s.props_mut(b).unwrap().flags.remove(NodeFlags::EVENT_ENABLED);
        assert_eq!(s.object_under_point(root, Point::new(30.0, 30.0), true), Some(a));
        s.props_mut(a).unwrap().alpha = 0.0;
        assert_eq!(s.object_under_point(root, Point::new(30.0, 30.0), true), None);
    }

    #[test]
    fn covering_top_child_wins() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let c2 = shape(&mut s, 10.0, 10.0, 10.0, 10.0);
        let c1 = shape(&mut s, 0.0, 0.0, 40.0, 40.0);
        s.add_children(root, &[c2, c1]).unwrap();
        assert_eq!(s.object_under_point(root, Point::new(15.0, 15.0), false), Some(c1));
    }

    #[test]
    fn boundary_counts_as_pick() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let a = shape(&mut s, 0.0, 0.0, 10.0, 10.0);
        s.add_child(root, a).unwrap();
        let edge = Point::new(10.0, 5.0);
        assert_eq!(s.hit_test_point(a, edge, true), Containment::Boundary);
        assert_eq!(s.object_under_point(root, edge, true), Some(a));
    }

    #[test]
    fn picking_descends_into_containers() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let group = s.insert(NodeKind::Container, DisplayProps::rect(100.0, 0.0, 0.0, 0.0));
        let leaf = shape(&mut s, 0.0, 0.0, 10.0, 10.0);
        s.add_child(root, group).unwrap();
        s.add_child(group, leaf).unwrap();
        assert_eq!(s.object_under_point(root, Point::new(105.0, 5.0), true), Some(leaf));
        assert_eq!(s.object_under_point(root, Point::new(5.0, 5.0), true), None);
    }

    #[test]
    fn object_collision_uses_polygons_on_request() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let a = shape(&mut s, 0.0, 0.0, 10.0, 10.0);
        let diamond = s.insert(
            NodeKind::Shape,
            DisplayProps {
                x: 8.0,
                y: 8.0,
                poly_area: Some(vec![
                    Point::new(5.0, 0.0),
                    Point::new(10.0, 5.0),
                    Point::new(5.0, 10.0),
                    Point::new(0.0, 5.0),
                ]),
                ..Default::default()
            },
        );
        let far = shape(&mut s, 50.0, 50.0, 5.0, 5.0);
        s.add_children(root, &[a, diamond, far]).unwrap();
        // Only the diamond's box reaches into the square: box overlap, no SAT hit.
        assert!(s.hit_test_object(a, diamond, false));
        assert!(!s.hit_test_object(a, diamond, true));
        assert!(!s.hit_test_object(a, far, false));
    }

    #[test]
    fn touching_nodes_do_not_collide() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let a = shape(&mut s, 0.0, 0.0, 10.0, 10.0);
        let right = shape(&mut s, 10.0, 0.0, 10.0, 10.0);
        let corner = shape(&mut s, 10.0, 10.0, 4.0, 4.0);
        s.add_children(root, &[a, right, corner]).unwrap();
        for other in [right, corner] {
            assert!(!s.hit_test_object(a, other, false));
            assert!(!s.hit_test_object(a, other, true));
        }
    }

    #[test]
    fn global_local_roundtrip_and_degenerate() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let leaf = s.insert(
            NodeKind::Shape,
            DisplayProps {
                x: 10.0,
                y: 5.0,
                scale_x: 2.0,
                scale_y: 4.0,
                ..Default::default()
            },
        );
        s.add_child(root, leaf).unwrap();
        let g = s.local_to_global(leaf, Point::new(1.0, 1.0)).unwrap();
        assert_eq!(g, Point::new(12.0, 9.0));
        assert_eq!(s.global_to_local(leaf, g), Some(Point::new(1.0, 1.0)));

        let other = shape(&mut s, 100.0, 0.0, 1.0, 1.0);
        s.add_child(root, other).unwrap();
        assert_eq!(
            s.local_to_target(leaf, Point::new(1.0, 1.0), other),
            Some(Point::new(-88.0, 9.0))
        );

        s.props_mut(leaf).unwrap().scale_x = 0.0;
        let p = s.global_to_local(leaf, Point::new(3.0, 3.0)).unwrap();
        assert!(!p.x.is_finite() || !p.y.is_finite());
    }

    #[test]
    fn current_size_stage_and_path() {
        let mut s = Scene::new();
        let stage = s.insert(NodeKind::Stage, DisplayProps::default());
        let c = container(&mut s);
        let leaf = s.insert(
            NodeKind::Shape,
            DisplayProps {
                width: 10.0,
                height: 4.0,
                scale_x: -2.0,
                ..Default::default()
            },
        );
        s.add_child(stage, c).unwrap();
        s.add_child(c, leaf).unwrap();
        assert_eq!(s.current_width(leaf), Some(20.0));
        assert_eq!(s.current_height(leaf), Some(4.0));
        assert_eq!(s.stage_of(leaf), Some(stage));
        assert_eq!(s.display_path(leaf).as_deref(), Some("Stage0.Container1.Shape2"));
        s.remove_child(stage, c);
        assert_eq!(s.stage_of(leaf), None);
    }

    #[test]
    fn update_order_and_depth() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let a = container(&mut s);
        let b = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        let a1 = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        s.add_children(root, &[a, b]).unwrap();
        s.add_child(a, a1).unwrap();

        let log = Rc::new(RefCell::new(Vec::new()));
        for id in [root, a, b, a1] {
            let log = log.clone();
            s.on_update(id, move |cx| {
                log.borrow_mut().push(cx.node);
                true
            });
        }
        s.update(root, &TickInfo::new(0.0, 50.0));
        assert_eq!(*log.borrow(), vec![a1, a, b, root]);
        assert_eq!(s.depth(a), Some(1));
        assert_eq!(s.depth(b), Some(2));
        assert_eq!(s.depth(a1), Some(1));
    }

    #[test]
    fn self_removal_during_update_is_tolerated() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let [a, b, c] = [0.0, 1.0, 2.0].map(|x| shape(&mut s, x, 0.0, 1.0, 1.0));
        s.add_children(root, &[a, b, c]).unwrap();
        let ran = Rc::new(Cell::new(0));
        s.on_update(a, |cx| {
            let parent = cx.scene.parent(cx.node);
            if let Some(p) = parent {
                cx.scene.remove_child(p, cx.node);
            }
            true
        });
        let seen = ran.clone();
        s.on_update(c, move |_| {
            seen.set(seen.get() + 1);
            true
        });
        s.on_update(b, |cx| {
            cx.scene.destroy(cx.node);
            true
        });
        s.update(root, &TickInfo::new(0.0, 16.0));
        assert_eq!(ran.get(), 1, "later siblings still update");
        assert_eq!(s.children(root), &[c]);
        assert!(!s.is_alive(b));
    }

    #[test]
    fn clip_update_tracks_frames() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let seq = AnimatedSequence::new([
            Frame::new(Rect::new(0.0, 0.0, 10.0, 10.0)).with_interval(2.0),
            Frame::new(Rect::new(10.0, 0.0, 30.0, 20.0)).with_stop(),
        ])
        .with_use_frames(true);
        let clip = s
            .insert_clip(Arc::new(Pixmap::new(30, 20)), seq, DisplayProps::default())
            .unwrap();
        s.add_child(root, clip).unwrap();
        let hook = Rc::new(Cell::new(0));
        let seen = hook.clone();
        s.on_update(clip, move |_| {
            seen.set(seen.get() + 1);
            true
        });

        let tick = TickInfo::new(0.0, 1000.0);
        for _ in 0..3 {
            s.update(root, &tick);
        }
        let NodeKind::Clip(seq) = s.kind(clip).unwrap() else {
            unreachable!("inserted as a clip");
        };
        assert_eq!(seq.current_frame(), 1, "advances on the third tick");
        assert_eq!(s.props(clip).unwrap().width, 20.0);
        assert_eq!(s.prop_value(clip, TrackedProp::SourceX), Some(10.0));
        assert_eq!(hook.get(), 3);

        // The stop frame pauses the clip and skips the hook.
        s.update(root, &tick);
        assert_eq!(hook.get(), 3);
        let NodeKind::Clip(seq) = s.kind(clip).unwrap() else {
            unreachable!("inserted as a clip");
        };
        assert!(seq.is_paused());
    }

    #[test]
    fn empty_clip_is_rejected() {
        let mut s = Scene::new();
        let r = s.insert_clip(
            Arc::new(Pixmap::new(1, 1)),
            AnimatedSequence::default(),
            DisplayProps::default(),
        );
        assert!(matches!(r, Err(SceneError::EmptySequence)));
    }

    #[test]
    fn state_diffing() {
        let mut s = Scene::new();
        let root = container(&mut s);
        let leaf = shape(&mut s, 1.0, 2.0, 3.0, 4.0);
        s.add_child(root, leaf).unwrap();
        assert!(s.prop_changed(leaf, &[]), "never saved");
        s.save_state(leaf, &[]);
        assert!(!s.prop_changed(leaf, &[]));
        assert_eq!(s.last_state(leaf, TrackedProp::X), Some(1.0));

        s.props_mut(leaf).unwrap().x = 9.0;
        assert!(s.prop_changed(leaf, &[TrackedProp::X]));
        assert!(!s.prop_changed(leaf, &[TrackedProp::Y]));

        s.props_mut(leaf).unwrap().flags.remove(NodeFlags::VISIBLE);
        s.save_state(leaf, TrackedProp::HIDDEN);
        assert_eq!(s.last_state(leaf, TrackedProp::Visible), Some(0.0));
        assert_eq!(s.last_state(leaf, TrackedProp::X), Some(1.0), "x not saved");

        s.set_tracked(leaf, &[TrackedProp::Y]);
        assert!(!s.prop_changed(leaf, &[]));
    }

    #[test]
    fn events_reach_node_listeners() {
        let mut s = Scene::new();
        let leaf = shape(&mut s, 0.0, 0.0, 1.0, 1.0);
        let hits = Rc::new(Cell::new(0));
        let seen = hits.clone();
        let id = s
            .on(leaf, PointerKind::Down, move |_| seen.set(seen.get() + 1))
            .unwrap();
        let down = PointerEvent::new(PointerKind::Down, (0.0, 0.0));
        assert_eq!(s.emit(leaf, &down), 1);
        assert!(s.off(leaf, id));
        assert_eq!(s.emit(leaf, &down), 0);
        assert_eq!(hits.get(), 1);
    }

    #[test]
    fn zero_sized_nodes_cannot_cache() {
        let mut s = Scene::new();
        let leaf = shape(&mut s, 0.0, 0.0, 0.0, 5.0);
        let backend = RasterBackend::new(1, 1);
        assert!(matches!(
            s.cache(leaf, &backend),
            Err(SceneError::InvalidSurfaceSize { .. })
        ));
        assert!(s.cached(leaf).is_none());
    }

    #[test]
    fn fit_text_sizes_node() {
        let mut s = Scene::new();
        let mut text = Text::new("abc\nde");
        text.font.size = 10.0;
        let id = s.insert(NodeKind::Text(text), DisplayProps::default());
        let size = s.fit_text(id, &RasterBackend::new(1, 1)).unwrap();
        assert_eq!(size, Size::new(18.0, 24.0));
        assert_eq!(s.props(id).unwrap().width, 18.0);
    }
}
