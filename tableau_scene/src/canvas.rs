// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! [`CanvasTarget`]: a [`RenderTarget`] drawing through a [`Backend`].

use kurbo::{Rect, Size, Vec2};
use tableau_events::Cursor;
use tracing::debug;

use crate::backend::{Backend, Composite};
use crate::paint::Pixmap;
use crate::render::{self, DrawResult, RenderTarget};
use crate::scene::Scene;
use crate::types::{NodeId, NodeKind};

/// Draws nodes onto a backend surface.
///
/// Masks are composited offscreen: the masked node is flattened into a layer, the
/// mask is painted into a buffer of the same size, and the layer is drawn into the
/// buffer with [`Composite::SourceIn`] before the buffer is blitted.
#[derive(Debug)]
pub struct CanvasTarget<B> {
    backend: B,
    /// Node currently being flattened; its own mask and cache are ignored.
    flatten_root: Option<NodeId>,
    display_scale: Option<(f64, f64)>,
    cursor: Cursor,
}

impl<B: Backend> CanvasTarget<B> {
    /// Wrap `backend`.
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            flatten_root: None,
            display_scale: None,
            cursor: Cursor::Default,
        }
    }

    pub(crate) fn flattening(mut self, id: NodeId) -> Self {
        self.flatten_root = Some(id);
        self
    }

    /// The wrapped backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The wrapped backend, mutably.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Unwrap the backend.
    pub fn into_backend(self) -> B {
        self.backend
    }

    /// The cursor last requested by the stage.
    pub fn cursor(&self) -> Cursor {
        self.cursor
    }

    /// Render `id` with its mask applied into a `width x height` image.
    fn masked(&self, scene: &Scene, id: NodeId, mask: NodeId) -> Option<Pixmap> {
        let props = scene.props(id)?;
        let Some((w, h)) = surface_size(props.width, props.height) else {
            debug!(node = ?id, "masked node has no area");
            return None;
        };
        let mut layer = CanvasTarget::new(self.backend.offscreen(w, h)).flattening(id);
        render::paint_content(scene, id, &mut layer, &mut Vec::new());
        let content = layer.into_backend().snapshot();

        let mut buffer = CanvasTarget::new(self.backend.offscreen(w, h)).flattening(mask);
        render::paint(scene, mask, &mut buffer, &mut Vec::new());
        let full = full_rect(&content);
        let buffer = buffer.backend_mut();
        buffer.set_composite(Composite::SourceIn);
        buffer.draw_image(&content, full, full);
        buffer.set_composite(Composite::SourceOver);
        Some(buffer.snapshot())
    }

    fn parent_masked(&self, scene: &Scene, id: NodeId) -> bool {
        let Some(parent) = scene.parent(id) else {
            return false;
        };
        self.flatten_root != Some(parent)
            && scene
                .props(parent)
                .and_then(|p| p.mask)
                .is_some_and(|m| scene.is_alive(m))
    }
}

impl<B: Backend> RenderTarget for CanvasTarget<B> {
    fn start_draw(&mut self) {
        self.backend.save();
    }

    fn transform(&mut self, scene: &Scene, id: NodeId) {
        let (Some(props), Some(kind)) = (scene.props(id), scene.kind(id)) else {
            return;
        };
        if matches!(kind, NodeKind::Stage) {
            let scale = (props.scale_x, props.scale_y);
            if self.display_scale != Some(scale) {
                self.display_scale = Some(scale);
                self.backend
                    .set_display_size(Size::new(props.width * scale.0, props.height * scale.1));
            }
        } else {
            self.backend.concat_transform(props.local_affine());
        }
        if props.alpha > 0.0 {
            self.backend.multiply_alpha(props.alpha);
        }
    }

    fn draw(&mut self, scene: &Scene, id: NodeId, src: Rect, dst: Rect) -> DrawResult {
        let flattening = self.flatten_root == Some(id);
        if !flattening && self.parent_masked(scene, id) {
            return DrawResult::Skipped;
        }
        if !flattening {
            let mask = scene
                .props(id)
                .and_then(|p| p.mask)
                .filter(|m| scene.is_alive(*m));
            if let Some(mask) = mask {
                if let Some(image) = self.masked(scene, id, mask) {
                    let full = full_rect(&image);
                    self.backend.draw_image(&image, full, full);
                }
                return DrawResult::Subtree;
            }
            if let Some(cache) = scene.cached(id) {
                let full = full_rect(cache);
                self.backend.draw_image(cache, full, full);
                return DrawResult::Subtree;
            }
        }
        match scene.kind(id) {
            Some(NodeKind::Graphics(graphics)) => {
                graphics.replay(&mut self.backend);
                DrawResult::Content
            }
            Some(NodeKind::Text(text)) => {
                text.draw(&mut self.backend);
                DrawResult::Content
            }
            _ => match scene.drawable(id) {
                Some(image) => {
                    self.backend.draw_image(image, src, dst);
                    DrawResult::Content
                }
                None => DrawResult::Skipped,
            },
        }
    }

    fn end_draw(&mut self) {
        self.backend.restore();
    }

    fn clear(&mut self, rect: Rect) {
        self.backend.clear_rect(rect);
    }

    fn surface_offsets(&self) -> Vec<Vec2> {
        self.backend.offset_chain()
    }

    fn set_cursor(&mut self, cursor: Cursor) {
        self.cursor = cursor;
    }
}

fn full_rect(image: &Pixmap) -> Rect {
    Rect::new(0.0, 0.0, f64::from(image.width()), f64::from(image.height()))
}

/// Whole-pixel surface size covering `width x height`, if it has any area.
pub(crate) fn surface_size(width: f64, height: f64) -> Option<(u32, u32)> {
    let ok = |v: f64| v.is_finite() && v > 0.0 && v <= f64::from(u32::MAX);
    if !ok(width) || !ok(height) {
        return None;
    }
    #[allow(
        clippy::cast_possible_truncation,
        reason = "Range checked above; ceil keeps partial pixels."
    )]
    let size = (width.ceil() as u32, height.ceil() as u32);
    Some(size)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::Graphics;
    use crate::paint::{Color, Image};
    use crate::raster::RasterBackend;
    use crate::types::DisplayProps;
    use std::sync::Arc;

    const RED: Color = Color::rgba(1.0, 0.0, 0.0, 1.0);
    const BLUE: Color = Color::rgba(0.0, 0.0, 1.0, 1.0);

    fn solid(w: u32, h: u32, color: Color) -> Image {
        Arc::new(Pixmap::filled(w, h, color))
    }

    fn render(scene: &mut Scene, root: NodeId, w: u32, h: u32) -> Pixmap {
        let mut target = CanvasTarget::new(RasterBackend::new(w, h));
        scene.render(root, &mut target);
        target.into_backend().snapshot()
    }

    #[test]
    fn surface_sizes() {
        assert_eq!(surface_size(10.2, 3.0), Some((11, 3)));
        assert_eq!(surface_size(0.0, 3.0), None);
        assert_eq!(surface_size(4.0, f64::NAN), None);
        assert_eq!(surface_size(-1.0, 1.0), None);
    }

    #[test]
    fn drawable_lands_at_node_position() {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let shape = s.insert(NodeKind::Shape, DisplayProps::rect(2.0, 3.0, 2.0, 2.0));
        s.set_drawable(shape, Some(solid(2, 2, RED)));
        s.add_child(root, shape).unwrap();
        let out = render(&mut s, root, 6, 6);
        assert_eq!(out.color(2, 3), Some(RED));
        assert_eq!(out.color(3, 4), Some(RED));
        assert_eq!(out.color(1, 3), Some(Color::TRANSPARENT));
        assert_eq!(out.color(4, 4), Some(Color::TRANSPARENT));
    }

    #[test]
    fn cached_rendering_is_pixel_identical() {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let group = s.insert(NodeKind::Container, DisplayProps::rect(3.0, 2.0, 10.0, 8.0));
        let back = s.insert(NodeKind::Shape, DisplayProps::rect(0.0, 0.0, 6.0, 6.0));
        s.set_drawable(back, Some(solid(6, 6, RED)));
        let mut g = Graphics::new();
        g.begin_fill(BLUE, 1.0).draw_rect(0.0, 0.0, 4.0, 4.0).end_fill();
        let front = s.insert(NodeKind::Graphics(g), DisplayProps::rect(5.0, 3.0, 4.0, 4.0));
        s.add_child(root, group).unwrap();
        s.add_children(group, &[back, front]).unwrap();

        let live = render(&mut s, root, 16, 12);
        s.cache(group, &RasterBackend::new(1, 1)).unwrap();
        assert!(s.cached(group).is_some());
        let cached = render(&mut s, root, 16, 12);
        assert_eq!(live, cached);
        assert_eq!(cached.color(9, 6), Some(BLUE));

        // The cache is a snapshot: later child edits do not show until uncached.
        s.props_mut(front).unwrap().x = 0.0;
        assert_eq!(render(&mut s, root, 16, 12), cached);
        s.uncache(group);
        assert_ne!(render(&mut s, root, 16, 12), cached);
    }

    fn masked_scene(cache_children: bool) -> Pixmap {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let group = s.insert(NodeKind::Container, DisplayProps::rect(1.0, 1.0, 8.0, 8.0));
        let a = s.insert(NodeKind::Shape, DisplayProps::rect(0.0, 0.0, 8.0, 4.0));
        let b = s.insert(NodeKind::Shape, DisplayProps::rect(0.0, 4.0, 8.0, 4.0));
        s.set_drawable(a, Some(solid(8, 4, RED)));
        s.set_drawable(b, Some(solid(8, 4, BLUE)));
        // The mask covers the left half of the group.
        let mask = s.insert(NodeKind::Shape, DisplayProps::rect(0.0, 0.0, 4.0, 8.0));
        s.set_drawable(mask, Some(solid(4, 8, Color::BLACK)));
        s.add_child(root, group).unwrap();
        s.add_children(group, &[a, b]).unwrap();
        s.props_mut(group).unwrap().mask = Some(mask);
        if cache_children {
            let backend = RasterBackend::new(1, 1);
            s.cache(a, &backend).unwrap();
            s.cache(b, &backend).unwrap();
        }
        render(&mut s, root, 10, 10)
    }

    #[test]
    fn mask_clips_to_mask_pixels() {
        let out = masked_scene(false);
        assert_eq!(out.color(1, 1), Some(RED));
        assert_eq!(out.color(4, 6), Some(BLUE));
        assert_eq!(out.color(5, 1), Some(Color::TRANSPARENT));
        assert_eq!(out.color(8, 8), Some(Color::TRANSPARENT));
        assert_eq!(out.color(0, 0), Some(Color::TRANSPARENT));
    }

    #[test]
    fn masked_container_ignores_child_caches() {
        assert_eq!(masked_scene(true), masked_scene(false));
    }

    #[test]
    fn stage_scale_sets_display_size() {
        let mut s = Scene::new();
        let stage = s.insert(
            NodeKind::Stage,
            DisplayProps {
                width: 40.0,
                height: 30.0,
                scale_x: 2.0,
                scale_y: 0.5,
                ..Default::default()
            },
        );
        let mut target = CanvasTarget::new(RasterBackend::new(40, 30));
        s.render(stage, &mut target);
        assert_eq!(target.backend().display_size(), Size::new(80.0, 15.0));
        assert_eq!(target.backend().save_depth(), 0, "scopes are balanced");
    }

    #[test]
    fn half_alpha_blends() {
        let mut s = Scene::new();
        let root = s.insert(NodeKind::Container, DisplayProps::default());
        let shape = s.insert(
            NodeKind::Shape,
            DisplayProps {
                width: 1.0,
                height: 1.0,
                alpha: 0.5,
                ..Default::default()
            },
        );
        s.set_drawable(shape, Some(solid(1, 1, RED)));
        s.add_child(root, shape).unwrap();
        let out = render(&mut s, root, 1, 1);
        let [r, g, b, a] = out.pixel(0, 0).unwrap();
        assert!((a - 0.5).abs() <= 1.0 / 255.0, "alpha {a}");
        assert_eq!(r, a, "premultiplied red");
        assert_eq!((g, b), (0.0, 0.0));
    }
}
