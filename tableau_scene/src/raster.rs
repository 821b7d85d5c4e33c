// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! A software [`Backend`] rendering into a [`Pixmap`] with tiny-skia.
//!
//! Paths, strokes and paints go through tiny-skia; images are sampled
//! nearest-neighbour. Text is rasterized with fontdue once a font is supplied
//! through [`RasterBackend::with_font`]; without one, text is measured with a
//! fixed-advance estimate and not drawn.
//!
//! Anti-aliasing is on by default. Turn it off with
//! [`RasterBackend::with_anti_alias`] when pixel-center coverage is wanted.

use std::sync::Arc;

use fontdue::layout::{CoordinateSystem, Layout, LayoutSettings};
use kurbo::{Affine, BezPath, PathEl, Point, Rect, Shape, Size, Vec2};
use tiny_skia::{
    BlendMode, FillRule, FilterQuality, Mask, PathBuilder, Pattern, PixmapPaint, Shader,
    SpreadMode, Transform,
};
use tracing::{debug, warn};

use crate::backend::{
    Backend, Composite, DrawingApi, Font, FontMetrics, StrokeStyle, TextAlign, TextStyle,
};
use crate::error::SceneError;
use crate::paint::{Paint, Pixmap, Repeat};

const PATH_TOLERANCE: f64 = 0.1;

#[derive(Copy, Clone, Debug)]
struct State {
    transform: Affine,
    alpha: f64,
    composite: Composite,
}

impl Default for State {
    fn default() -> Self {
        Self {
            transform: Affine::IDENTITY,
            alpha: 1.0,
            composite: Composite::SourceOver,
        }
    }
}

/// Software rasterizer implementing [`Backend`].
#[derive(Clone)]
pub struct RasterBackend {
    pixmap: Pixmap,
    state: State,
    stack: Vec<State>,
    display_size: Size,
    offsets: Vec<Vec2>,
    anti_alias: bool,
    font: Option<Arc<fontdue::Font>>,
    text_warned: bool,
}

impl core::fmt::Debug for RasterBackend {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RasterBackend")
            .field("pixmap", &self.pixmap)
            .field("state", &self.state)
            .field("save_depth", &self.stack.len())
            .field("anti_alias", &self.anti_alias)
            .field("has_font", &self.font.is_some())
            .finish_non_exhaustive()
    }
}

impl RasterBackend {
    /// A transparent surface.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixmap: Pixmap::new(width, height),
            state: State::default(),
            stack: Vec::new(),
            display_size: Size::new(f64::from(width), f64::from(height)),
            offsets: Vec::new(),
            anti_alias: true,
            font: None,
            text_warned: false,
        }
    }

    /// Load a TrueType or OpenType font used for all text on this surface and its
    /// offscreens.
    pub fn with_font(mut self, bytes: &[u8]) -> Result<Self, SceneError> {
        let font = fontdue::Font::from_bytes(bytes, fontdue::FontSettings::default())
            .map_err(|e| SceneError::Font(e.to_owned()))?;
        self.font = Some(Arc::new(font));
        Ok(self)
    }

    /// Enable or disable anti-aliased edges.
    pub fn with_anti_alias(mut self, anti_alias: bool) -> Self {
        self.anti_alias = anti_alias;
        self
    }

    /// Set the page offsets reported by [`Backend::offset_chain`], innermost first.
    pub fn with_offsets(mut self, offsets: Vec<Vec2>) -> Self {
        self.offsets = offsets;
        self
    }

    /// The displayed size last set through [`Backend::set_display_size`].
    pub fn display_size(&self) -> Size {
        self.display_size
    }

    /// Borrow the pixels.
    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    /// Depth of the save stack.
    pub fn save_depth(&self) -> usize {
        self.stack.len()
    }

    /// Run `draw` against the surface under the current composite mode.
    ///
    /// Source-over draws straight into the surface. Source-in draws into a
    /// transparent layer first and composites the whole layer, so pixels the
    /// source does not cover are cleared.
    fn composite(&mut self, draw: impl FnOnce(&mut tiny_skia::Pixmap)) {
        let composite = self.state.composite;
        let Some(target) = self.pixmap.skia_mut() else {
            return;
        };
        match composite {
            Composite::SourceOver => draw(target),
            Composite::SourceIn => {
                let Some(mut layer) = tiny_skia::Pixmap::new(target.width(), target.height())
                else {
                    return;
                };
                draw(&mut layer);
                let paint = PixmapPaint {
                    blend_mode: BlendMode::SourceIn,
                    ..PixmapPaint::default()
                };
                target.draw_pixmap(0, 0, layer.as_ref(), &paint, Transform::identity(), None);
            }
        }
    }

    /// Restrict non-repeating pattern axes to the tile's extent.
    fn pattern_mask(&self, repeat: Repeat, tile: (u32, u32)) -> Option<Mask> {
        if repeat == Repeat::Both {
            return None;
        }
        let (w, h) = self.pixmap_size();
        let transform = self.state.transform;
        if transform.determinant() == 0.0 {
            return None;
        }
        // The surface in local space bounds the infinite direction.
        let local = transform.inverse().transform_rect_bbox(Rect::new(
            0.0,
            0.0,
            f64::from(w),
            f64::from(h),
        ));
        let (tw, th) = (f64::from(tile.0), f64::from(tile.1));
        let area = match repeat {
            Repeat::X => Rect::new(local.x0, 0.0, local.x1, th),
            Repeat::Y => Rect::new(0.0, local.y0, tw, local.y1),
            Repeat::None | Repeat::Both => Rect::new(0.0, 0.0, tw, th),
        };
        let path = skia_path(&area.to_path(PATH_TOLERANCE))?;
        let mut mask = Mask::new(w, h)?;
        mask.fill_path(
            &path,
            FillRule::Winding,
            self.anti_alias,
            skia_transform(transform),
        );
        Some(mask)
    }

    fn pixmap_size(&self) -> (u32, u32) {
        (self.pixmap.width(), self.pixmap.height())
    }

    /// Fill `area` in local space with `shader`.
    fn fill_shader(&mut self, area: &tiny_skia::Path, shader: Shader<'_>, mask: Option<&Mask>) {
        let transform = skia_transform(self.state.transform);
        let paint = tiny_skia::Paint {
            shader,
            anti_alias: self.anti_alias,
            ..tiny_skia::Paint::default()
        };
        self.composite(|pm| pm.fill_path(area, &paint, FillRule::Winding, transform, mask));
    }

    /// Draw a glyph run laid out by fontdue with its line top at `origin`.
    fn draw_glyphs(&mut self, font: &fontdue::Font, text: &str, origin: Point, style: &TextStyle) {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "fontdue sizes are f32."
        )]
        let px = style.font.size.max(1.0) as f32;
        let mut layout = Layout::new(CoordinateSystem::PositiveYDown);
        layout.reset(&LayoutSettings::default());
        layout.append(&[font], &fontdue::layout::TextStyle::new(text, px, 0));

        let width = self.measure_text(text, &style.font);
        let squeeze = if style.max_width > 0.0 && width > style.max_width {
            style.max_width / width
        } else {
            1.0
        };
        let shift = match style.align {
            TextAlign::Start => 0.0,
            TextAlign::Center => -width * squeeze / 2.0,
            TextAlign::End => -width * squeeze,
        };
        let base = style.color.to_skia().to_color_u8();
        let saved = self.state.transform;
        self.state.transform = saved
            * Affine::translate((origin.x + shift, origin.y))
            * Affine::scale_non_uniform(squeeze, 1.0);
        for glyph in layout.glyphs() {
            let (metrics, coverage) = font.rasterize_config(glyph.key);
            if metrics.width == 0 || metrics.height == 0 {
                continue;
            }
            let Some(image) = glyph_pixmap(&metrics, &coverage, base, style.outline) else {
                continue;
            };
            let (w, h) = (f64::from(image.width()), f64::from(image.height()));
            let (x, y) = (f64::from(glyph.x), f64::from(glyph.y));
            self.draw_image(
                &image,
                Rect::new(0.0, 0.0, w, h),
                Rect::new(x, y, x + w, y + h),
            );
        }
        self.state.transform = saved;
    }
}

/// Tint a coverage bitmap with `base`. Outlined text keeps only covered pixels
/// with an uncovered 4-neighbour.
fn glyph_pixmap(
    metrics: &fontdue::Metrics,
    coverage: &[u8],
    base: tiny_skia::ColorU8,
    outline: bool,
) -> Option<Pixmap> {
    let w = u32::try_from(metrics.width).ok()?;
    let h = u32::try_from(metrics.height).ok()?;
    let mut pixmap = tiny_skia::Pixmap::new(w, h)?;
    let (mw, mh) = (metrics.width, metrics.height);
    let at = |x: isize, y: isize| -> u8 {
        if x < 0 || y < 0 || x >= mw as isize || y >= mh as isize {
            return 0;
        }
        coverage.get(y as usize * mw + x as usize).copied().unwrap_or(0)
    };
    for (i, px) in pixmap.pixels_mut().iter_mut().enumerate() {
        let (x, y) = ((i % mw) as isize, (i / mw) as isize);
        let mut cov = at(x, y);
        if outline
            && [(-1, 0), (1, 0), (0, -1), (0, 1)]
                .iter()
                .all(|(dx, dy)| at(x + dx, y + dy) == 255)
        {
            cov = 0;
        }
        let alpha = u16::from(base.alpha()) * u16::from(cov) / 255;
        let alpha = u8::try_from(alpha).unwrap_or(u8::MAX);
        *px = tiny_skia::ColorU8::from_rgba(base.red(), base.green(), base.blue(), alpha)
            .premultiply();
    }
    Some(pixmap.into())
}

fn skia_transform(affine: Affine) -> Transform {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "tiny-skia transforms are f32."
    )]
    let [sx, ky, kx, sy, tx, ty] = affine.as_coeffs().map(|v| v as f32);
    Transform::from_row(sx, ky, kx, sy, tx, ty)
}

#[allow(
    clippy::cast_possible_truncation,
    reason = "tiny-skia geometry is f32."
)]
fn skia_path(path: &BezPath) -> Option<tiny_skia::Path> {
    let f = |p: Point| (p.x as f32, p.y as f32);
    let mut pb = PathBuilder::new();
    for el in path.elements() {
        match *el {
            PathEl::MoveTo(p) => {
                let (x, y) = f(p);
                pb.move_to(x, y);
            }
            PathEl::LineTo(p) => {
                let (x, y) = f(p);
                pb.line_to(x, y);
            }
            PathEl::QuadTo(p1, p2) => {
                let ((x1, y1), (x, y)) = (f(p1), f(p2));
                pb.quad_to(x1, y1, x, y);
            }
            PathEl::CurveTo(p1, p2, p3) => {
                let ((x1, y1), (x2, y2), (x, y)) = (f(p1), f(p2), f(p3));
                pb.cubic_to(x1, y1, x2, y2, x, y);
            }
            PathEl::ClosePath => pb.close(),
        }
    }
    pb.finish()
}

impl DrawingApi for RasterBackend {
    fn fill_path(&mut self, path: &BezPath, paint: &Paint) {
        if self.state.transform.determinant() == 0.0 {
            return;
        }
        let Some(area) = skia_path(path) else {
            return;
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Global alpha is stored as f64 and applied in f32."
        )]
        let alpha = self.state.alpha as f32;
        let mask = match paint {
            Paint::Pattern { image, repeat } => {
                self.pattern_mask(*repeat, (image.width(), image.height()))
            }
            _ => None,
        };
        let Some(shader) = paint.to_shader(alpha) else {
            return;
        };
        self.fill_shader(&area, shader, mask.as_ref());
    }

    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle) {
        if style.width <= 0.0 || self.state.transform.determinant() == 0.0 {
            return;
        }
        let Some(line) = skia_path(path) else {
            return;
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Global alpha is stored as f64 and applied in f32."
        )]
        let alpha = self.state.alpha as f32;
        let Some(shader) = style.paint.to_shader(alpha) else {
            return;
        };
        let transform = skia_transform(self.state.transform);
        let stroke = style.to_skia();
        let paint = tiny_skia::Paint {
            shader,
            anti_alias: self.anti_alias,
            ..tiny_skia::Paint::default()
        };
        self.composite(|pm| pm.stroke_path(&line, &paint, &stroke, transform, None));
    }

    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle) {
        let Some(font) = self.font.clone() else {
            if !self.text_warned {
                warn!("raster backend has no font; text is measured but not drawn");
                self.text_warned = true;
            }
            debug!(text, x = origin.x, y = origin.y, size = style.font.size, "fill_text skipped");
            return;
        };
        self.draw_glyphs(&font, text, origin, style);
    }

    fn measure_text(&self, text: &str, font: &Font) -> f64 {
        match &self.font {
            Some(face) => {
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "fontdue sizes are f32."
                )]
                let px = font.size as f32;
                text.chars()
                    .map(|c| f64::from(face.metrics(c, px).advance_width))
                    .sum()
            }
            None => text.chars().count() as f64 * font.size * 0.6,
        }
    }

    fn font_metrics(&self, font: &Font) -> FontMetrics {
        #[allow(
            clippy::cast_possible_truncation,
            reason = "fontdue sizes are f32."
        )]
        let px = font.size as f32;
        match self.font.as_ref().and_then(|f| f.horizontal_line_metrics(px)) {
            Some(m) => {
                let ascent = f64::from(m.ascent);
                let descent = f64::from(m.descent.abs());
                FontMetrics {
                    height: f64::from(m.new_line_size).max(ascent + descent).ceil(),
                    ascent,
                    descent,
                }
            }
            None => FontMetrics {
                height: (font.size * 1.2).ceil(),
                ascent: font.size,
                descent: (font.size * 1.2).ceil() - font.size,
            },
        }
    }
}

impl Backend for RasterBackend {
    fn size(&self) -> (u32, u32) {
        self.pixmap_size()
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn concat_transform(&mut self, affine: Affine) {
        self.state.transform *= affine;
    }

    fn multiply_alpha(&mut self, alpha: f64) {
        self.state.alpha *= alpha;
    }

    fn set_composite(&mut self, composite: Composite) {
        self.state.composite = composite;
    }

    fn clear_rect(&mut self, rect: Rect) {
        let Some(area) = skia_path(&rect.to_path(PATH_TOLERANCE)) else {
            return;
        };
        let transform = skia_transform(self.state.transform);
        let paint = tiny_skia::Paint {
            blend_mode: BlendMode::Clear,
            anti_alias: self.anti_alias,
            ..tiny_skia::Paint::default()
        };
        if let Some(pm) = self.pixmap.skia_mut() {
            pm.fill_path(&area, &paint, FillRule::Winding, transform, None);
        }
    }

    fn draw_image(&mut self, image: &Pixmap, src: Rect, dst: Rect) {
        let Some(texture) = image.skia() else {
            return;
        };
        if self.state.transform.determinant() == 0.0
            || src.width() <= 0.0
            || src.height() <= 0.0
            || dst.width() == 0.0
            || dst.height() == 0.0
        {
            return;
        }
        let (sx, sy) = (dst.width() / src.width(), dst.height() / src.height());
        let bounds = Rect::new(
            0.0,
            0.0,
            f64::from(texture.width()),
            f64::from(texture.height()),
        );
        let visible = src.intersect(bounds);
        if visible.width() <= 0.0 || visible.height() <= 0.0 {
            return;
        }
        // Image space to local space, then only the part of `dst` the image covers.
        let to_local = Affine::new([sx, 0.0, 0.0, sy, dst.x0 - src.x0 * sx, dst.y0 - src.y0 * sy]);
        let area = to_local.transform_rect_bbox(visible);
        let Some(area) = skia_path(&area.to_path(PATH_TOLERANCE)) else {
            return;
        };
        #[allow(
            clippy::cast_possible_truncation,
            reason = "Global alpha is stored as f64 and applied in f32."
        )]
        let alpha = self.state.alpha as f32;
        let shader = Pattern::new(
            texture.as_ref(),
            SpreadMode::Pad,
            FilterQuality::Nearest,
            alpha,
            skia_transform(to_local),
        );
        self.fill_shader(&area, shader, None);
    }

    fn set_display_size(&mut self, size: Size) {
        debug!(width = size.width, height = size.height, "display size");
        self.display_size = size;
    }

    fn offset_chain(&self) -> Vec<Vec2> {
        self.offsets.clone()
    }

    fn offscreen(&self, width: u32, height: u32) -> Self {
        let mut surface = Self::new(width, height).with_anti_alias(self.anti_alias);
        surface.font = self.font.clone();
        surface
    }

    fn snapshot(&self) -> Pixmap {
        self.pixmap.clone()
    }
}
