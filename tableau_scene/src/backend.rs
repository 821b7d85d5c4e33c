// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The immediate-mode surface contract used by [`CanvasTarget`](crate::CanvasTarget).
//!
//! [`DrawingApi`] is the vector/text part that [`Graphics`](crate::graphics::Graphics)
//! and [`Text`](crate::text::Text) replay against. [`Backend`] adds the state stack,
//! compositing and image blits.

use kurbo::{Affine, BezPath, Cap, Join, Point, Rect, Size, Vec2};

use crate::paint::{Color, Paint, Pixmap};

/// How new pixels combine with what is already on the surface.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Composite {
    /// Draw over existing content.
    #[default]
    SourceOver,
    /// Keep new pixels only where the surface already has coverage, scaled by its
    /// alpha; everything else becomes transparent.
    SourceIn,
}

/// Stroke parameters for [`DrawingApi::stroke_path`].
#[derive(Clone, Debug, PartialEq)]
pub struct StrokeStyle {
    /// Line width.
    pub width: f64,
    /// Line color or paint.
    pub paint: Paint,
    /// End cap shape.
    pub cap: Cap,
    /// Corner shape.
    pub join: Join,
    /// Miter length limit.
    pub miter_limit: f64,
}

impl Default for StrokeStyle {
    fn default() -> Self {
        Self {
            width: 1.0,
            paint: Paint::default(),
            cap: Cap::Butt,
            join: Join::Miter,
            miter_limit: 10.0,
        }
    }
}

impl StrokeStyle {
    /// A stroke of `width` painted with `paint`.
    pub fn new(width: f64, paint: impl Into<Paint>) -> Self {
        Self {
            width,
            paint: paint.into(),
            ..Default::default()
        }
    }

    /// Replace the cap.
    pub fn with_cap(mut self, cap: Cap) -> Self {
        self.cap = cap;
        self
    }

    /// Replace the join.
    pub fn with_join(mut self, join: Join) -> Self {
        self.join = join;
        self
    }

    /// Replace the miter limit.
    pub fn with_miter_limit(mut self, limit: f64) -> Self {
        self.miter_limit = limit;
        self
    }

    #[allow(
        clippy::cast_possible_truncation,
        reason = "tiny-skia geometry is f32."
    )]
    pub(crate) fn to_skia(&self) -> tiny_skia::Stroke {
        tiny_skia::Stroke {
            width: self.width as f32,
            miter_limit: self.miter_limit as f32,
            line_cap: match self.cap {
                Cap::Butt => tiny_skia::LineCap::Butt,
                Cap::Round => tiny_skia::LineCap::Round,
                Cap::Square => tiny_skia::LineCap::Square,
            },
            line_join: match self.join {
                Join::Bevel => tiny_skia::LineJoin::Bevel,
                Join::Miter => tiny_skia::LineJoin::Miter,
                Join::Round => tiny_skia::LineJoin::Round,
            },
            dash: None,
        }
    }
}

/// A font request.
#[derive(Clone, Debug, PartialEq)]
pub struct Font {
    /// Family name.
    pub family: String,
    /// Size in pixels.
    pub size: f64,
}

impl Default for Font {
    fn default() -> Self {
        Self {
            family: "sans-serif".into(),
            size: 12.0,
        }
    }
}

/// Vertical font measurements.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FontMetrics {
    /// Line height.
    pub height: f64,
    /// Distance from the top of the line to the baseline.
    pub ascent: f64,
    /// Distance from the baseline to the bottom of the line.
    pub descent: f64,
}

/// Horizontal anchoring of a text line at its origin.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum TextAlign {
    /// Origin at the start of the line.
    #[default]
    Start,
    /// Origin at the middle of the line.
    Center,
    /// Origin at the end of the line.
    End,
}

/// Parameters for [`DrawingApi::fill_text`]. The origin is the top of the line.
#[derive(Clone, Debug, PartialEq)]
pub struct TextStyle {
    /// Font.
    pub font: Font,
    /// Text color.
    pub color: Color,
    /// Anchoring.
    pub align: TextAlign,
    /// Stroke glyph outlines instead of filling.
    pub outline: bool,
    /// Maximum rendered width of a line.
    pub max_width: f64,
}

/// Vector and text drawing on a surface, in the surface's current transform.
pub trait DrawingApi {
    /// Fill `path` with the nonzero winding rule.
    fn fill_path(&mut self, path: &BezPath, paint: &Paint);
    /// Stroke `path`.
    fn stroke_path(&mut self, path: &BezPath, style: &StrokeStyle);
    /// Draw one line of text with its top at `origin`.
    fn fill_text(&mut self, text: &str, origin: Point, style: &TextStyle);
    /// Advance width of `text`.
    fn measure_text(&self, text: &str, font: &Font) -> f64;
    /// Vertical metrics of `font`.
    fn font_metrics(&self, font: &Font) -> FontMetrics;
}

/// A 2D immediate-mode surface.
///
/// State (`transform`, alpha, composite mode) is scoped by [`Backend::save`] and
/// [`Backend::restore`].
pub trait Backend: DrawingApi {
    /// Surface size in pixels.
    fn size(&self) -> (u32, u32);
    /// Push the drawing state.
    fn save(&mut self);
    /// Pop the drawing state.
    fn restore(&mut self);
    /// Post-multiply the current transform: `current * affine`.
    fn concat_transform(&mut self, affine: Affine);
    /// Multiply the global alpha.
    fn multiply_alpha(&mut self, alpha: f64);
    /// Set the composite mode.
    fn set_composite(&mut self, composite: Composite);
    /// Make `rect` (in the current transform) fully transparent.
    fn clear_rect(&mut self, rect: Rect);
    /// Draw the `src` region of `image` into `dst`.
    fn draw_image(&mut self, image: &Pixmap, src: Rect, dst: Rect);
    /// Record the displayed size of the surface, used for stage scaling.
    fn set_display_size(&mut self, size: Size);
    /// Offsets of the surface and each of its containing elements within the page.
    fn offset_chain(&self) -> Vec<Vec2>;
    /// A fresh transparent surface of the same type.
    fn offscreen(&self, width: u32, height: u32) -> Self
    where
        Self: Sized;
    /// Copy out the current pixels.
    fn snapshot(&self) -> Pixmap;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_style_builders() {
        let s = StrokeStyle::new(3.0, Color::WHITE)
            .with_cap(Cap::Round)
            .with_join(Join::Bevel)
            .with_miter_limit(4.0);
        let k = s.to_skia();
        assert_eq!(k.width, 3.0);
        assert_eq!(k.line_cap, tiny_skia::LineCap::Round);
        assert_eq!(k.line_join, tiny_skia::LineJoin::Bevel);
        assert_eq!(k.miter_limit, 4.0);
        assert_eq!(s.paint, Paint::Solid(Color::WHITE));
    }
}
