// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Colors, paints and pixel buffers.

use std::sync::Arc;

use kurbo::Point;
use tiny_skia::{
    FilterQuality, LinearGradient, Pattern, RadialGradient, Shader, SpreadMode, Transform,
};

/// Shared, immutable pixel data used as a drawable or a cache.
pub type Image = Arc<Pixmap>;

/// A straight-alpha RGBA color with components in `[0, 1]`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha.
    pub a: f32,
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Color {
    /// Opaque black.
    pub const BLACK: Self = Self::rgb(0.0, 0.0, 0.0);
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(1.0, 1.0, 1.0);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::rgba(0.0, 0.0, 0.0, 0.0);

    /// An opaque color.
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self::rgba(r, g, b, 1.0)
    }

    /// A color with alpha.
    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// An opaque color from 8-bit channels.
    pub fn rgb8(r: u8, g: u8, b: u8) -> Self {
        Self::rgb(
            f32::from(r) / 255.0,
            f32::from(g) / 255.0,
            f32::from(b) / 255.0,
        )
    }

    /// Parse `#rgb`, `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.strip_prefix('#')?;
        let digit = |i: usize| -> Option<u8> {
            let c = hex.as_bytes().get(i)?;
            (*c as char).to_digit(16).and_then(|d| u8::try_from(d).ok())
        };
        match hex.len() {
            3 => Some(Self::rgb8(digit(0)? * 17, digit(1)? * 17, digit(2)? * 17)),
            6 | 8 => {
                let byte = |i: usize| Some(digit(i)? * 16 + digit(i + 1)?);
                let mut c = Self::rgb8(byte(0)?, byte(2)?, byte(4)?);
                if hex.len() == 8 {
                    c.a = f32::from(byte(6)?) / 255.0;
                }
                Some(c)
            }
            _ => None,
        }
    }

    /// The same color with alpha multiplied by `alpha`.
    pub fn with_alpha_factor(self, alpha: f32) -> Self {
        Self {
            a: self.a * alpha,
            ..self
        }
    }

    pub(crate) fn to_skia(self) -> tiny_skia::Color {
        let c = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        tiny_skia::Color::from_rgba(c(self.r), c(self.g), c(self.b), c(self.a))
            .unwrap_or(tiny_skia::Color::TRANSPARENT)
    }
}

/// A color stop: offset in `[0, 1]` and color.
pub type GradientStop = (f64, Color);

/// Tiling behavior for pattern paints.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum Repeat {
    /// Tile in both directions.
    #[default]
    Both,
    /// Tile horizontally only.
    X,
    /// Tile vertically only.
    Y,
    /// Draw the image once at the origin.
    None,
}

/// How a filled area is colored.
#[derive(Clone, Debug, PartialEq)]
pub enum Paint {
    /// A single color.
    Solid(Color),
    /// A linear gradient from `start` to `end`.
    Linear {
        /// Gradient start point.
        start: Point,
        /// Gradient end point.
        end: Point,
        /// Color stops in ascending offset order.
        stops: Vec<GradientStop>,
    },
    /// A two-circle radial gradient.
    Radial {
        /// Inner circle center.
        start_center: Point,
        /// Inner circle radius.
        start_radius: f64,
        /// Outer circle center.
        end_center: Point,
        /// Outer circle radius.
        end_radius: f64,
        /// Color stops in ascending offset order.
        stops: Vec<GradientStop>,
    },
    /// An image tiled from the local origin.
    Pattern {
        /// The tile.
        image: Image,
        /// Tiling mode.
        repeat: Repeat,
    },
}

impl Default for Paint {
    fn default() -> Self {
        Self::Solid(Color::BLACK)
    }
}

impl From<Color> for Paint {
    fn from(color: Color) -> Self {
        Self::Solid(color)
    }
}

impl Paint {
    /// Scale the paint's opacity by `alpha`. Patterns are returned unchanged.
    pub fn with_alpha_factor(self, alpha: f32) -> Self {
        let fade = |stops: Vec<GradientStop>| {
            stops
                .into_iter()
                .map(|(o, c)| (o, c.with_alpha_factor(alpha)))
                .collect()
        };
        match self {
            Self::Solid(c) => Self::Solid(c.with_alpha_factor(alpha)),
            Self::Linear { start, end, stops } => Self::Linear {
                start,
                end,
                stops: fade(stops),
            },
            Self::Radial {
                start_center,
                start_radius,
                end_center,
                end_radius,
                stops,
            } => Self::Radial {
                start_center,
                start_radius,
                end_center,
                end_radius,
                stops: fade(stops),
            },
            pattern @ Self::Pattern { .. } => pattern,
        }
    }

    /// The tiny-skia shader for this paint in local coordinates, with opacity scaled
    /// by `alpha`.
    ///
    /// Returns `None` when nothing would be painted: a gradient without stops or an
    /// empty pattern image.
    pub(crate) fn to_shader(&self, alpha: f32) -> Option<Shader<'_>> {
        match self {
            Self::Solid(c) => Some(Shader::SolidColor(c.with_alpha_factor(alpha).to_skia())),
            Self::Linear { start, end, stops } => {
                let fallback = solid_fallback(stops, alpha)?;
                let stops = skia_stops(stops, alpha, |o| o);
                Some(
                    LinearGradient::new(
                        skia_point(*start),
                        skia_point(*end),
                        stops,
                        SpreadMode::Pad,
                        Transform::identity(),
                    )
                    .unwrap_or(fallback),
                )
            }
            Self::Radial {
                start_center,
                start_radius,
                end_center,
                end_radius,
                stops: source,
            } => {
                let fallback = solid_fallback(source, alpha)?;
                // tiny-skia's radial gradient starts at radius zero; rescale the stops
                // so that offset zero lands on the inner circle.
                let (r0, r1) = (start_radius.max(0.0), end_radius.max(0.0));
                let remap = |o: f64| if r1 > 0.0 { (r0 + o * (r1 - r0)) / r1 } else { o };
                let mut stops = skia_stops(source, alpha, remap);
                if let Some((_, first)) = source.first().filter(|_| r0 > 0.0) {
                    let inner = first.with_alpha_factor(alpha).to_skia();
                    stops.insert(0, tiny_skia::GradientStop::new(0.0, inner));
                }
                #[allow(
                    clippy::cast_possible_truncation,
                    reason = "tiny-skia geometry is f32."
                )]
                let radius = r1 as f32;
                Some(
                    RadialGradient::new(
                        skia_point(*start_center),
                        skia_point(*end_center),
                        radius,
                        stops,
                        SpreadMode::Pad,
                        Transform::identity(),
                    )
                    .unwrap_or(fallback),
                )
            }
            Self::Pattern { image, .. } => Some(Pattern::new(
                image.skia()?.as_ref(),
                SpreadMode::Repeat,
                FilterQuality::Nearest,
                alpha,
                Transform::identity(),
            )),
        }
    }
}

fn skia_point(p: Point) -> tiny_skia::Point {
    #[allow(
        clippy::cast_possible_truncation,
        reason = "tiny-skia geometry is f32."
    )]
    tiny_skia::Point::from_xy(p.x as f32, p.y as f32)
}

/// The last stop as a solid color, used when a gradient is degenerate.
fn solid_fallback(stops: &[GradientStop], alpha: f32) -> Option<Shader<'static>> {
    let (_, color) = stops.last()?;
    Some(Shader::SolidColor(color.with_alpha_factor(alpha).to_skia()))
}

fn skia_stops(
    stops: &[GradientStop],
    alpha: f32,
    remap: impl Fn(f64) -> f64,
) -> Vec<tiny_skia::GradientStop> {
    stops
        .iter()
        .map(|(offset, color)| {
            #[allow(
                clippy::cast_possible_truncation,
                reason = "Gradient offsets are f32 in tiny-skia."
            )]
            let offset = remap(*offset) as f32;
            tiny_skia::GradientStop::new(offset, color.with_alpha_factor(alpha).to_skia())
        })
        .collect()
}

/// A premultiplied RGBA8 raster backed by a [`tiny_skia::Pixmap`].
///
/// A zero-sized pixmap is valid; it has no pixels and ignores drawing.
#[derive(Clone)]
pub struct Pixmap {
    width: u32,
    height: u32,
    inner: Option<tiny_skia::Pixmap>,
}

impl core::fmt::Debug for Pixmap {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pixmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl PartialEq for Pixmap {
    fn eq(&self, other: &Self) -> bool {
        self.width == other.width && self.height == other.height && self.data() == other.data()
    }
}

impl From<tiny_skia::Pixmap> for Pixmap {
    fn from(inner: tiny_skia::Pixmap) -> Self {
        Self {
            width: inner.width(),
            height: inner.height(),
            inner: Some(inner),
        }
    }
}

impl Pixmap {
    /// A transparent pixmap.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            inner: tiny_skia::Pixmap::new(width, height),
        }
    }

    /// A pixmap filled with one color.
    pub fn filled(width: u32, height: u32, color: Color) -> Self {
        let mut p = Self::new(width, height);
        if let Some(inner) = &mut p.inner {
            inner.fill(color.to_skia());
        }
        p
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied pixel at integer coordinates, channels in `[0, 1]`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[f32; 4]> {
        let p = self.inner.as_ref()?.pixel(x, y)?;
        let f = |v: u8| f32::from(v) / 255.0;
        Some([f(p.red()), f(p.green()), f(p.blue()), f(p.alpha())])
    }

    /// Straight-alpha color at integer coordinates.
    pub fn color(&self, x: u32, y: u32) -> Option<Color> {
        let c = self.inner.as_ref()?.pixel(x, y)?.demultiply();
        let f = |v: u8| f32::from(v) / 255.0;
        if c.alpha() == 0 {
            return Some(Color::TRANSPARENT);
        }
        Some(Color::rgba(f(c.red()), f(c.green()), f(c.blue()), f(c.alpha())))
    }

    /// Overwrite a pixel.
    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = y as usize * self.width as usize + x as usize;
        if let Some(px) = self.inner.as_mut().and_then(|p| p.pixels_mut().get_mut(i)) {
            *px = color.to_skia().premultiply().to_color_u8();
        }
    }

    /// Whether every pixel is fully transparent.
    pub fn is_clear(&self) -> bool {
        self.inner
            .as_ref()
            .is_none_or(|p| p.pixels().iter().all(|px| px.alpha() == 0))
    }

    /// Raw premultiplied RGBA8 bytes, row-major.
    pub fn data(&self) -> &[u8] {
        match &self.inner {
            Some(p) => p.data(),
            None => &[],
        }
    }

    /// Quantize to 8-bit straight-alpha RGBA, row-major.
    pub fn to_rgba8(&self) -> Vec<u8> {
        let Some(inner) = &self.inner else {
            return Vec::new();
        };
        inner
            .pixels()
            .iter()
            .flat_map(|px| {
                let c = px.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect()
    }

    pub(crate) fn skia(&self) -> Option<&tiny_skia::Pixmap> {
        self.inner.as_ref()
    }

    pub(crate) fn skia_mut(&mut self) -> Option<&mut tiny_skia::Pixmap> {
        self.inner.as_mut()
    }
}
