// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Recorded vector drawing for [`NodeKind::Graphics`](crate::NodeKind::Graphics) nodes.
//!
//! Builder calls append [`Command`]s; [`Graphics::replay`] walks them against a
//! [`DrawingApi`], keeping a current path and the current fill and stroke styles the
//! way a 2D canvas context does.

use core::f64::consts::{FRAC_PI_2, PI, TAU};

use kurbo::{Arc, BezPath, PathEl, Point, Rect, Vec2};

use crate::backend::{DrawingApi, StrokeStyle};
use crate::error::SceneError;
use crate::paint::{GradientStop, Image, Paint, Repeat};

/// Control point factor for approximating a quarter ellipse with a cubic.
const KAPPA: f64 = 0.552_284_749_830_793_3;

const ARC_TOLERANCE: f64 = 0.1;

/// One recorded drawing command.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Set the stroke style.
    LineStyle(StrokeStyle),
    /// Set the fill paint.
    FillStyle(Paint),
    /// Discard the current path.
    BeginPath,
    /// Close the current subpath.
    ClosePath,
    /// Start a subpath.
    MoveTo(Point),
    /// Line to a point.
    LineTo(Point),
    /// Cubic Bézier to a point.
    CurveTo(Point, Point, Point),
    /// Add a closed rectangle subpath.
    Rect(Rect),
    /// Clockwise circular arc; connected to the current point by a line.
    Arc {
        /// Center.
        center: Point,
        /// Radius.
        radius: f64,
        /// Start angle in radians.
        start: f64,
        /// End angle in radians.
        end: f64,
    },
    /// Stroke the current path.
    Stroke,
    /// Fill the current path.
    Fill,
}

/// A list of vector drawing commands.
///
/// ```
/// use tableau_scene::graphics::Graphics;
/// use tableau_scene::{Color, StrokeStyle};
///
/// let mut g = Graphics::new();
/// g.line_style(StrokeStyle::new(2.0, Color::BLACK))
///     .begin_fill(Color::WHITE, 1.0)
///     .draw_round_rect(0.0, 0.0, 40.0, 20.0, 4.0)
///     .end_fill();
/// assert!(!g.commands().is_empty());
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Graphics {
    commands: Vec<Command>,
    has_stroke: bool,
    has_fill: bool,
}

impl Graphics {
    /// An empty command list.
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded commands.
    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    fn push(&mut self, command: Command) -> &mut Self {
        self.commands.push(command);
        self
    }

    /// Set the stroke style and stroke on [`Graphics::end_fill`].
    pub fn line_style(&mut self, style: StrokeStyle) -> &mut Self {
        self.has_stroke = true;
        self.push(Command::LineStyle(style))
    }

    /// Set the fill paint, faded by `alpha`, and fill on [`Graphics::end_fill`].
    pub fn begin_fill(&mut self, paint: impl Into<Paint>, alpha: f32) -> &mut Self {
        self.has_fill = true;
        self.push(Command::FillStyle(paint.into().with_alpha_factor(alpha)))
    }

    /// Fill with a linear gradient from `start` to `end`.
    pub fn begin_linear_gradient_fill(
        &mut self,
        start: Point,
        end: Point,
        stops: Vec<GradientStop>,
    ) -> &mut Self {
        self.has_fill = true;
        self.push(Command::FillStyle(Paint::Linear { start, end, stops }))
    }

    /// Fill with a radial gradient between two circles.
    pub fn begin_radial_gradient_fill(
        &mut self,
        start: (Point, f64),
        end: (Point, f64),
        stops: Vec<GradientStop>,
    ) -> &mut Self {
        self.has_fill = true;
        self.push(Command::FillStyle(Paint::Radial {
            start_center: start.0,
            start_radius: start.1,
            end_center: end.0,
            end_radius: end.1,
            stops,
        }))
    }

    /// Fill with a tiled image.
    pub fn begin_bitmap_fill(&mut self, image: Image, repeat: Repeat) -> &mut Self {
        self.has_fill = true;
        self.push(Command::FillStyle(Paint::Pattern { image, repeat }))
    }

    /// Stroke and fill the current path with the styles set so far.
    pub fn end_fill(&mut self) -> &mut Self {
        if self.has_stroke {
            self.push(Command::Stroke);
        }
        if self.has_fill {
            self.push(Command::Fill);
        }
        self
    }

    /// Start a new path.
    pub fn begin_path(&mut self) -> &mut Self {
        self.push(Command::BeginPath)
    }

    /// Close the current subpath.
    pub fn close_path(&mut self) -> &mut Self {
        self.push(Command::ClosePath)
    }

    /// Start a subpath at `(x, y)`.
    pub fn move_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push(Command::MoveTo(Point::new(x, y)))
    }

    /// Line to `(x, y)`.
    pub fn line_to(&mut self, x: f64, y: f64) -> &mut Self {
        self.push(Command::LineTo(Point::new(x, y)))
    }

    /// Cubic Bézier through two control points to `p`.
    pub fn curve_to(&mut self, c1: Point, c2: Point, p: Point) -> &mut Self {
        self.push(Command::CurveTo(c1, c2, p))
    }

    /// Add a rectangle.
    pub fn draw_rect(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        self.push(Command::Rect(Rect::new(x, y, x + width, y + height)))
    }

    /// Add a rectangle with one corner radius per corner, clockwise from top left.
    pub fn draw_round_rect_complex(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radii: [f64; 4],
    ) -> &mut Self {
        let [tl, tr, br, bl] = radii;
        let arc = |cx: f64, cy: f64, r: f64, start: f64| Command::Arc {
            center: Point::new(cx, cy),
            radius: r,
            start,
            end: start + FRAC_PI_2,
        };
        self.move_to(x + tl, y)
            .line_to(x + width - tr, y)
            .push(arc(x + width - tr, y + tr, tr, -FRAC_PI_2))
            .line_to(x + width, y + height - br)
            .push(arc(x + width - br, y + height - br, br, 0.0))
            .line_to(x + bl, y + height)
            .push(arc(x + bl, y + height - bl, bl, FRAC_PI_2))
            .line_to(x, y + tl)
            .push(arc(x + tl, y + tl, tl, PI))
    }

    /// Add a rectangle with equal rounded corners.
    pub fn draw_round_rect(
        &mut self,
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        radius: f64,
    ) -> &mut Self {
        self.draw_round_rect_complex(x, y, width, height, [radius; 4])
    }

    /// Add a circle whose bounding square has its top left corner at `(x, y)`.
    pub fn draw_circle(&mut self, x: f64, y: f64, radius: f64) -> &mut Self {
        self.push(Command::Arc {
            center: Point::new(x + radius, y + radius),
            radius,
            start: 0.0,
            end: TAU,
        })
    }

    /// Add an ellipse inscribed in the given box.
    pub fn draw_ellipse(&mut self, x: f64, y: f64, width: f64, height: f64) -> &mut Self {
        if width == height {
            return self.draw_circle(x, y, width / 2.0);
        }
        let (w, h) = (width / 2.0, height / 2.0);
        let (cx, cy) = (KAPPA * w, KAPPA * h);
        let (x, y) = (x + w, y + h);
        self.move_to(x + w, y)
            .curve_to(
                Point::new(x + w, y - cy),
                Point::new(x + cx, y - h),
                Point::new(x, y - h),
            )
            .curve_to(
                Point::new(x - cx, y - h),
                Point::new(x - w, y - cy),
                Point::new(x - w, y),
            )
            .curve_to(
                Point::new(x - w, y + cy),
                Point::new(x - cx, y + h),
                Point::new(x, y + h),
            )
            .curve_to(
                Point::new(x + cx, y + h),
                Point::new(x + w, y + cy),
                Point::new(x + w, y),
            )
    }

    /// Start a new path from SVG path data.
    ///
    /// The full SVG path grammar is accepted. Relative commands resolve against the
    /// current point, and `H`, `V`, `S`, `Q`, `T` and `A` become lines and cubics.
    /// Malformed data is an error rather than being skipped.
    pub fn draw_svg_path(&mut self, data: &str) -> Result<&mut Self, SceneError> {
        let path = BezPath::from_svg(data)?;
        self.begin_path();
        for el in path.elements() {
            match *el {
                PathEl::MoveTo(p) => self.push(Command::MoveTo(p)),
                PathEl::LineTo(p) => self.push(Command::LineTo(p)),
                PathEl::QuadTo(c, p) => {
                    // Degree-raise using the previous on-curve point.
                    let p0 = self.last_point().unwrap_or(c);
                    let c1 = p0 + (c - p0) * (2.0 / 3.0);
                    let c2 = p + (c - p) * (2.0 / 3.0);
                    self.push(Command::CurveTo(c1, c2, p))
                }
                PathEl::CurveTo(c1, c2, p) => self.push(Command::CurveTo(c1, c2, p)),
                PathEl::ClosePath => self.push(Command::ClosePath),
            };
        }
        Ok(self)
    }

    fn last_point(&self) -> Option<Point> {
        match self.commands.last()? {
            Command::MoveTo(p) | Command::LineTo(p) | Command::CurveTo(_, _, p) => Some(*p),
            _ => None,
        }
    }

    /// Drop every command and reset the styles.
    pub fn clear(&mut self) {
        self.commands.clear();
        self.has_stroke = false;
        self.has_fill = false;
    }

    /// Execute the commands against `api`.
    pub fn replay(&self, api: &mut dyn DrawingApi) {
        let mut stroke = StrokeStyle::default();
        let mut fill = Paint::default();
        let mut builder = PathBuilder::default();
        for command in &self.commands {
            match command {
                Command::LineStyle(style) => stroke = style.clone(),
                Command::FillStyle(paint) => fill = paint.clone(),
                Command::BeginPath => builder = PathBuilder::default(),
                Command::ClosePath => builder.close(),
                Command::MoveTo(p) => builder.move_to(*p),
                Command::LineTo(p) => builder.line_to(*p),
                Command::CurveTo(c1, c2, p) => builder.curve_to(*c1, *c2, *p),
                Command::Rect(r) => builder.rect(*r),
                Command::Arc {
                    center,
                    radius,
                    start,
                    end,
                } => builder.arc(*center, *radius, *start, *end),
                Command::Stroke => api.stroke_path(&builder.path, &stroke),
                Command::Fill => api.fill_path(&builder.closed(), &fill),
            }
        }
    }
}

/// Canvas-style path state: implicit move-to for the first segment, and a
/// remembered subpath start for closing.
#[derive(Default)]
struct PathBuilder {
    path: BezPath,
    current: Option<Point>,
    start: Option<Point>,
}

impl PathBuilder {
    fn move_to(&mut self, p: Point) {
        self.path.move_to(p);
        self.current = Some(p);
        self.start = Some(p);
    }

    fn ensure_subpath(&mut self, p: Point) {
        if self.current.is_none() {
            self.move_to(p);
        }
    }

    fn line_to(&mut self, p: Point) {
        self.ensure_subpath(p);
        self.path.line_to(p);
        self.current = Some(p);
    }

    fn curve_to(&mut self, c1: Point, c2: Point, p: Point) {
        self.ensure_subpath(c1);
        self.path.curve_to(c1, c2, p);
        self.current = Some(p);
    }

    fn close(&mut self) {
        if self.current.is_some() {
            self.path.close_path();
            self.current = self.start;
        }
    }

    fn rect(&mut self, r: Rect) {
        self.move_to(Point::new(r.x0, r.y0));
        self.path.line_to((r.x1, r.y0));
        self.path.line_to((r.x1, r.y1));
        self.path.line_to((r.x0, r.y1));
        self.path.close_path();
    }

    fn arc(&mut self, center: Point, radius: f64, start: f64, end: f64) {
        let from = center + Vec2::from_angle(start) * radius;
        if self.current.is_some() {
            self.line_to(from);
        } else {
            self.move_to(from);
        }
        let sweep = end - start;
        if radius <= 0.0 || sweep == 0.0 {
            return;
        }
        let arc = Arc {
            center,
            radii: Vec2::new(radius, radius),
            start_angle: start,
            sweep_angle: sweep.clamp(-TAU, TAU),
            x_rotation: 0.0,
        };
        for el in arc.append_iter(ARC_TOLERANCE) {
            self.path.push(el);
        }
        self.current = Some(center + Vec2::from_angle(start + sweep) * radius);
    }

    /// The path with every open subpath closed, for filling.
    fn closed(&self) -> BezPath {
        let mut out = BezPath::new();
        let mut open = false;
        for el in self.path.elements() {
            match el {
                PathEl::MoveTo(_) => {
                    if open {
                        out.close_path();
                    }
                    open = true;
                }
                PathEl::ClosePath => open = false,
                _ => {}
            }
            out.push(*el);
        }
        if open {
            out.close_path();
        }
        out
    }
}
