// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Six-scalar affine matrix.

use core::fmt;

use kurbo::{Affine, Point};

/// A 2D affine transform `(a, b, c, d, tx, ty)`.
///
/// Maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
///
/// The type is `Copy`; the mutating operations update `self` in place and return
/// `&mut Self` so calls can be chained. Copy the value first when the unmodified matrix must
/// be kept.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Matrix {
    /// Horizontal scale / rotation component.
    pub a: f64,
    /// Vertical shear / rotation component.
    pub b: f64,
    /// Horizontal shear / rotation component.
    pub c: f64,
    /// Vertical scale / rotation component.
    pub d: f64,
    /// Horizontal translation.
    pub tx: f64,
    /// Vertical translation.
    pub ty: f64,
}

impl Default for Matrix {
    fn default() -> Self {
        Self::identity()
    }
}

impl Matrix {
    /// Create a matrix from its six coefficients.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, tx: f64, ty: f64) -> Self {
        Self { a, b, c, d, tx, ty }
    }

    /// The identity transform.
    pub const fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)
    }

    /// Reset to the identity transform.
    pub fn set_identity(&mut self) -> &mut Self {
        *self = Self::identity();
        self
    }

    /// Append `other` so that `self` is applied first and `other` second.
    pub fn concat(&mut self, other: &Self) -> &mut Self {
        let (a, b, c, d, tx, ty) = (self.a, self.b, self.c, self.d, self.tx, self.ty);
        self.a = a * other.a + b * other.c;
        self.b = a * other.b + b * other.d;
        self.c = c * other.a + d * other.c;
        self.d = c * other.b + d * other.d;
        self.tx = tx * other.a + ty * other.c + other.tx;
        self.ty = tx * other.b + ty * other.d + other.ty;
        self
    }

    /// Append a rotation of `angle` radians.
    pub fn rotate(&mut self, angle: f64) -> &mut Self {
        let (sin, cos) = angle.sin_cos();
        self.concat(&Self::new(cos, sin, -sin, cos, 0.0, 0.0))
    }

    /// Append a non-uniform scale.
    pub fn scale(&mut self, sx: f64, sy: f64) -> &mut Self {
        self.concat(&Self::new(sx, 0.0, 0.0, sy, 0.0, 0.0))
    }

    /// Append a translation.
    pub fn translate(&mut self, dx: f64, dy: f64) -> &mut Self {
        self.tx += dx;
        self.ty += dy;
        self
    }

    /// The determinant `a*d - b*c`.
    pub fn determinant(&self) -> f64 {
        self.a * self.d - self.b * self.c
    }

    /// Invert in place.
    ///
    /// A singular matrix (zero determinant) produces infinite or NaN coefficients;
    /// use [`Matrix::is_finite`] to detect that case.
    pub fn invert(&mut self) -> &mut Self {
        let (a, b, c, d, tx, ty) = (self.a, self.b, self.c, self.d, self.tx, self.ty);
        let i = a * d - b * c;
        self.a = d / i;
        self.b = -b / i;
        self.c = -c / i;
        self.d = a / i;
        self.tx = (c * ty - d * tx) / i;
        self.ty = -(a * ty - b * tx) / i;
        self
    }

    /// Return the inverse without modifying `self`.
    pub fn inverted(&self) -> Self {
        let mut m = *self;
        m.invert();
        m
    }

    /// Whether every coefficient is finite.
    pub fn is_finite(&self) -> bool {
        [self.a, self.b, self.c, self.d, self.tx, self.ty]
            .iter()
            .all(|v| v.is_finite())
    }

    /// Transform a point, returning a new point.
    ///
    /// With `round`, both coordinates are snapped half-up to whole pixels
    /// (`floor(v + 0.5)`).
    pub fn transform_point(&self, point: Point, round: bool) -> Point {
        let mut x = point.x * self.a + point.y * self.c + self.tx;
        let mut y = point.x * self.b + point.y * self.d + self.ty;
        if round {
            x = (x + 0.5).floor();
            y = (y + 0.5).floor();
        }
        Point::new(x, y)
    }

    /// Transform a point in place.
    pub fn transform_point_mut(&self, point: &mut Point, round: bool) {
        *point = self.transform_point(*point, round);
    }
}

impl From<Affine> for Matrix {
    fn from(affine: Affine) -> Self {
        let [a, b, c, d, tx, ty] = affine.as_coeffs();
        Self::new(a, b, c, d, tx, ty)
    }
}

impl From<Matrix> for Affine {
    fn from(m: Matrix) -> Self {
        Self::new([m.a, m.b, m.c, m.d, m.tx, m.ty])
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "(a={}, b={}, c={}, d={}, tx={}, ty={})",
            self.a, self.b, self.c, self.d, self.tx, self.ty
        )
    }
}
