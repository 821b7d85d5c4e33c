// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tableau Geom: the geometry layer of a 2D display list.
//!
//! Tableau Geom is a small, dependency-light building block for scene graphs that need
//! pixel-snapped picking and shape overlap tests.
//!
//! - [`Matrix`]: a six-scalar affine transform with in-place composition, inversion and
//!   optional pixel rounding of transformed points.
//! - [`WorldBounds`]: the world-space polygon of a node plus the axis-aligned box
//!   enclosing it.
//! - [`Containment`]: the tri-state result of a point test (inside, on the boundary, or
//!   outside).
//! - [`polygon_collision`]: convex polygon intersection via the Separating Axis Theorem.
//!
//! Points, vectors and rectangles are [`kurbo`] types so higher layers can move between
//! this crate and Kurbo's own shape APIs without conversions.
//!
//! ## Conventions
//!
//! - A [`Matrix`] maps `(x, y)` to `(a*x + c*y + tx, b*x + d*y + ty)`.
//! - [`Matrix::concat`] applies `self` first and the argument second.
//! - Inverting a singular matrix yields non-finite coefficients. Callers converting
//!   coordinates through a degenerate transform should check [`Matrix::is_finite`].
//!
//! # Example
//!
//! ```rust
//! use tableau_geom::{Containment, Matrix, WorldBounds, polygon_collision, rect_polygon};
//! use kurbo::Point;
//!
//! // Place a 10x10 square at (20, 20) and a second one overlapping it.
//! let mut m = Matrix::identity();
//! m.translate(20.0, 20.0);
//! let a = WorldBounds::from_local(&m, &rect_polygon(10.0, 10.0));
//!
//! let mut n = Matrix::identity();
//! n.translate(25.0, 25.0);
//! let b = WorldBounds::from_local(&n, &rect_polygon(10.0, 10.0));
//!
//! assert_eq!(a.contains(Point::new(25.0, 25.0), true), Containment::Inside);
//! assert_eq!(a.contains(Point::new(20.0, 25.0), true), Containment::Boundary);
//! assert!(a.overlaps(&b));
//! assert!(polygon_collision(&a.vertices, &b.vertices).is_some());
//! ```

pub mod collision;
pub mod matrix;
pub mod polygon;

pub use collision::{Penetration, polygon_collision};
pub use matrix::Matrix;
pub use polygon::{Containment, WorldBounds, rect_polygon};
