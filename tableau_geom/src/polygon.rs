// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! World-space polygons, their bounding boxes, and point containment.

use kurbo::{Point, Rect};

use crate::collision::{Penetration, polygon_collision};
use crate::matrix::Matrix;

/// Result of testing a point against a polygon.
///
/// The discriminants match the tri-state convention used by picking:
/// `1` inside, `0` on the boundary, `-1` outside.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(i8)]
pub enum Containment {
    /// Strictly outside.
    Outside = -1,
    /// On an edge or vertex.
    Boundary = 0,
    /// Strictly inside.
    Inside = 1,
}

impl Containment {
    /// The numeric value (`-1`, `0` or `1`).
    pub const fn as_i8(self) -> i8 {
        self as i8
    }

    /// Whether the point counts as a hit (inside or on the boundary).
    pub const fn is_hit(self) -> bool {
        !matches!(self, Self::Outside)
    }
}

/// The four corners of the local rectangle `(0, 0, width, height)`, clockwise from the
/// origin.
pub fn rect_polygon(width: f64, height: f64) -> [Point; 4] {
    [
        Point::new(0.0, 0.0),
        Point::new(width, 0.0),
        Point::new(width, height),
        Point::new(0.0, height),
    ]
}

/// A polygon in world space together with its axis-aligned bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct WorldBounds {
    /// Polygon vertices in world space.
    pub vertices: Vec<Point>,
    /// Smallest axis-aligned rectangle enclosing `vertices`.
    pub rect: Rect,
}

impl WorldBounds {
    /// Transform local vertices by `matrix`, snapping each to whole pixels.
    pub fn from_local(matrix: &Matrix, local: &[Point]) -> Self {
        Self::from_vertices(
            local
                .iter()
                .map(|p| matrix.transform_point(*p, true))
                .collect(),
        )
    }

    /// Wrap world-space vertices, computing their bounding box.
    ///
    /// An empty vertex list yields a zero rectangle at the origin.
    pub fn from_vertices(vertices: Vec<Point>) -> Self {
        let rect = match vertices.split_first() {
            None => Rect::ZERO,
            Some((first, rest)) => rest
                .iter()
                .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p)),
        };
        Self { vertices, rect }
    }

    /// Test a world-space point.
    ///
    /// The bounding box is checked first. With `use_polygon`, points inside the box are
    /// refined with a ray-crossing test against the polygon; otherwise the box alone
    /// decides, with its edges reported as [`Containment::Boundary`].
    pub fn contains(&self, point: Point, use_polygon: bool) -> Containment {
        if self.vertices.is_empty() {
            return Containment::Outside;
        }
        let r = self.rect;
        if point.x < r.x0 || point.x > r.x1 || point.y < r.y0 || point.y > r.y1 {
            return Containment::Outside;
        }
        if use_polygon {
            return ray_crossing(&self.vertices, point);
        }
        if point.x == r.x0 || point.x == r.x1 || point.y == r.y0 || point.y == r.y1 {
            Containment::Boundary
        } else {
            Containment::Inside
        }
    }

    /// Strict bounding-box overlap. Boxes that only share an edge or a corner do
    /// not overlap, matching [`polygon_collision`] for axis-aligned rectangles.
    pub fn overlaps(&self, other: &Self) -> bool {
        let (a, b) = (self.rect, other.rect);
        a.x0 < b.x1 && b.x0 < a.x1 && a.y0 < b.y1 && b.y0 < a.y1
    }

    /// Precise polygon intersection, after a bounding-box reject.
    pub fn collides(&self, other: &Self) -> Option<Penetration> {
        if !self.overlaps(other) {
            return None;
        }
        polygon_collision(&self.vertices, &other.vertices)
    }
}

/// Cast a ray from `point` towards +x and count edge crossings.
///
/// Vertices use a half-open rule (an edge counts when exactly one endpoint lies
/// strictly above the ray), so a ray through a shared vertex is counted once.
/// Any boundary contact wins over the parity result.
fn ray_crossing(vertices: &[Point], point: Point) -> Containment {
    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let n = vertices.len();
    for i in 0..n {
        let p1 = vertices[i];
        let p2 = vertices[(i + 1) % n];

        if p1.y == y && p2.y == y {
            if x >= p1.x.min(p2.x) && x <= p1.x.max(p2.x) {
                return Containment::Boundary;
            }
            continue;
        }
        if y < p1.y.min(p2.y) || y > p1.y.max(p2.y) {
            continue;
        }

        let nx = p1.x + (y - p1.y) * (p2.x - p1.x) / (p2.y - p1.y);
        if nx == x {
            return Containment::Boundary;
        }
        if nx > x && ((p1.y > y) != (p2.y > y)) {
            inside = !inside;
        }
    }
    if inside {
        Containment::Inside
    } else {
        Containment::Outside
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_at(x: f64, y: f64, size: f64) -> WorldBounds {
        let mut m = Matrix::identity();
        m.translate(x, y);
        WorldBounds::from_local(&m, &rect_polygon(size, size))
    }

    #[test]
    fn translated_square_bounds() {
        let wb = square_at(20.0, 30.0, 10.0);
        assert_eq!(wb.rect, Rect::new(20.0, 30.0, 30.0, 40.0));
        assert_eq!(wb.vertices[2], Point::new(30.0, 40.0));
    }

    #[test]
    fn corners_are_never_outside() {
        let wb = square_at(5.0, 5.0, 10.0);
        for v in wb.vertices.clone() {
            assert_ne!(wb.contains(v, true), Containment::Outside, "corner {v:?}");
            assert_ne!(wb.contains(v, false), Containment::Outside, "corner {v:?}");
        }
    }

    #[test]
    fn outside_box_is_outside() {
        let wb = square_at(0.0, 0.0, 10.0);
        for p in [
            Point::new(-0.5, 5.0),
            Point::new(10.5, 5.0),
            Point::new(5.0, -1.0),
            Point::new(5.0, 11.0),
        ] {
            assert_eq!(wb.contains(p, true), Containment::Outside);
            assert_eq!(wb.contains(p, false), Containment::Outside);
        }
    }

    #[test]
    fn edges_and_interior() {
        let wb = square_at(0.0, 0.0, 10.0);
        assert_eq!(wb.contains(Point::new(5.0, 5.0), true), Containment::Inside);
        assert_eq!(wb.contains(Point::new(0.0, 5.0), true), Containment::Boundary);
        assert_eq!(wb.contains(Point::new(10.0, 5.0), true), Containment::Boundary);
        assert_eq!(wb.contains(Point::new(5.0, 0.0), true), Containment::Boundary);
        assert_eq!(wb.contains(Point::new(5.0, 10.0), false), Containment::Boundary);
        // Box-only edges still pick.
        assert!(wb.contains(Point::new(10.0, 10.0), false).is_hit());
        assert_eq!(wb.contains(Point::new(5.0, 5.0), false), Containment::Inside);
    }

    #[test]
    fn ray_through_diamond_vertex_counts_once() {
        let wb = WorldBounds::from_vertices(vec![
            Point::new(10.0, 0.0),
            Point::new(20.0, 10.0),
            Point::new(10.0, 20.0),
            Point::new(0.0, 10.0),
        ]);
        // The ray from (5, 10) passes exactly through the right vertex (20, 10).
        assert_eq!(wb.contains(Point::new(5.0, 10.0), true), Containment::Inside);
        // Inside the box but outside the diamond.
        assert_eq!(wb.contains(Point::new(2.0, 2.0), true), Containment::Outside);
        // The box test alone accepts it.
        assert_eq!(wb.contains(Point::new(2.0, 2.0), false), Containment::Inside);
    }

    #[test]
    fn empty_polygon_is_outside() {
        let wb = WorldBounds::from_vertices(Vec::new());
        assert_eq!(wb.contains(Point::ORIGIN, true), Containment::Outside);
    }

    #[test]
    fn containment_values() {
        assert_eq!(Containment::Inside.as_i8(), 1);
        assert_eq!(Containment::Boundary.as_i8(), 0);
        assert_eq!(Containment::Outside.as_i8(), -1);
        assert!(Containment::Boundary.is_hit());
        assert!(!Containment::Outside.is_hit());
    }

    #[test]
    fn touching_boxes_do_not_overlap() {
        let a = square_at(0.0, 0.0, 10.0);
        let edge = square_at(10.0, 0.0, 10.0);
        let corner = square_at(10.0, 10.0, 10.0);
        let apart = square_at(11.0, 0.0, 10.0);
        let inside_by_one = square_at(9.0, 9.0, 10.0);
        for other in [&edge, &corner, &apart] {
            assert!(!a.overlaps(other), "{:?}", other.rect);
            assert!(!other.overlaps(&a), "{:?}", other.rect);
            assert!(a.collides(other).is_none(), "{:?}", other.rect);
        }
        assert!(a.overlaps(&inside_by_one));
        assert!(a.collides(&inside_by_one).is_some());
    }
}
