// Copyright 2025 the Tableau Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Convex polygon intersection via the Separating Axis Theorem.

use kurbo::{Point, Vec2};

/// Minimum translation found by [`polygon_collision`].
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Penetration {
    /// Penetration depth along `normal`; always positive.
    pub overlap: f64,
    /// Unit vector along which the first polygon moves by `overlap` to separate.
    pub normal: Vec2,
}

/// Test two convex polygons for intersection.
///
/// Every edge normal of `a` is probed first, then every edge normal of `b`. The first
/// separating axis short-circuits with `None`. Polygons that merely touch are not
/// considered intersecting. Zero-length edges have no normal and are skipped.
///
/// The returned normal always describes moving `a`, including when the shallowest
/// axis is one of `b`'s edges.
///
/// Either polygon having fewer than two distinct vertices yields `None`.
pub fn polygon_collision(a: &[Point], b: &[Point]) -> Option<Penetration> {
    let mut best = Best {
        overlap: f64::NEG_INFINITY,
        normal: Vec2::ZERO,
        found: false,
    };
    probe(a, b, false, &mut best)?;
    probe(b, a, true, &mut best)?;
    best.found.then(|| Penetration {
        overlap: -best.overlap,
        normal: best.normal,
    })
}

struct Best {
    overlap: f64,
    normal: Vec2,
    found: bool,
}

/// Probe the edge normals of `edges_of` against `other`. Returns `None` when an axis
/// separates the shapes.
fn probe(edges_of: &[Point], other: &[Point], swapped: bool, best: &mut Best) -> Option<()> {
    let n = edges_of.len();
    if n < 2 || other.is_empty() {
        return None;
    }
    for i in 0..n {
        let cur = edges_of[i];
        let next = edges_of[(i + 1) % n];
        let axis = Vec2::new(cur.y - next.y, next.x - cur.x);
        let len = axis.hypot();
        if len == 0.0 {
            continue;
        }
        let axis = axis / len;

        let (min1, max1) = project(edges_of, axis);
        let (min2, max2) = project(other, axis);

        let (overlap, mut normal) = if min1 < min2 {
            (min2 - max1, -axis)
        } else {
            (min1 - max2, axis)
        };
        if overlap >= 0.0 {
            return None;
        }
        if swapped {
            normal = -normal;
        }
        if overlap > best.overlap {
            best.overlap = overlap;
            best.normal = normal;
            best.found = true;
        }
    }
    Some(())
}

fn project(points: &[Point], axis: Vec2) -> (f64, f64) {
    points
        .iter()
        .map(|p| p.to_vec2().dot(axis))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), d| {
            (lo.min(d), hi.max(d))
        })
}
