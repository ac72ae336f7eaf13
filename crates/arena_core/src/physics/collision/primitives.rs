//! Primitive geometric types and helpers
//!
//! Axis-aligned bounds, contact results, segment queries and the convex-hull
//! routine used by swept shapes. All inputs are world-space.

use crate::foundation::math::{utils, Vec2, LENGTH_EPSILON};
use std::cmp::Ordering;

/// Axis-aligned bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Lower-left corner
    pub min: Vec2,
    /// Upper-right corner
    pub max: Vec2,
}

impl Aabb {
    /// Creates bounds from two corners
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// Creates bounds from a center and half extents
    pub fn from_center_extents(center: Vec2, half_extents: Vec2) -> Self {
        Self::new(center - half_extents, center + half_extents)
    }

    /// Smallest bounds containing every point, `None` for an empty slice
    pub fn from_points(points: &[Vec2]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        let mut bounds = Self::new(*first, *first);
        for point in rest {
            bounds.min = bounds.min.inf(point);
            bounds.max = bounds.max.sup(point);
        }
        Some(bounds)
    }

    /// Finite and not inverted
    pub fn is_valid(&self) -> bool {
        utils::is_finite(self.min)
            && utils::is_finite(self.max)
            && self.min.x <= self.max.x
            && self.min.y <= self.max.y
    }

    /// Center point
    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Half extents
    pub fn extents(&self) -> Vec2 {
        (self.max - self.min) * 0.5
    }

    /// Closed-interval overlap test (touching counts)
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
    }

    /// Point inside or on the boundary
    pub fn contains_point(&self, point: Vec2) -> bool {
        point.x >= self.min.x && point.x <= self.max.x && point.y >= self.min.y && point.y <= self.max.y
    }

    /// Grow by `margin` on every side
    pub fn expanded(&self, margin: f32) -> Self {
        let margin = Vec2::new(margin, margin);
        Self::new(self.min - margin, self.max + margin)
    }

    /// Corners in counter-clockwise order starting at `min`
    pub fn corners(&self) -> [Vec2; 4] {
        [
            self.min,
            Vec2::new(self.max.x, self.min.y),
            self.max,
            Vec2::new(self.min.x, self.max.y),
        ]
    }
}

/// Result of a penetrating intersection test
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contact {
    /// Unit vector pointing from the second shape toward the first; moving the
    /// first shape by `normal * overlap` separates the pair
    pub normal: Vec2,
    /// Minimum translation distance along `normal`
    pub overlap: f32,
}

impl Contact {
    /// Translation that pushes the first shape out of the second
    pub fn resolution(&self) -> Vec2 {
        self.normal * self.overlap
    }

    /// The same contact seen from the other shape
    pub fn flipped(&self) -> Self {
        Self {
            normal: -self.normal,
            overlap: self.overlap,
        }
    }
}

/// Closest point to `point` on the segment `start..end`
pub fn closest_point_on_segment(start: Vec2, end: Vec2, point: Vec2) -> Vec2 {
    let edge = end - start;
    let length_squared = edge.norm_squared();
    if length_squared <= LENGTH_EPSILON * LENGTH_EPSILON {
        return start;
    }
    let t = ((point - start).dot(&edge) / length_squared).clamp(0.0, 1.0);
    start + edge * t
}

/// Signed area, positive for counter-clockwise winding
pub fn signed_area(vertices: &[Vec2]) -> f32 {
    let n = vertices.len();
    if n < 3 {
        return 0.0;
    }
    let doubled: f32 = (0..n)
        .map(|i| utils::cross(vertices[i], vertices[(i + 1) % n]))
        .sum();
    doubled * 0.5
}

/// Average of the vertices; good enough as a reference point for convex shapes
pub fn vertex_centroid(vertices: &[Vec2]) -> Vec2 {
    if vertices.is_empty() {
        return Vec2::zeros();
    }
    vertices.iter().fold(Vec2::zeros(), |acc, v| acc + v) / vertices.len() as f32
}

/// True when a counter-clockwise polygon bends left (or goes straight) at every vertex
pub fn is_convex_ccw(vertices: &[Vec2]) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        let c = vertices[(i + 2) % n];
        utils::cross(b - a, c - b) >= -LENGTH_EPSILON
    })
}

/// Point-in-convex-polygon for counter-clockwise vertices, boundary inclusive
pub fn convex_contains_point(vertices: &[Vec2], point: Vec2) -> bool {
    let n = vertices.len();
    if n < 3 {
        return false;
    }
    (0..n).all(|i| {
        let a = vertices[i];
        let b = vertices[(i + 1) % n];
        utils::cross(b - a, point - a) >= -LENGTH_EPSILON
    })
}

/// Minimum and maximum of the points projected onto `axis`
pub fn project_points(points: &[Vec2], axis: Vec2) -> (f32, f32) {
    points.iter().fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), p| {
        let d = p.dot(&axis);
        (min.min(d), max.max(d))
    })
}

fn turns_left(hull: &[Vec2], p: Vec2) -> bool {
    let n = hull.len();
    utils::cross(hull[n - 1] - hull[n - 2], p - hull[n - 1]) > 0.0
}

fn lexicographic(a: &Vec2, b: &Vec2) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// Counter-clockwise convex hull of `points`, written into `out`
///
/// Andrew's monotone chain. Collinear points are dropped, so the hull only
/// holds corner vertices. `points` is reordered in place.
pub fn convex_hull_into(points: &mut [Vec2], out: &mut Vec<Vec2>) {
    out.clear();
    if points.len() < 3 {
        out.extend_from_slice(points);
        return;
    }
    points.sort_unstable_by(lexicographic);

    for &p in points.iter() {
        while out.len() >= 2 && !turns_left(out, p) {
            out.pop();
        }
        out.push(p);
    }

    let lower_len = out.len() + 1;
    for &p in points.iter().rev().skip(1) {
        while out.len() >= lower_len && !turns_left(out, p) {
            out.pop();
        }
        out.push(p);
    }
    // Last point repeats the first
    out.pop();
}
