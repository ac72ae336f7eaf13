//! Narrow-phase intersection tests
//!
//! Every [`ShapeView`] is treated as a convex core (a point, a segment or a
//! polygon) inflated by a radius: circles are points with a radius, capsules
//! are segments with a radius and polygons have radius zero. Two tests cover
//! all pairs:
//!
//! - disjoint cores: the closest features give the exact distance, normal and
//!   overlap (circle-circle, circle-polygon, capsule-anything);
//! - overlapping cores: separating axis test over the edge normals of both
//!   cores, keeping the axis of minimum overlap.
//!
//! Axis selection is order independent (ties break on a canonical axis order)
//! so `intersect(a, b)` and `intersect(b, a)` report the same overlap with
//! antiparallel normals.

use super::primitives::{self, Aabb, Contact};
use super::shape::ShapeView;
use crate::foundation::math::{utils, Vec2, LENGTH_EPSILON};
use std::cmp::Ordering;

/// Penetration at or below this depth counts as touching, not colliding
pub const CONTACT_EPSILON: f32 = 1e-5;

/// Penetrating contact between `a` and `b`, normal pointing from `b` toward `a`
///
/// Returns `None` when the shapes are apart, merely touching, have non-finite
/// geometry, or sit on exactly the same center with no defined push direction.
pub fn intersect(a: &ShapeView<'_>, b: &ShapeView<'_>) -> Option<Contact> {
    match penetration(a, b) {
        Penetration::Contact(contact) => Some(contact),
        Penetration::Separated | Penetration::Coincident => None,
    }
}

/// Whether `a` and `b` share area
///
/// Unlike [`intersect`] this reports `true` for concentric overlapping
/// shapes, which have no contact normal but clearly overlap.
pub fn overlaps(a: &ShapeView<'_>, b: &ShapeView<'_>) -> bool {
    !matches!(penetration(a, b), Penetration::Separated)
}

/// Whether `view` shares area with the rectangle `area`
pub fn overlaps_aabb(view: &ShapeView<'_>, area: &Aabb) -> bool {
    if !area.is_valid() {
        return false;
    }
    let corners = area.corners();
    overlaps(view, &ShapeView::Polygon { vertices: &corners })
}

#[derive(Debug, Clone, Copy)]
enum Penetration {
    Separated,
    Contact(Contact),
    Coincident,
}

enum Core<'a> {
    Point([Vec2; 1]),
    Segment([Vec2; 2]),
    Polygon(&'a [Vec2]),
}

struct Rounded<'a> {
    core: Core<'a>,
    radius: f32,
    center: Vec2,
}

impl<'a> Rounded<'a> {
    fn from_view(view: &ShapeView<'a>) -> Option<Self> {
        let (core, radius) = match *view {
            ShapeView::Circle { center, radius } => (Core::Point([center]), radius),
            ShapeView::Capsule { start, end, radius } => (Core::Segment([start, end]), radius),
            ShapeView::Polygon { vertices } => (Core::Polygon(vertices), 0.0),
        };
        let rounded = Self {
            core,
            radius,
            center: view.center(),
        };
        let finite = radius.is_finite()
            && radius >= 0.0
            && !rounded.points().is_empty()
            && rounded.points().iter().all(|p| utils::is_finite(*p));
        finite.then_some(rounded)
    }

    fn points(&self) -> &[Vec2] {
        match &self.core {
            Core::Point(p) => p.as_slice(),
            Core::Segment(s) => s.as_slice(),
            Core::Polygon(v) => *v,
        }
    }

    fn project(&self, axis: Vec2) -> (f32, f32) {
        let (min, max) = primitives::project_points(self.points(), axis);
        (min - self.radius, max + self.radius)
    }
}

fn penetration(a: &ShapeView<'_>, b: &ShapeView<'_>) -> Penetration {
    let (Some(a), Some(b)) = (Rounded::from_view(a), Rounded::from_view(b)) else {
        return Penetration::Separated;
    };

    let rounded = a.radius > 0.0 || b.radius > 0.0;
    if rounded && !cores_intersect(a.points(), b.points()) {
        return closest_contact(&a, &b);
    }
    separating_axis(&a, &b)
}

fn closest_contact(a: &Rounded<'_>, b: &Rounded<'_>) -> Penetration {
    let Some((distance, pa, pb)) = closest_features(a.points(), b.points()) else {
        return Penetration::Separated;
    };
    let overlap = a.radius + b.radius - distance;
    if overlap <= CONTACT_EPSILON || distance <= LENGTH_EPSILON {
        return Penetration::Separated;
    }
    Penetration::Contact(Contact {
        normal: (pa - pb) / distance,
        overlap,
    })
}

fn separating_axis(a: &Rounded<'_>, b: &Rounded<'_>) -> Penetration {
    // (overlap, axis, push bias); positive bias means A leaves along +axis
    let mut best: Option<(f32, Vec2, f32)> = None;

    for axis in core_axes(a.points()).chain(core_axes(b.points())) {
        let (a_min, a_max) = a.project(axis);
        let (b_min, b_max) = b.project(axis);
        let push_negative = a_max - b_min;
        let push_positive = b_max - a_min;
        let overlap = push_negative.min(push_positive);
        if overlap <= CONTACT_EPSILON {
            return Penetration::Separated;
        }

        let better = best.map_or(true, |(best_overlap, best_axis, _)| {
            overlap
                .total_cmp(&best_overlap)
                .then_with(|| axis_order(&axis, &best_axis))
                == Ordering::Less
        });
        if better {
            best = Some((overlap, axis, push_negative - push_positive));
        }
    }

    let Some((overlap, axis, bias)) = best else {
        // Two points with no axis between them
        return Penetration::Coincident;
    };

    let side = if bias.abs() > LENGTH_EPSILON {
        bias
    } else {
        (a.center - b.center).dot(&axis)
    };
    if side.abs() <= LENGTH_EPSILON {
        return Penetration::Coincident;
    }

    Penetration::Contact(Contact {
        normal: if side > 0.0 { axis } else { -axis },
        overlap,
    })
}

/// Candidate separating axes of a core, each a canonical unit vector
///
/// Polygons contribute their edge normals; a segment contributes its normal
/// and its direction; a point contributes nothing. Zero-length edges are
/// skipped.
fn core_axes(points: &[Vec2]) -> impl Iterator<Item = Vec2> + '_ {
    let n = points.len();
    let edge_count = match n {
        0 | 1 => 0,
        2 => 1,
        _ => n,
    };
    (0..edge_count)
        .flat_map(move |i| {
            let edge = points[(i + 1) % n] - points[i];
            let direction = (n == 2).then_some(edge);
            [Some(utils::perp(edge)), direction].into_iter().flatten()
        })
        .filter_map(utils::try_normalize)
        .map(canonical_axis)
}

fn canonical_axis(axis: Vec2) -> Vec2 {
    if axis.x > 0.0 || (axis.x == 0.0 && axis.y > 0.0) {
        axis
    } else {
        -axis
    }
}

fn axis_order(a: &Vec2, b: &Vec2) -> Ordering {
    a.x.total_cmp(&b.x).then_with(|| a.y.total_cmp(&b.y))
}

/// Zero-radius intersection test between two cores
fn cores_intersect(a: &[Vec2], b: &[Vec2]) -> bool {
    let mut axes = core_axes(a).chain(core_axes(b)).peekable();
    if axes.peek().is_none() {
        return closest_features(a, b).map_or(false, |(distance, ..)| distance <= LENGTH_EPSILON);
    }
    axes.all(|axis| {
        let (a_min, a_max) = primitives::project_points(a, axis);
        let (b_min, b_max) = primitives::project_points(b, axis);
        a_max >= b_min - LENGTH_EPSILON && b_max >= a_min - LENGTH_EPSILON
    })
}

fn edges(points: &[Vec2]) -> impl Iterator<Item = (Vec2, Vec2)> + '_ {
    let n = points.len();
    (0..n).map(move |i| (points[i], points[(i + 1) % n]))
}

/// Closest pair of points between two disjoint cores: `(distance, on_a, on_b)`
fn closest_features(a: &[Vec2], b: &[Vec2]) -> Option<(f32, Vec2, Vec2)> {
    let a_to_b = a.iter().flat_map(|&pa| {
        edges(b).map(move |(start, end)| (pa, primitives::closest_point_on_segment(start, end, pa)))
    });
    let b_to_a = b.iter().flat_map(|&pb| {
        edges(a).map(move |(start, end)| (primitives::closest_point_on_segment(start, end, pb), pb))
    });

    a_to_b
        .chain(b_to_a)
        .map(|(pa, pb)| ((pa - pb).norm(), pa, pb))
        .min_by(|x, y| x.0.total_cmp(&y.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::physics::collision::shape::{Collidable, Shape};
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    const EPSILON: f32 = 1e-4;

    fn circle(x: f32, y: f32, radius: f32) -> Shape {
        Shape::circle(Vec2::new(x, y), radius).unwrap()
    }

    fn rect(x: f32, y: f32, width: f32, height: f32) -> Shape {
        Shape::rectangle(Vec2::new(x, y), width, height).unwrap()
    }

    #[test]
    fn test_circle_circle_contact() {
        let a = circle(1.0, 0.0, 1.0);
        let b = circle(0.0, 0.0, 1.0);
        let contact = a.intersect(&b).unwrap();
        assert_relative_eq!(contact.normal, Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(contact.overlap, 1.0, epsilon = EPSILON);
    }

    #[test]
    fn test_touching_is_not_colliding() {
        let a = rect(0.0, 0.0, 2.0, 2.0);
        let b = rect(2.0, 0.0, 2.0, 2.0);
        assert!(a.intersect(&b).is_none());
        assert!(!a.intersects(&b));

        let c = circle(0.0, 0.0, 1.0);
        let d = circle(2.0, 0.0, 1.0);
        assert!(!c.intersects(&d));
    }

    #[test]
    fn test_coincident_centers_have_no_contact_but_overlap() {
        let a = circle(3.0, 3.0, 1.0);
        let b = circle(3.0, 3.0, 0.5);
        assert!(a.intersect(&b).is_none());
        assert!(a.intersects(&b));

        let c = rect(0.0, 0.0, 2.0, 2.0);
        let d = rect(0.0, 0.0, 2.0, 2.0);
        assert!(c.intersect(&d).is_none());
        assert!(c.intersects(&d));
    }

    #[test]
    fn test_non_finite_input_never_collides() {
        let nan = ShapeView::Circle {
            center: Vec2::new(f32::NAN, 0.0),
            radius: 1.0,
        };
        let b = circle(0.0, 0.0, 1.0);
        assert!(intersect(&nan, &b.view()).is_none());
        assert!(!overlaps(&nan, &b.view()));
    }

    #[test]
    fn test_circle_against_polygon_corner() {
        let square = rect(0.5, 0.5, 1.0, 1.0);
        assert!(circle(2.0, 2.0, 1.0).intersect(&square).is_none());

        let contact = circle(1.5, 1.5, 1.0).intersect(&square).unwrap();
        let diagonal = Vec2::new(1.0, 1.0).normalize();
        assert_relative_eq!(contact.normal, diagonal, epsilon = EPSILON);
        assert_relative_eq!(contact.overlap, 1.0 - 0.5f32.sqrt(), epsilon = EPSILON);
    }

    #[test]
    fn test_circle_center_inside_polygon() {
        let square = rect(0.0, 0.0, 2.0, 2.0);
        let contact = circle(0.5, 0.0, 0.25).intersect(&square).unwrap();
        assert_relative_eq!(contact.normal, Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(contact.overlap, 0.75, epsilon = EPSILON);
    }

    #[test]
    fn test_polygon_minimum_axis() {
        let a = rect(1.5, 0.2, 2.0, 2.0);
        let b = rect(0.0, 0.0, 2.0, 2.0);
        let contact = a.intersect(&b).unwrap();
        assert_relative_eq!(contact.normal, Vec2::new(1.0, 0.0), epsilon = EPSILON);
        assert_relative_eq!(contact.overlap, 0.5, epsilon = EPSILON);
    }

    #[test]
    fn test_capsule_crossing_thin_wall() {
        let wall = rect(0.0, 0.0, 0.2, 4.0);
        let capsule = ShapeView::Capsule {
            start: Vec2::new(-5.0, 0.0),
            end: Vec2::new(5.0, 0.0),
            radius: 0.1,
        };
        assert!(overlaps(&capsule, &wall.view()));

        let beside = ShapeView::Capsule {
            start: Vec2::new(-5.0, 3.0),
            end: Vec2::new(5.0, 3.0),
            radius: 0.1,
        };
        assert!(!overlaps(&beside, &wall.view()));
    }

    #[test]
    fn test_overlaps_aabb() {
        let area = Aabb::new(Vec2::zeros(), Vec2::new(1.0, 1.0));
        assert!(overlaps_aabb(&circle(1.2, 0.5, 0.3).view(), &area));
        assert!(!overlaps_aabb(&circle(1.5, 0.5, 0.3).view(), &area));
        // Near the corner but outside the rounded distance
        assert!(!overlaps_aabb(&circle(1.25, 1.25, 0.3).view(), &area));
    }

    fn random_shape(rng: &mut StdRng) -> Shape {
        let position = Vec2::new(rng.gen_range(-2.0..2.0), rng.gen_range(-2.0..2.0));
        let mut shape = match rng.gen_range(0..3) {
            0 => Shape::circle(Vec2::zeros(), rng.gen_range(0.2..1.5)).unwrap(),
            1 => Shape::rectangle(Vec2::zeros(), rng.gen_range(0.2..2.0), rng.gen_range(0.2..2.0))
                .unwrap(),
            _ => Shape::rectangle(Vec2::zeros(), 3.0, 0.1).unwrap(),
        };
        shape.set_transformation(position, rng.gen_range(-3.0..3.0));
        shape
    }

    #[test]
    fn test_intersect_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..500 {
            let a = random_shape(&mut rng);
            let b = random_shape(&mut rng);

            let ab = a.intersect(&b);
            let ba = b.intersect(&a);
            assert_eq!(ab.is_some(), ba.is_some());
            assert_eq!(a.intersects(&b), b.intersects(&a));

            if let (Some(ab), Some(ba)) = (ab, ba) {
                assert_relative_eq!(ab.overlap, ba.overlap, epsilon = EPSILON);
                assert_relative_eq!(ab.normal, -ba.normal, epsilon = EPSILON);
                assert!(ab.overlap.is_finite());
            }
        }
    }
}
