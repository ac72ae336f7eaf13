//! High-level collision shape abstractions
//!
//! [`CollisionShape`] holds the immutable model-space definition. [`Shape`]
//! pairs it with a world transform and keeps a world-space vertex buffer that
//! is rewritten in place whenever the transform changes, so one instance is
//! reused frame after frame without reallocating.
//!
//! Narrow-phase code never looks at either type directly; it works on the
//! borrowed [`ShapeView`] produced through the [`Collidable`] trait.

use super::narrow;
use super::primitives::{self, Aabb, Contact};
use crate::foundation::math::{utils, Transform2D, Vec2, LENGTH_EPSILON};

/// Errors raised while building a shape definition
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// A radius, width or height was zero, negative or not finite
    #[error("Invalid dimension `{name}`: {value}")]
    InvalidDimension {
        /// Which dimension was rejected
        name: &'static str,
        /// The rejected value
        value: f32,
    },

    /// Polygons need at least three vertices
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    /// A vertex coordinate was NaN or infinite
    #[error("Polygon vertex {0} is not finite")]
    NonFiniteVertex(usize),

    /// The vertices enclose no area
    #[error("Polygon is degenerate (zero area)")]
    Degenerate,

    /// The vertices do not describe a convex polygon
    #[error("Polygon is not convex")]
    NotConvex,
}

/// Collision shape definition (stored in MODEL SPACE)
#[derive(Debug, Clone, PartialEq)]
pub enum CollisionShape {
    /// Circle centered on the transform position
    Circle {
        /// Radius in world units
        radius: f32,
    },
    /// Rectangle centered on the transform position, rotated with it
    Rectangle {
        /// Half width and half height
        half_extents: Vec2,
    },
    /// Convex polygon, counter-clockwise around the local origin
    Polygon {
        /// Local-space vertices
        vertices: Vec<Vec2>,
    },
}

impl CollisionShape {
    /// Creates a circle of the given radius
    pub fn circle(radius: f32) -> Result<Self, GeometryError> {
        positive_dimension("radius", radius)?;
        Ok(Self::Circle { radius })
    }

    /// Creates a `width` x `height` rectangle
    pub fn rectangle(width: f32, height: f32) -> Result<Self, GeometryError> {
        positive_dimension("width", width)?;
        positive_dimension("height", height)?;
        Ok(Self::Rectangle {
            half_extents: Vec2::new(width * 0.5, height * 0.5),
        })
    }

    /// Creates a convex polygon from local-space vertices
    ///
    /// Either winding is accepted; clockwise input is reversed so every stored
    /// polygon is counter-clockwise.
    pub fn polygon(mut vertices: Vec<Vec2>) -> Result<Self, GeometryError> {
        if vertices.len() < 3 {
            return Err(GeometryError::TooFewVertices(vertices.len()));
        }
        if let Some(index) = vertices.iter().position(|v| !utils::is_finite(*v)) {
            return Err(GeometryError::NonFiniteVertex(index));
        }
        let area = primitives::signed_area(&vertices);
        if area.abs() <= LENGTH_EPSILON {
            return Err(GeometryError::Degenerate);
        }
        if area < 0.0 {
            vertices.reverse();
        }
        let n = vertices.len();
        let has_zero_edge = (0..n)
            .any(|i| (vertices[(i + 1) % n] - vertices[i]).norm() <= LENGTH_EPSILON);
        if has_zero_edge {
            return Err(GeometryError::Degenerate);
        }
        if !primitives::is_convex_ccw(&vertices) {
            return Err(GeometryError::NotConvex);
        }
        Ok(Self::Polygon { vertices })
    }

    /// Number of world-space vertices this shape needs (zero for circles)
    fn vertex_count(&self) -> usize {
        match self {
            Self::Circle { .. } => 0,
            Self::Rectangle { .. } => 4,
            Self::Polygon { vertices } => vertices.len(),
        }
    }
}

/// Borrowed world-space view used by every intersection routine
#[derive(Debug, Clone, Copy)]
pub enum ShapeView<'a> {
    /// World-space circle
    Circle {
        /// Center
        center: Vec2,
        /// Radius
        radius: f32,
    },
    /// World-space convex polygon, counter-clockwise
    Polygon {
        /// Vertices
        vertices: &'a [Vec2],
    },
    /// Circle swept along a segment (stadium)
    Capsule {
        /// Segment start (center at the beginning of the sweep)
        start: Vec2,
        /// Segment end (center at the end of the sweep)
        end: Vec2,
        /// Radius
        radius: f32,
    },
}

impl ShapeView<'_> {
    /// World-space bounds
    pub fn bounds(&self) -> Aabb {
        match *self {
            Self::Circle { center, radius } => {
                Aabb::from_center_extents(center, Vec2::new(radius, radius))
            }
            Self::Polygon { vertices } => Aabb::from_points(vertices)
                .unwrap_or_else(|| Aabb::new(Vec2::repeat(f32::NAN), Vec2::repeat(f32::NAN))),
            Self::Capsule { start, end, radius } => {
                Aabb::new(start.inf(&end), start.sup(&end)).expanded(radius)
            }
        }
    }

    /// Reference point used to orient contact normals
    pub fn center(&self) -> Vec2 {
        match *self {
            Self::Circle { center, .. } => center,
            Self::Polygon { vertices } => primitives::vertex_centroid(vertices),
            Self::Capsule { start, end, .. } => (start + end) * 0.5,
        }
    }

    /// Point inside or on the boundary
    pub fn contains_point(&self, point: Vec2) -> bool {
        match *self {
            Self::Circle { center, radius } => (point - center).norm_squared() <= radius * radius,
            Self::Polygon { vertices } => primitives::convex_contains_point(vertices, point),
            Self::Capsule { start, end, radius } => {
                let closest = primitives::closest_point_on_segment(start, end, point);
                (point - closest).norm_squared() <= radius * radius
            }
        }
    }

    /// Every vertex of a convex polygon lies inside this shape (so the polygon does)
    pub fn contains_polygon(&self, vertices: &[Vec2]) -> bool {
        !vertices.is_empty() && vertices.iter().all(|v| self.contains_point(*v))
    }

    /// Horizontal extent of the shape inside the band `min_y..=max_y`
    ///
    /// Exact for circles and polygons, a slight superset for capsules.
    /// `None` when the shape does not reach the band.
    pub fn span_in_band(&self, min_y: f32, max_y: f32) -> Option<(f32, f32)> {
        match *self {
            Self::Circle { center, radius } => {
                let dy = center.y.clamp(min_y, max_y) - center.y;
                if dy.abs() > radius {
                    return None;
                }
                let half = (radius * radius - dy * dy).max(0.0).sqrt();
                Some((center.x - half, center.x + half))
            }
            Self::Polygon { vertices } => {
                let mut span: Option<(f32, f32)> = None;
                let mut include = |x: f32| {
                    span = Some(span.map_or((x, x), |(lo, hi)| (lo.min(x), hi.max(x))));
                };
                for (i, &a) in vertices.iter().enumerate() {
                    if (min_y..=max_y).contains(&a.y) {
                        include(a.x);
                    }
                    let b = vertices[(i + 1) % vertices.len()];
                    for line in [min_y, max_y] {
                        if (a.y < line && line < b.y) || (b.y < line && line < a.y) {
                            let t = (line - a.y) / (b.y - a.y);
                            include(a.x + (b.x - a.x) * t);
                        }
                    }
                }
                span
            }
            Self::Capsule { start, end, radius } => {
                let (lo, hi) = (min_y - radius, max_y + radius);
                let delta = end - start;
                let (enter, exit) = if delta.y == 0.0 {
                    if !(lo..=hi).contains(&start.y) {
                        return None;
                    }
                    (0.0, 1.0)
                } else {
                    let t0 = (lo - start.y) / delta.y;
                    let t1 = (hi - start.y) / delta.y;
                    (t0.min(t1).max(0.0), t0.max(t1).min(1.0))
                };
                if enter.is_nan() || exit.is_nan() || enter > exit {
                    return None;
                }
                let (x0, x1) = (start.x + delta.x * enter, start.x + delta.x * exit);
                Some((x0.min(x1) - radius, x0.max(x1) + radius))
            }
        }
    }
}

/// Anything that can take part in an intersection test
pub trait Collidable {
    /// World-space geometry
    fn view(&self) -> ShapeView<'_>;

    /// World-space bounds
    fn bounds(&self) -> Aabb {
        self.view().bounds()
    }

    /// Penetrating contact with `other`, normal pointing from `other` toward `self`
    fn intersect(&self, other: &dyn Collidable) -> Option<Contact> {
        narrow::intersect(&self.view(), &other.view())
    }

    /// Boolean overlap test with `other`; touching does not count
    fn intersects(&self, other: &dyn Collidable) -> bool {
        narrow::overlaps(&self.view(), &other.view())
    }

    /// Point inside or on the boundary
    fn contains_point(&self, point: Vec2) -> bool {
        self.view().contains_point(point)
    }

    /// Whole convex polygon inside this shape
    fn contains_polygon(&self, vertices: &[Vec2]) -> bool {
        self.view().contains_polygon(vertices)
    }

    /// Shares area with the rectangle `area` (used for cell membership)
    fn overlaps_area(&self, area: &Aabb) -> bool {
        narrow::overlaps_aabb(&self.view(), area)
    }
}

impl Collidable for ShapeView<'_> {
    fn view(&self) -> ShapeView<'_> {
        *self
    }
}

/// A collision shape placed in the world
#[derive(Debug, Clone)]
pub struct Shape {
    model: CollisionShape,
    transform: Transform2D,
    world: Vec<Vec2>,
}

impl Shape {
    /// Places `model` at the origin with no rotation
    pub fn new(model: CollisionShape) -> Self {
        Self::with_transform(model, Transform2D::identity())
    }

    /// Places `model` at `transform`
    pub fn with_transform(model: CollisionShape, transform: Transform2D) -> Self {
        let mut shape = Self {
            world: Vec::with_capacity(model.vertex_count()),
            model,
            transform,
        };
        shape.refresh_world();
        shape
    }

    /// Circle shorthand
    pub fn circle(center: Vec2, radius: f32) -> Result<Self, GeometryError> {
        Ok(Self::with_transform(
            CollisionShape::circle(radius)?,
            Transform2D::from_position(center),
        ))
    }

    /// Axis-aligned rectangle shorthand
    pub fn rectangle(center: Vec2, width: f32, height: f32) -> Result<Self, GeometryError> {
        Ok(Self::with_transform(
            CollisionShape::rectangle(width, height)?,
            Transform2D::from_position(center),
        ))
    }

    /// Thin rectangle running from `start` to `end`
    ///
    /// Stands in for an infinite barrier line when given far-apart endpoints;
    /// it goes through the ordinary SAT path like every other polygon.
    pub fn barrier(start: Vec2, end: Vec2, thickness: f32) -> Result<Self, GeometryError> {
        let along = end - start;
        let length = along.norm();
        positive_dimension("length", length)?;
        let rotation = utils::angle_of(along).unwrap_or(0.0);
        Ok(Self::with_transform(
            CollisionShape::rectangle(length, thickness)?,
            Transform2D::new((start + end) * 0.5, rotation),
        ))
    }

    /// Moves the shape; the model-space definition is untouched
    pub fn set_transformation(&mut self, position: Vec2, rotation: f32) {
        self.transform = Transform2D::new(position, rotation);
        self.refresh_world();
    }

    /// Model-space definition
    pub const fn model(&self) -> &CollisionShape {
        &self.model
    }

    /// Current transform
    pub const fn transform(&self) -> &Transform2D {
        &self.transform
    }

    /// Current position
    pub const fn position(&self) -> Vec2 {
        self.transform.position
    }

    /// Current rotation in radians
    pub const fn rotation(&self) -> f32 {
        self.transform.rotation
    }

    /// World-space vertices (empty for circles)
    pub fn world_vertices(&self) -> &[Vec2] {
        &self.world
    }

    fn refresh_world(&mut self) {
        self.world.clear();
        let transform = self.transform;
        match &self.model {
            CollisionShape::Circle { .. } => {}
            CollisionShape::Rectangle { half_extents } => {
                let (hx, hy) = (half_extents.x, half_extents.y);
                self.world.extend(
                    [
                        Vec2::new(-hx, -hy),
                        Vec2::new(hx, -hy),
                        Vec2::new(hx, hy),
                        Vec2::new(-hx, hy),
                    ]
                    .into_iter()
                    .map(|v| transform.transform_point(v)),
                );
            }
            CollisionShape::Polygon { vertices } => {
                self.world
                    .extend(vertices.iter().map(|v| transform.transform_point(*v)));
            }
        }
    }
}

impl Collidable for Shape {
    fn view(&self) -> ShapeView<'_> {
        match self.model {
            CollisionShape::Circle { radius } => ShapeView::Circle {
                center: self.transform.position,
                radius,
            },
            CollisionShape::Rectangle { .. } | CollisionShape::Polygon { .. } => {
                ShapeView::Polygon {
                    vertices: &self.world,
                }
            }
        }
    }
}

fn positive_dimension(name: &'static str, value: f32) -> Result<(), GeometryError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(GeometryError::InvalidDimension { name, value })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::math::constants::HALF_PI;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-5;

    #[test]
    fn test_rejects_invalid_dimensions() {
        assert!(CollisionShape::circle(0.0).is_err());
        assert!(CollisionShape::circle(f32::NAN).is_err());
        assert!(CollisionShape::rectangle(1.0, -2.0).is_err());
    }

    #[test]
    fn test_polygon_validation() {
        assert_eq!(
            CollisionShape::polygon(vec![Vec2::zeros(), Vec2::new(1.0, 0.0)]),
            Err(GeometryError::TooFewVertices(2))
        );
        assert_eq!(
            CollisionShape::polygon(vec![
                Vec2::zeros(),
                Vec2::new(1.0, 0.0),
                Vec2::new(2.0, 0.0)
            ]),
            Err(GeometryError::Degenerate)
        );
        // Arrow head: concave at (1, 0.5)
        assert_eq!(
            CollisionShape::polygon(vec![
                Vec2::new(0.0, 0.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(2.0, 2.0),
                Vec2::new(1.0, 0.5),
                Vec2::new(0.0, 2.0),
            ]),
            Err(GeometryError::NotConvex)
        );
    }

    #[test]
    fn test_clockwise_polygon_is_stored_counter_clockwise() {
        let shape = CollisionShape::polygon(vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
        ])
        .unwrap();
        let CollisionShape::Polygon { vertices } = shape else {
            panic!("expected polygon");
        };
        assert!(primitives::signed_area(&vertices) > 0.0);
    }

    #[test]
    fn test_transform_is_reapplied_not_baked() {
        let mut shape = Shape::rectangle(Vec2::zeros(), 2.0, 1.0).unwrap();
        let buffer = shape.world_vertices().as_ptr();

        shape.set_transformation(Vec2::new(5.0, 0.0), HALF_PI);
        shape.set_transformation(Vec2::new(5.0, 0.0), 0.0);

        // Same allocation, and rotating back restores the original footprint
        assert_eq!(shape.world_vertices().as_ptr(), buffer);
        let bounds = shape.bounds();
        assert_relative_eq!(bounds.min, Vec2::new(4.0, -0.5), epsilon = EPSILON);
        assert_relative_eq!(bounds.max, Vec2::new(6.0, 0.5), epsilon = EPSILON);
    }

    #[test]
    fn test_rotated_rectangle_bounds() {
        let mut shape = Shape::rectangle(Vec2::zeros(), 4.0, 2.0).unwrap();
        shape.set_transformation(Vec2::new(1.0, 1.0), HALF_PI);
        let bounds = shape.bounds();
        assert_relative_eq!(bounds.min, Vec2::new(0.0, -1.0), epsilon = EPSILON);
        assert_relative_eq!(bounds.max, Vec2::new(2.0, 3.0), epsilon = EPSILON);
    }

    #[test]
    fn test_circle_bounds_and_containment() {
        let shape = Shape::circle(Vec2::new(2.0, 3.0), 1.0).unwrap();
        let bounds = shape.bounds();
        assert_eq!(bounds.min, Vec2::new(1.0, 2.0));
        assert_eq!(bounds.max, Vec2::new(3.0, 4.0));
        assert!(shape.contains_point(Vec2::new(2.5, 3.5)));
        assert!(!shape.contains_point(Vec2::new(3.0, 4.0)));
    }

    #[test]
    fn test_contains_polygon() {
        let big = Shape::rectangle(Vec2::zeros(), 10.0, 10.0).unwrap();
        let small = Shape::rectangle(Vec2::new(1.0, 1.0), 2.0, 2.0).unwrap();
        let straddling = Shape::rectangle(Vec2::new(5.0, 0.0), 2.0, 2.0).unwrap();
        assert!(big.contains_polygon(small.world_vertices()));
        assert!(!big.contains_polygon(straddling.world_vertices()));
        assert!(!big.contains_polygon(&[]));
    }

    #[test]
    fn test_barrier_spans_endpoints() {
        let barrier = Shape::barrier(Vec2::new(-100.0, 2.0), Vec2::new(100.0, 2.0), 0.5).unwrap();
        let bounds = barrier.bounds();
        assert_relative_eq!(bounds.min, Vec2::new(-100.0, 1.75), epsilon = 1e-3);
        assert_relative_eq!(bounds.max, Vec2::new(100.0, 2.25), epsilon = 1e-3);
        assert!(Shape::barrier(Vec2::zeros(), Vec2::zeros(), 1.0).is_err());
    }

    #[test]
    fn test_span_in_band() {
        let circle = Shape::circle(Vec2::new(2.0, 0.0), 1.0).unwrap();
        let (left, right) = circle.view().span_in_band(0.5, 3.0).unwrap();
        let half = 0.75f32.sqrt();
        assert_relative_eq!(left, 2.0 - half, epsilon = EPSILON);
        assert_relative_eq!(right, 2.0 + half, epsilon = EPSILON);
        assert!(circle.view().span_in_band(1.5, 2.0).is_none());

        // Diamond: the band cuts two edges on each side
        let diamond = Shape::new(
            CollisionShape::polygon(vec![
                Vec2::new(0.0, -2.0),
                Vec2::new(2.0, 0.0),
                Vec2::new(0.0, 2.0),
                Vec2::new(-2.0, 0.0),
            ])
            .unwrap(),
        );
        let (left, right) = diamond.view().span_in_band(1.0, 5.0).unwrap();
        assert_relative_eq!(left, -1.0, epsilon = EPSILON);
        assert_relative_eq!(right, 1.0, epsilon = EPSILON);
        let (left, right) = diamond.view().span_in_band(-0.5, 0.5).unwrap();
        assert_relative_eq!(left, -2.0, epsilon = EPSILON);
        assert_relative_eq!(right, 2.0, epsilon = EPSILON);
        assert!(diamond.view().span_in_band(2.5, 3.0).is_none());

        let capsule = ShapeView::Capsule {
            start: Vec2::new(0.0, 0.0),
            end: Vec2::new(10.0, 10.0),
            radius: 0.5,
        };
        let (left, right) = capsule.span_in_band(4.0, 5.0).unwrap();
        assert!(left <= 4.0 - 0.5 && right >= 5.0 + 0.5);
        assert!(right - left <= 3.0 + EPSILON);
        assert!(capsule.span_in_band(11.0, 12.0).is_none());
    }
}
