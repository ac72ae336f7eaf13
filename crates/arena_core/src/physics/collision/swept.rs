//! Swept (continuous) shapes
//!
//! A [`SweptShape`] covers everything a base shape touches while moving over
//! one step. Polygons become the convex hull of their start and end poses;
//! circles become capsules. Every motion-blocking check goes through one of
//! these so that fast movers cannot skip over thin obstacles.

use super::primitives::{self, Aabb};
use super::shape::{Collidable, CollisionShape, Shape, ShapeView};
use crate::foundation::math::{utils, Vec2, LENGTH_EPSILON};

/// A shape together with the path it covered during the last step
///
/// Created once per owner and re-parameterized every frame; the hull buffers
/// are retained between calls.
#[derive(Debug, Clone)]
pub struct SweptShape {
    base: Shape,
    /// Offset from the start of the step to the end pose
    sweep: Vec2,
    points: Vec<Vec2>,
    hull: Vec<Vec2>,
}

impl SweptShape {
    /// Wraps `model` placed at the origin with no sweep
    pub fn new(model: CollisionShape) -> Self {
        let mut swept = Self {
            base: Shape::new(model),
            sweep: Vec2::zeros(),
            points: Vec::new(),
            hull: Vec::new(),
        };
        swept.rebuild();
        swept
    }

    /// Sets the pose at the end of the step; the sweep offset is kept
    pub fn set_transformation(&mut self, position: Vec2, rotation: f32) {
        self.base.set_transformation(position, rotation);
        self.rebuild();
    }

    /// Extends the shape backward along its facing direction by `distance`
    ///
    /// Returns the world-space hull vertices. Circles have no polygonal hull
    /// (they sweep into a capsule), so the slice is empty for them.
    pub fn sweep_vertices(&mut self, distance: f32) -> &[Vec2] {
        let distance = if distance.is_finite() { distance.max(0.0) } else { 0.0 };
        self.sweep = self.base.transform().facing() * distance;
        self.rebuild();
        &self.hull
    }

    /// Places the shape at `to` and sweeps it back to `from`
    ///
    /// Unlike [`sweep_vertices`](Self::sweep_vertices) the motion does not
    /// have to follow the facing direction.
    pub fn sweep_between(&mut self, from: Vec2, to: Vec2, rotation: f32) {
        self.base.set_transformation(to, rotation);
        let sweep = to - from;
        self.sweep = if utils::is_finite(sweep) { sweep } else { Vec2::zeros() };
        self.rebuild();
    }

    /// Drops the sweep, leaving just the base shape at its current pose
    pub fn clear_sweep(&mut self) {
        self.sweep = Vec2::zeros();
        self.rebuild();
    }

    /// The unswept shape at the end pose
    pub const fn base(&self) -> &Shape {
        &self.base
    }

    /// Offset travelled during the step
    pub const fn sweep(&self) -> Vec2 {
        self.sweep
    }

    /// Position at the start of the step
    pub fn start_position(&self) -> Vec2 {
        self.base.position() - self.sweep
    }

    /// Hull vertices (empty for circles)
    pub fn hull(&self) -> &[Vec2] {
        &self.hull
    }

    fn is_swept(&self) -> bool {
        self.sweep.norm_squared() > LENGTH_EPSILON * LENGTH_EPSILON
    }

    fn rebuild(&mut self) {
        self.hull.clear();
        if matches!(self.base.model(), CollisionShape::Circle { .. }) {
            return;
        }

        let world = self.base.world_vertices();
        if !self.is_swept() {
            self.hull.extend_from_slice(world);
            return;
        }
        self.points.clear();
        self.points.extend_from_slice(world);
        let sweep = self.sweep;
        self.points.extend(world.iter().map(|v| v - sweep));
        primitives::convex_hull_into(&mut self.points, &mut self.hull);
    }
}

impl Collidable for SweptShape {
    fn view(&self) -> ShapeView<'_> {
        match *self.base.model() {
            CollisionShape::Circle { radius } => {
                let end = self.base.position();
                if self.is_swept() {
                    ShapeView::Capsule {
                        start: end - self.sweep,
                        end,
                        radius,
                    }
                } else {
                    ShapeView::Circle { center: end, radius }
                }
            }
            CollisionShape::Rectangle { .. } | CollisionShape::Polygon { .. } => {
                ShapeView::Polygon {
                    vertices: &self.hull,
                }
            }
        }
    }

    fn bounds(&self) -> Aabb {
        self.view().bounds()
    }
}
