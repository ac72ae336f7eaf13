//! Math utilities and types
//!
//! Provides the 2D math types used by the collision and navigation code.
//! Everything is `f32` and built on nalgebra.

use serde::{Deserialize, Serialize};

use nalgebra::Vector2;

/// 2D vector type
pub type Vec2 = Vector2<f32>;

/// Tolerance used when deciding whether a length is effectively zero
pub const LENGTH_EPSILON: f32 = 1e-6;

/// Position and rotation of a shape in world space
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform2D {
    /// Position in world space
    pub position: Vec2,

    /// Rotation in radians, counter-clockwise from +X
    pub rotation: f32,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vec2::zeros(),
            rotation: 0.0,
        }
    }
}

impl Transform2D {
    /// Create a new identity transform
    pub fn identity() -> Self {
        Self::default()
    }

    /// Create a transform from position and rotation
    pub const fn new(position: Vec2, rotation: f32) -> Self {
        Self { position, rotation }
    }

    /// Create a transform with only position
    pub fn from_position(position: Vec2) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Apply this transform to a local-space point
    pub fn transform_point(&self, local: Vec2) -> Vec2 {
        self.rotate(local) + self.position
    }

    /// Rotate a local-space vector (no translation)
    pub fn rotate(&self, local: Vec2) -> Vec2 {
        let (sin, cos) = self.rotation.sin_cos();
        Vec2::new(local.x * cos - local.y * sin, local.x * sin + local.y * cos)
    }

    /// Unit vector the transform is facing (local +X in world space)
    pub fn facing(&self) -> Vec2 {
        utils::direction_from_angle(self.rotation)
    }
}

/// Math constants
pub mod constants {
    /// Pi constant
    pub const PI: f32 = std::f32::consts::PI;

    /// 2 * Pi
    pub const TAU: f32 = 2.0 * PI;

    /// Pi / 2
    pub const HALF_PI: f32 = PI * 0.5;

    /// Square root of two, the length of a unit diagonal step
    pub const SQRT_2: f32 = std::f32::consts::SQRT_2;
}

/// Math utility functions
pub mod utils {
    use super::{Vec2, LENGTH_EPSILON};

    /// Unit vector pointing along `angle` radians
    pub fn direction_from_angle(angle: f32) -> Vec2 {
        let (sin, cos) = angle.sin_cos();
        Vec2::new(cos, sin)
    }

    /// Angle of a vector in radians, or `None` for a zero-length vector
    pub fn angle_of(v: Vec2) -> Option<f32> {
        if v.norm_squared() <= LENGTH_EPSILON * LENGTH_EPSILON {
            None
        } else {
            Some(v.y.atan2(v.x))
        }
    }

    /// Normalize `v`, returning `None` for zero-length or non-finite input
    pub fn try_normalize(v: Vec2) -> Option<Vec2> {
        let length = v.norm();
        if !length.is_finite() || length <= LENGTH_EPSILON {
            return None;
        }
        Some(v / length)
    }

    /// Left-hand perpendicular (rotated +90 degrees)
    pub fn perp(v: Vec2) -> Vec2 {
        Vec2::new(-v.y, v.x)
    }

    /// Scalar 2D cross product `a.x * b.y - a.y * b.x`
    pub fn cross(a: Vec2, b: Vec2) -> f32 {
        a.x * b.y - a.y * b.x
    }

    /// True when both components are finite
    pub fn is_finite(v: Vec2) -> bool {
        v.x.is_finite() && v.y.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const EPSILON: f32 = 1e-6;

    #[test]
    fn test_transform_point_rotates_then_translates() {
        let transform = Transform2D::new(Vec2::new(10.0, 0.0), constants::HALF_PI);
        let world = transform.transform_point(Vec2::new(1.0, 0.0));
        assert_relative_eq!(world, Vec2::new(10.0, 1.0), epsilon = EPSILON);
    }

    #[test]
    fn test_facing_matches_rotation() {
        let transform = Transform2D::new(Vec2::zeros(), constants::PI);
        assert_relative_eq!(transform.facing(), Vec2::new(-1.0, 0.0), epsilon = EPSILON);
    }

    #[test]
    fn test_try_normalize_rejects_degenerate_vectors() {
        assert!(utils::try_normalize(Vec2::zeros()).is_none());
        assert!(utils::try_normalize(Vec2::new(f32::NAN, 1.0)).is_none());
        let unit = utils::try_normalize(Vec2::new(3.0, 4.0)).unwrap();
        assert_relative_eq!(unit, Vec2::new(0.6, 0.8), epsilon = EPSILON);
    }

    #[test]
    fn test_angle_of_zero_vector_is_none() {
        assert!(utils::angle_of(Vec2::zeros()).is_none());
        assert_relative_eq!(utils::angle_of(Vec2::new(0.0, 2.0)).unwrap(), constants::HALF_PI);
    }
}
