//! Abstract spatial query interface
//!
//! Path search only needs to know whether a probe is blocked. This trait is
//! that seam, so the search can run against the live collision world or a
//! plain list of obstacles.

use crate::physics::collision::{Collidable, Shape};

/// Answers "is this probe blocked?" for movement checks
pub trait SpatialQuery {
    /// True iff `probe` overlaps any movement obstacle
    fn restriction_query(&self, probe: &dyn Collidable) -> bool;
}

/// Every shape in the slice blocks movement
impl SpatialQuery for [Shape] {
    fn restriction_query(&self, probe: &dyn Collidable) -> bool {
        let bounds = probe.bounds();
        self.iter()
            .any(|shape| bounds.intersects(&shape.bounds()) && probe.intersects(shape))
    }
}

impl<T: SpatialQuery + ?Sized> SpatialQuery for &T {
    fn restriction_query(&self, probe: &dyn Collidable) -> bool {
        (**self).restriction_query(probe)
    }
}
