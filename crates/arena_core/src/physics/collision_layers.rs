//! Collision layers for filtering queries
//!
//! Every tracked object carries a layer set. Queries filter on it, and the
//! restriction query only ever sees objects on [`CollisionLayers::OBSTACLE`].

use bitflags::bitflags;

bitflags! {
    /// Layer membership of a tracked object
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CollisionLayers: u32 {
        /// Player character
        const PLAYER = 1 << 0;
        /// Enemy character
        const ENEMY = 1 << 1;
        /// Projectiles and melee hit volumes
        const PROJECTILE = 1 << 2;
        /// Buildings and other placed structures
        const STRUCTURE = 1 << 3;
        /// Blocks movement; seen by restriction queries and path search
        const OBSTACLE = 1 << 4;
        /// Can receive damage
        const ATTACKABLE = 1 << 5;
        /// Trigger volumes (no blocking, no damage)
        const TRIGGER = 1 << 6;
        /// Pickups and collectibles
        const PICKUP = 1 << 7;
    }
}

impl CollisionLayers {
    /// A wall: a structure that blocks movement
    pub const WALL: Self = Self::STRUCTURE.union(Self::OBSTACLE);

    /// Blocks movement
    ///
    /// ```
    /// use arena_core::physics::CollisionLayers;
    ///
    /// assert!(CollisionLayers::WALL.is_obstacle());
    /// assert!(!(CollisionLayers::PLAYER | CollisionLayers::ATTACKABLE).is_obstacle());
    /// ```
    pub const fn is_obstacle(self) -> bool {
        self.contains(Self::OBSTACLE)
    }

    /// Can be damaged
    pub const fn is_attackable(self) -> bool {
        self.contains(Self::ATTACKABLE)
    }

    /// Is a placed structure
    pub const fn is_structure(self) -> bool {
        self.contains(Self::STRUCTURE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wall_is_structure_and_obstacle() {
        let wall = CollisionLayers::WALL;
        assert!(wall.is_structure());
        assert!(wall.is_obstacle());
        assert!(!wall.is_attackable());
        assert!((CollisionLayers::ENEMY | CollisionLayers::ATTACKABLE).is_attackable());
    }
}
