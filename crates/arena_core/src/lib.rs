//! # Arena Core
//!
//! Spatial, collision and path-finding core for a real-time top-down 2D game.
//!
//! ## Features
//!
//! - **Convex Shapes**: circles, rotated rectangles and convex polygons with
//!   SAT intersection, contact normals and penetration depth
//! - **Swept Shapes**: hulls and capsules covering a whole step of motion, so
//!   fast movers cannot tunnel through thin walls
//! - **Chunk Grid**: unbounded uniform spatial hash with incremental cell
//!   membership and deterministic query order
//! - **Path Search**: A* over a lazily discovered lattice, traversability
//!   decided by swept probes, with waypoint simplification
//! - **Hunting Agents**: throttled path recompute and per-tick steering
//!
//! ## Quick Start
//!
//! ```rust
//! use arena_core::prelude::*;
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = EngineConfig::default();
//!     let mut world = CollisionWorld::from_config(&config.grid)?;
//!
//!     // A wall between the hunter and its target
//!     world.spawn(
//!         ObjectDesc::new(CollisionShape::rectangle(1.0, 6.0)?)
//!             .at(Vec2::new(4.0, 0.0))
//!             .layers(CollisionLayers::WALL),
//!     )?;
//!
//!     let search = PathSearch::from_config(&config.navigation)?;
//!     let mut hunter = Hunter::new(CollisionShape::circle(0.3)?, search, config.hunt.clone());
//!
//!     let steering = hunter.update(&world, Vec2::zeros(), Vec2::new(8.0, 0.0), 1.0 / 60.0);
//!     assert!(steering.move_direction.is_some());
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions, clippy::similar_names, clippy::too_many_arguments)]

// Configuration
pub mod config;
pub mod core;

// Engine modules
pub mod foundation;
pub mod navigation;
pub mod physics;
pub mod spatial;

/// Common imports for engine users
pub mod prelude {
    pub use crate::{
        core::config::{
            Config, ConfigError, ConfigFormat, EngineConfig, GridConfig, HuntConfig, NavigationConfig,
        },
        foundation::{
            collections::MinHeap,
            math::{Transform2D, Vec2},
            time::{Cooldown, Stopwatch},
        },
        navigation::{Hunter, NavigationError, Path, PathSearch, SearchOutcome, Steering},
        physics::{
            Aabb, Collidable, CollisionLayers, CollisionShape, CollisionWorld, Contact,
            GeometryError, ObjectDesc, ObjectId, QueryFilter, Shape, SweptShape, WorldError,
        },
        spatial::{CellCoord, CellKey, ChunkGrid, GridError, SpatialQuery},
    };
}
