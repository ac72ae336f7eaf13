//! Path finding and agent steering
//!
//! [`PathSearch`] finds probe-clear waypoints through the collision world;
//! [`Hunter`] decides when to search again and turns the cached path into
//! per-tick steering.

pub mod astar;
pub mod hunter;

pub use astar::{NavigationError, Path, PathNode, PathSearch, SearchOutcome};
pub use hunter::{Hunter, Steering};
