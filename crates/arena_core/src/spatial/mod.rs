//! Spatial partitioning data structures
//!
//! A uniform grid ("chunk grid") over an unbounded 2D world, its cell keys,
//! and the query seam used by path search.

pub mod cell_key;
pub mod chunk_grid;
pub mod spatial_query;

pub use cell_key::{CellCoord, CellKey};
pub use chunk_grid::{CellMembership, CellRange, ChunkGrid, GridError, MembershipChange};
pub use spatial_query::SpatialQuery;
