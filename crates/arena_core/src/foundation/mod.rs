//! Foundation module - Core utilities and types
//!
//! Building blocks shared by the spatial, physics and navigation modules:
//! - 2D math aliases over nalgebra and transform helpers
//! - The binary min-heap used as the path search open set
//! - Frame-stepped cooldowns and diagnostic stopwatches
//! - Logger initialisation

pub mod math;
pub mod collections;
pub mod time;
pub mod logging;
