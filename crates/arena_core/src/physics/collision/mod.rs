//! Shape geometry and intersection tests
//!
//! # Architecture
//!
//! - **Model Space Storage**: [`CollisionShape`] holds local-space geometry only
//! - **Retained World Buffers**: [`Shape`] and [`SweptShape`] rewrite their
//!   world-space vertices in place when the transform changes
//! - **Closed Dispatch**: every test matches exhaustively on [`ShapeView`]
//!
//! # Module Organization
//!
//! - [`primitives`] - bounds, contacts, segment and hull helpers
//! - [`shape`] - shape definitions and the posed [`Shape`]
//! - [`narrow`] - exact intersection tests
//! - [`swept`] - continuous shapes for motion checks

pub mod narrow;
pub mod primitives;
pub mod shape;
pub mod swept;

pub use narrow::CONTACT_EPSILON;
pub use primitives::{Aabb, Contact};
pub use shape::{Collidable, CollisionShape, GeometryError, Shape, ShapeView};
pub use swept::SweptShape;
