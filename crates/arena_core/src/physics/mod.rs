//! Collision detection for a 2D world
//!
//! Shapes and intersection tests live in [`collision`]; the tracked-object
//! world that ties them to the chunk grid lives in [`collision_system`].

pub mod collision;
pub mod collision_layers;
pub mod collision_system;

pub use collision::{
    Aabb,
    Collidable,
    CollisionShape,
    Contact,
    GeometryError,
    Shape,
    ShapeView,
    SweptShape,
};
pub use collision_layers::CollisionLayers;
pub use collision_system::{
    CollisionWorld,
    ObjectDesc,
    ObjectId,
    QueryFilter,
    TeamId,
    TrackedObject,
    WorldError,
};
