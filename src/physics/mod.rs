//! Physics integration: a rapier3d world whose bodies drive scene nodes.

pub mod binding;
pub mod world;

pub use binding::{
    BodyDesc, BodyKind, BodyMut, BodyRef, ColliderDesc, ColliderShape, CollisionLayer,
    RigidBodyBinding,
};
pub use world::{PhysicsWorld, SyncReport};
