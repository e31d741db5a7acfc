//! Pairing of one rapier rigid body with one scene node, plus typed access to
//! the body's state.

use crate::config::TREAD_OFFSET;
use crate::scene::NodeId;
use macroquad::math::{Quat, Vec3};
use rapier3d::na::{Quaternion, UnitQuaternion};
use rapier3d::prelude::*;
use std::fmt;

/// Handle pair for one physics body and the scene node it drives.
///
/// The entity that created the binding owns it; the [`PhysicsWorld`](super::PhysicsWorld)
/// keeps a copy in its sync registry. A binding whose body has been released
/// no longer resolves and every access reports
/// [`PhysicsError::StaleBody`](crate::error::PhysicsError).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RigidBodyBinding {
    pub body: RigidBodyHandle,
    pub node: NodeId,
}

impl RigidBodyBinding {
    /// Whether the body still resolves in `world`.
    pub fn is_valid(&self, world: &super::PhysicsWorld) -> bool {
        world.is_valid(self)
    }
}

impl fmt::Display for RigidBodyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (index, generation) = self.body.into_raw_parts();
        write!(f, "body {}v{} -> {}", index, generation, self.node)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyKind {
    Dynamic,
    Static,
}

/// Rigid body descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyDesc {
    pub kind: BodyKind,
    pub translation: Vec3,
    pub rotation: Quat,
    pub linear_damping: f32,
    pub angular_damping: f32,
    /// Continuous collision detection, for fast movers.
    pub ccd: bool,
    /// Only allow rotation about the vertical axis.
    pub yaw_only: bool,
    pub gravity_scale: f32,
}

impl BodyDesc {
    pub fn dynamic(translation: Vec3) -> Self {
        BodyDesc {
            kind: BodyKind::Dynamic,
            translation,
            rotation: Quat::IDENTITY,
            linear_damping: 0.0,
            angular_damping: 0.0,
            ccd: false,
            yaw_only: false,
            gravity_scale: 1.0,
        }
    }

    pub fn fixed(translation: Vec3) -> Self {
        BodyDesc {
            kind: BodyKind::Static,
            ..BodyDesc::dynamic(translation)
        }
    }
}

/// Which colliders touch which. Projectiles pass through tanks (hits are
/// resolved by distance) but stop against static geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollisionLayer {
    Static,
    Tank,
    Projectile,
}

impl CollisionLayer {
    fn groups(self) -> InteractionGroups {
        match self {
            CollisionLayer::Static => InteractionGroups::new(Group::GROUP_1, Group::ALL),
            CollisionLayer::Tank => {
                InteractionGroups::new(Group::GROUP_2, Group::GROUP_1 | Group::GROUP_2)
            }
            CollisionLayer::Projectile => InteractionGroups::new(Group::GROUP_3, Group::GROUP_1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColliderShape {
    Cuboid { half_extents: Vec3 },
    Ball { radius: f32 },
}

/// Collider descriptor
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColliderDesc {
    pub shape: ColliderShape,
    pub density: f32,
    pub friction: f32,
    pub restitution: f32,
    pub sensor: bool,
    pub layer: CollisionLayer,
}

impl ColliderDesc {
    pub fn cuboid(half_extents: Vec3) -> Self {
        ColliderDesc {
            shape: ColliderShape::Cuboid { half_extents },
            density: 1.0,
            friction: 0.5,
            restitution: 0.0,
            sensor: false,
            layer: CollisionLayer::Static,
        }
    }

    pub fn ball(radius: f32) -> Self {
        ColliderDesc {
            shape: ColliderShape::Ball { radius },
            ..ColliderDesc::cuboid(Vec3::ONE)
        }
    }

    pub fn with_density(mut self, density: f32) -> Self {
        self.density = density;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_layer(mut self, layer: CollisionLayer) -> Self {
        self.layer = layer;
        self
    }

    pub(crate) fn build(&self) -> Collider {
        let builder = match self.shape {
            ColliderShape::Cuboid { half_extents } => {
                ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            }
            ColliderShape::Ball { radius } => ColliderBuilder::ball(radius),
        };
        builder
            .density(self.density)
            .friction(self.friction)
            .restitution(self.restitution)
            .sensor(self.sensor)
            .collision_groups(self.layer.groups())
            .build()
    }
}

// Conversion helpers between the render math types and rapier's nalgebra types
pub(crate) fn to_vector(v: Vec3) -> Vector<Real> {
    vector![v.x, v.y, v.z]
}

pub(crate) fn from_vector(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

pub(crate) fn to_rotation(q: Quat) -> Rotation<Real> {
    UnitQuaternion::from_quaternion(Quaternion::new(q.w, q.x, q.y, q.z))
}

pub(crate) fn from_rotation(r: &Rotation<Real>) -> Quat {
    let coords = r.coords;
    Quat::from_xyzw(coords.x, coords.y, coords.z, coords.w)
}

/// Read-only view of a live body. Every getter returns a copy.
pub struct BodyRef<'a> {
    body: &'a RigidBody,
}

impl<'a> BodyRef<'a> {
    pub(crate) fn new(body: &'a RigidBody) -> Self {
        BodyRef { body }
    }

    pub fn position(&self) -> Vec3 {
        from_vector(self.body.translation())
    }

    pub fn rotation(&self) -> Quat {
        from_rotation(self.body.rotation())
    }

    pub fn velocity(&self) -> Vec3 {
        from_vector(self.body.linvel())
    }

    pub fn angular_velocity(&self) -> Vec3 {
        from_vector(self.body.angvel())
    }

    pub fn mass(&self) -> f32 {
        self.body.mass()
    }

    pub fn is_sleeping(&self) -> bool {
        self.body.is_sleeping()
    }
}

/// Mutable access to a live body. Every write wakes the body so that it is
/// never silently dropped by a sleeping island.
pub struct BodyMut<'a> {
    body: &'a mut RigidBody,
}

impl<'a> BodyMut<'a> {
    pub(crate) fn new(body: &'a mut RigidBody) -> Self {
        BodyMut { body }
    }

    pub fn position(&self) -> Vec3 {
        from_vector(self.body.translation())
    }

    pub fn rotation(&self) -> Quat {
        from_rotation(self.body.rotation())
    }

    pub fn velocity(&self) -> Vec3 {
        from_vector(self.body.linvel())
    }

    pub fn angular_velocity(&self) -> Vec3 {
        from_vector(self.body.angvel())
    }

    pub fn mass(&self) -> f32 {
        self.body.mass()
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.body.set_translation(to_vector(position), true);
    }

    pub fn set_rotation(&mut self, rotation: Quat) {
        self.body.set_rotation(to_rotation(rotation), true);
    }

    pub fn set_velocity(&mut self, velocity: Vec3) {
        self.body.set_linvel(to_vector(velocity), true);
    }

    pub fn set_angular_velocity(&mut self, angular_velocity: Vec3) {
        self.body.set_angvel(to_vector(angular_velocity), true);
    }

    /// Continuous force, cleared by the world after the next step.
    pub fn apply_force(&mut self, force: Vec3) {
        self.body.add_force(to_vector(force), true);
    }

    pub fn apply_impulse(&mut self, impulse: Vec3) {
        self.body.apply_impulse(to_vector(impulse), true);
    }

    /// Continuous torque, cleared by the world after the next step.
    pub fn apply_torque(&mut self, torque: Vec3) {
        self.body.add_torque(to_vector(torque), true);
    }

    pub fn apply_angular_impulse(&mut self, impulse: Vec3) {
        self.body.apply_torque_impulse(to_vector(impulse), true);
    }

    /// Approximates differential tread drive for a tank hull.
    ///
    /// `direction` is -1, 0 or 1 (positive yaws toward +X from a +Z heading).
    /// Applies a yaw torque of `direction * strength` plus an opposing pair of
    /// forces at the two treads, which adds the same torque again.
    pub fn simulate_treads(&mut self, direction: f32, strength: f32) {
        if direction == 0.0 {
            return;
        }
        let direction = direction.clamp(-1.0, 1.0);
        self.apply_torque(Vec3::Y * direction * strength);

        let rotation = self.rotation();
        let center = self.position();
        let side = rotation * Vec3::X;
        let forward = rotation * Vec3::Z;
        let tread_force = forward * (direction * strength / (2.0 * TREAD_OFFSET));

        // The +X tread drives backward and the -X tread forward for positive yaw
        let right_tread = center + side * TREAD_OFFSET;
        let left_tread = center - side * TREAD_OFFSET;
        self.body.add_force_at_point(
            to_vector(-tread_force),
            point![right_tread.x, right_tread.y, right_tread.z],
            true,
        );
        self.body.add_force_at_point(
            to_vector(tread_force),
            point![left_tread.x, left_tread.y, left_tread.z],
            true,
        );
    }
}
