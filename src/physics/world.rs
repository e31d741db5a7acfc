//! rapier3d world ownership, stepping and render sync.
//!
//! Each frame [`PhysicsWorld::step`]:
//!
//! 1. advances the simulation once with the frame's dt (clamped to
//!    [`MAX_PHYSICS_DT`]);
//! 2. clears the user forces and torques accumulated for that step;
//! 3. copies translation and rotation of every registered binding into its
//!    scene node.
//!
//! Bindings whose body or node no longer resolves are pruned during the sync
//! without affecting any other binding.

use super::binding::{
    from_vector, to_rotation, to_vector, BodyDesc, BodyKind, BodyMut, BodyRef, ColliderDesc,
    RigidBodyBinding,
};
use crate::config::MAX_PHYSICS_DT;
use crate::error::PhysicsError;
use crate::scene::{NodeId, SceneGraph, Transform};
use macroquad::math::Vec3;
use rapier3d::prelude::*;

/// Outcome of one sync pass.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct SyncReport {
    pub synced: usize,
    pub pruned: Vec<RigidBodyBinding>,
}

/// Owns the rapier simulation and the registry of bindings to keep in sync.
pub struct PhysicsWorld {
    pipeline: PhysicsPipeline,
    gravity: Vector<Real>,
    integration_params: IntegrationParameters,
    island_manager: IslandManager,
    broad_phase: DefaultBroadPhase,
    narrow_phase: NarrowPhase,
    rigid_body_set: RigidBodySet,
    collider_set: ColliderSet,
    impulse_joint_set: ImpulseJointSet,
    multibody_joint_set: MultibodyJointSet,
    ccd_solver: CCDSolver,
    /// Non-owning copies of the bindings synced after each step.
    registered: Vec<RigidBodyBinding>,
}

impl PhysicsWorld {
    pub fn new(gravity: Vec3) -> Self {
        PhysicsWorld {
            pipeline: PhysicsPipeline::new(),
            gravity: to_vector(gravity),
            integration_params: IntegrationParameters::default(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            registered: Vec::new(),
        }
    }

    pub fn gravity(&self) -> Vec3 {
        from_vector(&self.gravity)
    }

    /// Creates a rapier body with its colliders, driving `node`.
    ///
    /// The returned binding is not registered for sync yet; see [`add_body`](Self::add_body).
    pub fn create_body(
        &mut self,
        desc: &BodyDesc,
        colliders: &[ColliderDesc],
        node: NodeId,
    ) -> RigidBodyBinding {
        let builder = match desc.kind {
            BodyKind::Dynamic => RigidBodyBuilder::dynamic(),
            BodyKind::Static => RigidBodyBuilder::fixed(),
        };
        let mut builder = builder
            .translation(to_vector(desc.translation))
            .linear_damping(desc.linear_damping)
            .angular_damping(desc.angular_damping)
            .ccd_enabled(desc.ccd)
            .gravity_scale(desc.gravity_scale);
        if desc.yaw_only {
            builder = builder.enabled_rotations(false, true, false);
        }
        let mut body = builder.build();
        body.set_rotation(to_rotation(desc.rotation), false);

        let handle = self.rigid_body_set.insert(body);
        for collider in colliders {
            self.collider_set
                .insert_with_parent(collider.build(), handle, &mut self.rigid_body_set);
        }
        crate::debug_physics!("Created {:?} body {:?} for {}", desc.kind, handle, node);
        RigidBodyBinding { body: handle, node }
    }

    /// Creates and registers a fixed box body centred at `center`.
    pub fn create_static_box(
        &mut self,
        center: Vec3,
        half_extents: Vec3,
        friction: f32,
        node: NodeId,
    ) -> RigidBodyBinding {
        let binding = self.create_body(
            &BodyDesc::fixed(center),
            &[ColliderDesc::cuboid(half_extents).with_friction(friction)],
            node,
        );
        self.add_body(binding);
        binding
    }

    /// Registers a binding for per-step sync. Registering twice has no effect.
    pub fn add_body(&mut self, binding: RigidBodyBinding) {
        if !self.registered.contains(&binding) {
            self.registered.push(binding);
        }
    }

    /// Unregisters a binding and releases its body and colliders.
    ///
    /// Safe to call on bindings that were never registered or were already
    /// removed; returns whether anything was released.
    pub fn remove_body(&mut self, binding: &RigidBodyBinding) -> bool {
        let before = self.registered.len();
        self.registered.retain(|b| b != binding);
        let unregistered = self.registered.len() != before;
        let released = self.release(binding.body);
        if unregistered || released {
            crate::debug_physics!("Removed {}", binding);
        }
        unregistered || released
    }

    fn release(&mut self, handle: RigidBodyHandle) -> bool {
        self.rigid_body_set
            .remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true, // remove attached colliders
            )
            .is_some()
    }

    pub fn is_valid(&self, binding: &RigidBodyBinding) -> bool {
        self.rigid_body_set.contains(binding.body)
    }

    pub fn is_registered(&self, binding: &RigidBodyBinding) -> bool {
        self.registered.contains(binding)
    }

    pub fn body(&self, binding: &RigidBodyBinding) -> Result<BodyRef<'_>, PhysicsError> {
        self.rigid_body_set
            .get(binding.body)
            .map(BodyRef::new)
            .ok_or(PhysicsError::StaleBody(binding.body))
    }

    pub fn body_mut(&mut self, binding: &RigidBodyBinding) -> Result<BodyMut<'_>, PhysicsError> {
        self.rigid_body_set
            .get_mut(binding.body)
            .map(BodyMut::new)
            .ok_or(PhysicsError::StaleBody(binding.body))
    }

    /// Number of live rapier bodies, registered or not.
    pub fn body_count(&self) -> usize {
        self.rigid_body_set.len()
    }

    pub fn registered_count(&self) -> usize {
        self.registered.len()
    }

    /// Advances the simulation one step and syncs every registered binding
    /// into `scene`. A frame with no elapsed time only syncs.
    pub fn step(&mut self, dt: f32, scene: &mut SceneGraph) -> SyncReport {
        if dt <= 0.0 {
            return self.sync(scene);
        }
        self.integration_params.dt = dt.min(MAX_PHYSICS_DT);

        self.pipeline.step(
            &self.gravity,
            &self.integration_params,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            None, // query pipeline (unused)
            &(),  // physics hooks
            &(),  // event handler
        );

        // Forces and torques only act for the step they were issued in
        for (_, body) in self.rigid_body_set.iter_mut() {
            body.reset_forces(false);
            body.reset_torques(false);
        }

        self.sync(scene)
    }

    /// Copies physics transforms into the scene, pruning bindings that no
    /// longer resolve.
    pub fn sync(&mut self, scene: &mut SceneGraph) -> SyncReport {
        let mut report = SyncReport::default();
        for binding in &self.registered {
            match Self::sync_binding(&self.rigid_body_set, binding, scene) {
                Ok(()) => report.synced += 1,
                Err(err) => {
                    crate::debug_physics!("Pruning {}: {}", binding, err);
                    report.pruned.push(*binding);
                }
            }
        }
        if !report.pruned.is_empty() {
            self.registered.retain(|b| !report.pruned.contains(b));
            // A body whose render target is gone has nothing left to drive
            for binding in &report.pruned {
                self.release(binding.body);
            }
        }
        report
    }

    fn sync_binding(
        bodies: &RigidBodySet,
        binding: &RigidBodyBinding,
        scene: &mut SceneGraph,
    ) -> Result<(), PhysicsError> {
        let body = bodies
            .get(binding.body)
            .map(BodyRef::new)
            .ok_or(PhysicsError::StaleBody(binding.body))?;
        let transform = Transform {
            translation: body.position(),
            rotation: body.rotation(),
        };
        if scene.set_transform(binding.node, transform) {
            Ok(())
        } else {
            Err(PhysicsError::MissingNode(binding.node))
        }
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new(Vec3::from(crate::config::GRAVITY))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::NodeShape;
    use assert_approx_eq::assert_approx_eq;
    use macroquad::color::GRAY;
    use macroquad::math::Quat;

    fn ball_node(scene: &mut SceneGraph) -> NodeId {
        scene.attach(NodeShape::Sphere { radius: 0.5 }, GRAY, Transform::default())
    }

    fn spawn_ball(
        world: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        at: Vec3,
    ) -> RigidBodyBinding {
        let node = ball_node(scene);
        let colliders = [ColliderDesc::ball(0.5)];
        let binding = world.create_body(&BodyDesc::dynamic(at), &colliders, node);
        world.add_body(binding);
        binding
    }

    // Removes a body behind the world's back, as an out-of-band engine removal would.
    fn evict(world: &mut PhysicsWorld, binding: &RigidBodyBinding) {
        world.release(binding.body);
    }

    #[test]
    fn test_new_world_is_empty() {
        let world = PhysicsWorld::default();
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.registered_count(), 0);
        assert_approx_eq!(world.gravity().y, -9.81);
    }

    #[test]
    fn test_step_syncs_scene_to_physics() {
        let mut world = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let falling = spawn_ball(&mut world, &mut scene, Vec3::new(0.0, 10.0, 0.0));
        let spinning = spawn_ball(&mut world, &mut scene, Vec3::new(5.0, 10.0, 0.0));
        world
            .body_mut(&spinning)
            .map(|mut body| body.set_angular_velocity(Vec3::new(0.0, 2.0, 0.0)))
            .expect("body should exist");

        for _ in 0..10 {
            let report = world.step(1.0 / 60.0, &mut scene);
            assert_eq!(report.synced, 2);
            for binding in [falling, spinning] {
                let body = world.body(&binding).expect("body should exist");
                let node = scene.transform(binding.node).expect("node should exist");
                assert!((node.translation - body.position()).length() < 1e-6);
                assert!(node.rotation.abs_diff_eq(body.rotation(), 1e-6));
            }
        }
        let fallen = scene.transform(falling.node).expect("node should exist");
        assert!(fallen.translation.y < 10.0, "gravity should pull the ball down");
        let spun = scene.transform(spinning.node).expect("node should exist");
        assert!(!spun.rotation.abs_diff_eq(Quat::IDENTITY, 1e-4));
    }

    #[test]
    fn test_duplicate_registration_is_ignored() {
        let mut world = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        world.add_body(binding);
        world.add_body(binding);
        assert_eq!(world.registered_count(), 1);
        assert_eq!(world.step(1.0 / 60.0, &mut scene).synced, 1);
    }

    #[test]
    fn test_remove_body_twice_is_a_noop() {
        let mut world = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        assert!(world.remove_body(&binding));
        assert!(!world.remove_body(&binding));
        assert!(!binding.is_valid(&world));
        assert_eq!(world.body_count(), 0);
        assert_eq!(world.registered_count(), 0);
    }

    #[test]
    fn test_stale_body_is_pruned_without_disturbing_others() {
        let mut world = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let first = spawn_ball(&mut world, &mut scene, Vec3::new(0.0, 5.0, 0.0));
        let stale = spawn_ball(&mut world, &mut scene, Vec3::new(3.0, 5.0, 0.0));
        let last = spawn_ball(&mut world, &mut scene, Vec3::new(6.0, 5.0, 0.0));

        evict(&mut world, &stale);
        assert!(matches!(world.body(&stale), Err(PhysicsError::StaleBody(_))));

        let report = world.step(1.0 / 60.0, &mut scene);
        assert_eq!(report.synced, 2);
        assert_eq!(report.pruned, vec![stale]);
        assert!(world.is_registered(&first));
        assert!(world.is_registered(&last));
        assert!(!world.is_registered(&stale));

        // Removing it afterwards is still harmless
        assert!(!world.remove_body(&stale));
    }

    #[test]
    fn test_detached_node_prunes_and_releases_body() {
        let mut world = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let kept = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        let orphan = spawn_ball(&mut world, &mut scene, Vec3::new(4.0, 0.0, 0.0));
        scene.detach(orphan.node);

        let report = world.step(1.0 / 60.0, &mut scene);
        assert_eq!(report.pruned, vec![orphan]);
        assert!(!orphan.is_valid(&world));
        assert!(kept.is_valid(&world));
    }

    #[test]
    fn test_writes_wake_and_apply() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        {
            let mut body = world.body_mut(&binding).expect("body should exist");
            body.set_position(Vec3::new(1.0, 2.0, 3.0));
            body.set_velocity(Vec3::new(0.0, 0.0, 4.0));
            assert_eq!(body.position(), Vec3::new(1.0, 2.0, 3.0));
            assert_eq!(body.velocity(), Vec3::new(0.0, 0.0, 4.0));
        }
        world.step(0.5, &mut scene);
        let body = world.body(&binding).expect("body should exist");
        // dt is clamped, so the ball moves at most 4 * MAX_PHYSICS_DT
        assert_approx_eq!(body.position().z, 3.0 + 4.0 * MAX_PHYSICS_DT, 1e-4);
        assert!(!body.is_sleeping());
    }

    #[test]
    fn test_zero_dt_does_not_move_bodies() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        world
            .body_mut(&binding)
            .map(|mut body| body.set_velocity(Vec3::new(0.0, 0.0, 10.0)))
            .expect("body should exist");
        let report = world.step(0.0, &mut scene);
        assert_eq!(report.synced, 1);
        assert_eq!(world.body(&binding).map(|b| b.position()).expect("body"), Vec3::ZERO);
        world.step(-1.0, &mut scene);
        assert_eq!(world.body(&binding).map(|b| b.position()).expect("body"), Vec3::ZERO);
    }

    #[test]
    fn test_angular_impulse_spins_the_body() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        world
            .body_mut(&binding)
            .map(|mut body| body.apply_angular_impulse(Vec3::new(0.0, 2.0, 0.0)))
            .expect("body should exist");
        world.step(1.0 / 60.0, &mut scene);
        let spin = world.body(&binding).map(|b| b.angular_velocity()).expect("body");
        assert!(spin.y > 0.0);
        assert_approx_eq!(spin.x, 0.0, 1e-5);
        assert_approx_eq!(spin.z, 0.0, 1e-5);
    }

    #[test]
    fn test_forces_only_last_one_step() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneGraph::new();
        let binding = spawn_ball(&mut world, &mut scene, Vec3::ZERO);
        world
            .body_mut(&binding)
            .map(|mut body| body.apply_force(Vec3::new(100.0, 0.0, 0.0)))
            .expect("body should exist");
        world.step(1.0 / 60.0, &mut scene);
        let after_push = world.body(&binding).map(|b| b.velocity().x).expect("body");
        assert!(after_push > 0.0);
        world.step(1.0 / 60.0, &mut scene);
        let later = world.body(&binding).map(|b| b.velocity().x).expect("body");
        assert_approx_eq!(later, after_push, 1e-5);
    }

    #[test]
    fn test_simulate_treads_yaws_in_requested_direction() {
        let mut world = PhysicsWorld::new(Vec3::ZERO);
        let mut scene = SceneGraph::new();
        let node = ball_node(&mut scene);
        let binding = world.create_body(
            &BodyDesc::dynamic(Vec3::ZERO),
            &[ColliderDesc::cuboid(Vec3::new(1.5, 0.75, 2.5))],
            node,
        );
        world.add_body(binding);

        world
            .body_mut(&binding)
            .map(|mut body| body.simulate_treads(0.0, 50.0))
            .expect("body should exist");
        world.step(1.0 / 60.0, &mut scene);
        let idle = world.body(&binding).map(|b| b.angular_velocity()).expect("body");
        assert_eq!(idle, Vec3::ZERO);

        world
            .body_mut(&binding)
            .map(|mut body| body.simulate_treads(1.0, 50.0))
            .expect("body should exist");
        world.step(1.0 / 60.0, &mut scene);
        let body = world.body(&binding).expect("body should exist");
        assert!(body.angular_velocity().y > 0.0);
        // Opposing tread forces cancel out linearly
        assert!(body.velocity().length() < 1e-4);
    }
}
