use crate::config::*;
use crate::physics::{BodyDesc, ColliderDesc, CollisionLayer, PhysicsWorld, RigidBodyBinding};
use crate::scene::{NodeShape, SceneGraph, Transform};
use crate::types::{ProjectileId, ProjectileSource};
use macroquad::color::{ORANGE, YELLOW};
use macroquad::math::Vec3;

/// Everything needed to put a shell into the world
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProjectileLaunch {
    pub origin: Vec3,
    pub direction: Vec3,
    pub shooter_velocity: Vec3,
    pub source: ProjectileSource,
    pub speed: f32,
    pub damage: f32,
}

impl ProjectileLaunch {
    /// Muzzle velocity plus whatever the shooter was already doing
    pub fn velocity(&self) -> Vec3 {
        self.direction.normalize_or_zero() * self.speed + self.shooter_velocity
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub id: ProjectileId,
    pub source: ProjectileSource,
    pub binding: RigidBodyBinding,
    pub damage: f32,
    pub spawned_at: f64,
    pub expires_at: f64,
}

impl Projectile {
    pub fn is_expired(&self, now: f64) -> bool {
        now >= self.expires_at
    }
}

/// Live projectiles of the current match.
///
/// Removal always takes the scene node, the physics body and the entry
/// together, and removing an id that is already gone does nothing.
#[derive(Debug, Default)]
pub struct ProjectileStore {
    projectiles: Vec<Projectile>,
    next_id: u64,
}

impl ProjectileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(
        &mut self,
        launch: ProjectileLaunch,
        now: f64,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
    ) -> ProjectileId {
        let id = ProjectileId(self.next_id);
        self.next_id += 1;

        let color = match launch.source {
            ProjectileSource::Player => YELLOW,
            ProjectileSource::Enemy => ORANGE,
        };
        let node = scene.attach(
            NodeShape::Sphere {
                radius: PROJECTILE_RADIUS,
            },
            color,
            Transform::from_translation(launch.origin),
        );
        // No drag and no drop: a shell flies straight until it hits or expires
        let desc = BodyDesc {
            ccd: true,
            gravity_scale: 0.0,
            ..BodyDesc::dynamic(launch.origin)
        };
        let collider = ColliderDesc::ball(PROJECTILE_RADIUS)
            .with_density(PROJECTILE_DENSITY)
            .with_layer(CollisionLayer::Projectile);
        let binding = physics.create_body(&desc, &[collider], node);
        if let Ok(mut body) = physics.body_mut(&binding) {
            body.set_velocity(launch.velocity());
        }
        physics.add_body(binding);

        self.projectiles.push(Projectile {
            id,
            source: launch.source,
            binding,
            damage: launch.damage,
            spawned_at: now,
            expires_at: now + PROJECTILE_LIFETIME,
        });
        crate::debug_combat!(
            "Spawned {} ({:?}) at {:?} moving {:?}",
            id,
            launch.source,
            launch.origin,
            launch.velocity()
        );
        id
    }

    /// Detaches, releases and forgets a projectile. Returns false if it was
    /// already gone.
    pub fn remove(
        &mut self,
        id: ProjectileId,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
    ) -> bool {
        let Some(index) = self.projectiles.iter().position(|p| p.id == id) else {
            return false;
        };
        let projectile = self.projectiles.swap_remove(index);
        scene.detach(projectile.binding.node);
        physics.remove_body(&projectile.binding);
        crate::debug_combat!("Removed {}", id);
        true
    }

    /// Removes every projectile whose lifetime ran out. Returns how many went.
    pub fn expire(
        &mut self,
        now: f64,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
    ) -> usize {
        let expired: Vec<ProjectileId> = self
            .projectiles
            .iter()
            .filter(|p| p.is_expired(now))
            .map(|p| p.id)
            .collect();
        expired
            .into_iter()
            .filter(|id| self.remove(*id, physics, scene))
            .count()
    }

    /// Removes everything, for match teardown
    pub fn clear(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        for id in self.ids() {
            self.remove(id, physics, scene);
        }
    }

    pub fn get(&self, id: ProjectileId) -> Option<&Projectile> {
        self.projectiles.iter().find(|p| p.id == id)
    }

    /// Snapshot of the live ids, safe to iterate while removing.
    pub fn ids(&self) -> Vec<ProjectileId> {
        self.projectiles.iter().map(|p| p.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Projectile> {
        self.projectiles.iter()
    }

    pub fn len(&self) -> usize {
        self.projectiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projectiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn launch(origin: Vec3) -> ProjectileLaunch {
        ProjectileLaunch {
            origin,
            direction: Vec3::Z,
            shooter_velocity: Vec3::ZERO,
            source: ProjectileSource::Player,
            speed: PLAYER_PROJECTILE_SPEED,
            damage: PLAYER_PROJECTILE_DAMAGE,
        }
    }

    #[test]
    fn test_velocity_includes_shooter_motion() {
        let shot = ProjectileLaunch {
            direction: Vec3::new(0.0, 0.0, 2.0),
            shooter_velocity: Vec3::new(3.0, 0.0, 1.0),
            speed: 40.0,
            ..launch(Vec3::ZERO)
        };
        assert_eq!(shot.velocity(), Vec3::new(3.0, 0.0, 41.0));
    }

    #[test]
    fn test_spawn_registers_body_and_node() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut store = ProjectileStore::new();
        let id = store.spawn(launch(Vec3::new(0.0, 2.0, 0.0)), 1.0, &mut physics, &mut scene);

        let projectile = store.get(id).expect("projectile should exist");
        assert_eq!(projectile.expires_at, 1.0 + PROJECTILE_LIFETIME);
        assert!(physics.is_registered(&projectile.binding));
        assert!(scene.contains(projectile.binding.node));
        let velocity = physics
            .body(&projectile.binding)
            .map(|b| b.velocity())
            .expect("body should exist");
        assert_approx_eq!(velocity.z, PLAYER_PROJECTILE_SPEED);
    }

    #[test]
    fn test_projectiles_keep_their_speed() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut store = ProjectileStore::new();
        let id = store.spawn(launch(Vec3::new(0.0, 2.0, 0.0)), 0.0, &mut physics, &mut scene);
        for _ in 0..30 {
            physics.step(1.0 / 60.0, &mut scene);
        }
        let binding = store.get(id).map(|p| p.binding).expect("projectile should exist");
        let body = physics.body(&binding).expect("body should exist");
        assert_approx_eq!(body.velocity().length(), PLAYER_PROJECTILE_SPEED, 1e-3);
        assert_approx_eq!(body.position().y, 2.0, 1e-3);
    }

    #[test]
    fn test_remove_is_atomic_and_idempotent() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut store = ProjectileStore::new();
        let id = store.spawn(launch(Vec3::ZERO), 0.0, &mut physics, &mut scene);
        let binding = store.get(id).map(|p| p.binding).expect("projectile should exist");

        assert!(store.remove(id, &mut physics, &mut scene));
        assert!(store.get(id).is_none());
        assert!(!scene.contains(binding.node));
        assert!(!binding.is_valid(&physics));
        assert!(!physics.is_registered(&binding));

        assert!(!store.remove(id, &mut physics, &mut scene));
        assert!(store.is_empty());
    }

    #[test]
    fn test_expire_only_removes_spent_projectiles() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut store = ProjectileStore::new();
        let old = store.spawn(launch(Vec3::ZERO), 0.0, &mut physics, &mut scene);
        let fresh = store.spawn(launch(Vec3::new(5.0, 0.0, 0.0)), 2.0, &mut physics, &mut scene);

        assert_eq!(store.expire(PROJECTILE_LIFETIME - 0.1, &mut physics, &mut scene), 0);
        assert_eq!(store.expire(PROJECTILE_LIFETIME, &mut physics, &mut scene), 1);
        assert!(store.get(old).is_none());
        assert!(store.get(fresh).is_some());
        assert_eq!(physics.body_count(), 1);
        assert_eq!(scene.len(), 1);
    }

    #[test]
    fn test_clear_empties_everything() {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut store = ProjectileStore::new();
        for i in 0..3 {
            store.spawn(launch(Vec3::new(i as f32, 0.0, 0.0)), 0.0, &mut physics, &mut scene);
        }
        store.clear(&mut physics, &mut scene);
        assert!(store.is_empty());
        assert_eq!(physics.body_count(), 0);
        assert!(scene.is_empty());
    }
}
