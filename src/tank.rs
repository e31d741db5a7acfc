use crate::config::*;
use crate::error::PhysicsError;
use crate::physics::{BodyDesc, ColliderDesc, CollisionLayer, PhysicsWorld, RigidBodyBinding};
use crate::projectile::{ProjectileLaunch, ProjectileStore};
use crate::scene::{NodeShape, SceneGraph, Transform};
use crate::types::{ProjectileId, ProjectileSource, TankId};
use crate::utils::flatten;
use macroquad::color::{Color, BLUE, RED};
use macroquad::math::{Quat, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TankKind {
    Player,
    Enemy,
}

/// Per-kind tuning of a tank
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TankSpec {
    pub move_speed: f32,
    pub turn_speed: f32,
    pub max_hp: f32,
    pub fire_cooldown: f64,
    pub projectile_speed: f32,
    pub projectile_damage: f32,
    /// Turret arc either side of the hull. `None` means the turret stays
    /// fixed and the whole hull aims.
    pub turret_limit: Option<f32>,
    pub color: Color,
}

impl TankSpec {
    pub fn player() -> Self {
        TankSpec {
            move_speed: PLAYER_MOVE_SPEED,
            turn_speed: PLAYER_TURN_SPEED,
            max_hp: PLAYER_MAX_HP,
            fire_cooldown: PLAYER_FIRE_COOLDOWN,
            projectile_speed: PLAYER_PROJECTILE_SPEED,
            projectile_damage: PLAYER_PROJECTILE_DAMAGE,
            turret_limit: Some(PLAYER_TURRET_LIMIT),
            color: BLUE,
        }
    }

    pub fn enemy() -> Self {
        TankSpec {
            move_speed: ENEMY_MOVE_SPEED,
            turn_speed: ENEMY_TURN_SPEED,
            max_hp: ENEMY_MAX_HP,
            fire_cooldown: ENEMY_FIRE_COOLDOWN,
            projectile_speed: ENEMY_PROJECTILE_SPEED,
            projectile_damage: ENEMY_PROJECTILE_DAMAGE,
            turret_limit: None,
            color: RED,
        }
    }

    pub fn for_kind(kind: TankKind) -> Self {
        match kind {
            TankKind::Player => TankSpec::player(),
            TankKind::Enemy => TankSpec::enemy(),
        }
    }
}

/// A tank hull with its turret, driven through its physics binding
#[derive(Debug, Clone)]
pub struct Tank {
    pub id: TankId,
    pub kind: TankKind,
    pub spec: TankSpec,
    pub binding: RigidBodyBinding,
    hp: f32,
    last_fired: Option<f64>,
    turret_yaw: f32,
}

impl Tank {
    /// Creates the hull body and scene node and registers them for sync.
    pub fn spawn(
        id: TankId,
        kind: TankKind,
        position: Vec3,
        yaw: f32,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
    ) -> Self {
        let spec = TankSpec::for_kind(kind);
        let half_extents = Vec3::from(TANK_HALF_EXTENTS);
        let rotation = Quat::from_rotation_y(yaw);
        let node = scene.attach(
            NodeShape::Tank {
                half_extents,
                turret_yaw: 0.0,
            },
            spec.color,
            Transform {
                translation: position,
                rotation,
            },
        );
        let desc = BodyDesc {
            rotation,
            linear_damping: TANK_LINEAR_DAMPING,
            angular_damping: TANK_ANGULAR_DAMPING,
            yaw_only: true,
            ..BodyDesc::dynamic(position)
        };
        let hull = ColliderDesc::cuboid(half_extents)
            .with_density(TANK_DENSITY)
            .with_friction(TANK_FRICTION)
            .with_layer(CollisionLayer::Tank);
        let binding = physics.create_body(&desc, &[hull], node);
        physics.add_body(binding);
        crate::debug_tank!(id, "Spawned {:?} tank at {:?} ({})", kind, position, binding);

        Tank {
            id,
            kind,
            spec,
            binding,
            hp: spec.max_hp,
            last_fired: None,
            turret_yaw: 0.0,
        }
    }

    pub fn hp(&self) -> f32 {
        self.hp
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0.0
    }

    pub fn turret_yaw(&self) -> f32 {
        self.turret_yaw
    }

    pub fn last_fired(&self) -> Option<f64> {
        self.last_fired
    }

    pub fn position(&self, physics: &PhysicsWorld) -> Result<Vec3, PhysicsError> {
        physics.body(&self.binding).map(|body| body.position())
    }

    pub fn rotation(&self, physics: &PhysicsWorld) -> Result<Quat, PhysicsError> {
        physics.body(&self.binding).map(|body| body.rotation())
    }

    /// Hull forward direction on the ground plane.
    pub fn forward(&self, physics: &PhysicsWorld) -> Result<Vec3, PhysicsError> {
        self.rotation(physics).map(|rotation| flatten(rotation * Vec3::Z))
    }

    /// Hull rotation composed with the turret yaw
    pub fn fire_rotation(&self, physics: &PhysicsWorld) -> Result<Quat, PhysicsError> {
        self.rotation(physics)
            .map(|rotation| rotation * Quat::from_rotation_y(self.turret_yaw))
    }

    pub fn fire_direction(&self, physics: &PhysicsWorld) -> Result<Vec3, PhysicsError> {
        self.fire_rotation(physics).map(|rotation| flatten(rotation * Vec3::Z))
    }

    /// Pushes the hull along its forward vector; `direction` is clamped to [-1, 1].
    pub fn move_hull(
        &self,
        physics: &mut PhysicsWorld,
        direction: f32,
        dt: f32,
    ) -> Result<(), PhysicsError> {
        let direction = direction.clamp(-1.0, 1.0);
        if direction == 0.0 {
            return Ok(());
        }
        let mut body = physics.body_mut(&self.binding)?;
        let mass = body.mass();
        // Never push upward, the hull would hop off the ground
        let forward = flatten(body.rotation() * Vec3::Z);
        body.apply_impulse(forward * direction * self.spec.move_speed * mass * dt);
        Ok(())
    }

    /// Pivots the hull in place at `direction * turn_speed` radians per second.
    pub fn turn(&self, physics: &mut PhysicsWorld, direction: f32) -> Result<(), PhysicsError> {
        let direction = direction.clamp(-1.0, 1.0);
        let mut body = physics.body_mut(&self.binding)?;
        let spin = body.angular_velocity();
        body.set_angular_velocity(Vec3::new(spin.x, direction * self.spec.turn_speed, spin.z));
        body.simulate_treads(direction, TREAD_STRENGTH);
        Ok(())
    }

    /// Swings the turret within its arc. Tanks without a turret arc aim with
    /// the hull, so this does nothing for them.
    pub fn rotate_turret(&mut self, scene: &mut SceneGraph, direction: f32, dt: f32) {
        let Some(limit) = self.spec.turret_limit else {
            return;
        };
        let step = direction.clamp(-1.0, 1.0) * TURRET_ROTATION_SPEED * dt;
        self.turret_yaw = (self.turret_yaw + step).clamp(-limit, limit);
        scene.set_turret_yaw(self.binding.node, self.turret_yaw);
    }

    pub fn can_fire(&self, now: f64) -> bool {
        match self.last_fired {
            Some(at) => now - at >= self.spec.fire_cooldown,
            None => true,
        }
    }

    /// Launches a projectile from the muzzle if the cannon has cooled down.
    ///
    /// Returns `None` without touching anything while cooling down or when
    /// the hull body no longer resolves.
    pub fn fire(
        &mut self,
        now: f64,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        projectiles: &mut ProjectileStore,
    ) -> Option<ProjectileId> {
        if !self.can_fire(now) {
            return None;
        }
        let launch = match self.launch(physics) {
            Ok(launch) => launch,
            Err(err) => {
                crate::debug_tank!(self.id, "Cannot fire: {}", err);
                return None;
            }
        };
        let id = projectiles.spawn(launch, now, physics, scene);
        self.last_fired = Some(now);
        crate::debug_tank!(self.id, "Fired {} toward {:?}", id, launch.direction);
        Some(id)
    }

    fn launch(&self, physics: &PhysicsWorld) -> Result<ProjectileLaunch, PhysicsError> {
        let body = physics.body(&self.binding)?;
        let aim = body.rotation() * Quat::from_rotation_y(self.turret_yaw);
        Ok(ProjectileLaunch {
            origin: body.position() + aim * Vec3::new(0.0, TURRET_HEIGHT, MUZZLE_LENGTH),
            direction: flatten(aim * Vec3::Z),
            shooter_velocity: body.velocity(),
            source: ProjectileSource::for_tank(self.id),
            speed: self.spec.projectile_speed,
            damage: self.spec.projectile_damage,
        })
    }

    /// Applies damage and reports whether the tank survived. Hit points never go up.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if amount > 0.0 {
            self.hp -= amount;
        }
        crate::debug_tank!(self.id, "Took {} damage, {} hp left", amount, self.hp);
        self.is_alive()
    }

    /// Releases the hull body and its scene node. Safe to call twice.
    pub fn despawn(&self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) -> bool {
        let detached = scene.detach(self.binding.node);
        let removed = physics.remove_body(&self.binding);
        detached || removed
    }
}
