//! Configuration constants for the tank arena game.

use std::f32::consts::PI;

// Arena defaults (overridable from the command line)
pub const WORLD_SIZE: f32 = 500.0; // Side length of the square arena
pub const ENEMY_COUNT: usize = 5;
pub const OBSTACLE_COUNT: usize = 40;
pub const MIN_OBSTACLE_DISTANCE: f32 = 30.0; // Keep the player's spawn at the origin clear
pub const MIN_ENEMY_DISTANCE: f32 = 100.0;
pub const WALL_HEIGHT: f32 = 10.0;
pub const WALL_THICKNESS: f32 = 2.0;
pub const OBSTACLE_MIN_SIZE: f32 = 4.0;
pub const OBSTACLE_MAX_SIZE: f32 = 14.0;
pub const OBSTACLE_MIN_HEIGHT: f32 = 4.0;
pub const OBSTACLE_MAX_HEIGHT: f32 = 16.0;
pub const SPAWN_SEPARATION: f32 = 10.0; // Minimum gap between spawned enemies and obstacles
pub const PLACEMENT_ATTEMPTS: u32 = 500; // Per placed object

// Physics
pub const GRAVITY: [f32; 3] = [0.0, -9.81, 0.0];
pub const MAX_PHYSICS_DT: f32 = 1.0 / 30.0; // Larger frame gaps are clamped
pub const GROUND_FRICTION: f32 = 0.6;

// Tank hull
pub const TANK_HALF_EXTENTS: [f32; 3] = [1.5, 0.75, 2.5]; // x = width, y = height, z = length
pub const TANK_SPAWN_HEIGHT: f32 = 0.8;
pub const TANK_DENSITY: f32 = 1.0;
pub const TANK_FRICTION: f32 = 0.5;
pub const TANK_LINEAR_DAMPING: f32 = 1.5;
pub const TANK_ANGULAR_DAMPING: f32 = 2.0;
pub const TREAD_STRENGTH: f32 = 40.0; // Torque per unit of turn input
pub const TREAD_OFFSET: f32 = 1.25; // Lateral distance of each tread from the hull centre

// Turret and muzzle (hull-local)
pub const TURRET_HEIGHT: f32 = 1.0;
pub const MUZZLE_LENGTH: f32 = 3.5;
pub const TURRET_ROTATION_SPEED: f32 = 1.5; // Radians per second at full input
pub const PLAYER_TURRET_LIMIT: f32 = PI / 4.0;

// Player tank
pub const PLAYER_MOVE_SPEED: f32 = 20.0;
pub const PLAYER_TURN_SPEED: f32 = 1.6;
pub const PLAYER_MAX_HP: f32 = 100.0;
pub const PLAYER_FIRE_COOLDOWN: f64 = 0.5;
pub const PLAYER_PROJECTILE_SPEED: f32 = 60.0;
pub const PLAYER_PROJECTILE_DAMAGE: f32 = 10.0;

// Enemy tanks
pub const ENEMY_MOVE_SPEED: f32 = 14.0;
pub const ENEMY_TURN_SPEED: f32 = 1.2;
pub const ENEMY_MAX_HP: f32 = 10.0;
pub const ENEMY_FIRE_COOLDOWN: f64 = 2.0;
pub const ENEMY_PROJECTILE_SPEED: f32 = 40.0;
pub const ENEMY_PROJECTILE_DAMAGE: f32 = 10.0;

// Projectiles
pub const PROJECTILE_RADIUS: f32 = 0.3;
pub const PROJECTILE_DENSITY: f32 = 2.0;
pub const PROJECTILE_LIFETIME: f64 = 3.0;
pub const OUT_OF_BOUNDS_DISTANCE: f32 = 1000.0;
pub const COLLISION_DISTANCE: f32 = 2.0;
pub const KILL_REWARD: u32 = 100;

// Enemy AI
pub const AI_DECISION_INTERVAL: f64 = 0.5;
pub const AI_DETECTION_RANGE: f32 = 120.0;
pub const AI_FIRING_RANGE: f32 = 80.0;
pub const AI_FIRE_ANGLE: f32 = PI / 8.0;
pub const AI_ALIGN_THRESHOLD: f32 = 0.1; // Radians of yaw error before driving forward
pub const AI_ARRIVAL_THRESHOLD: f32 = 5.0;
pub const AI_PATROL_RADIUS: f32 = 60.0;
pub const AI_MIN_PATROL_DISTANCE: f32 = 20.0;
pub const AI_PATROL_TIMEOUT: f64 = 20.0; // Give up on a patrol point that cannot be reached
pub const AI_ENGAGE_DISTANCE: f32 = 25.0; // Stop closing in once this near the player

// Rendering configuration
pub const WINDOW_WIDTH: i32 = 1280;
pub const WINDOW_HEIGHT: i32 = 720;
pub const CHASE_CAMERA_DISTANCE: f32 = 14.0;
pub const CHASE_CAMERA_HEIGHT: f32 = 6.0;
pub const FLY_CAMERA_SPEED: f32 = 40.0;

/// Static arena description, read once when a match is set up.
#[derive(Debug, Clone, PartialEq)]
pub struct ArenaConfig {
    pub world_size: f32,
    pub enemy_count: usize,
    pub obstacle_count: usize,
    pub min_obstacle_distance: f32,
    pub min_enemy_distance: f32,
    pub wall_height: f32,
    pub wall_thickness: f32,
    /// Seed for obstacle/enemy placement and patrol points. `None` draws from entropy.
    pub seed: Option<u64>,
}

impl ArenaConfig {
    /// Half of the arena side length; the playable area spans `-half..half` on X and Z.
    pub fn half_extent(&self) -> f32 {
        self.world_size / 2.0
    }
}

impl Default for ArenaConfig {
    fn default() -> Self {
        ArenaConfig {
            world_size: WORLD_SIZE,
            enemy_count: ENEMY_COUNT,
            obstacle_count: OBSTACLE_COUNT,
            min_obstacle_distance: MIN_OBSTACLE_DISTANCE,
            min_enemy_distance: MIN_ENEMY_DISTANCE,
            wall_height: WALL_HEIGHT,
            wall_thickness: WALL_THICKNESS,
            seed: None,
        }
    }
}
