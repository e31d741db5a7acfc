use crate::config::*;
use crate::error::SetupError;
use crate::physics::{PhysicsWorld, RigidBodyBinding};
use crate::scene::{NodeShape, SceneGraph, Transform};
use macroquad::color::{Color, BROWN, DARKGREEN, GRAY};
use macroquad::math::Vec3;
use rand::Rng;

/// A static axis-aligned box (obstacle or wall) with its physics body
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Obstacle {
    pub center: Vec3,
    pub half_extents: Vec3,
    pub binding: RigidBodyBinding,
}

impl Obstacle {
    /// Whether a circle of `radius` on the ground plane overlaps this box
    pub fn overlaps_circle(&self, point: Vec3, radius: f32) -> bool {
        (point.x - self.center.x).abs() < self.half_extents.x + radius
            && (point.z - self.center.z).abs() < self.half_extents.z + radius
    }

    /// Ray-AABB slab test of the ground-plane segment `from -> to`
    pub fn intersects_segment(&self, from: Vec3, to: Vec3) -> bool {
        let dx = to.x - from.x;
        let dz = to.z - from.z;
        let inv_dx = if dx.abs() > 1e-9 { 1.0 / dx } else { f32::INFINITY };
        let inv_dz = if dz.abs() > 1e-9 { 1.0 / dz } else { f32::INFINITY };

        let t1x = (self.center.x - self.half_extents.x - from.x) * inv_dx;
        let t2x = (self.center.x + self.half_extents.x - from.x) * inv_dx;
        let t1z = (self.center.z - self.half_extents.z - from.z) * inv_dz;
        let t2z = (self.center.z + self.half_extents.z - from.z) * inv_dz;

        let tmin = t1x.min(t2x).max(t1z.min(t2z));
        let tmax = t1x.max(t2x).min(t1z.max(t2z));

        // Intersection interval must overlap the segment itself (t in [0, 1])
        tmax >= 0.0 && tmin <= tmax && tmin <= 1.0
    }
}

/// Static arena geometry: ground, boundary walls and obstacles
#[derive(Debug)]
pub struct Arena {
    pub config: ArenaConfig,
    pub ground: RigidBodyBinding,
    pub walls: Vec<Obstacle>,
    pub obstacles: Vec<Obstacle>,
}

impl Arena {
    /// Builds the ground and walls, then places the configured number of obstacles.
    pub fn build<R: Rng + ?Sized>(
        config: ArenaConfig,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        rng: &mut R,
    ) -> Result<Self, SetupError> {
        validate(&config)?;
        let half = config.half_extent();
        let thickness = config.wall_thickness;

        let ground_half = Vec3::new(half + thickness, 0.5, half + thickness);
        let ground = add_static_box(
            physics,
            scene,
            Vec3::new(0.0, -0.5, 0.0),
            ground_half,
            DARKGREEN,
        );

        let wall_y = config.wall_height / 2.0;
        let offset = half + thickness / 2.0;
        let along_x = Vec3::new(half + thickness, wall_y, thickness / 2.0);
        let along_z = Vec3::new(thickness / 2.0, wall_y, half + thickness);
        let walls = [
            (Vec3::new(0.0, wall_y, offset), along_x),
            (Vec3::new(0.0, wall_y, -offset), along_x),
            (Vec3::new(offset, wall_y, 0.0), along_z),
            (Vec3::new(-offset, wall_y, 0.0), along_z),
        ]
        .into_iter()
        .map(|(center, half_extents)| Obstacle {
            center,
            half_extents,
            binding: add_static_box(physics, scene, center, half_extents, GRAY),
        })
        .collect();

        let mut arena = Arena {
            config,
            ground,
            walls,
            obstacles: Vec::new(),
        };
        arena.place_obstacles(physics, scene, rng)?;
        Ok(arena)
    }

    pub fn half_extent(&self) -> f32 {
        self.config.half_extent()
    }

    // Places obstacles randomly, away from the origin and from each other
    fn place_obstacles<R: Rng + ?Sized>(
        &mut self,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        rng: &mut R,
    ) -> Result<(), SetupError> {
        let count = self.config.obstacle_count;
        log::info!("Placing {} obstacles...", count);
        let half = self.half_extent();

        for _ in 0..count {
            let half_extents = Vec3::new(
                rng.gen_range(OBSTACLE_MIN_SIZE..=OBSTACLE_MAX_SIZE) / 2.0,
                rng.gen_range(OBSTACLE_MIN_HEIGHT..=OBSTACLE_MAX_HEIGHT) / 2.0,
                rng.gen_range(OBSTACLE_MIN_SIZE..=OBSTACLE_MAX_SIZE) / 2.0,
            );
            let limit_x = half - half_extents.x - SPAWN_SEPARATION;
            let limit_z = half - half_extents.z - SPAWN_SEPARATION;
            if limit_x <= 0.0 || limit_z <= 0.0 {
                return Err(SetupError::InvalidConfig(format!(
                    "arena of size {} is too small for obstacles",
                    self.config.world_size
                )));
            }

            let mut placed = None;
            for _ in 0..PLACEMENT_ATTEMPTS {
                let center = Vec3::new(
                    rng.gen_range(-limit_x..=limit_x),
                    half_extents.y,
                    rng.gen_range(-limit_z..=limit_z),
                );
                let clear_of_origin = Vec3::new(center.x, 0.0, center.z).length()
                    >= self.config.min_obstacle_distance;
                let clear_of_others = !self.obstacles.iter().any(|other| {
                    (center.x - other.center.x).abs()
                        < half_extents.x + other.half_extents.x + SPAWN_SEPARATION
                        && (center.z - other.center.z).abs()
                            < half_extents.z + other.half_extents.z + SPAWN_SEPARATION
                });
                if clear_of_origin && clear_of_others {
                    placed = Some(center);
                    break;
                }
            }

            let center = placed.ok_or(SetupError::PlacementExhausted {
                what: "obstacle",
                attempts: PLACEMENT_ATTEMPTS,
            })?;
            let binding = add_static_box(physics, scene, center, half_extents, BROWN);
            self.obstacles.push(Obstacle {
                center,
                half_extents,
                binding,
            });
        }
        log::info!("Obstacles placed.");
        Ok(())
    }

    /// Picks `count` enemy spawn points that keep their distance from the
    /// origin, the obstacles and each other.
    pub fn enemy_spawn_points<R: Rng + ?Sized>(
        &self,
        count: usize,
        rng: &mut R,
    ) -> Result<Vec<Vec3>, SetupError> {
        let footprint = TANK_HALF_EXTENTS[2];
        let limit = self.half_extent() - footprint - SPAWN_SEPARATION;
        let mut points: Vec<Vec3> = Vec::with_capacity(count);

        for _ in 0..count {
            let mut placed = None;
            for _ in 0..PLACEMENT_ATTEMPTS {
                let candidate = Vec3::new(
                    rng.gen_range(-limit..=limit),
                    TANK_SPAWN_HEIGHT,
                    rng.gen_range(-limit..=limit),
                );
                let far_enough = Vec3::new(candidate.x, 0.0, candidate.z).length()
                    >= self.config.min_enemy_distance;
                let apart = points
                    .iter()
                    .all(|p| p.distance(candidate) >= 2.0 * footprint + SPAWN_SEPARATION);
                if far_enough && apart && !self.is_blocked(candidate, footprint + 1.0) {
                    placed = Some(candidate);
                    break;
                }
            }
            points.push(placed.ok_or(SetupError::PlacementExhausted {
                what: "enemy tank",
                attempts: PLACEMENT_ATTEMPTS,
            })?);
        }
        Ok(points)
    }

    /// Checks if a circle on the ground plane overlaps any obstacle
    pub fn is_blocked(&self, point: Vec3, radius: f32) -> bool {
        self.obstacles
            .iter()
            .any(|obstacle| obstacle.overlaps_circle(point, radius))
    }

    /// True when no obstacle interrupts the ground-plane segment between the points
    pub fn line_of_sight(&self, from: Vec3, to: Vec3) -> bool {
        !self
            .obstacles
            .iter()
            .any(|obstacle| obstacle.intersects_segment(from, to))
    }

    /// Pulls a point back inside the walls, leaving `margin` clearance
    pub fn clamp_inside(&self, point: Vec3, margin: f32) -> Vec3 {
        let limit = (self.half_extent() - margin).max(0.0);
        Vec3::new(
            point.x.clamp(-limit, limit),
            point.y,
            point.z.clamp(-limit, limit),
        )
    }
}

/// Rejects configurations no arena can be built from
pub fn validate(config: &ArenaConfig) -> Result<(), SetupError> {
    if !(config.world_size > 0.0) {
        return Err(SetupError::InvalidConfig(format!(
            "world size must be positive, got {}",
            config.world_size
        )));
    }
    if config.wall_height <= 0.0 || config.wall_thickness <= 0.0 {
        return Err(SetupError::InvalidConfig(
            "walls need a positive height and thickness".to_string(),
        ));
    }
    if config.min_obstacle_distance < 0.0 || config.min_enemy_distance < 0.0 {
        return Err(SetupError::InvalidConfig(
            "spawn distances cannot be negative".to_string(),
        ));
    }
    if config.enemy_count == 0 {
        return Err(SetupError::InvalidConfig(
            "a match needs at least one enemy".to_string(),
        ));
    }
    if config.min_enemy_distance >= config.half_extent() {
        return Err(SetupError::InvalidConfig(format!(
            "minimum enemy distance {} does not fit in an arena of size {}",
            config.min_enemy_distance, config.world_size
        )));
    }
    Ok(())
}

fn add_static_box(
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    center: Vec3,
    half_extents: Vec3,
    color: Color,
) -> RigidBodyBinding {
    let node = scene.attach(
        NodeShape::Cuboid { half_extents },
        color,
        Transform::from_translation(center),
    );
    physics.create_static_box(center, half_extents, GROUND_FRICTION, node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(config: ArenaConfig) -> (Result<Arena, SetupError>, PhysicsWorld, SceneGraph) {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let mut rng = StdRng::seed_from_u64(7);
        let arena = Arena::build(config, &mut physics, &mut scene, &mut rng);
        (arena, physics, scene)
    }

    fn lone_box(center: Vec3, half_extents: Vec3) -> Obstacle {
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        Obstacle {
            center,
            half_extents,
            binding: add_static_box(&mut physics, &mut scene, center, half_extents, BROWN),
        }
    }

    #[test]
    fn test_build_creates_ground_walls_and_obstacles() {
        let (arena, physics, scene) = build(ArenaConfig::default());
        let arena = arena.expect("default arena should build");
        assert_eq!(arena.walls.len(), 4);
        assert_eq!(arena.obstacles.len(), OBSTACLE_COUNT);
        // ground + walls + obstacles, each with a body and a node
        assert_eq!(physics.body_count(), 1 + 4 + OBSTACLE_COUNT);
        assert_eq!(scene.len(), 1 + 4 + OBSTACLE_COUNT);
        assert!(arena.ground.is_valid(&physics));
    }

    #[test]
    fn test_obstacles_respect_spawn_constraints() {
        let (arena, _physics, _scene) = build(ArenaConfig::default());
        let arena = arena.expect("default arena should build");
        let half = arena.half_extent();
        for (i, obstacle) in arena.obstacles.iter().enumerate() {
            let flat = Vec3::new(obstacle.center.x, 0.0, obstacle.center.z);
            assert!(flat.length() >= MIN_OBSTACLE_DISTANCE);
            assert!(obstacle.center.x.abs() + obstacle.half_extents.x <= half);
            assert!(obstacle.center.z.abs() + obstacle.half_extents.z <= half);
            for other in &arena.obstacles[i + 1..] {
                assert!(
                    !obstacle.overlaps_circle(other.center, 0.0),
                    "obstacles should not overlap"
                );
            }
        }
    }

    #[test]
    fn test_enemy_spawn_points_respect_constraints() {
        let (arena, _physics, _scene) = build(ArenaConfig::default());
        let arena = arena.expect("default arena should build");
        let mut rng = StdRng::seed_from_u64(11);
        let points = arena
            .enemy_spawn_points(8, &mut rng)
            .expect("enemies should fit");
        assert_eq!(points.len(), 8);
        for (i, p) in points.iter().enumerate() {
            assert!(Vec3::new(p.x, 0.0, p.z).length() >= MIN_ENEMY_DISTANCE);
            assert!(!arena.is_blocked(*p, TANK_HALF_EXTENTS[2]));
            assert!(p.x.abs() <= arena.half_extent() && p.z.abs() <= arena.half_extent());
            for q in &points[i + 1..] {
                assert!(p.distance(*q) >= 2.0 * TANK_HALF_EXTENTS[2]);
            }
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = ArenaConfig {
            world_size: 150.0,
            min_enemy_distance: 100.0,
            ..ArenaConfig::default()
        };
        let (arena, _physics, _scene) = build(config);
        assert!(matches!(arena, Err(SetupError::InvalidConfig(_))));

        let config = ArenaConfig {
            world_size: -1.0,
            ..ArenaConfig::default()
        };
        let (arena, _physics, _scene) = build(config);
        assert!(matches!(arena, Err(SetupError::InvalidConfig(_))));

        let config = ArenaConfig {
            enemy_count: 0,
            ..ArenaConfig::default()
        };
        let (arena, _physics, _scene) = build(config);
        assert!(matches!(arena, Err(SetupError::InvalidConfig(_))));
    }

    #[test]
    fn test_crowded_arena_exhausts_placement() {
        let config = ArenaConfig {
            world_size: 80.0,
            obstacle_count: 200,
            min_obstacle_distance: 5.0,
            enemy_count: 1,
            min_enemy_distance: 20.0,
            ..ArenaConfig::default()
        };
        let (arena, _physics, _scene) = build(config);
        assert!(matches!(
            arena,
            Err(SetupError::PlacementExhausted {
                what: "obstacle",
                ..
            })
        ));
    }

    #[test]
    fn test_segment_against_box() {
        let obstacle = lone_box(Vec3::new(10.0, 2.0, 0.0), Vec3::new(2.0, 2.0, 2.0));
        // Straight through
        assert!(obstacle.intersects_segment(Vec3::ZERO, Vec3::new(20.0, 0.0, 0.0)));
        // Stops short of the box
        assert!(!obstacle.intersects_segment(Vec3::ZERO, Vec3::new(7.0, 0.0, 0.0)));
        // Passes beside it
        assert!(!obstacle.intersects_segment(Vec3::new(0.0, 0.0, 5.0), Vec3::new(20.0, 0.0, 5.0)));
        // Box is behind the start
        assert!(!obstacle.intersects_segment(Vec3::new(15.0, 0.0, 0.0), Vec3::new(30.0, 0.0, 0.0)));
        // Axis-parallel segment along Z
        assert!(obstacle.intersects_segment(
            Vec3::new(10.0, 0.0, -10.0),
            Vec3::new(10.0, 0.0, 10.0)
        ));
    }

    #[test]
    fn test_line_of_sight_and_clamp() {
        let config = ArenaConfig {
            obstacle_count: 0,
            ..ArenaConfig::default()
        };
        let (arena, mut physics, mut scene) = build(config);
        let mut arena = arena.expect("empty arena should build");
        let from = Vec3::new(-50.0, 0.8, 0.0);
        let to = Vec3::new(50.0, 0.8, 0.0);
        assert!(arena.line_of_sight(from, to));

        let center = Vec3::new(0.0, 3.0, 0.0);
        let half_extents = Vec3::new(3.0, 3.0, 3.0);
        let binding = add_static_box(&mut physics, &mut scene, center, half_extents, BROWN);
        arena.obstacles.push(Obstacle {
            center,
            half_extents,
            binding,
        });
        assert!(!arena.line_of_sight(from, to));
        assert!(arena.line_of_sight(from, Vec3::new(-50.0, 0.8, 40.0)));

        let clamped = arena.clamp_inside(Vec3::new(900.0, 1.0, -900.0), 10.0);
        assert_eq!(clamped, Vec3::new(240.0, 1.0, -240.0));
    }
}
