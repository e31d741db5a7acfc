//! One match: the world, the tanks and the per-frame update order.

use crate::ai::AiController;
use crate::arena::Arena;
use crate::combat::{resolve_collisions, Enemy, GameState};
use crate::config::*;
use crate::controller::{Controller, InputState, Perception, PlayerController, TankCommand};
use crate::error::SetupError;
use crate::hud::Hud;
use crate::marquee::CameraPose;
use crate::particles::ParticleSystem;
use crate::physics::PhysicsWorld;
use crate::scene::SceneGraph;
use crate::tank::{Tank, TankKind};
use crate::types::{CombatEvent, TankId};
use crate::utils::{heading, heading_vector};
use macroquad::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const FLY_TURN_SPEED: f32 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraMode {
    Chase,
    Fly,
}

pub struct PlaySession {
    pub physics: PhysicsWorld,
    pub scene: SceneGraph,
    pub arena: Arena,
    pub state: GameState,
    pub hud: Hud,
    pub particles: ParticleSystem,
    pub wireframe: bool,
    player_controller: PlayerController,
    clock: f64,
    camera_mode: CameraMode,
    chase_pose: CameraPose,
    fly_position: Vec3,
    fly_yaw: f32,
}

impl PlaySession {
    /// Builds the arena, the player at the origin and the enemies around it.
    pub fn new(config: &ArenaConfig) -> Result<Self, SetupError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let mut physics = PhysicsWorld::default();
        let mut scene = SceneGraph::new();
        let arena = Arena::build(config.clone(), &mut physics, &mut scene, &mut rng)?;

        let spawns = arena.enemy_spawn_points(config.enemy_count, &mut rng)?;
        let player = Tank::spawn(
            TankId::PLAYER,
            TankKind::Player,
            Vec3::new(0.0, TANK_SPAWN_HEIGHT, 0.0),
            0.0,
            &mut physics,
            &mut scene,
        );
        let enemies = spawns
            .into_iter()
            .enumerate()
            .map(|(i, at)| {
                let id = TankId(i as u32 + 1);
                // Start facing the middle of the arena
                let yaw = heading(-at);
                Enemy {
                    tank: Tank::spawn(id, TankKind::Enemy, at, yaw, &mut physics, &mut scene),
                    ai: AiController::new(id, rng.r#gen()),
                }
            })
            .collect::<Vec<_>>();
        log::info!(
            "Match ready: {} enemies, {} obstacles, arena size {}",
            enemies.len(),
            arena.obstacles.len(),
            config.world_size
        );

        let chase_pose = chase_camera(Vec3::new(0.0, TANK_SPAWN_HEIGHT, 0.0), Vec3::Z);
        Ok(PlaySession {
            physics,
            scene,
            arena,
            state: GameState::new(Some(player), enemies),
            hud: Hud::new(PLAYER_MAX_HP),
            particles: ParticleSystem::new(),
            wireframe: false,
            player_controller: PlayerController::new(),
            clock: 0.0,
            camera_mode: CameraMode::Chase,
            chase_pose,
            fly_position: chase_pose.position,
            fly_yaw: 0.0,
        })
    }

    /// Simulation time in seconds since the match started
    pub fn clock(&self) -> f64 {
        self.clock
    }

    pub fn camera_mode(&self) -> CameraMode {
        self.camera_mode
    }

    pub fn is_over(&self) -> bool {
        self.state.game_over
    }

    /// True once every enemy is gone and the player still stands
    pub fn is_won(&self) -> bool {
        self.state.enemies.is_empty() && self.state.player.is_some()
    }

    /// Advances the match by one frame and returns what happened in it.
    pub fn update(&mut self, dt: f32, input: &InputState) -> Vec<CombatEvent> {
        if input.fly_camera_toggle {
            self.camera_mode = match self.camera_mode {
                CameraMode::Chase => {
                    self.fly_position = self.chase_pose.position;
                    self.fly_yaw = heading(self.chase_pose.look_at - self.chase_pose.position);
                    CameraMode::Fly
                }
                CameraMode::Fly => CameraMode::Chase,
            };
            crate::debug_state!("Camera mode {:?}", self.camera_mode);
        }
        if input.wireframe_toggle {
            self.wireframe = !self.wireframe;
        }
        self.particles.update(dt);
        if self.camera_mode == CameraMode::Fly {
            self.fly(dt, input);
        }

        // A finished match keeps rendering but no longer simulates
        if self.state.game_over {
            return Vec::new();
        }
        self.clock += dt as f64;
        let now = self.clock;

        self.state.projectiles.expire(now, &mut self.physics, &mut self.scene);

        let report = self.physics.step(dt, &mut self.scene);
        if !report.pruned.is_empty() {
            crate::debug_physics!("Pruned {} stale bindings", report.pruned.len());
        }

        self.player_controller.input = match self.camera_mode {
            CameraMode::Chase => *input,
            CameraMode::Fly => InputState::default(),
        };
        let mut events = self.issue_commands(dt, now);

        events.extend(resolve_collisions(
            &mut self.state,
            &mut self.physics,
            &mut self.scene,
            &mut self.hud,
        ));
        if self.is_won() {
            log::info!("All enemies destroyed");
            self.state.end(&mut self.hud);
        }

        if let Some(player) = &self.state.player {
            let pose = (player.position(&self.physics), player.forward(&self.physics));
            if let (Ok(position), Ok(forward)) = pose {
                self.chase_pose = chase_camera(position, forward);
            }
        }
        for event in &events {
            self.particles.react(event);
        }
        events
    }

    // Player and AI decide against the post-step world, then act for the next step
    fn issue_commands(&mut self, dt: f32, now: f64) -> Vec<CombatEvent> {
        let perception = Perception {
            physics: &self.physics,
            arena: &self.arena,
            player_position: self.state.player_position(&self.physics),
            now,
        };
        let player_command = self
            .state
            .player
            .as_ref()
            .map(|player| self.player_controller.command(player, &perception));
        let enemy_commands: Vec<TankCommand> = self
            .state
            .enemies
            .iter_mut()
            .map(|Enemy { tank, ai }| ai.command(tank, &perception))
            .collect();

        let mut events = Vec::new();
        let tanks = self
            .state
            .player
            .iter_mut()
            .zip(player_command)
            .chain(
                self.state
                    .enemies
                    .iter_mut()
                    .map(|enemy| &mut enemy.tank)
                    .zip(enemy_commands),
            );
        for (tank, command) in tanks {
            let fired = command.apply(
                tank,
                dt,
                now,
                &mut self.physics,
                &mut self.scene,
                &mut self.state.projectiles,
            );
            let Some(id) = fired else {
                continue;
            };
            let launched = self
                .state
                .projectiles
                .get(id)
                .and_then(|p| self.physics.body(&p.binding).ok())
                .map(|body| (body.position(), body.velocity().normalize_or_zero()));
            if let Some((position, direction)) = launched {
                events.push(CombatEvent::Fired {
                    shooter: tank.id,
                    position,
                    direction,
                });
            }
        }
        events
    }

    fn fly(&mut self, dt: f32, input: &InputState) {
        let turn = match (input.left, input.right) {
            (true, false) => 1.0,
            (false, true) => -1.0,
            _ => 0.0,
        };
        self.fly_yaw += turn * FLY_TURN_SPEED * dt;
        let forward = heading_vector(self.fly_yaw);
        let mut motion = Vec3::ZERO;
        if input.forward {
            motion += forward;
        }
        if input.backward {
            motion -= forward;
        }
        if input.turret_left {
            motion += Vec3::Y;
        }
        if input.turret_right {
            motion -= Vec3::Y;
        }
        self.fly_position += motion * FLY_CAMERA_SPEED * dt;
        self.fly_position.y = self.fly_position.y.max(1.0);
    }

    pub fn camera(&self) -> CameraPose {
        match self.camera_mode {
            CameraMode::Chase => self.chase_pose,
            CameraMode::Fly => CameraPose {
                position: self.fly_position,
                look_at: self.fly_position + heading_vector(self.fly_yaw) - Vec3::Y * 0.3,
            },
        }
    }

    /// Stops every tank and releases the world's bodies
    pub fn on_exit(&mut self) {
        self.state.clear(&mut self.physics, &mut self.scene);
        self.hud.visible = false;
        log::info!("Match closed with score {}", self.state.score);
    }
}

fn chase_camera(position: Vec3, forward: Vec3) -> CameraPose {
    CameraPose {
        position: position - forward * CHASE_CAMERA_DISTANCE + Vec3::Y * CHASE_CAMERA_HEIGHT,
        look_at: position + forward * 5.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_approx_eq::assert_approx_eq;

    fn config() -> ArenaConfig {
        ArenaConfig {
            seed: Some(42),
            ..ArenaConfig::default()
        }
    }

    #[test]
    fn test_new_session_spawns_everything() {
        let session = PlaySession::new(&config()).expect("session");
        assert!(session.state.player.is_some());
        assert_eq!(session.state.enemies.len(), ENEMY_COUNT);
        assert_eq!(session.arena.obstacles.len(), OBSTACLE_COUNT);
        assert_eq!(session.clock(), 0.0);
        assert_eq!(session.camera_mode(), CameraMode::Chase);
    }

    #[test]
    fn test_bad_config_fails_setup() {
        let bad = ArenaConfig {
            world_size: 0.0,
            ..config()
        };
        assert!(matches!(
            PlaySession::new(&bad),
            Err(SetupError::InvalidConfig(_))
        ));

        // A match with nobody to fight would be won on its first frame
        let empty = ArenaConfig {
            enemy_count: 0,
            ..config()
        };
        assert!(matches!(
            PlaySession::new(&empty),
            Err(SetupError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_update_keeps_scene_in_sync() {
        let mut session = PlaySession::new(&config()).expect("session");
        let input = InputState {
            forward: true,
            ..InputState::default()
        };
        for _ in 0..30 {
            session.update(1.0 / 60.0, &input);
        }
        assert_approx_eq!(session.clock(), 0.5, 1e-6);
        let player = session.state.player.as_ref().expect("player");
        let body = session.physics.body(&player.binding).expect("body");
        let node = session.scene.transform(player.binding.node).expect("node");
        assert!((node.translation - body.position()).length() < 1e-5);
        assert!(body.position().z > 0.0, "player should have driven forward");
    }

    #[test]
    fn test_fire_input_emits_event_and_projectile() {
        let mut session = PlaySession::new(&config()).expect("session");
        let input = InputState {
            fire: true,
            ..InputState::default()
        };
        let events = session.update(1.0 / 60.0, &input);
        assert!(events.iter().any(|e| matches!(
            e,
            CombatEvent::Fired { shooter, .. } if shooter.is_player()
        )));
        assert!(session
            .state
            .projectiles
            .iter()
            .any(|p| p.source == crate::types::ProjectileSource::Player));
    }

    #[test]
    fn test_projectiles_expire_on_the_clock() {
        let mut session = PlaySession::new(&config()).expect("session");
        let fire = InputState {
            fire: true,
            ..InputState::default()
        };
        session.update(1.0 / 60.0, &fire);
        let shot = session
            .state
            .projectiles
            .iter()
            .find(|p| p.source == crate::types::ProjectileSource::Player)
            .map(|p| p.id)
            .expect("player shot");

        let idle = InputState::default();
        let frames = (PROJECTILE_LIFETIME * 60.0) as usize + 5;
        for _ in 0..frames {
            session.update(1.0 / 60.0, &idle);
        }
        assert!(session.state.projectiles.get(shot).is_none());
    }

    #[test]
    fn test_game_over_freezes_simulation() {
        let mut session = PlaySession::new(&config()).expect("session");
        session.update(1.0 / 60.0, &InputState::default());
        let clock = session.clock();
        session.state.game_over = true;
        session.update(1.0 / 60.0, &InputState::default());
        assert_eq!(session.clock(), clock);
    }

    #[test]
    fn test_toggles() {
        let mut session = PlaySession::new(&config()).expect("session");
        let toggle = InputState {
            fly_camera_toggle: true,
            wireframe_toggle: true,
            ..InputState::default()
        };
        session.update(1.0 / 60.0, &toggle);
        assert_eq!(session.camera_mode(), CameraMode::Fly);
        assert!(session.wireframe);

        // Flying moves the camera, not the tank
        let start = session.camera().position;
        let forward = InputState {
            forward: true,
            ..InputState::default()
        };
        session.update(0.5, &forward);
        assert!(session.camera().position.distance(start) > 1.0);

        session.update(1.0 / 60.0, &toggle);
        assert_eq!(session.camera_mode(), CameraMode::Chase);
        assert!(!session.wireframe);
    }

    #[test]
    fn test_on_exit_releases_bodies() {
        let mut session = PlaySession::new(&config()).expect("session");
        let statics = 1 + 4 + session.arena.obstacles.len();
        session.on_exit();
        assert!(session.state.player.is_none());
        assert!(session.state.enemies.is_empty());
        assert_eq!(session.physics.body_count(), statics);
    }
}
