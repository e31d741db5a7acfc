use crate::arena::Arena;
use crate::physics::PhysicsWorld;
use crate::projectile::ProjectileStore;
use crate::scene::SceneGraph;
use crate::tank::Tank;
use crate::types::ProjectileId;
use macroquad::input::{is_key_down, is_key_pressed, is_mouse_button_pressed, KeyCode, MouseButton};
use macroquad::math::Vec3;

/// Flat per-frame snapshot of the player's intents
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
    pub fire: bool,
    pub turret_left: bool,
    pub turret_right: bool,
    pub fly_camera_toggle: bool,
    pub wireframe_toggle: bool,
    pub start: bool,
    pub back: bool,
}

impl InputState {
    /// Reads the keyboard. Toggles and mode keys fire once per press.
    pub fn poll() -> Self {
        InputState {
            forward: is_key_down(KeyCode::W) || is_key_down(KeyCode::Up),
            backward: is_key_down(KeyCode::S) || is_key_down(KeyCode::Down),
            left: is_key_down(KeyCode::A) || is_key_down(KeyCode::Left),
            right: is_key_down(KeyCode::D) || is_key_down(KeyCode::Right),
            fire: is_key_down(KeyCode::Space),
            turret_left: is_key_down(KeyCode::Q),
            turret_right: is_key_down(KeyCode::E),
            fly_camera_toggle: is_key_pressed(KeyCode::F),
            wireframe_toggle: is_key_pressed(KeyCode::V),
            start: is_key_pressed(KeyCode::Enter) || is_mouse_button_pressed(MouseButton::Left),
            back: is_key_pressed(KeyCode::Escape),
        }
    }
}

fn axis(positive: bool, negative: bool) -> f32 {
    match (positive, negative) {
        (true, false) => 1.0,
        (false, true) => -1.0,
        _ => 0.0,
    }
}

/// One frame of orders for a tank
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TankCommand {
    /// -1 reverse .. 1 forward
    pub drive: f32,
    /// Positive yaws toward +X
    pub turn: f32,
    pub turret: f32,
    pub fire: bool,
}

impl TankCommand {
    pub fn idle() -> Self {
        Self::default()
    }

    /// Carries the orders out on `tank`. Returns the id of any projectile fired.
    pub fn apply(
        self,
        tank: &mut Tank,
        dt: f32,
        now: f64,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
        projectiles: &mut ProjectileStore,
    ) -> Option<ProjectileId> {
        if let Err(err) = tank
            .turn(physics, self.turn)
            .and_then(|()| tank.move_hull(physics, self.drive, dt))
        {
            crate::debug_tank!(tank.id, "Skipping command: {}", err);
            return None;
        }
        tank.rotate_turret(scene, self.turret, dt);
        if self.fire {
            tank.fire(now, physics, scene, projectiles)
        } else {
            None
        }
    }
}

/// What a controller may look at when deciding
pub struct Perception<'a> {
    pub physics: &'a PhysicsWorld,
    pub arena: &'a Arena,
    pub player_position: Option<Vec3>,
    pub now: f64,
}

/// Source of per-frame orders for one tank
pub trait Controller {
    fn command(&mut self, tank: &Tank, perception: &Perception<'_>) -> TankCommand;
}

/// Maps the latest keyboard snapshot onto the player's tank
#[derive(Debug, Default)]
pub struct PlayerController {
    pub input: InputState,
}

impl PlayerController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Controller for PlayerController {
    fn command(&mut self, _tank: &Tank, _perception: &Perception<'_>) -> TankCommand {
        let input = self.input;
        TankCommand {
            drive: axis(input.forward, input.backward),
            turn: axis(input.left, input.right),
            turret: axis(input.turret_left, input.turret_right),
            fire: input.fire,
        }
    }
}
