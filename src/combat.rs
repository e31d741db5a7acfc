use crate::ai::AiController;
use crate::config::*;
use crate::hud::HudListener;
use crate::physics::PhysicsWorld;
use crate::projectile::ProjectileStore;
use crate::scene::SceneGraph;
use crate::tank::Tank;
use crate::types::{CombatEvent, ProjectileId, ProjectileSource, TankId};
use macroquad::math::Vec3;

/// An enemy tank and the brain driving it
pub struct Enemy {
    pub tank: Tank,
    pub ai: AiController,
}

/// Everything that changes while a match is played
pub struct GameState {
    pub player: Option<Tank>,
    pub enemies: Vec<Enemy>,
    pub projectiles: ProjectileStore,
    pub score: u32,
    pub game_over: bool,
}

impl GameState {
    pub fn new(player: Option<Tank>, enemies: Vec<Enemy>) -> Self {
        GameState {
            player,
            enemies,
            projectiles: ProjectileStore::new(),
            score: 0,
            game_over: false,
        }
    }

    pub fn player_position(&self, physics: &PhysicsWorld) -> Option<Vec3> {
        self.player
            .as_ref()
            .and_then(|player| player.position(physics).ok())
    }

    pub fn enemy(&self, id: TankId) -> Option<&Enemy> {
        self.enemies.iter().find(|enemy| enemy.tank.id == id)
    }

    /// Takes an enemy out of the match along with its body and node. Its AI
    /// goes with it. Returns `None` if it was already removed.
    pub fn remove_enemy(
        &mut self,
        id: TankId,
        physics: &mut PhysicsWorld,
        scene: &mut SceneGraph,
    ) -> Option<Enemy> {
        let index = self.enemies.iter().position(|enemy| enemy.tank.id == id)?;
        let enemy = self.enemies.remove(index);
        enemy.tank.despawn(physics, scene);
        crate::debug_combat!("Removed enemy {}", id);
        Some(enemy)
    }

    /// Ends the match. Only the first call has any effect.
    pub fn end(&mut self, hud: &mut dyn HudListener) {
        if !self.game_over {
            self.game_over = true;
            hud.game_over(self.score);
        }
    }

    /// Releases every remaining body and node
    pub fn clear(&mut self, physics: &mut PhysicsWorld, scene: &mut SceneGraph) {
        self.projectiles.clear(physics, scene);
        for enemy in self.enemies.drain(..) {
            enemy.tank.despawn(physics, scene);
        }
        if let Some(player) = self.player.take() {
            player.despawn(physics, scene);
        }
    }
}

// First tank of the opposing side within reach of `position`
fn find_target(
    state: &GameState,
    source: ProjectileSource,
    position: Vec3,
    physics: &PhysicsWorld,
) -> Option<TankId> {
    let in_reach = |tank: &Tank| {
        tank.position(physics)
            .map(|at| at.distance(position) < COLLISION_DISTANCE)
            .unwrap_or(false)
    };
    match source {
        ProjectileSource::Player => state
            .enemies
            .iter()
            .map(|enemy| &enemy.tank)
            .find(|tank| in_reach(tank))
            .map(|tank| tank.id),
        ProjectileSource::Enemy => state
            .player
            .as_ref()
            .filter(|player| in_reach(player))
            .map(|player| player.id),
    }
}

/// Checks every live projectile against the opposing side after the physics
/// step. At most one tank is hit per projectile per pass.
pub fn resolve_collisions(
    state: &mut GameState,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    hud: &mut dyn HudListener,
) -> Vec<CombatEvent> {
    let mut events = Vec::new();

    for id in state.projectiles.ids() {
        let Some(projectile) = state.projectiles.get(id) else {
            continue;
        };
        let (source, damage, binding) = (projectile.source, projectile.damage, projectile.binding);

        let position = match physics.body(&binding) {
            Ok(body) => body.position(),
            Err(err) => {
                crate::debug_combat!("Dropping {}: {}", id, err);
                state.projectiles.remove(id, physics, scene);
                continue;
            }
        };

        if position.length() > OUT_OF_BOUNDS_DISTANCE {
            crate::debug_combat!("{} left the arena at {:?}", id, position);
            state.projectiles.remove(id, physics, scene);
            events.push(CombatEvent::OutOfBounds { projectile: id });
            continue;
        }

        let Some(target) = find_target(state, source, position, physics) else {
            continue;
        };
        state.projectiles.remove(id, physics, scene);
        apply_hit(state, target, id, damage, position, physics, scene, hud, &mut events);
    }
    events
}

#[allow(clippy::too_many_arguments)]
fn apply_hit(
    state: &mut GameState,
    target: TankId,
    projectile: ProjectileId,
    damage: f32,
    position: Vec3,
    physics: &mut PhysicsWorld,
    scene: &mut SceneGraph,
    hud: &mut dyn HudListener,
    events: &mut Vec<CombatEvent>,
) {
    let tank = if target.is_player() {
        state.player.as_mut()
    } else {
        state
            .enemies
            .iter_mut()
            .find(|enemy| enemy.tank.id == target)
            .map(|enemy| &mut enemy.tank)
    };
    let Some(tank) = tank else {
        return;
    };

    let alive = tank.take_damage(damage);
    let remaining_hp = tank.hp();
    let max_hp = tank.spec.max_hp;
    let tank_position = tank.position(physics).unwrap_or(position);
    crate::debug_combat!("{} hit {} for {}, {} hp left", projectile, target, damage, remaining_hp);
    events.push(CombatEvent::Hit {
        target,
        position,
        remaining_hp,
    });
    if target.is_player() {
        hud.health_changed(remaining_hp.max(0.0), max_hp);
    }
    if alive {
        return;
    }

    events.push(CombatEvent::Destroyed {
        target,
        position: tank_position,
    });
    if target.is_player() {
        log::info!("Player destroyed");
        if let Some(player) = state.player.take() {
            player.despawn(physics, scene);
        }
        state.end(hud);
    } else if state.remove_enemy(target, physics, scene).is_some() {
        state.score += KILL_REWARD;
        log::info!("Enemy {} destroyed, score {}", target, state.score);
        hud.score_changed(state.score);
    }
}
