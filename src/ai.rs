//! Enemy tank brain.
//!
//! Decisions (what to chase, whether to shoot) are taken on a fixed cadence of
//! simulation time; steering toward the current goal runs every frame.

use crate::arena::Arena;
use crate::config::*;
use crate::controller::{Controller, Perception, TankCommand};
use crate::tank::Tank;
use crate::types::TankId;
use crate::utils::{flatten, planar_angle_between, planar_distance, turn_sign};
use macroquad::math::Vec3;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::PI;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AiState {
    /// Wandering between random points
    Patrol,
    /// Player in sight, closing in on the live position
    Engage,
    /// Player lost, heading for where it was last seen
    Search,
}

pub struct AiController {
    id: TankId,
    state: AiState,
    rng: StdRng,
    patrol_target: Option<Vec3>,
    patrol_started: f64,
    last_known: Option<Vec3>,
    last_decision: Option<f64>,
}

impl AiController {
    pub fn new(id: TankId, seed: u64) -> Self {
        AiController {
            id,
            state: AiState::Patrol,
            rng: StdRng::seed_from_u64(seed),
            patrol_target: None,
            patrol_started: 0.0,
            last_known: None,
            last_decision: None,
        }
    }

    pub fn state(&self) -> AiState {
        self.state
    }

    pub fn patrol_target(&self) -> Option<Vec3> {
        self.patrol_target
    }

    pub fn last_known(&self) -> Option<Vec3> {
        self.last_known
    }

    fn decision_due(&self, now: f64) -> bool {
        match self.last_decision {
            Some(at) => now - at >= AI_DECISION_INTERVAL,
            None => true,
        }
    }

    /// Player counts as seen when in range, in the forward half-plane and not
    /// hidden behind an obstacle.
    pub fn can_see(position: Vec3, forward: Vec3, player: Vec3, arena: &Arena) -> bool {
        if planar_distance(position, player) > AI_DETECTION_RANGE {
            return false;
        }
        if forward.dot(flatten(player - position)) <= 0.0 {
            return false;
        }
        arena.line_of_sight(position, player)
    }

    // Re-evaluates state. Returns whether to fire this tick.
    fn decide(
        &mut self,
        position: Vec3,
        forward: Vec3,
        player: Vec3,
        perception: &Perception<'_>,
    ) -> bool {
        let visible = Self::can_see(position, forward, player, perception.arena);
        let previous = self.state;

        if visible {
            self.state = AiState::Engage;
            self.last_known = Some(player);
        } else if self.last_known.is_some() {
            self.state = AiState::Search;
        } else {
            self.state = AiState::Patrol;
        }
        if self.state != previous {
            crate::debug_ai!(self.id, "{:?} -> {:?}", previous, self.state);
        }

        let distance = planar_distance(position, player);
        let off_axis = planar_angle_between(forward, flatten(player - position));
        let fire = visible && distance <= AI_FIRING_RANGE && off_axis < AI_FIRE_ANGLE;
        if fire {
            crate::debug_ai!(
                self.id,
                "Firing at {:.1} units, {:.3} rad off axis",
                distance,
                off_axis
            );
        }
        fire
    }

    fn new_patrol_target(&mut self, position: Vec3, now: f64, arena: &Arena) -> Vec3 {
        let footprint = TANK_HALF_EXTENTS[2];
        let mut target = position;
        for _ in 0..PLACEMENT_ATTEMPTS {
            let angle = self.rng.gen_range(-PI..PI);
            let radius = self.rng.gen_range(AI_MIN_PATROL_DISTANCE..=AI_PATROL_RADIUS);
            let candidate = arena.clamp_inside(
                position + Vec3::new(angle.sin() * radius, 0.0, angle.cos() * radius),
                SPAWN_SEPARATION,
            );
            target = candidate;
            if !arena.is_blocked(candidate, footprint) {
                break;
            }
        }
        self.patrol_target = Some(target);
        self.patrol_started = now;
        crate::debug_ai!(self.id, "New patrol point {:?}", target);
        target
    }

    // Picks the point to drive toward this frame and how close to get
    fn navigation_goal(
        &mut self,
        position: Vec3,
        player: Vec3,
        perception: &Perception<'_>,
    ) -> (Vec3, f32) {
        let now = perception.now;
        match self.state {
            AiState::Engage => (player, AI_ENGAGE_DISTANCE),
            AiState::Search => match self.last_known {
                Some(spot) if planar_distance(position, spot) >= AI_ARRIVAL_THRESHOLD => {
                    (spot, AI_ARRIVAL_THRESHOLD)
                }
                _ => {
                    crate::debug_ai!(self.id, "Lost the player, back to patrol");
                    self.state = AiState::Patrol;
                    self.last_known = None;
                    let target = self.new_patrol_target(position, now, perception.arena);
                    (target, AI_ARRIVAL_THRESHOLD)
                }
            },
            AiState::Patrol => {
                let target = match self.patrol_target {
                    Some(target)
                        if planar_distance(position, target) >= AI_ARRIVAL_THRESHOLD
                            && now - self.patrol_started < AI_PATROL_TIMEOUT =>
                    {
                        target
                    }
                    _ => self.new_patrol_target(position, now, perception.arena),
                };
                (target, AI_ARRIVAL_THRESHOLD)
            }
        }
    }

    /// Rotate first; drive forward only once roughly facing the goal.
    pub fn steer(position: Vec3, forward: Vec3, goal: Vec3, stop_distance: f32) -> TankCommand {
        let to_goal = flatten(goal - position);
        let error = planar_angle_between(forward, to_goal);
        if error > AI_ALIGN_THRESHOLD {
            return TankCommand {
                turn: turn_sign(forward, to_goal),
                ..TankCommand::idle()
            };
        }
        if planar_distance(position, goal) > stop_distance {
            TankCommand {
                drive: 1.0,
                ..TankCommand::idle()
            }
        } else {
            TankCommand::idle()
        }
    }
}

impl Controller for AiController {
    fn command(&mut self, tank: &Tank, perception: &Perception<'_>) -> TankCommand {
        let Some(player) = perception.player_position else {
            return TankCommand::idle();
        };
        let pose = tank
            .position(perception.physics)
            .and_then(|position| {
                tank.forward(perception.physics)
                    .map(|forward| (position, forward))
            });
        let (position, forward) = match pose {
            Ok(pose) => pose,
            Err(err) => {
                crate::debug_ai!(self.id, "No body to drive: {}", err);
                return TankCommand::idle();
            }
        };

        let mut fire = false;
        if self.decision_due(perception.now) {
            self.last_decision = Some(perception.now);
            fire = self.decide(position, forward, player, perception);
        }

        let (goal, stop_distance) = self.navigation_goal(position, player, perception);
        TankCommand {
            fire,
            ..Self::steer(position, forward, goal, stop_distance)
        }
    }
}
