use macroquad::math::Vec3;
use std::fmt;

/// Identifies a tank for the lifetime of a match. The player is always [`TankId::PLAYER`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TankId(pub u32);

impl TankId {
    pub const PLAYER: TankId = TankId(0);

    pub fn is_player(self) -> bool {
        self == TankId::PLAYER
    }
}

impl fmt::Display for TankId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{:02}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProjectileId(pub u64);

impl fmt::Display for ProjectileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Which side fired a projectile. Player shots only damage enemies and enemy
/// shots only damage the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProjectileSource {
    Player,
    Enemy,
}

impl ProjectileSource {
    pub fn for_tank(id: TankId) -> Self {
        if id.is_player() {
            ProjectileSource::Player
        } else {
            ProjectileSource::Enemy
        }
    }
}

/// Things that happened during a frame that effects, audio and the HUD react to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CombatEvent {
    Fired {
        shooter: TankId,
        position: Vec3,
        direction: Vec3,
    },
    Hit {
        target: TankId,
        position: Vec3,
        remaining_hp: f32,
    },
    Destroyed {
        target: TankId,
        position: Vec3,
    },
    OutOfBounds {
        projectile: ProjectileId,
    },
}
