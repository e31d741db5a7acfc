use crate::types::CombatEvent;
use log::warn;
use macroquad::audio::{Sound, load_sound, play_sound_once};

/// Combat sound effects. Missing files only cost the sound, never the game.
#[derive(Default)]
pub struct AudioManager {
    fire_sound: Option<Sound>,
    hit_sound: Option<Sound>,
    death_sound: Option<Sound>,
}

async fn load(label: &str, path: &str) -> Option<Sound> {
    load_sound(path)
        .await
        .map_err(|e| warn!("Failed to load {} sound '{}': {}", label, path, e))
        .ok()
}

impl AudioManager {
    pub fn new() -> Self {
        Default::default()
    }

    pub async fn load_assets(&mut self) {
        self.fire_sound = load("fire", "assets/cannon.ogg").await;
        self.hit_sound = load("hit", "assets/impact.ogg").await;
        self.death_sound = load("death", "assets/explosion.ogg").await;
    }

    fn play(sound: &Option<Sound>) {
        if let Some(sound) = sound {
            play_sound_once(sound);
        }
    }

    /// Plays the sound matching a combat event, if it loaded
    pub fn react(&self, event: &CombatEvent) {
        match event {
            CombatEvent::Fired { .. } => Self::play(&self.fire_sound),
            CombatEvent::Hit { .. } => Self::play(&self.hit_sound),
            CombatEvent::Destroyed { .. } => Self::play(&self.death_sound),
            CombatEvent::OutOfBounds { .. } => {}
        }
    }
}
