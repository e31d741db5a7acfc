use crate::types::CombatEvent;
use macroquad::color::{Color, ORANGE, RED, YELLOW};
use macroquad::math::Vec3;
use macroquad::models::draw_cube;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

const PARTICLE_GRAVITY: f32 = -12.0;
const PARTICLE_SIZE: f32 = 0.25;

// Represents a single particle
#[derive(Debug, Clone)]
struct Particle {
    position: Vec3,
    velocity: Vec3,
    color: Color,
    lifetime: f32, // Time remaining in seconds
    initial_lifetime: f32,
}

impl Particle {
    fn new(position: Vec3, velocity: Vec3, color: Color, lifetime: f32) -> Self {
        Particle {
            position,
            velocity,
            color,
            lifetime,
            initial_lifetime: lifetime,
        }
    }

    fn update(&mut self, dt: f32) {
        self.velocity.y += PARTICLE_GRAVITY * dt;
        self.position += self.velocity * dt;
        // Sparks settle on the ground instead of sinking through it
        if self.position.y < 0.0 {
            self.position.y = 0.0;
            self.velocity = Vec3::ZERO;
        }
        self.lifetime -= dt;

        let fade_factor = (self.lifetime / self.initial_lifetime).max(0.0);
        self.color.a = fade_factor;
    }

    fn is_alive(&self) -> bool {
        self.lifetime > 0.0
    }
}

/// Short-lived visual sparks for shots, hits and kills
#[derive(Debug)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
    rng: StdRng,
}

impl ParticleSystem {
    pub fn new() -> Self {
        ParticleSystem {
            particles: Vec::new(),
            rng: StdRng::from_entropy(),
        }
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    // Random unit vector biased upward
    fn random_direction(&mut self) -> Vec3 {
        let yaw = self.rng.r#gen::<f32>() * std::f32::consts::TAU;
        let pitch = self.rng.r#gen::<f32>() * std::f32::consts::FRAC_PI_2;
        Vec3::new(yaw.cos() * pitch.cos(), pitch.sin(), yaw.sin() * pitch.cos())
    }

    /// Spawns a burst of particles
    pub fn spawn_explosion(
        &mut self,
        position: Vec3,
        base_color: Color,
        count: usize,
        max_speed: f32,
        lifetime: f32,
    ) {
        for _ in 0..count {
            let speed = self.rng.r#gen::<f32>() * max_speed;
            let velocity = self.random_direction() * speed;
            let particle_lifetime = lifetime * (0.5 + self.rng.r#gen::<f32>() * 0.5);
            self.particles
                .push(Particle::new(position, velocity, base_color, particle_lifetime));
        }
    }

    /// Spawns a short, directional burst of particles for muzzle flash.
    pub fn spawn_muzzle_flash(&mut self, position: Vec3, direction: Vec3) {
        let count = 6;
        let lifetime = 0.15;
        let base_speed = 25.0;
        let spread = 0.25;

        for _ in 0..count {
            let jitter = Vec3::new(
                self.rng.r#gen::<f32>() - 0.5,
                self.rng.r#gen::<f32>() - 0.5,
                self.rng.r#gen::<f32>() - 0.5,
            ) * spread;
            let speed = base_speed * (0.7 + self.rng.r#gen::<f32>() * 0.6);
            let velocity = (direction + jitter).normalize_or_zero() * speed;
            let color = Color { a: 0.7, ..YELLOW };
            self.particles.push(Particle::new(
                position,
                velocity,
                color,
                lifetime * (0.8 + self.rng.r#gen::<f32>() * 0.4),
            ));
        }
    }

    /// Visual reaction to one combat event
    pub fn react(&mut self, event: &CombatEvent) {
        match *event {
            CombatEvent::Fired {
                position,
                direction,
                ..
            } => self.spawn_muzzle_flash(position, direction),
            CombatEvent::Hit { position, .. } => {
                self.spawn_explosion(position, ORANGE, 30, 12.0, 0.6)
            }
            CombatEvent::Destroyed { position, .. } => {
                self.spawn_explosion(position, RED, 80, 20.0, 1.2)
            }
            CombatEvent::OutOfBounds { .. } => {}
        }
    }

    pub fn update(&mut self, dt: f32) {
        self.particles.retain_mut(|p| {
            p.update(dt);
            p.is_alive()
        });
    }

    /// Draws every live particle. Expects a 3D camera to be active.
    pub fn draw(&self) {
        let size = Vec3::splat(PARTICLE_SIZE);
        for particle in &self.particles {
            draw_cube(particle.position, size, None, particle.color);
        }
    }
}

impl Default for ParticleSystem {
    fn default() -> Self {
        Self::new()
    }
}
