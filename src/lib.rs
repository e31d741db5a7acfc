//! Tank Arena: a single-player tank battle over a rapier3d world, drawn with macroquad.

pub mod ai;
pub mod arena;
pub mod audio;
pub mod combat;
pub mod config;
pub mod controller;
pub mod error;
pub mod game;
pub mod hud;
pub mod logging;
pub mod marquee;
pub mod particles;
pub mod physics;
pub mod play;
pub mod projectile;
pub mod render;
pub mod scene;
pub mod tank;
pub mod types;
pub mod utils;
