//! Simulation engine for dice-defense.
//!
//! Owns the hecs ECS world, runs systems at a fixed tick rate,
//! and produces GameStateSnapshots for the runner.

pub mod components;
pub mod engine;
pub mod game_manager;
pub mod guidance;
pub mod health;
pub mod projectile;
pub mod scenario;
pub mod scheduler;
pub mod spatial;
pub mod systems;
pub mod world_setup;

pub use dice_defense_core as core;
pub use engine::{SimConfig, SimulationEngine};
