//! Headless runner for the dice-defense simulation.
//!
//! Drives the engine on a game-loop thread fed by an `mpsc` command
//! channel and keeps the latest snapshot for polling.

pub mod game_loop;
pub mod state;

pub use dice_defense_core as core;
