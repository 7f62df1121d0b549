//! Player commands sent from the input layer to the simulation.
//!
//! Commands are queued and processed at the next tick boundary, even
//! while the game is paused.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::TowerType;

/// All possible player actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum PlayerCommand {
    // --- Waves ---
    /// Start the next wave if none is running.
    StartNextWave,
    /// Operator override: start the next wave, cancelling any pending auto-start.
    ForceStartNextWave,
    /// Operator override: despawn every tracked enemy and stop spawning.
    StopCurrentWave,

    // --- Towers ---
    /// Buy a tower from the catalogue. Placing onto an occupied column stacks it.
    PlaceTower { tower_type: TowerType, position: Vec3 },
    /// Raise one base stat of an existing tower.
    UpgradeTower { tower_id: u64, upgrade: TowerUpgrade },

    // --- Simulation control ---
    TogglePause,
    Pause,
    Resume,
    /// Set time scale (1.0 = normal), clamped to [0, MAX_TIME_SCALE].
    SetTimeScale { scale: f64 },
    RestartGame,
}

/// Stat increase applied by an upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "stat", content = "amount")]
pub enum TowerUpgrade {
    Damage(f32),
    Range(f32),
    FireRate(f32),
}
