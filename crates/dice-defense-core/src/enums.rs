//! Enumeration types used throughout the simulation.

use serde::{Deserialize, Serialize};

/// Tower archetype, named after the die it is modelled on.
///
/// Each die type also acts as a stacking modifier for towers placed
/// on top of it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TowerType {
    D4,
    D6,
    D8,
    D12,
    D14,
}

impl TowerType {
    pub const COUNT: usize = 5;

    /// All tower types in stacking-rule order.
    pub const ALL: [TowerType; Self::COUNT] = [
        TowerType::D4,
        TowerType::D6,
        TowerType::D8,
        TowerType::D12,
        TowerType::D14,
    ];

    pub fn index(self) -> usize {
        match self {
            TowerType::D4 => 0,
            TowerType::D6 => 1,
            TowerType::D8 => 2,
            TowerType::D12 => 3,
            TowerType::D14 => 4,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            TowerType::D4 => "D4",
            TowerType::D6 => "D6",
            TowerType::D8 => "D8",
            TowerType::D12 => "D12",
            TowerType::D14 => "D14",
        }
    }
}

/// Projectile archetype.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProjectileKind {
    /// Straight shot with optional lead prediction.
    Direct,
    /// Steers toward its target and retargets when it dies.
    Homing,
    /// Detonates with radial damage falloff.
    Explosive,
    /// Splits into pellets on launch.
    Spread,
    /// Single straight-flying pellet spawned by a spread shot.
    Pellet,
    /// Sustained segment damage for a fixed duration.
    Beam,
}

/// Enemy lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnemyState {
    #[default]
    Alive,
    /// Walked off the end of the path; despawned this tick.
    ReachedEnd,
    /// Killed; awaiting the despawn delay.
    Dead,
}

/// Wave manager lifecycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WavePhase {
    #[default]
    Idle,
    Spawning,
    AwaitingCompletion,
    Completed,
}

/// Game phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    #[default]
    Active,
    Paused,
    /// Lives ran out.
    Defeat,
    /// Final wave cleared.
    Victory,
}

/// Presentation hint for a one-shot visual effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    Hit,
    Explosion,
    BeamStart,
    BeamEnd,
    EnemyDeath,
}
