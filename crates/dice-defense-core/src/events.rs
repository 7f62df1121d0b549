//! Events emitted by the simulation for UI and effect feedback.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::enums::*;

/// Observer notifications, drained into each snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum GameEvent {
    MoneyChanged { money: i32 },
    LivesChanged { lives: i32 },
    /// 1-based wave number; 0 before the first wave.
    WaveChanged { wave: u32 },
    WaveStarted { wave: u32, enemy_count: u32 },
    WaveCompleted { wave: u32 },
    GameOver,
    GameWon,
    PauseChanged { paused: bool },
    HealthChanged { entity_id: u64, current: f32, max: f32 },
    EnemyKilled { entity_id: u64, reward: i32 },
    EnemyReachedEnd { entity_id: u64, damage: i32 },
    TowerPlaced { tower_id: u64, tower_type: TowerType },
    ProjectileFired { tower_id: u64, kind: ProjectileKind },
}

/// Fire-and-forget request for a visual effect.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EffectEvent {
    pub kind: EffectKind,
    pub position: Vec3,
    pub rotation: Quat,
}

impl EffectEvent {
    pub fn new(kind: EffectKind, position: Vec3, rotation: Quat) -> Self {
        Self {
            kind,
            position,
            rotation,
        }
    }
}
