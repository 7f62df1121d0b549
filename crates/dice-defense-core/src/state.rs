//! Game state snapshot: the complete observable state after each tick.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::enums::*;
use crate::events::{EffectEvent, GameEvent};
use crate::types::SimTime;

/// Complete game state published after each tick.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GameStateSnapshot {
    pub time: SimTime,
    pub phase: GamePhase,
    /// Effective time scale applied this tick (0 while paused or ended).
    pub time_scale: f64,
    pub economy: EconomyView,
    pub wave: WaveView,
    pub enemies: Vec<EnemyView>,
    pub towers: Vec<TowerView>,
    pub projectiles: Vec<ProjectileView>,
    pub events: Vec<GameEvent>,
    pub effects: Vec<EffectEvent>,
}

/// Lives, money and score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EconomyView {
    pub money: i32,
    pub lives: i32,
    pub enemies_killed: u32,
    pub game_over: bool,
    pub game_won: bool,
    pub paused: bool,
}

/// Wave progression for the HUD.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WaveView {
    /// 1-based; 0 before the first wave.
    pub current_wave: u32,
    pub total_waves: u32,
    pub phase: WavePhase,
    pub in_progress: bool,
    pub enemies_remaining: u32,
    pub enemies_alive: u32,
    /// Fraction of the wave's enemies already spawned.
    pub spawn_progress: f32,
    /// Fraction of the wave's enemies no longer alive.
    pub completion_progress: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnemyView {
    pub id: u64,
    pub position: Vec3,
    pub state: EnemyState,
    pub health: f32,
    pub max_health: f32,
    pub waypoint_index: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TowerView {
    pub id: u64,
    pub tower_type: TowerType,
    pub position: Vec3,
    /// Base plus stacking bonus.
    pub damage: f32,
    pub range: f32,
    pub fire_rate: f32,
    /// Another tower sits on top; firing is suppressed.
    pub disabled: bool,
    pub target: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectileView {
    pub id: u64,
    pub kind: ProjectileKind,
    pub position: Vec3,
    pub forward: Vec3,
    pub target: Option<u64>,
    /// Beam segment while a beam is active.
    pub beam: Option<(Vec3, Vec3)>,
}
