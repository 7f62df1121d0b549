//! Level definitions: path, waves, tower catalogue and economy.
//!
//! Levels are plain serde data. `default_level` is the built-in
//! five-wave map; custom levels load from JSON.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use dice_defense_core::constants::*;
use dice_defense_core::enums::TowerType;

use crate::projectile::ProjectileSpec;

#[derive(Debug, Error)]
pub enum LevelError {
    #[error("failed to read level file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse level: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid level: {0}")]
    Invalid(String),
}

/// Base enemy stats before wave multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTemplate {
    pub move_speed: f32,
    pub reward: i32,
    /// Lives taken on reaching the end of the path.
    pub damage: i32,
    pub max_health: f32,
}

impl Default for EnemyTemplate {
    fn default() -> Self {
        Self {
            move_speed: DEFAULT_ENEMY_SPEED,
            reward: DEFAULT_ENEMY_REWARD,
            damage: DEFAULT_ENEMY_DAMAGE,
            max_health: DEFAULT_ENEMY_HEALTH,
        }
    }
}

/// Static wave definition. Read-only once the wave starts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    pub name: String,
    pub enemy_count: u32,
    pub enemy_template: EnemyTemplate,
    /// Enemies per second.
    pub spawn_rate: f32,
    /// Delay before the next wave auto-starts.
    pub time_between_waves: f64,
    pub enemy_speed_multiplier: f32,
    pub enemy_health_multiplier: f32,
    pub enemy_reward_multiplier: i32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            enemy_count: 5,
            enemy_template: EnemyTemplate::default(),
            spawn_rate: 1.0,
            time_between_waves: DEFAULT_TIME_BETWEEN_WAVES_SECS,
            enemy_speed_multiplier: 1.0,
            enemy_health_multiplier: 1.0,
            enemy_reward_multiplier: 1,
        }
    }
}

impl WaveConfig {
    /// Template with this wave's multipliers applied.
    pub fn scaled_enemy(&self) -> EnemyTemplate {
        let base = &self.enemy_template;
        EnemyTemplate {
            move_speed: base.move_speed * self.enemy_speed_multiplier,
            reward: base.reward * self.enemy_reward_multiplier,
            damage: base.damage,
            max_health: base.max_health * self.enemy_health_multiplier,
        }
    }

    /// Seconds between spawns; zero when the rate is not positive.
    pub fn spawn_interval(&self) -> f64 {
        if self.spawn_rate > 0.0 {
            1.0 / f64::from(self.spawn_rate)
        } else {
            0.0
        }
    }
}

/// Catalogue entry for one tower type.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerTemplate {
    pub tower_type: TowerType,
    pub damage: f32,
    pub range: f32,
    pub fire_rate: f32,
    pub cost: i32,
    #[serde(default)]
    pub projectile: Option<ProjectileSpec>,
}

impl TowerTemplate {
    /// Default stats and projectile archetype for a die.
    pub fn for_type(tower_type: TowerType) -> Self {
        let (damage, range, fire_rate, cost) = match tower_type {
            TowerType::D4 => (15.0, 6.0, 1.5, 60),
            TowerType::D6 => (DEFAULT_TOWER_DAMAGE, DEFAULT_TOWER_RANGE, DEFAULT_TOWER_FIRE_RATE, DEFAULT_TOWER_COST),
            TowerType::D8 => (40.0, 5.0, 0.5, 80),
            TowerType::D12 => (30.0, 4.0, 0.8, 70),
            TowerType::D14 => (45.0, 7.0, 0.25, 100),
        };
        Self {
            tower_type,
            damage,
            range,
            fire_rate,
            cost,
            projectile: Some(ProjectileSpec::for_tower(tower_type)),
        }
    }
}

/// A tower present when the level starts. Free of charge.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TowerPlacement {
    pub tower_type: TowerType,
    pub position: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelConfig {
    pub name: String,
    pub starting_money: i32,
    pub starting_lives: i32,
    pub spawn_point: Vec3,
    pub waypoints: Vec<Vec3>,
    pub waves: Vec<WaveConfig>,
    pub towers: Vec<TowerTemplate>,
    pub initial_towers: Vec<TowerPlacement>,
}

impl Default for LevelConfig {
    fn default() -> Self {
        Self::default_level()
    }
}

impl LevelConfig {
    /// Built-in level: an S-shaped path and five escalating waves.
    pub fn default_level() -> Self {
        let wave = |name: &str, count: u32, rate: f32, speed: f32, health: f32, reward: i32| WaveConfig {
            name: name.to_string(),
            enemy_count: count,
            spawn_rate: rate,
            enemy_speed_multiplier: speed,
            enemy_health_multiplier: health,
            enemy_reward_multiplier: reward,
            ..WaveConfig::default()
        };
        Self {
            name: "Felt Table".to_string(),
            starting_money: STARTING_MONEY,
            starting_lives: STARTING_LIVES,
            spawn_point: Vec3::new(-10.0, 0.0, -10.0),
            waypoints: vec![
                Vec3::new(-10.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 8.0),
                Vec3::new(10.0, 0.0, 8.0),
                Vec3::new(10.0, 0.0, 16.0),
            ],
            waves: vec![
                wave("Opening Roll", 5, 1.0, 1.0, 1.0, 1),
                wave("Snake Eyes", 8, 1.5, 1.1, 1.2, 1),
                wave("Double Down", 10, 2.0, 1.2, 1.5, 2),
                wave("High Roller", 12, 2.0, 1.3, 2.0, 2),
                wave("Jackpot", 15, 2.5, 1.4, 3.0, 3),
            ],
            towers: TowerType::ALL.iter().map(|t| TowerTemplate::for_type(*t)).collect(),
            initial_towers: vec![
                TowerPlacement {
                    tower_type: TowerType::D6,
                    position: Vec3::new(-3.0, 0.0, 2.0),
                },
                TowerPlacement {
                    tower_type: TowerType::D8,
                    position: Vec3::new(3.0, 0.0, 5.0),
                },
                TowerPlacement {
                    tower_type: TowerType::D4,
                    position: Vec3::new(3.0, 0.0, 5.0),
                },
            ],
        }
    }

    pub fn from_json_str(json: &str) -> Result<Self, LevelError> {
        let level: Self = serde_json::from_str(json)?;
        level.validate()?;
        Ok(level)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, LevelError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LevelError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject levels that cannot be played; log recoverable gaps.
    pub fn validate(&self) -> Result<(), LevelError> {
        if self.waves.is_empty() {
            return Err(LevelError::Invalid("level has no waves".into()));
        }
        if self.starting_lives <= 0 {
            return Err(LevelError::Invalid(format!(
                "starting lives must be positive, got {}",
                self.starting_lives
            )));
        }
        for (i, wave) in self.waves.iter().enumerate() {
            let multipliers = [wave.enemy_speed_multiplier, wave.enemy_health_multiplier];
            if multipliers.iter().any(|m| !m.is_finite() || *m < 0.0) || wave.enemy_reward_multiplier < 0 {
                return Err(LevelError::Invalid(format!("wave {} has a negative or non-finite multiplier", i + 1)));
            }
            if !wave.time_between_waves.is_finite() || wave.time_between_waves < 0.0 {
                return Err(LevelError::Invalid(format!("wave {} has an invalid time between waves", i + 1)));
            }
            if wave.spawn_rate <= 0.0 && wave.enemy_count > 1 {
                warn!(wave = i + 1, "non-positive spawn rate, enemies will spawn together");
            }
        }
        let mut seen = HashSet::new();
        for template in &self.towers {
            if !seen.insert(template.tower_type) {
                return Err(LevelError::Invalid(format!(
                    "tower type {} listed twice in the catalogue",
                    template.tower_type.label()
                )));
            }
            if template.projectile.is_none() {
                warn!(tower_type = template.tower_type.label(), "catalogue entry has no projectile");
            }
        }
        if self.waypoints.is_empty() {
            warn!("level has no waypoints, enemies will stay at the spawn point");
        }
        for placement in &self.initial_towers {
            if !seen.contains(&placement.tower_type) {
                warn!(tower_type = placement.tower_type.label(), "initial tower type missing from catalogue");
            }
        }
        Ok(())
    }

    pub fn tower_template(&self, tower_type: TowerType) -> Option<&TowerTemplate> {
        self.towers.iter().find(|t| t.tower_type == tower_type)
    }

    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    /// Shared path handed to every enemy.
    pub fn path(&self) -> Arc<[Vec3]> {
        self.waypoints.clone().into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_level_is_valid() {
        let level = LevelConfig::default_level();
        level.validate().unwrap();
        assert_eq!(level.total_waves(), 5);
        for tower_type in TowerType::ALL {
            assert!(level.tower_template(tower_type).is_some(), "{} missing", tower_type.label());
        }
    }

    #[test]
    fn test_scaled_enemy_applies_multipliers() {
        let wave = WaveConfig {
            enemy_speed_multiplier: 1.5,
            enemy_health_multiplier: 2.0,
            enemy_reward_multiplier: 3,
            ..WaveConfig::default()
        };
        let enemy = wave.scaled_enemy();
        assert_eq!(enemy.move_speed, DEFAULT_ENEMY_SPEED * 1.5);
        assert_eq!(enemy.max_health, DEFAULT_ENEMY_HEALTH * 2.0);
        assert_eq!(enemy.reward, DEFAULT_ENEMY_REWARD * 3);
        assert_eq!(enemy.damage, DEFAULT_ENEMY_DAMAGE);
    }

    #[test]
    fn test_spawn_interval() {
        let wave = WaveConfig {
            spawn_rate: 4.0,
            ..WaveConfig::default()
        };
        assert_eq!(wave.spawn_interval(), 0.25);
        let stalled = WaveConfig {
            spawn_rate: 0.0,
            ..WaveConfig::default()
        };
        assert_eq!(stalled.spawn_interval(), 0.0);
    }

    #[test]
    fn test_from_json_fills_defaults() {
        let json = r#"{
            "starting_money": 250,
            "waypoints": [[0.0, 0.0, 0.0], [0.0, 0.0, 5.0]],
            "waves": [{"enemy_count": 3, "spawn_rate": 1.0}],
            "towers": [{"tower_type": "D6", "damage": 10.0, "range": 4.0, "fire_rate": 2.0, "cost": 30}]
        }"#;
        let level = LevelConfig::from_json_str(json).unwrap();
        assert_eq!(level.starting_money, 250);
        assert_eq!(level.starting_lives, STARTING_LIVES, "unspecified fields fall back to the default level");
        assert_eq!(level.waves[0].enemy_count, 3);
        assert_eq!(level.waves[0].enemy_speed_multiplier, 1.0);
        assert_eq!(level.towers.len(), 1);
        assert!(level.towers[0].projectile.is_none());
    }

    #[test]
    fn test_invalid_levels_rejected() {
        let no_waves = r#"{"waves": []}"#;
        assert!(matches!(LevelConfig::from_json_str(no_waves), Err(LevelError::Invalid(_))));

        let dup = r#"{"towers": [
            {"tower_type": "D4", "damage": 1.0, "range": 1.0, "fire_rate": 1.0, "cost": 1},
            {"tower_type": "D4", "damage": 1.0, "range": 1.0, "fire_rate": 1.0, "cost": 1}
        ]}"#;
        assert!(matches!(LevelConfig::from_json_str(dup), Err(LevelError::Invalid(_))));

        let negative = r#"{"waves": [{"enemy_health_multiplier": -1.0}]}"#;
        assert!(matches!(LevelConfig::from_json_str(negative), Err(LevelError::Invalid(_))));

        assert!(matches!(LevelConfig::from_json_str("{not json"), Err(LevelError::Parse(_))));
        assert!(matches!(
            LevelConfig::from_path("/nonexistent/level.json"),
            Err(LevelError::Io { .. })
        ));
    }
}
