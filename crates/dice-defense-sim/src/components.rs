//! Enemy and tower components stored in the hecs world.
//!
//! Enemies are spawned as `(Transform, Enemy, Health)`, towers as
//! `(Transform, Tower)`. Cross-entity references are `hecs::Entity`
//! handles and must be revalidated before use.

use std::sync::Arc;

use glam::Vec3;
use hecs::Entity;

use dice_defense_core::commands::TowerUpgrade;
use dice_defense_core::enums::{EnemyState, TowerType};

use crate::projectile::ProjectileSpec;
use crate::scheduler::TaskId;

/// Path follower that damages the base on arrival and pays out on death.
#[derive(Debug, Clone)]
pub struct Enemy {
    /// Shared path, referenced from the level.
    pub waypoints: Arc<[Vec3]>,
    pub current_waypoint_index: usize,
    pub move_speed: f32,
    pub reward_value: i32,
    pub damage_to_base: i32,
    pub state: EnemyState,
    pub despawn_task: Option<TaskId>,
}

impl Enemy {
    pub fn new(waypoints: Arc<[Vec3]>, move_speed: f32, reward_value: i32, damage_to_base: i32) -> Self {
        Self {
            waypoints,
            current_waypoint_index: 0,
            move_speed,
            reward_value,
            damage_to_base,
            state: EnemyState::Alive,
            despawn_task: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.state == EnemyState::Alive
    }

    pub fn is_dead(&self) -> bool {
        self.state == EnemyState::Dead
    }

    pub fn set_stats(&mut self, move_speed: f32, reward_value: i32, damage_to_base: i32) {
        self.move_speed = move_speed.max(0.0);
        self.reward_value = reward_value;
        self.damage_to_base = damage_to_base;
    }

    /// Replace the path and restart it from the first waypoint.
    pub fn set_waypoints(&mut self, waypoints: Arc<[Vec3]>) {
        self.waypoints = waypoints;
        self.current_waypoint_index = 0;
    }

    pub fn current_waypoint(&self) -> Option<Vec3> {
        self.waypoints.get(self.current_waypoint_index).copied()
    }
}

/// Damage, range (m) and fire rate (shots/s).
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct TowerStats {
    pub damage: f32,
    pub range: f32,
    pub fire_rate: f32,
}

/// Additive bonuses derived from the towers stacked beneath.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StackBonus {
    pub damage_bonus: f32,
    pub range_bonus: f32,
    pub fire_rate_bonus: f32,
}

/// Number of towers of each type stacked beneath a tower.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StackCounts([u32; TowerType::COUNT]);

impl StackCounts {
    pub fn get(&self, tower_type: TowerType) -> u32 {
        self.0[tower_type.index()]
    }

    pub fn add(&mut self, tower_type: TowerType) {
        self.0[tower_type.index()] += 1;
    }

    pub fn total(&self) -> u32 {
        self.0.iter().sum()
    }
}

#[derive(Debug, Clone)]
pub struct Tower {
    pub tower_type: TowerType,
    pub base: TowerStats,
    pub cost: i32,
    /// `None` means firing is a no-op.
    pub projectile: Option<ProjectileSpec>,
    pub stack: StackCounts,
    pub bonus: StackBonus,
    /// Another tower sits directly on top.
    pub covered: bool,
    pub current_target: Option<Entity>,
    pub next_fire_time: f64,
}

impl Tower {
    pub fn new(tower_type: TowerType, base: TowerStats, cost: i32, projectile: Option<ProjectileSpec>) -> Self {
        Self {
            tower_type,
            base,
            cost,
            projectile,
            stack: StackCounts::default(),
            bonus: StackBonus::default(),
            covered: false,
            current_target: None,
            next_fire_time: 0.0,
        }
    }

    /// Base plus stacking bonus.
    pub fn effective_stats(&self) -> TowerStats {
        TowerStats {
            damage: self.base.damage + self.bonus.damage_bonus,
            range: self.base.range + self.bonus.range_bonus,
            fire_rate: self.base.fire_rate + self.bonus.fire_rate_bonus,
        }
    }

    pub fn can_fire(&self) -> bool {
        !self.covered
    }

    pub fn apply_upgrade(&mut self, upgrade: TowerUpgrade) {
        match upgrade {
            TowerUpgrade::Damage(amount) => self.base.damage += amount,
            TowerUpgrade::Range(amount) => self.base.range += amount,
            TowerUpgrade::FireRate(amount) => self.base.fire_rate += amount,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path() -> Arc<[Vec3]> {
        vec![Vec3::ZERO, Vec3::X].into()
    }

    #[test]
    fn test_enemy_set_waypoints_restarts_path() {
        let mut enemy = Enemy::new(path(), 2.0, 10, 1);
        enemy.current_waypoint_index = 1;
        enemy.set_waypoints(vec![Vec3::Z].into());
        assert_eq!(enemy.current_waypoint_index, 0);
        assert_eq!(enemy.current_waypoint(), Some(Vec3::Z));
    }

    #[test]
    fn test_enemy_without_waypoints_has_no_goal() {
        let enemy = Enemy::new(Vec::new().into(), 2.0, 10, 1);
        assert_eq!(enemy.current_waypoint(), None);
        assert!(enemy.is_alive());
    }

    #[test]
    fn test_tower_effective_stats_and_upgrade() {
        let base = TowerStats {
            damage: 20.0,
            range: 5.0,
            fire_rate: 1.0,
        };
        let mut tower = Tower::new(TowerType::D6, base, 50, None);
        tower.bonus.damage_bonus = 4.0;
        tower.apply_upgrade(TowerUpgrade::Range(1.5));
        let stats = tower.effective_stats();
        assert_eq!(stats.damage, 24.0);
        assert_eq!(stats.range, 6.5);
        assert_eq!(stats.fire_rate, 1.0);
    }

    #[test]
    fn test_stack_counts() {
        let mut counts = StackCounts::default();
        counts.add(TowerType::D8);
        counts.add(TowerType::D8);
        counts.add(TowerType::D4);
        assert_eq!(counts.get(TowerType::D8), 2);
        assert_eq!(counts.total(), 3);
    }
}
