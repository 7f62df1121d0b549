//! Tower stacking: per-tick bonus recomputation and top-cover detection.
//!
//! A tower is "below" another when their columns line up on the XZ plane
//! and it sits within `STACK_PROBE_DISTANCE` underneath. The chain of
//! towers below is followed down to the ground.

use glam::Vec3;
use hecs::{Entity, World};

use dice_defense_core::constants::*;
use dice_defense_core::enums::TowerType;
use dice_defense_core::types::Transform;

use crate::components::{StackBonus, StackCounts, Tower, TowerStats};

struct Column {
    entity: Entity,
    transform: Transform,
    tower_type: TowerType,
}

pub fn run(world: &mut World) {
    let columns: Vec<Column> = world
        .query::<(&Transform, &Tower)>()
        .iter()
        .map(|(entity, (transform, tower))| Column {
            entity,
            transform: *transform,
            tower_type: tower.tower_type,
        })
        .collect();

    for column in &columns {
        let counts = count_below(&columns, column.transform.position);
        let covered = tower_above(&columns, column.transform.position).is_some();
        if let Ok(tower) = world.query_one_mut::<&mut Tower>(column.entity) {
            tower.stack = counts;
            tower.bonus = stack_bonus(&tower.base, &counts);
            tower.covered = covered;
        }
    }
}

/// Bonus from the towers beneath, proportional to how many of each type.
///
/// Rules are applied in `TowerType::ALL` order and each rule overwrites
/// the stats it touches, so the last type touching a stat wins.
pub fn stack_bonus(base: &TowerStats, counts: &StackCounts) -> StackBonus {
    let mut bonus = StackBonus::default();
    for tower_type in TowerType::ALL {
        let n = counts.get(tower_type) as f32;
        if n == 0.0 {
            continue;
        }
        match tower_type {
            TowerType::D4 => bonus.fire_rate_bonus = base.fire_rate * STACK_RATE_D4_FIRE_RATE * n,
            TowerType::D6 => {
                bonus.damage_bonus = base.damage * STACK_RATE_D6_ALL * n;
                bonus.range_bonus = base.range * STACK_RATE_D6_ALL * n;
                bonus.fire_rate_bonus = base.fire_rate * STACK_RATE_D6_ALL * n;
            }
            TowerType::D8 => bonus.damage_bonus = base.damage * STACK_RATE_D8_DAMAGE * n,
            TowerType::D12 => bonus.range_bonus = base.range * STACK_RATE_D12_RANGE * n,
            TowerType::D14 => {
                bonus.damage_bonus = base.damage * STACK_RATE_D14_DAMAGE * n;
                bonus.range_bonus = base.range * STACK_RATE_D14_RANGE * n;
            }
        }
    }
    bonus
}

fn same_column(tower: &Transform, point: Vec3) -> bool {
    tower.horizontal_distance_to(point) <= STACK_ALIGN_TOLERANCE
}

/// Index of the closest tower directly beneath `position`.
fn tower_below(columns: &[Column], position: Vec3) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| same_column(&c.transform, position))
        .map(|(i, c)| (i, position.y - c.transform.position.y))
        .filter(|(_, gap)| *gap > 0.0 && *gap <= STACK_PROBE_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Index of the closest tower directly on top of `position`.
fn tower_above(columns: &[Column], position: Vec3) -> Option<usize> {
    columns
        .iter()
        .enumerate()
        .filter(|(_, c)| same_column(&c.transform, position))
        .map(|(i, c)| (i, c.transform.position.y - position.y))
        .filter(|(_, gap)| *gap > 0.0 && *gap <= STACK_PROBE_DISTANCE)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

fn count_below(columns: &[Column], position: Vec3) -> StackCounts {
    let mut counts = StackCounts::default();
    // Strictly decreasing height, so this terminates.
    let mut cursor = position;
    while let Some(i) = tower_below(columns, cursor) {
        counts.add(columns[i].tower_type);
        cursor = columns[i].transform.position;
    }
    counts
}

/// Height at which a new tower placed at `position` lands: on top of the
/// column's highest tower, or on the ground.
pub fn placement_height(world: &World, position: Vec3) -> f32 {
    world
        .query::<(&Transform, &Tower)>()
        .iter()
        .filter(|(_, (transform, _))| same_column(transform, position))
        .map(|(_, (transform, _))| transform.position.y + TOWER_HEIGHT)
        .fold(position.y, f32::max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenario::TowerTemplate;

    fn spawn(world: &mut World, tower_type: TowerType, position: Vec3) -> Entity {
        let t = TowerTemplate::for_type(tower_type);
        let base = TowerStats {
            damage: t.damage,
            range: t.range,
            fire_rate: t.fire_rate,
        };
        world.spawn((Transform::new(position), Tower::new(tower_type, base, t.cost, t.projectile)))
    }

    #[test]
    fn test_stack_of_three() {
        let mut world = World::new();
        let bottom = spawn(&mut world, TowerType::D8, Vec3::ZERO);
        let middle = spawn(&mut world, TowerType::D8, Vec3::new(0.1, TOWER_HEIGHT, 0.0));
        let top = spawn(&mut world, TowerType::D6, Vec3::new(0.0, TOWER_HEIGHT * 2.0, 0.1));
        let lone = spawn(&mut world, TowerType::D6, Vec3::new(5.0, 0.0, 0.0));

        run(&mut world);

        let top_tower = world.get::<&Tower>(top).unwrap();
        assert_eq!(top_tower.stack.get(TowerType::D8), 2);
        assert!(!top_tower.covered);
        let expected = top_tower.base.damage * STACK_RATE_D8_DAMAGE * 2.0;
        assert!((top_tower.bonus.damage_bonus - expected).abs() < 1e-5);
        drop(top_tower);

        assert!(world.get::<&Tower>(bottom).unwrap().covered);
        assert!(world.get::<&Tower>(middle).unwrap().covered);
        assert_eq!(world.get::<&Tower>(middle).unwrap().stack.total(), 1);

        let lone_tower = world.get::<&Tower>(lone).unwrap();
        assert_eq!(lone_tower.stack.total(), 0);
        assert_eq!(lone_tower.bonus, StackBonus::default());
    }

    #[test]
    fn test_bonus_rules_overwrite_per_stat() {
        let base = TowerStats {
            damage: 100.0,
            range: 10.0,
            fire_rate: 2.0,
        };
        let mut counts = StackCounts::default();
        counts.add(TowerType::D6);
        counts.add(TowerType::D8);
        let bonus = stack_bonus(&base, &counts);
        // D8 replaces the damage bonus written by D6.
        assert!((bonus.damage_bonus - 20.0).abs() < 1e-4);
        assert!((bonus.range_bonus - 1.0).abs() < 1e-5);
        assert!((bonus.fire_rate_bonus - 0.2).abs() < 1e-5);
    }

    #[test]
    fn test_placement_height_lands_on_top() {
        let mut world = World::new();
        assert_eq!(placement_height(&world, Vec3::ZERO), 0.0);
        spawn(&mut world, TowerType::D4, Vec3::ZERO);
        spawn(&mut world, TowerType::D4, Vec3::new(0.0, TOWER_HEIGHT, 0.0));
        assert_eq!(placement_height(&world, Vec3::new(0.2, 0.0, 0.0)), TOWER_HEIGHT * 2.0);
        assert_eq!(placement_height(&world, Vec3::new(3.0, 0.0, 0.0)), 0.0);
    }
}
