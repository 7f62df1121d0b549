//! Damage application and the per-tick combat log.

use hecs::{Entity, World};

use dice_defense_core::enums::EnemyState;
use dice_defense_core::events::{EffectEvent, GameEvent};

use crate::components::Enemy;
use crate::health::Health;

/// Events, effects and deaths produced while systems run.
#[derive(Debug, Default)]
pub struct CombatLog {
    pub events: Vec<GameEvent>,
    pub effects: Vec<EffectEvent>,
    /// Enemies killed this tick, resolved by `death::run`.
    pub deaths: Vec<Entity>,
}

impl CombatLog {
    pub fn clear(&mut self) {
        self.events.clear();
        self.effects.clear();
        self.deaths.clear();
    }
}

/// Apply `amount` to a living enemy. Returns false for stale or dead targets.
///
/// A killed enemy is marked `Dead` immediately so the rest of the tick
/// no longer sees it as a valid target.
pub fn apply_damage(world: &mut World, target: Entity, amount: f32, log: &mut CombatLog) -> bool {
    let Ok((enemy, health)) = world.query_one_mut::<(&mut Enemy, &mut Health)>(target) else {
        return false;
    };
    if !enemy.is_alive() {
        return false;
    }
    let Some(change) = health.take_damage(amount) else {
        return false;
    };
    log.events.push(GameEvent::HealthChanged {
        entity_id: target.to_bits().get(),
        current: change.current,
        max: health.max_health(),
    });
    if change.died {
        enemy.state = EnemyState::Dead;
        log.deaths.push(target);
    }
    true
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use glam::Vec3;

    use dice_defense_core::types::Transform;

    use super::*;

    #[test]
    fn test_lethal_damage_marks_dead_once() {
        let mut world = World::new();
        let mut log = CombatLog::default();
        let path: Arc<[Vec3]> = Vec::new().into();
        let enemy = world.spawn((Transform::default(), Enemy::new(path, 1.0, 5, 1), Health::new(30.0)));

        assert!(apply_damage(&mut world, enemy, 20.0, &mut log));
        assert!(log.deaths.is_empty());
        assert!(apply_damage(&mut world, enemy, 20.0, &mut log));
        assert_eq!(log.deaths, vec![enemy]);
        assert!(!apply_damage(&mut world, enemy, 20.0, &mut log), "dead enemies take no damage");
        assert_eq!(log.events.len(), 2);
        assert!(world.get::<&Enemy>(enemy).unwrap().is_dead());
    }

    #[test]
    fn test_stale_handle_is_ignored() {
        let mut world = World::new();
        let mut log = CombatLog::default();
        let ghost = world.spawn(());
        world.despawn(ghost).unwrap();
        assert!(!apply_damage(&mut world, ghost, 10.0, &mut log));
    }
}
