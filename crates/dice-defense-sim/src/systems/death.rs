//! Resolve enemies killed this tick: reward, death effect, delayed despawn.

use hecs::World;
use tracing::debug;

use dice_defense_core::constants::ENEMY_DESPAWN_DELAY_SECS;
use dice_defense_core::enums::EffectKind;
use dice_defense_core::events::{EffectEvent, GameEvent};
use dice_defense_core::types::Transform;

use crate::components::Enemy;
use crate::game_manager::GameManager;
use crate::scheduler::{Scheduler, Task};

use super::damage::CombatLog;
use super::wave_spawner::WaveManager;

/// Drain `log.deaths`. Each enemy is rewarded exactly once; the body
/// stays in the world (non-targetable) until its despawn task fires.
pub fn run(
    world: &mut World,
    now: f64,
    scheduler: &mut Scheduler,
    log: &mut CombatLog,
    game: &mut GameManager,
    waves: &mut WaveManager,
) {
    for entity in std::mem::take(&mut log.deaths) {
        let Ok((transform, enemy)) = world.query_one_mut::<(&Transform, &mut Enemy)>(entity) else {
            continue;
        };
        if enemy.despawn_task.is_some() {
            continue;
        }
        enemy.despawn_task = Some(scheduler.schedule(now, ENEMY_DESPAWN_DELAY_SECS, Task::DespawnEnemy(entity)));
        let reward = enemy.reward_value;

        debug!(entity = entity.to_bits().get(), reward, "enemy killed");
        log.effects
            .push(EffectEvent::new(EffectKind::EnemyDeath, transform.position, transform.rotation()));
        log.events.push(GameEvent::EnemyKilled {
            entity_id: entity.to_bits().get(),
            reward,
        });
        game.add_money(reward);
        game.enemy_killed();
        waves.on_enemy_death(entity);
    }
}
