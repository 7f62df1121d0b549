//! Cleanup system: removes enemies that left the map and destroyed projectiles.

use hecs::{Entity, World};

use dice_defense_core::enums::EnemyState;

use crate::components::Enemy;
use crate::projectile::Projectile;

/// Despawn finished entities. Uses a pre-allocated buffer to avoid per-tick allocation.
pub fn run(world: &mut World, despawn_buffer: &mut Vec<Entity>) {
    despawn_buffer.clear();

    for (entity, enemy) in world.query_mut::<&Enemy>() {
        if enemy.state == EnemyState::ReachedEnd {
            despawn_buffer.push(entity);
        }
    }

    for (entity, projectile) in world.query_mut::<&Projectile>() {
        if projectile.is_destroyed {
            despawn_buffer.push(entity);
        }
    }

    for entity in despawn_buffer.drain(..) {
        let _ = world.despawn(entity);
    }
}

/// `Task::DespawnEnemy`: remove a dead enemy's body.
pub fn despawn_enemy(world: &mut World, entity: Entity) {
    let dead = world.get::<&Enemy>(entity).map(|e| e.is_dead()).unwrap_or(false);
    if dead {
        let _ = world.despawn(entity);
    }
}
