//! Entity spawn factories for the simulation world.
//!
//! Creates enemy, tower and projectile entities with their component
//! bundles and registers the scheduler tasks each one owns.

use std::sync::Arc;

use glam::Vec3;
use hecs::{Entity, World};
use tracing::warn;

use dice_defense_core::events::GameEvent;
use dice_defense_core::types::Transform;

use crate::components::{Enemy, Tower, TowerStats};
use crate::health::Health;
use crate::projectile::Projectile;
use crate::scenario::{EnemyTemplate, TowerTemplate};
use crate::scheduler::{Scheduler, Task};
use crate::systems::damage::CombatLog;

/// Spawn an enemy at `position` heading for the first waypoint of `path`.
///
/// Emits the initial `HealthChanged` so observers start from full health.
pub fn spawn_enemy(
    world: &mut World,
    position: Vec3,
    path: Arc<[Vec3]>,
    template: &EnemyTemplate,
    log: &mut CombatLog,
) -> Entity {
    if path.is_empty() {
        warn!("enemy spawned without waypoints, it will stay idle");
    }
    let facing = path.first().map_or(Vec3::Z, |first| *first - position);
    let health = Health::new(template.max_health);
    let (current, max) = (health.current_health(), health.max_health());
    let entity = world.spawn((
        Transform::looking(position, facing),
        Enemy::new(path, template.move_speed.max(0.0), template.reward, template.damage),
        health,
    ));
    log.events.push(GameEvent::HealthChanged {
        entity_id: entity.to_bits().get(),
        current,
        max,
    });
    entity
}

/// Spawn a tower and start its target-scan cadence.
pub fn spawn_tower(
    world: &mut World,
    scheduler: &mut Scheduler,
    now: f64,
    position: Vec3,
    template: &TowerTemplate,
) -> Entity {
    if template.projectile.is_none() {
        warn!(tower_type = template.tower_type.label(), "tower has no projectile mapping, firing disabled");
    }
    if template.fire_rate <= 0.0 {
        warn!(tower_type = template.tower_type.label(), fire_rate = template.fire_rate, "non-positive fire rate");
    }
    let tower = Tower::new(
        template.tower_type,
        TowerStats {
            damage: template.damage,
            range: template.range,
            fire_rate: template.fire_rate,
        },
        template.cost,
        template.projectile,
    );
    let entity = world.spawn((Transform::new(position), tower));
    scheduler.schedule(now, 0.0, Task::ScanTargets(entity));
    entity
}

/// Spawn a projectile and schedule its lifetime expiry.
pub fn spawn_projectile(
    world: &mut World,
    scheduler: &mut Scheduler,
    now: f64,
    transform: Transform,
    projectile: Projectile,
) -> Entity {
    let lifetime = projectile.lifetime;
    let entity = world.spawn((transform, projectile));
    set_lifetime(world, scheduler, now, entity, lifetime);
    entity
}

/// Replace a projectile's remaining lifetime, counted from `now`.
///
/// Returns false if the entity is not a live projectile.
pub fn set_lifetime(
    world: &mut World,
    scheduler: &mut Scheduler,
    now: f64,
    entity: Entity,
    lifetime: f32,
) -> bool {
    let Ok(mut projectile) = world.get::<&mut Projectile>(entity) else {
        return false;
    };
    if projectile.is_destroyed {
        return false;
    }
    if let Some(previous) = projectile.expiry.take() {
        scheduler.cancel(previous);
    }
    projectile.lifetime = lifetime.max(0.0);
    projectile.expiry = Some(scheduler.schedule(
        now,
        f64::from(projectile.lifetime),
        Task::ExpireProjectile(entity),
    ));
    true
}
