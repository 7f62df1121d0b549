//! Projectile flight, hit resolution and expiry.
//!
//! Each projectile is copied out of the world, updated against the
//! current world state, then written back. Damage applied by one
//! projectile is visible to every projectile updated after it in the
//! same tick.

pub mod beam;
pub mod direct;
pub mod explosive;
pub mod homing;
pub mod pellet;
pub mod spread;

use glam::Vec3;
use hecs::{Entity, World};

use dice_defense_core::constants::ENEMY_COLLISION_RADIUS;
use dice_defense_core::enums::{EffectKind, ProjectileKind};
use dice_defense_core::events::EffectEvent;
use dice_defense_core::types::Transform;

use crate::guidance::move_towards;
use crate::projectile::{Behavior, Projectile};
use crate::scheduler::Scheduler;
use crate::spatial::{living_enemy_position, SpatialQuery};

use super::damage::{apply_damage, CombatLog};

/// Shared per-tick context for projectile updates.
pub struct ProjectileContext<'a> {
    pub now: f64,
    pub dt: f32,
    pub scheduler: &'a mut Scheduler,
    pub spatial: &'a dyn SpatialQuery,
    pub log: &'a mut CombatLog,
}

pub fn run(world: &mut World, ctx: &mut ProjectileContext) {
    let entities: Vec<Entity> = world
        .query::<&Projectile>()
        .iter()
        .filter(|(_, p)| !p.is_destroyed)
        .map(|(e, _)| e)
        .collect();

    for entity in entities {
        let Some((mut transform, mut projectile)) = take(world, entity) else {
            continue;
        };
        if projectile.is_destroyed {
            continue;
        }
        if !projectile.started {
            projectile.started = true;
            launch(entity, &mut projectile, &mut transform, world, ctx);
        }
        if !projectile.is_destroyed {
            update(&mut projectile, &mut transform, world, ctx);
        }
        if let Ok((t, p)) = world.query_one_mut::<(&mut Transform, &mut Projectile)>(entity) {
            *t = transform;
            *p = projectile;
        }
    }
}

fn take(world: &World, entity: Entity) -> Option<(Transform, Projectile)> {
    let mut query = world.query_one::<(&Transform, &Projectile)>(entity).ok()?;
    let (transform, projectile) = query.get()?;
    Some((*transform, projectile.clone()))
}

/// One-time hook on the first update after spawning.
fn launch(
    entity: Entity,
    projectile: &mut Projectile,
    transform: &mut Transform,
    world: &mut World,
    ctx: &mut ProjectileContext,
) {
    match projectile.kind() {
        ProjectileKind::Homing => {
            let speed = projectile.speed;
            if let Behavior::Homing(shot) = &mut projectile.behavior {
                shot.velocity = transform.forward * speed;
            }
        }
        ProjectileKind::Beam => beam::activate(entity, projectile, transform, ctx),
        ProjectileKind::Spread => spread::fire(projectile, transform, world, ctx),
        ProjectileKind::Direct | ProjectileKind::Explosive | ProjectileKind::Pellet => {}
    }
}

fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    match projectile.kind() {
        ProjectileKind::Direct => direct::update(projectile, transform, world, ctx),
        ProjectileKind::Homing => homing::update(projectile, transform, world, ctx),
        ProjectileKind::Explosive => explosive::update(projectile, transform, world, ctx),
        ProjectileKind::Pellet => pellet::update(projectile, transform, world, ctx),
        ProjectileKind::Beam => beam::update(projectile, transform, world, ctx),
        // Parent shells destroy themselves on launch.
        ProjectileKind::Spread => {}
    }
}

/// Lifetime elapsed: destroy without damage.
pub fn expire(world: &mut World, entity: Entity, scheduler: &mut Scheduler, log: &mut CombatLog) {
    let Ok((transform, projectile)) = world.query_one_mut::<(&Transform, &mut Projectile)>(entity) else {
        return;
    };
    projectile.expiry = None;
    let beam_active = matches!(&projectile.behavior, Behavior::Beam(beam) if beam.active);
    if projectile.destroy(scheduler) && beam_active {
        log.effects
            .push(EffectEvent::new(EffectKind::BeamEnd, transform.position, transform.rotation()));
    }
}

/// Current position of the locked target, clearing the lock if it died.
pub(crate) fn refresh_target(world: &World, projectile: &mut Projectile) -> Option<Vec3> {
    let target = projectile.target?;
    let position = living_enemy_position(world, target);
    if position.is_none() {
        projectile.target = None;
    }
    position
}

/// Step toward `aim`, face the direction of travel, return the remaining distance.
pub(crate) fn advance_towards(transform: &mut Transform, aim: Vec3, step: f32) -> f32 {
    let heading = (aim - transform.position).normalize_or_zero();
    if heading != Vec3::ZERO {
        transform.forward = heading;
    }
    transform.position = move_towards(transform.position, aim, step);
    transform.position.distance(aim)
}

/// First living enemy touching `position`.
pub(crate) fn first_contact(world: &World, spatial: &dyn SpatialQuery, position: Vec3) -> Option<Entity> {
    spatial
        .nearest(world, position, ENEMY_COLLISION_RADIUS)
        .map(|hit| hit.entity)
}

/// Destroy and damage `victim` once. Later calls on the same projectile do nothing.
pub(crate) fn hit(
    projectile: &mut Projectile,
    transform: &Transform,
    world: &mut World,
    victim: Option<Entity>,
    ctx: &mut ProjectileContext,
) {
    if !projectile.destroy(ctx.scheduler) {
        return;
    }
    if let Some(victim) = victim {
        apply_damage(world, victim, projectile.damage, ctx.log);
    }
    ctx.log
        .effects
        .push(EffectEvent::new(EffectKind::Hit, transform.position, transform.rotation()));
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use super::*;
    use crate::components::Enemy;
    use crate::health::Health;

    pub fn enemy(world: &mut World, position: Vec3, health: f32) -> Entity {
        let path: Arc<[Vec3]> = Vec::new().into();
        world.spawn((Transform::new(position), Enemy::new(path, 0.0, 5, 1), Health::new(health)))
    }

    pub fn walking_enemy(world: &mut World, position: Vec3, goal: Vec3, speed: f32) -> Entity {
        let path: Arc<[Vec3]> = vec![goal].into();
        world.spawn((Transform::new(position), Enemy::new(path, speed, 5, 1), Health::new(100.0)))
    }

    pub fn health_of(world: &World, entity: Entity) -> f32 {
        world.get::<&Health>(entity).map_or(-1.0, |h| h.current_health())
    }

    pub fn projectile(world: &World, entity: Entity) -> Option<Projectile> {
        world.get::<&Projectile>(entity).ok().map(|p| (*p).clone())
    }

    /// Tick the projectile systems `ticks` times at 60 Hz.
    pub fn run_ticks(world: &mut World, scheduler: &mut Scheduler, log: &mut CombatLog, ticks: usize) {
        use crate::spatial::LinearScan;
        let dt = 1.0 / 60.0;
        let mut now = 0.0;
        for _ in 0..ticks {
            while let Some(task) = scheduler.pop_due(now) {
                match task {
                    crate::scheduler::Task::ExpireProjectile(e) => expire(world, e, scheduler, log),
                    crate::scheduler::Task::BeamDamage(e) => {
                        beam::damage_tick(world, e, now, scheduler, &LinearScan, log)
                    }
                    _ => {}
                }
            }
            crate::systems::movement::run(world, dt as f32);
            let mut ctx = ProjectileContext {
                now,
                dt: dt as f32,
                scheduler: &mut *scheduler,
                spatial: &LinearScan,
                log: &mut *log,
            };
            run(world, &mut ctx);
            now += dt;
        }
    }
}
