//! Sustained beam that damages everything along its line for a fixed duration.
//!
//! The beam holds the nearest living enemy within its search radius and
//! samples segment damage at `BEAM_TICK_INTERVAL_SECS` through a
//! scheduler task. It ends when the duration runs out or no target
//! remains.

use hecs::{Entity, World};

use dice_defense_core::constants::{BEAM_TICK_INTERVAL_SECS, ENEMY_COLLISION_RADIUS};
use dice_defense_core::enums::EffectKind;
use dice_defense_core::events::EffectEvent;
use dice_defense_core::types::Transform;

use crate::guidance::steer;
use crate::projectile::{Behavior, Projectile};
use crate::scheduler::{Scheduler, Task};
use crate::spatial::SpatialQuery;
use crate::systems::damage::{apply_damage, CombatLog};

use super::{refresh_target, ProjectileContext};

pub(super) fn activate(entity: Entity, projectile: &mut Projectile, transform: &Transform, ctx: &mut ProjectileContext) {
    let speed = projectile.speed;
    let Behavior::Beam(beam) = &mut projectile.behavior else {
        return;
    };
    beam.active = true;
    beam.beam_timer = 0.0;
    beam.velocity = transform.forward * speed;
    beam.beam_start = transform.position;
    beam.beam_end = transform.position;
    beam.damage_task = Some(ctx.scheduler.schedule(ctx.now, 0.0, Task::BeamDamage(entity)));
    ctx.log
        .effects
        .push(EffectEvent::new(EffectKind::BeamStart, transform.position, transform.rotation()));
}

pub(super) fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    let dt = ctx.dt;
    let (search_radius, expired) = match &mut projectile.behavior {
        Behavior::Beam(beam) if beam.active => {
            beam.beam_timer += dt;
            (beam.params.search_radius, beam.beam_timer >= beam.params.beam_duration)
        }
        _ => return,
    };
    if expired {
        end(projectile, transform, ctx);
        return;
    }

    let held = refresh_target(world, projectile).zip(projectile.target);
    let tracked = match held {
        Some((position, entity)) => Some((entity, position)),
        None => ctx
            .spatial
            .nearest(world, transform.position, search_radius)
            .map(|found| (found.entity, found.position)),
    };
    let Some((target, target_position)) = tracked else {
        end(projectile, transform, ctx);
        return;
    };
    projectile.target = Some(target);
    projectile.target_position = Some(target_position);

    let speed = projectile.speed;
    if let Behavior::Beam(beam) = &mut projectile.behavior {
        let heading = steer(
            beam.velocity,
            target_position - transform.position,
            beam.params.max_turn_rate_deg,
            beam.params.homing_strength,
            dt,
        );
        beam.velocity = heading * speed;
        transform.position += beam.velocity * dt;
        if let Some(forward) = beam.velocity.try_normalize() {
            transform.forward = forward;
        }
        beam.beam_start = transform.position;
        beam.beam_end = target_position;
    }
}

fn end(projectile: &mut Projectile, transform: &Transform, ctx: &mut ProjectileContext) {
    if projectile.destroy(ctx.scheduler) {
        ctx.log
            .effects
            .push(EffectEvent::new(EffectKind::BeamEnd, transform.position, transform.rotation()));
    }
}

/// One damage sample along the current beam segment, then re-arm.
pub fn damage_tick(
    world: &mut World,
    entity: Entity,
    now: f64,
    scheduler: &mut Scheduler,
    spatial: &dyn SpatialQuery,
    log: &mut CombatLog,
) {
    let (start, end, radius, amount) = {
        let Ok(projectile) = world.get::<&Projectile>(entity) else {
            return;
        };
        match &projectile.behavior {
            Behavior::Beam(beam) if beam.active && !projectile.is_destroyed => (
                beam.beam_start,
                beam.beam_end,
                ENEMY_COLLISION_RADIUS + beam.params.beam_width * 0.5,
                beam.damage_per_second * BEAM_TICK_INTERVAL_SECS as f32,
            ),
            _ => return,
        }
    };
    for victim in spatial.query_segment(world, start, end, radius) {
        apply_damage(world, victim.entity, amount, log);
    }
    let next = scheduler.schedule(now, BEAM_TICK_INTERVAL_SECS, Task::BeamDamage(entity));
    if let Ok(mut projectile) = world.get::<&mut Projectile>(entity) {
        if let Behavior::Beam(beam) = &mut projectile.behavior {
            beam.damage_task = Some(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use dice_defense_core::enums::TowerType;

    use super::super::test_support::*;
    use crate::projectile::ProjectileSpec;
    use crate::world_setup::spawn_projectile;

    use super::*;

    fn beam_at(world: &mut World, scheduler: &mut Scheduler, target: Entity, total_damage: f32) -> Entity {
        let target_pos = world.get::<&Transform>(target).unwrap().position;
        let mut beam = Projectile::from_spec(&ProjectileSpec {
            speed: 0.0,
            ..ProjectileSpec::for_tower(TowerType::D14)
        });
        beam.configure(Some((target, target_pos)), total_damage);
        spawn_projectile(world, scheduler, 0.0, Transform::looking(Vec3::ZERO, target_pos), beam)
    }

    #[test]
    fn test_beam_damages_everything_on_the_line() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        let far = enemy(&mut world, Vec3::new(0.0, 0.0, 8.0), 1000.0);
        let between = enemy(&mut world, Vec3::new(0.3, 0.0, 4.0), 1000.0);
        let aside = enemy(&mut world, Vec3::new(4.0, 0.0, 4.0), 1000.0);
        let entity = beam_at(&mut world, &mut scheduler, far, 30.0);

        // 1 s of beam: ten samples of 10 dps * 0.1 s.
        run_ticks(&mut world, &mut scheduler, &mut log, 61);

        let dealt_far = 1000.0 - health_of(&world, far);
        let dealt_between = 1000.0 - health_of(&world, between);
        assert!((dealt_far - 10.0).abs() < 1.0 + 1e-3, "far took {dealt_far}");
        assert!((dealt_between - dealt_far).abs() < 1e-3, "enemy in the line takes the same damage");
        assert_eq!(health_of(&world, aside), 1000.0);
        assert!(!projectile(&world, entity).unwrap().is_destroyed);
        let starts = log.effects.iter().filter(|e| e.kind == EffectKind::BeamStart).count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn test_beam_ends_after_duration() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        let target = enemy(&mut world, Vec3::new(0.0, 0.0, 5.0), 1000.0);
        let entity = beam_at(&mut world, &mut scheduler, target, 30.0);

        run_ticks(&mut world, &mut scheduler, &mut log, 200);

        assert!(projectile(&world, entity).unwrap().is_destroyed);
        let dealt = 1000.0 - health_of(&world, target);
        assert!((dealt - 30.0).abs() <= 1.0 + 1e-3, "total budget spent, dealt {dealt}");
        let ends = log.effects.iter().filter(|e| e.kind == EffectKind::BeamEnd).count();
        assert_eq!(ends, 1, "end effect exactly once");
        assert!(scheduler.is_empty(), "damage task cancelled");
    }

    #[test]
    fn test_beam_retargets_then_ends_when_nothing_left() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        let first = enemy(&mut world, Vec3::new(0.0, 0.0, 5.0), 1000.0);
        let second = enemy(&mut world, Vec3::new(5.0, 0.0, 0.0), 1000.0);
        let entity = beam_at(&mut world, &mut scheduler, first, 30.0);

        run_ticks(&mut world, &mut scheduler, &mut log, 2);
        world.despawn(first).unwrap();
        run_ticks(&mut world, &mut scheduler, &mut log, 1);
        assert_eq!(projectile(&world, entity).unwrap().target, Some(second));

        world.despawn(second).unwrap();
        run_ticks(&mut world, &mut scheduler, &mut log, 1);
        assert!(projectile(&world, entity).unwrap().is_destroyed, "no target left ends the beam");
    }
}
