//! Turn-rate limited seeker that retargets when its target dies.

use hecs::World;

use dice_defense_core::constants::HOMING_ARRIVAL_EPSILON;
use dice_defense_core::types::Transform;

use crate::guidance::steer;
use crate::projectile::{Behavior, Projectile};

use super::{first_contact, hit, refresh_target, ProjectileContext};

pub(super) fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    let dt = ctx.dt;
    let params = match &mut projectile.behavior {
        Behavior::Homing(shot) => {
            shot.homing_timer += dt;
            shot.params
        }
        _ => return,
    };

    let had_aim = projectile.target_position.is_some();
    match refresh_target(world, projectile) {
        Some(current) => projectile.target_position = Some(current),
        None if had_aim => match ctx.spatial.nearest(world, transform.position, params.retarget_radius) {
            Some(found) => projectile.set_target(found.entity, found.position),
            // Nothing left to chase: fly straight until the lifetime ends.
            None => projectile.target_position = None,
        },
        None => {}
    }

    let speed = projectile.speed;
    let locked_aim = projectile.target.and(projectile.target_position);
    if let Behavior::Homing(shot) = &mut projectile.behavior {
        if let Some(aim) = locked_aim {
            if shot.homing_timer >= params.homing_delay {
                let heading = steer(
                    shot.velocity,
                    aim - transform.position,
                    params.max_turn_rate_deg,
                    params.homing_strength,
                    dt,
                );
                shot.velocity = heading * speed;
            }
        }
        transform.position += shot.velocity * dt;
        if let Some(forward) = shot.velocity.try_normalize() {
            transform.forward = forward;
        }
    }

    let arrived = locked_aim.is_some_and(|aim| transform.position.distance(aim) < HOMING_ARRIVAL_EPSILON);
    if arrived {
        let target = projectile.target;
        hit(projectile, transform, world, target, ctx);
    } else if let Some(victim) = first_contact(world, ctx.spatial, transform.position) {
        hit(projectile, transform, world, Some(victim), ctx);
    }
}
