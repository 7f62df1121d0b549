//! Straight shot re-aimed every tick, optionally leading its target.

use hecs::World;

use dice_defense_core::constants::PROJECTILE_ARRIVAL_EPSILON;
use dice_defense_core::types::Transform;

use crate::guidance::{estimate_velocity, lead_point};
use crate::projectile::{Behavior, Projectile};

use super::{advance_towards, first_contact, hit, refresh_target, ProjectileContext};

pub(super) fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    let dt = ctx.dt;
    if let Some(current) = refresh_target(world, projectile) {
        let speed = projectile.speed;
        let aim = match &mut projectile.behavior {
            Behavior::Direct(shot) if shot.params.predictive_aiming => {
                shot.target_velocity = estimate_velocity(shot.last_target_position, current, dt);
                shot.last_target_position = current;
                lead_point(
                    transform.position,
                    current,
                    shot.target_velocity,
                    speed,
                    shot.params.prediction_accuracy,
                )
            }
            _ => current,
        };
        projectile.target_position = Some(aim);
    }

    // Untargeted shots wait for their lifetime to run out.
    let Some(aim) = projectile.target_position else {
        return;
    };
    let remaining = advance_towards(transform, aim, projectile.speed * dt);
    if remaining < PROJECTILE_ARRIVAL_EPSILON {
        match projectile.target {
            Some(target) => hit(projectile, transform, world, Some(target), ctx),
            // Lost the target mid-flight: vanish at the last known point.
            None => {
                projectile.destroy(ctx.scheduler);
            }
        }
    } else if let Some(victim) = first_contact(world, ctx.spatial, transform.position) {
        hit(projectile, transform, world, Some(victim), ctx);
    }
}
