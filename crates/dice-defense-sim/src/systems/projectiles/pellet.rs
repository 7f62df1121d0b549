//! Straight, untargeted spread sub-projectile.

use hecs::World;

use dice_defense_core::types::Transform;

use crate::projectile::Projectile;

use super::{first_contact, hit, ProjectileContext};

pub(super) fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    transform.position += transform.forward * projectile.speed * ctx.dt;
    if let Some(victim) = first_contact(world, ctx.spatial, transform.position) {
        hit(projectile, transform, world, Some(victim), ctx);
    }
}
