//! Shell that detonates once on arrival or contact, with radial falloff.

use hecs::World;

use dice_defense_core::constants::PROJECTILE_ARRIVAL_EPSILON;
use dice_defense_core::enums::EffectKind;
use dice_defense_core::events::EffectEvent;
use dice_defense_core::types::Transform;

use crate::projectile::{Behavior, ExplosiveParams, Projectile};
use crate::systems::damage::apply_damage;

use super::{advance_towards, first_contact, refresh_target, ProjectileContext};

/// Damage dealt at `distance` from the blast centre. Zero beyond the radius.
pub fn explosion_damage(base_damage: f32, distance: f32, params: &ExplosiveParams) -> f32 {
    if params.explosion_radius <= 0.0 || distance > params.explosion_radius {
        return 0.0;
    }
    base_damage * params.falloff.evaluate(distance / params.explosion_radius) * params.explosion_damage_multiplier
}

pub(super) fn update(projectile: &mut Projectile, transform: &mut Transform, world: &mut World, ctx: &mut ProjectileContext) {
    if let Some(current) = refresh_target(world, projectile) {
        projectile.target_position = Some(current);
    }
    let Some(aim) = projectile.target_position else {
        return;
    };
    let remaining = advance_towards(transform, aim, projectile.speed * ctx.dt);
    if remaining < PROJECTILE_ARRIVAL_EPSILON || first_contact(world, ctx.spatial, transform.position).is_some() {
        explode(projectile, transform, world, ctx);
    }
}

fn explode(projectile: &mut Projectile, transform: &Transform, world: &mut World, ctx: &mut ProjectileContext) {
    let Behavior::Explosive(shell) = &projectile.behavior else {
        return;
    };
    let params = shell.params;
    if !projectile.destroy(ctx.scheduler) {
        return;
    }
    let center = transform.position;
    for victim in ctx.spatial.query_nearby(world, center, params.explosion_radius) {
        let amount = explosion_damage(projectile.damage, victim.distance, &params);
        apply_damage(world, victim.entity, amount, ctx.log);
    }
    ctx.log
        .effects
        .push(EffectEvent::new(EffectKind::Explosion, center, transform.rotation()));
}

#[cfg(test)]
mod tests {
    use glam::Vec3;

    use dice_defense_core::enums::TowerType;

    use super::super::test_support::*;
    use crate::projectile::{FalloffCurve, ProjectileSpec};
    use crate::scheduler::Scheduler;
    use crate::systems::damage::CombatLog;
    use crate::world_setup::spawn_projectile;

    use super::*;

    #[test]
    fn test_explosion_damage_formula() {
        let params = ExplosiveParams {
            explosion_radius: 4.0,
            explosion_damage_multiplier: 0.5,
            falloff: FalloffCurve {
                at_center: 1.0,
                at_edge: 0.2,
            },
        };
        assert_eq!(explosion_damage(100.0, 0.0, &params), 50.0);
        assert!((explosion_damage(100.0, 2.0, &params) - 30.0).abs() < 1e-4);
        assert!((explosion_damage(100.0, 4.0, &params) - 10.0).abs() < 1e-4);
        assert_eq!(explosion_damage(100.0, 4.01, &params), 0.0);
    }

    #[test]
    fn test_detonates_once_with_falloff() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        let target_pos = Vec3::new(0.0, 0.0, 5.0);
        let target = enemy(&mut world, target_pos, 200.0);
        let bystander = enemy(&mut world, Vec3::new(1.5, 0.0, 5.0), 200.0);
        let outside = enemy(&mut world, Vec3::new(6.0, 0.0, 5.0), 200.0);

        let mut shell = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D8));
        shell.configure(Some((target, target_pos)), 100.0);
        let entity = spawn_projectile(&mut world, &mut scheduler, 0.0, Transform::default(), shell);

        run_ticks(&mut world, &mut scheduler, &mut log, 60);

        assert!(projectile(&world, entity).unwrap().is_destroyed);
        let explosions = log.effects.iter().filter(|e| e.kind == EffectKind::Explosion).count();
        assert_eq!(explosions, 1);

        // Contact at 0.5 m from the target detonates the shell there.
        let blast = log.effects[0].position;
        let params = ExplosiveParams::default();
        for (entity, position) in [(target, target_pos), (bystander, Vec3::new(1.5, 0.0, 5.0))] {
            let expected = 200.0 - explosion_damage(100.0, blast.distance(position), &params);
            assert!(
                (health_of(&world, entity) - expected).abs() < 1e-3,
                "expected {expected}, got {}",
                health_of(&world, entity)
            );
        }
        assert_eq!(health_of(&world, outside), 200.0);
    }
}
