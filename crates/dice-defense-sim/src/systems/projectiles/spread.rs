//! Shotgun shell that splits into a horizontal fan of pellets on launch.

use glam::{Quat, Vec3};
use hecs::World;

use dice_defense_core::types::Transform;

use crate::projectile::{Behavior, Projectile};
use crate::world_setup;

use super::{refresh_target, ProjectileContext};

/// Pellet directions evenly spaced across `spread_angle_deg`, symmetric
/// about `base` and rotated about the vertical axis.
pub fn pellet_directions(base: Vec3, count: u32, spread_angle_deg: f32) -> Vec<Vec3> {
    let half = spread_angle_deg / 2.0;
    (0..count)
        .map(|i| {
            let offset = if count > 1 {
                -half + spread_angle_deg * i as f32 / (count - 1) as f32
            } else {
                0.0
            };
            Quat::from_rotation_y(offset.to_radians()) * base
        })
        .collect()
}

/// Spawn the pellets and destroy the shell. Runs once.
pub(super) fn fire(projectile: &mut Projectile, transform: &Transform, world: &mut World, ctx: &mut ProjectileContext) {
    let params = match &mut projectile.behavior {
        Behavior::Spread(shell) if !shell.has_fired => {
            shell.has_fired = true;
            shell.params
        }
        _ => return,
    };

    let origin = transform.position;
    let base = refresh_target(world, projectile)
        .or(projectile.target_position)
        .and_then(|aim| (aim - origin).try_normalize())
        .unwrap_or(transform.forward);

    let pellet_damage = projectile.damage * params.pellet_damage_multiplier;
    for direction in pellet_directions(base, params.pellet_count, params.spread_angle_deg) {
        let mut pellet = Projectile::pellet(params.pellet_speed, pellet_damage, params.pellet_lifetime);
        pellet.source = projectile.source;
        world_setup::spawn_projectile(
            world,
            ctx.scheduler,
            ctx.now,
            Transform::looking(origin, direction),
            pellet,
        );
    }
    projectile.destroy(ctx.scheduler);
}

#[cfg(test)]
mod tests {
    use dice_defense_core::enums::{ProjectileKind, TowerType};

    use super::super::test_support::*;
    use crate::projectile::ProjectileSpec;
    use crate::scheduler::Scheduler;
    use crate::systems::damage::CombatLog;
    use crate::world_setup::spawn_projectile;

    use super::*;

    #[test]
    fn test_five_pellets_symmetric_fan() {
        let dirs = pellet_directions(Vec3::Z, 5, 30.0);
        assert_eq!(dirs.len(), 5);
        assert!((dirs[2] - Vec3::Z).length() < 1e-6, "middle pellet on the base direction");

        let signed = |d: Vec3| d.x.atan2(d.z).to_degrees();
        let angles: Vec<f32> = dirs.iter().map(|d| signed(*d)).collect();
        for pair in angles.windows(2) {
            assert!(((pair[1] - pair[0]).abs() - 7.5).abs() < 1e-3, "uneven spacing {angles:?}");
        }
        for i in 0..5 {
            assert!((angles[i] + angles[4 - i]).abs() < 1e-3, "asymmetric fan {angles:?}");
            assert!(dirs[i].y.abs() < 1e-6, "fan stays horizontal");
        }
        assert_eq!(pellet_directions(Vec3::X, 1, 30.0), vec![Vec3::X]);
        assert!(pellet_directions(Vec3::X, 0, 30.0).is_empty());
    }

    #[test]
    fn test_shell_splits_and_pellets_hit() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        let target_pos = Vec3::new(4.0, 0.0, 0.0);
        let target = enemy(&mut world, target_pos, 100.0);

        let mut shell = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D12));
        shell.configure(Some((target, target_pos)), 50.0);
        // Facing away from the target: the fan still centres on the target.
        let entity = spawn_projectile(&mut world, &mut scheduler, 0.0, Transform::looking(Vec3::ZERO, Vec3::Z), shell);

        run_ticks(&mut world, &mut scheduler, &mut log, 1);
        assert!(projectile(&world, entity).unwrap().is_destroyed);
        let pellets = world
            .query::<&Projectile>()
            .iter()
            .filter(|(_, p)| p.kind() == ProjectileKind::Pellet)
            .count();
        assert_eq!(pellets, 5);

        run_ticks(&mut world, &mut scheduler, &mut log, 60);
        // Only the middle pellet passes within contact range at 4 m; 50 * 0.3 each.
        let taken = 100.0 - health_of(&world, target);
        assert!((taken - 15.0).abs() < 1e-3, "expected one pellet hit, took {taken}");
    }
}
