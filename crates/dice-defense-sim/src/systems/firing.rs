//! Tower firing: cooldown gating, range revalidation and projectile launch.

use glam::Vec3;
use hecs::{Entity, World};

use dice_defense_core::constants::FIRE_POINT_HEIGHT;
use dice_defense_core::events::GameEvent;
use dice_defense_core::types::Transform;

use crate::components::Tower;
use crate::projectile::Projectile;
use crate::scheduler::Scheduler;
use crate::spatial::living_enemy_position;
use crate::world_setup;

use super::damage::CombatLog;

struct Shot {
    tower: Entity,
    origin: Vec3,
    target: Entity,
    target_position: Vec3,
}

/// Fire every uncovered tower whose target is alive, in range and off cooldown.
pub fn run(world: &mut World, now: f64, scheduler: &mut Scheduler, log: &mut CombatLog) {
    let towers: Vec<Entity> = world.query::<&Tower>().iter().map(|(e, _)| e).collect();
    let mut shots = Vec::new();

    for entity in towers {
        let Ok((transform, tower)) = world.query_one_mut::<(&Transform, &mut Tower)>(entity) else {
            continue;
        };
        let origin = transform.position;
        if !tower.can_fire() {
            continue;
        }
        let Some(target) = tower.current_target else {
            continue;
        };
        // Query borrows end before the liveness lookup.
        let (range, fire_rate, next_fire_time) = {
            let stats = tower.effective_stats();
            (stats.range, stats.fire_rate, tower.next_fire_time)
        };
        let Some(target_position) = living_enemy_position(world, target) else {
            clear_target(world, entity);
            continue;
        };
        if origin.distance(target_position) > range {
            clear_target(world, entity);
            continue;
        }
        if now < next_fire_time || fire_rate <= 0.0 {
            continue;
        }
        if let Ok(tower) = world.query_one_mut::<&mut Tower>(entity) {
            tower.next_fire_time = now + 1.0 / f64::from(fire_rate);
        }
        shots.push(Shot {
            tower: entity,
            origin,
            target,
            target_position,
        });
    }

    for shot in shots {
        fire(world, now, scheduler, log, &shot);
    }
}

fn clear_target(world: &mut World, tower: Entity) {
    if let Ok(tower) = world.query_one_mut::<&mut Tower>(tower) {
        tower.current_target = None;
    }
}

/// Spawn and configure this tower's projectile. No-op without a projectile mapping.
fn fire(world: &mut World, now: f64, scheduler: &mut Scheduler, log: &mut CombatLog, shot: &Shot) {
    let (spec, damage) = match world.get::<&Tower>(shot.tower) {
        Ok(tower) => (tower.projectile, tower.effective_stats().damage),
        Err(_) => return,
    };
    let Some(spec) = spec else {
        return;
    };
    let muzzle = shot.origin + Vec3::Y * FIRE_POINT_HEIGHT;
    let mut projectile = Projectile::from_spec(&spec);
    projectile.source = Some(shot.tower);
    projectile.configure(Some((shot.target, shot.target_position)), damage);

    world_setup::spawn_projectile(
        world,
        scheduler,
        now,
        Transform::looking(muzzle, shot.target_position - muzzle),
        projectile,
    );
    log.events.push(GameEvent::ProjectileFired {
        tower_id: shot.tower.to_bits().get(),
        kind: spec.kind(),
    });
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use dice_defense_core::enums::{ProjectileKind, TowerType};

    use super::*;
    use crate::components::{Enemy, TowerStats};
    use crate::health::Health;
    use crate::projectile::ProjectileSpec;

    fn setup(range: f32, enemy_at: Vec3) -> (World, Entity, Entity) {
        let mut world = World::new();
        let path: Arc<[Vec3]> = Vec::new().into();
        let enemy = world.spawn((Transform::new(enemy_at), Enemy::new(path, 1.0, 1, 1), Health::new(50.0)));
        let stats = TowerStats {
            damage: 12.0,
            range,
            fire_rate: 2.0,
        };
        let mut tower = Tower::new(TowerType::D6, stats, 10, Some(ProjectileSpec::for_tower(TowerType::D6)));
        tower.current_target = Some(enemy);
        let tower = world.spawn((Transform::new(Vec3::ZERO), tower));
        (world, tower, enemy)
    }

    fn projectiles(world: &World) -> Vec<Projectile> {
        world.query::<&Projectile>().iter().map(|(_, p)| p.clone()).collect()
    }

    #[test]
    fn test_fires_and_respects_cooldown() {
        let (mut world, tower, enemy) = setup(5.0, Vec3::new(0.0, 0.0, 3.0));
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();

        run(&mut world, 0.0, &mut scheduler, &mut log);
        let shots = projectiles(&world);
        assert_eq!(shots.len(), 1);
        assert_eq!(shots[0].target, Some(enemy));
        assert_eq!(shots[0].damage, 12.0);
        assert_eq!(shots[0].source, Some(tower));
        assert_eq!(
            log.events,
            vec![GameEvent::ProjectileFired {
                tower_id: tower.to_bits().get(),
                kind: ProjectileKind::Direct,
            }]
        );

        run(&mut world, 0.25, &mut scheduler, &mut log);
        assert_eq!(projectiles(&world).len(), 1, "2 shots/s means 0.5 s cooldown");
        run(&mut world, 0.5, &mut scheduler, &mut log);
        assert_eq!(projectiles(&world).len(), 2);
    }

    #[test]
    fn test_out_of_range_target_is_cleared() {
        let (mut world, tower, _) = setup(2.0, Vec3::new(0.0, 0.0, 3.0));
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        run(&mut world, 0.0, &mut scheduler, &mut log);
        assert!(projectiles(&world).is_empty());
        assert_eq!(world.get::<&Tower>(tower).unwrap().current_target, None);
    }

    #[test]
    fn test_covered_or_unmapped_tower_does_not_fire() {
        let (mut world, tower, _) = setup(5.0, Vec3::new(0.0, 0.0, 3.0));
        let mut scheduler = Scheduler::new();
        let mut log = CombatLog::default();
        world.get::<&mut Tower>(tower).unwrap().covered = true;
        run(&mut world, 0.0, &mut scheduler, &mut log);
        assert!(projectiles(&world).is_empty());

        {
            let mut t = world.get::<&mut Tower>(tower).unwrap();
            t.covered = false;
            t.projectile = None;
        }
        run(&mut world, 0.0, &mut scheduler, &mut log);
        assert!(projectiles(&world).is_empty(), "missing projectile mapping is a no-op");
    }
}
