//! Enemy path following.

use glam::Vec3;
use hecs::{Entity, World};

use dice_defense_core::constants::WAYPOINT_REACHED_EPSILON;
use dice_defense_core::enums::EnemyState;
use dice_defense_core::types::Transform;

use crate::components::Enemy;
use crate::guidance::move_towards;

/// Advance every living enemy along its path by `dt` seconds.
///
/// Enemies that pass their final waypoint switch to `ReachedEnd` and are
/// returned with the damage they deal to the base.
pub fn run(world: &mut World, dt: f32) -> Vec<(Entity, i32)> {
    let mut reached_end = Vec::new();
    for (entity, (transform, enemy)) in world.query_mut::<(&mut Transform, &mut Enemy)>() {
        if !enemy.is_alive() {
            continue;
        }
        let Some(waypoint) = enemy.current_waypoint() else {
            continue;
        };
        let position = move_towards(transform.position, waypoint, enemy.move_speed * dt);
        let heading = (waypoint - position).normalize_or_zero();
        if heading != Vec3::ZERO {
            transform.forward = heading;
        }
        transform.position = position;

        if position.distance(waypoint) < WAYPOINT_REACHED_EPSILON {
            enemy.current_waypoint_index += 1;
            if enemy.current_waypoint_index >= enemy.waypoints.len() {
                enemy.state = EnemyState::ReachedEnd;
                reached_end.push((entity, enemy.damage_to_base));
            }
        }
    }
    reached_end
}
