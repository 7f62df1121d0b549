//! Proximity queries over living enemies.
//!
//! Stands in for physics overlap tests. Dead or despawning enemies are
//! never returned, so every caller gets liveness filtering for free.

use glam::Vec3;
use hecs::{Entity, World};

use dice_defense_core::types::Transform;

use crate::components::Enemy;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyEnemy {
    pub entity: Entity,
    pub position: Vec3,
    pub distance: f32,
}

pub trait SpatialQuery: Send {
    /// Living enemies within `radius` of `center`, nearest first.
    fn query_nearby(&self, world: &World, center: Vec3, radius: f32) -> Vec<NearbyEnemy>;

    /// Living enemies within `radius` of the segment `start..end`, nearest to `start` first.
    fn query_segment(&self, world: &World, start: Vec3, end: Vec3, radius: f32) -> Vec<NearbyEnemy>;

    fn nearest(&self, world: &World, center: Vec3, radius: f32) -> Option<NearbyEnemy> {
        self.query_nearby(world, center, radius).into_iter().next()
    }
}

/// Brute-force scan over every enemy in the world.
#[derive(Debug, Clone, Copy, Default)]
pub struct LinearScan;

impl SpatialQuery for LinearScan {
    fn query_nearby(&self, world: &World, center: Vec3, radius: f32) -> Vec<NearbyEnemy> {
        let mut hits: Vec<NearbyEnemy> = world
            .query::<(&Transform, &Enemy)>()
            .iter()
            .filter(|(_, (_, enemy))| enemy.is_alive())
            .filter_map(|(entity, (transform, _))| {
                let distance = transform.position.distance(center);
                (distance <= radius).then_some(NearbyEnemy {
                    entity,
                    position: transform.position,
                    distance,
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }

    fn query_segment(&self, world: &World, start: Vec3, end: Vec3, radius: f32) -> Vec<NearbyEnemy> {
        let mut hits: Vec<NearbyEnemy> = world
            .query::<(&Transform, &Enemy)>()
            .iter()
            .filter(|(_, (_, enemy))| enemy.is_alive())
            .filter_map(|(entity, (transform, _))| {
                let position = transform.position;
                (distance_to_segment(position, start, end) <= radius).then_some(NearbyEnemy {
                    entity,
                    position,
                    distance: position.distance(start),
                })
            })
            .collect();
        hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
        hits
    }
}

/// Shortest distance from `point` to the segment `start..end`.
pub fn distance_to_segment(point: Vec3, start: Vec3, end: Vec3) -> f32 {
    let segment = end - start;
    let length_sq = segment.length_squared();
    if length_sq <= f32::EPSILON {
        return point.distance(start);
    }
    let t = ((point - start).dot(segment) / length_sq).clamp(0.0, 1.0);
    point.distance(start + segment * t)
}

/// Position of `entity` if it is an enemy that is still alive.
pub fn living_enemy_position(world: &World, entity: Entity) -> Option<Vec3> {
    let mut query = world.query_one::<(&Transform, &Enemy)>(entity).ok()?;
    let (transform, enemy) = query.get()?;
    enemy.is_alive().then_some(transform.position)
}
