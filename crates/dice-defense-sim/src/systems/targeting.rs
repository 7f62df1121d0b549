//! Tower target acquisition on a fixed scan cadence.

use hecs::{Entity, World};

use dice_defense_core::types::Transform;

use crate::components::Tower;
use crate::spatial::{NearbyEnemy, SpatialQuery};

/// Closest candidate; ties keep the first one found.
pub fn select_closest(candidates: &[NearbyEnemy]) -> Option<Entity> {
    candidates
        .iter()
        .fold(None::<&NearbyEnemy>, |best, c| match best {
            Some(b) if b.distance <= c.distance => Some(b),
            _ => Some(c),
        })
        .map(|c| c.entity)
}

/// Rescan one tower's surroundings and retarget the closest living enemy.
///
/// Returns false if `tower` no longer exists, ending its scan cadence.
pub fn scan(world: &mut World, tower: Entity, spatial: &dyn SpatialQuery) -> bool {
    let (position, range) = {
        let Ok(mut query) = world.query_one::<(&Transform, &Tower)>(tower) else {
            return false;
        };
        let Some((transform, tower)) = query.get() else {
            return false;
        };
        (transform.position, tower.effective_stats().range)
    };
    let in_range = spatial.query_nearby(world, position, range);
    let target = select_closest(&in_range);
    if let Ok(tower) = world.query_one_mut::<&mut Tower>(tower) {
        tower.current_target = target;
    }
    true
}
