//! Snapshot system: queries the ECS world and builds a complete GameStateSnapshot.
//!
//! Read-only apart from draining the event buffers handed in.

use hecs::World;

use dice_defense_core::enums::*;
use dice_defense_core::events::{EffectEvent, GameEvent};
use dice_defense_core::state::*;
use dice_defense_core::types::{SimTime, Transform};

use crate::components::{Enemy, Tower};
use crate::game_manager::GameManager;
use crate::health::Health;
use crate::projectile::{Behavior, Projectile};

use super::wave_spawner::WaveManager;

pub fn build_snapshot(
    world: &World,
    time: &SimTime,
    time_scale: f64,
    game: &GameManager,
    waves: &WaveManager,
    events: Vec<GameEvent>,
    effects: Vec<EffectEvent>,
) -> GameStateSnapshot {
    GameStateSnapshot {
        time: *time,
        phase: game.phase(),
        time_scale,
        economy: EconomyView {
            money: game.money(),
            lives: game.lives(),
            enemies_killed: game.enemies_killed(),
            game_over: game.is_game_over(),
            game_won: game.is_game_won(),
            paused: game.is_paused(),
        },
        wave: build_wave(waves),
        enemies: build_enemies(world),
        towers: build_towers(world),
        projectiles: build_projectiles(world),
        events,
        effects,
    }
}

fn build_wave(waves: &WaveManager) -> WaveView {
    WaveView {
        current_wave: waves.current_wave_number(),
        total_waves: waves.total_waves(),
        phase: waves.phase(),
        in_progress: waves.is_wave_in_progress(),
        enemies_remaining: waves.enemies_remaining(),
        enemies_alive: waves.enemies_alive(),
        spawn_progress: waves.wave_progress(),
        completion_progress: waves.completion_progress(),
    }
}

fn build_enemies(world: &World) -> Vec<EnemyView> {
    let mut enemies: Vec<EnemyView> = world
        .query::<(&Transform, &Enemy, &Health)>()
        .iter()
        .map(|(entity, (transform, enemy, health))| EnemyView {
            id: entity.to_bits().get(),
            position: transform.position,
            state: enemy.state,
            health: health.current_health(),
            max_health: health.max_health(),
            waypoint_index: enemy.current_waypoint_index,
        })
        .collect();
    enemies.sort_by_key(|e| e.id);
    enemies
}

fn build_towers(world: &World) -> Vec<TowerView> {
    let mut towers: Vec<TowerView> = world
        .query::<(&Transform, &Tower)>()
        .iter()
        .map(|(entity, (transform, tower))| {
            let stats = tower.effective_stats();
            TowerView {
                id: entity.to_bits().get(),
                tower_type: tower.tower_type,
                position: transform.position,
                damage: stats.damage,
                range: stats.range,
                fire_rate: stats.fire_rate,
                disabled: !tower.can_fire(),
                target: tower.current_target.map(|t| t.to_bits().get()),
            }
        })
        .collect();
    towers.sort_by_key(|t| t.id);
    towers
}

fn build_projectiles(world: &World) -> Vec<ProjectileView> {
    let mut projectiles: Vec<ProjectileView> = world
        .query::<(&Transform, &Projectile)>()
        .iter()
        .filter(|(_, (_, projectile))| !projectile.is_destroyed)
        .map(|(entity, (transform, projectile))| ProjectileView {
            id: entity.to_bits().get(),
            kind: projectile.kind(),
            position: transform.position,
            forward: transform.forward,
            target: projectile.target.map(|t| t.to_bits().get()),
            beam: match &projectile.behavior {
                Behavior::Beam(beam) if beam.active => Some((beam.beam_start, beam.beam_end)),
                _ => None,
            },
        })
        .collect();
    projectiles.sort_by_key(|p| p.id);
    projectiles
}
