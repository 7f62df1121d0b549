//! Simulation engine, the core of the game.
//!
//! `SimulationEngine` owns the hecs ECS world, the task scheduler and the
//! wave and game managers. It processes player commands, runs all systems
//! and produces `GameStateSnapshot`s. Completely headless, enabling
//! deterministic testing.

use std::collections::VecDeque;

use glam::Vec3;
use hecs::{Entity, World};
use tracing::{debug, warn};

use dice_defense_core::commands::PlayerCommand;
use dice_defense_core::constants::{DT, MAX_TIME_SCALE, TOWER_SCAN_INTERVAL_SECS};
use dice_defense_core::enums::TowerType;
use dice_defense_core::events::GameEvent;
use dice_defense_core::state::GameStateSnapshot;
use dice_defense_core::types::SimTime;

use crate::components::Tower;
use crate::game_manager::{GameData, GameManager};
use crate::scenario::{LevelConfig, TowerTemplate};
use crate::scheduler::{Scheduler, Task};
use crate::spatial::{LinearScan, SpatialQuery};
use crate::systems;
use crate::systems::damage::CombatLog;
use crate::systems::projectiles::ProjectileContext;
use crate::systems::wave_spawner::WaveManager;
use crate::world_setup;

/// Configuration for starting a new simulation.
#[derive(Debug, Clone, Copy)]
pub struct SimConfig {
    /// Initial time scale (1.0 = normal).
    pub time_scale: f64,
    /// Start each wave automatically once the previous one clears.
    pub auto_start_waves: bool,
    /// Delay before wave 1 when auto-start is on.
    pub first_wave_delay_secs: f64,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            time_scale: 1.0,
            auto_start_waves: true,
            first_wave_delay_secs: dice_defense_core::constants::FIRST_WAVE_DELAY_SECS,
        }
    }
}

/// The simulation engine. Owns the ECS world and all sim state.
pub struct SimulationEngine {
    config: SimConfig,
    level: LevelConfig,
    world: World,
    time: SimTime,
    time_scale: f64,
    scheduler: Scheduler,
    spatial: Box<dyn SpatialQuery>,
    game: GameManager,
    waves: WaveManager,
    log: CombatLog,
    command_queue: VecDeque<PlayerCommand>,
    despawn_buffer: Vec<Entity>,
}

impl SimulationEngine {
    /// Create a new simulation engine and set up `level`.
    pub fn new(config: SimConfig, level: LevelConfig) -> Self {
        let game = GameManager::new(level.starting_money, level.starting_lives, level.total_waves());
        let waves = Self::wave_manager(&config, &level);
        let mut engine = Self {
            config,
            level,
            world: World::new(),
            time: SimTime::default(),
            time_scale: config.time_scale.clamp(0.0, MAX_TIME_SCALE),
            scheduler: Scheduler::new(),
            spatial: Box::new(LinearScan),
            game,
            waves,
            log: CombatLog::default(),
            command_queue: VecDeque::new(),
            despawn_buffer: Vec::new(),
        };
        engine.setup_level();
        engine
    }

    /// Replace the proximity query backend.
    pub fn with_spatial_query(mut self, spatial: Box<dyn SpatialQuery>) -> Self {
        self.spatial = spatial;
        self
    }

    fn wave_manager(config: &SimConfig, level: &LevelConfig) -> WaveManager {
        WaveManager::new(level.waves.clone(), level.spawn_point, level.path(), config.auto_start_waves)
    }

    /// Fresh world with the level's initial towers and the first-wave timer.
    fn setup_level(&mut self) {
        self.world.clear();
        self.scheduler.clear();
        self.log.clear();
        self.despawn_buffer.clear();
        self.time = SimTime::default();
        self.waves = Self::wave_manager(&self.config, &self.level);
        self.waves
            .schedule_first_wave(&mut self.scheduler, 0.0, self.config.first_wave_delay_secs);

        for placement in self.level.initial_towers.clone() {
            match self.level.tower_template(placement.tower_type).copied() {
                Some(template) => {
                    self.spawn_tower(&template, placement.position);
                }
                None => warn!(tower_type = placement.tower_type.label(), "initial tower type not in catalogue"),
            }
        }
    }

    /// Queue a player command for processing at the next tick boundary.
    pub fn queue_command(&mut self, command: PlayerCommand) {
        self.command_queue.push_back(command);
    }

    /// Queue multiple commands.
    pub fn queue_commands(&mut self, commands: impl IntoIterator<Item = PlayerCommand>) {
        self.command_queue.extend(commands);
    }

    /// Advance the simulation by one fixed tick and return the resulting snapshot.
    pub fn tick(&mut self) -> GameStateSnapshot {
        self.step(DT)
    }

    /// Advance by `real_dt` seconds of wall time, scaled by the effective time scale.
    pub fn step(&mut self, real_dt: f64) -> GameStateSnapshot {
        self.process_commands();

        let dt = real_dt.max(0.0) * self.effective_time_scale();
        if dt > 0.0 {
            self.run_systems(dt);
            self.time.advance(dt);
        }

        let mut events = self.game.drain_events();
        events.append(&mut self.log.events);
        let effects = std::mem::take(&mut self.log.effects);
        systems::snapshot::build_snapshot(
            &self.world,
            &self.time,
            self.effective_time_scale(),
            &self.game,
            &self.waves,
            events,
            effects,
        )
    }

    /// Player time scale times the game's own multiplier (0 while paused or ended).
    pub fn effective_time_scale(&self) -> f64 {
        self.time_scale * self.game.time_scale()
    }

    /// Get the current simulation time.
    pub fn time(&self) -> SimTime {
        self.time
    }

    /// Get the player-selected time scale.
    pub fn time_scale(&self) -> f64 {
        self.time_scale
    }

    /// Get a read-only reference to the ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn game(&self) -> &GameManager {
        &self.game
    }

    pub fn waves(&self) -> &WaveManager {
        &self.waves
    }

    pub fn level(&self) -> &LevelConfig {
        &self.level
    }

    /// Restore saved economy and wave progress. The next wave started is
    /// the one after the saved wave. Ignored once the game has ended.
    pub fn load_game_data(&mut self, data: GameData) -> bool {
        if !self.game.load_game_data(data) {
            return false;
        }
        self.waves
            .restore_wave(self.game.current_wave(), &mut self.world, &mut self.scheduler);
        true
    }

    /// Spawn an enemy on the level path, outside of any wave (for testing).
    #[cfg(test)]
    pub fn spawn_test_enemy(&mut self, position: Vec3, template: &crate::scenario::EnemyTemplate) -> Entity {
        world_setup::spawn_enemy(&mut self.world, position, self.level.path(), template, &mut self.log)
    }

    /// Process all queued commands.
    fn process_commands(&mut self) {
        while let Some(command) = self.command_queue.pop_front() {
            self.handle_command(command);
        }
    }

    /// Handle a single player command.
    fn handle_command(&mut self, command: PlayerCommand) {
        let now = self.time.elapsed_secs;
        match command {
            PlayerCommand::StartNextWave => {
                self.game.start_next_wave(&mut self.waves, &mut self.scheduler, now);
            }
            PlayerCommand::ForceStartNextWave => {
                if !self.game.is_game_over() {
                    self.waves
                        .force_start_next_wave(&mut self.scheduler, now, &mut self.game);
                }
            }
            PlayerCommand::StopCurrentWave => {
                self.waves.stop_current_wave(&mut self.world, &mut self.scheduler);
            }
            PlayerCommand::PlaceTower { tower_type, position } => {
                self.place_tower(tower_type, position);
            }
            PlayerCommand::UpgradeTower { tower_id, upgrade } => {
                if self.game.is_game_over() {
                    return;
                }
                let Some(entity) = Entity::from_bits(tower_id) else {
                    debug!(tower_id, "malformed tower id");
                    return;
                };
                match self.world.query_one_mut::<&mut Tower>(entity) {
                    Ok(tower) => tower.apply_upgrade(upgrade),
                    Err(_) => debug!(tower_id, "upgrade target is not a tower"),
                }
            }
            PlayerCommand::TogglePause => self.game.toggle_pause(),
            PlayerCommand::Pause => self.game.pause(),
            PlayerCommand::Resume => self.game.resume(),
            PlayerCommand::SetTimeScale { scale } => {
                if scale.is_finite() {
                    self.time_scale = scale.clamp(0.0, MAX_TIME_SCALE);
                }
            }
            PlayerCommand::RestartGame => {
                self.game.restart();
                self.setup_level();
            }
        }
    }

    /// Buy a tower from the catalogue. Stacks onto an occupied column.
    fn place_tower(&mut self, tower_type: TowerType, position: Vec3) -> Option<Entity> {
        let Some(template) = self.level.tower_template(tower_type).copied() else {
            warn!(tower_type = tower_type.label(), "no catalogue entry for tower type");
            return None;
        };
        if !self.game.spend_money(template.cost) {
            return None;
        }
        Some(self.spawn_tower(&template, position))
    }

    fn spawn_tower(&mut self, template: &TowerTemplate, position: Vec3) -> Entity {
        let height = systems::stacking::placement_height(&self.world, position);
        let entity = world_setup::spawn_tower(
            &mut self.world,
            &mut self.scheduler,
            self.time.elapsed_secs,
            Vec3::new(position.x, height, position.z),
            template,
        );
        self.log.events.push(GameEvent::TowerPlaced {
            tower_id: entity.to_bits().get(),
            tower_type: template.tower_type,
        });
        entity
    }

    /// Run all systems in order.
    fn run_systems(&mut self, dt: f64) {
        let now = self.time.elapsed_secs;

        // 1. Scheduled tasks, each resumed at its own deadline
        while let Some(deadline) = self.scheduler.next_deadline().filter(|d| *d <= now) {
            let Some(task) = self.scheduler.pop_due(deadline) else {
                break;
            };
            self.run_task(task, deadline);
        }
        // 2. Stacking bonuses and cover
        systems::stacking::run(&mut self.world);
        // 3. Enemy movement; arrivals cost lives
        for (entity, damage) in systems::movement::run(&mut self.world, dt as f32) {
            self.game.take_damage(damage);
            self.log.events.push(GameEvent::EnemyReachedEnd {
                entity_id: entity.to_bits().get(),
                damage,
            });
            self.waves.on_enemy_left(entity);
        }
        // 4. Tower firing
        systems::firing::run(&mut self.world, now, &mut self.scheduler, &mut self.log);
        // 5. Projectile flight and hits
        let mut ctx = ProjectileContext {
            now,
            dt: dt as f32,
            scheduler: &mut self.scheduler,
            spatial: self.spatial.as_ref(),
            log: &mut self.log,
        };
        systems::projectiles::run(&mut self.world, &mut ctx);
        // 6. Rewards for this tick's kills
        systems::death::run(
            &mut self.world,
            now,
            &mut self.scheduler,
            &mut self.log,
            &mut self.game,
            &mut self.waves,
        );
        // 7. Cleanup (arrived enemies, destroyed projectiles)
        systems::cleanup::run(&mut self.world, &mut self.despawn_buffer);
    }

    fn run_task(&mut self, task: Task, now: f64) {
        match task {
            Task::StartNextWave => {
                self.game.start_next_wave(&mut self.waves, &mut self.scheduler, now);
            }
            Task::SpawnEnemy => {
                self.waves
                    .spawn_next(&mut self.world, &mut self.scheduler, now, &mut self.log);
            }
            Task::PollWaveCompletion => {
                self.waves
                    .poll_completion(&self.world, &mut self.scheduler, now, &mut self.game);
            }
            Task::DespawnEnemy(entity) => systems::cleanup::despawn_enemy(&mut self.world, entity),
            Task::ExpireProjectile(entity) => {
                systems::projectiles::expire(&mut self.world, entity, &mut self.scheduler, &mut self.log);
            }
            Task::ScanTargets(tower) => {
                if systems::targeting::scan(&mut self.world, tower, self.spatial.as_ref()) {
                    self.scheduler
                        .schedule(now, TOWER_SCAN_INTERVAL_SECS, Task::ScanTargets(tower));
                }
            }
            Task::BeamDamage(entity) => systems::projectiles::beam::damage_tick(
                &mut self.world,
                entity,
                now,
                &mut self.scheduler,
                self.spatial.as_ref(),
                &mut self.log,
            ),
        }
    }
}
