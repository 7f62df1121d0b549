//! Wave manager: timed spawning, live-enemy roster and completion polling.
//!
//! Per wave: `Idle -> Spawning -> AwaitingCompletion -> Completed`.
//! Spawning, completion polling and auto-advance are scheduler tasks,
//! so pausing the clock pauses the wave too.

use std::sync::Arc;

use glam::Vec3;
use hecs::{Entity, World};
use tracing::{debug, info, warn};

use dice_defense_core::constants::WAVE_POLL_INTERVAL_SECS;
use dice_defense_core::enums::WavePhase;

use crate::components::Enemy;
use crate::game_manager::GameManager;
use crate::scenario::WaveConfig;
use crate::scheduler::{Scheduler, Task, TaskId};
use crate::world_setup;

use super::damage::CombatLog;

#[derive(Debug)]
pub struct WaveManager {
    waves: Vec<WaveConfig>,
    spawn_point: Vec3,
    path: Arc<[Vec3]>,
    auto_start: bool,
    current_wave_index: Option<usize>,
    wave_in_progress: bool,
    phase: WavePhase,
    enemies_remaining: u32,
    enemies_alive: u32,
    active_enemies: Vec<Entity>,
    spawn_task: Option<TaskId>,
    poll_task: Option<TaskId>,
    next_wave_task: Option<TaskId>,
}

impl WaveManager {
    pub fn new(waves: Vec<WaveConfig>, spawn_point: Vec3, path: Arc<[Vec3]>, auto_start: bool) -> Self {
        if waves.is_empty() {
            warn!("wave manager has no waves configured");
        }
        Self {
            waves,
            spawn_point,
            path,
            auto_start,
            current_wave_index: None,
            wave_in_progress: false,
            phase: WavePhase::Idle,
            enemies_remaining: 0,
            enemies_alive: 0,
            active_enemies: Vec::new(),
            spawn_task: None,
            poll_task: None,
            next_wave_task: None,
        }
    }

    pub fn total_waves(&self) -> u32 {
        self.waves.len() as u32
    }

    /// 1-based number of the current (or last) wave; 0 before the first.
    pub fn current_wave_number(&self) -> u32 {
        self.current_wave_index.map_or(0, |i| i as u32 + 1)
    }

    pub fn current_wave(&self) -> Option<&WaveConfig> {
        self.current_wave_index.and_then(|i| self.waves.get(i))
    }

    pub fn is_wave_in_progress(&self) -> bool {
        self.wave_in_progress
    }

    pub fn phase(&self) -> WavePhase {
        self.phase
    }

    pub fn enemies_remaining(&self) -> u32 {
        self.enemies_remaining
    }

    pub fn enemies_alive(&self) -> u32 {
        self.enemies_alive
    }

    pub fn active_enemies(&self) -> &[Entity] {
        &self.active_enemies
    }

    /// Fraction of the running wave already spawned.
    pub fn wave_progress(&self) -> f32 {
        match self.running_count() {
            Some(count) => (count - self.enemies_remaining.min(count)) as f32 / count as f32,
            None => 0.0,
        }
    }

    /// Fraction of the running wave no longer alive (spawned and resolved).
    pub fn completion_progress(&self) -> f32 {
        match self.running_count() {
            Some(count) => {
                let resolved = count.saturating_sub(self.enemies_remaining + self.enemies_alive);
                resolved as f32 / count as f32
            }
            None => 0.0,
        }
    }

    fn running_count(&self) -> Option<u32> {
        if !self.wave_in_progress {
            return None;
        }
        self.current_wave().map(|w| w.enemy_count).filter(|count| *count > 0)
    }

    /// Queue wave 1 after `delay` when auto-advance is on.
    pub fn schedule_first_wave(&mut self, scheduler: &mut Scheduler, now: f64, delay: f64) {
        if self.auto_start && !self.waves.is_empty() {
            self.next_wave_task = Some(scheduler.schedule(now, delay, Task::StartNextWave));
        }
    }

    pub fn start_next_wave(&mut self, scheduler: &mut Scheduler, now: f64, game: &mut GameManager) -> bool {
        let next = self.current_wave_index.map_or(0, |i| i + 1);
        self.start_wave(next as u32 + 1, scheduler, now, game)
    }

    /// Start wave `wave_number` (1-based). Rejected while a wave runs or out of range.
    pub fn start_wave(&mut self, wave_number: u32, scheduler: &mut Scheduler, now: f64, game: &mut GameManager) -> bool {
        if self.wave_in_progress {
            debug!(wave_number, "wave already in progress");
            return false;
        }
        if game.is_game_over() {
            return false;
        }
        let Some(index) = (wave_number as usize).checked_sub(1).filter(|i| *i < self.waves.len()) else {
            debug!(wave_number, total = self.waves.len(), "wave number out of range");
            return false;
        };

        self.cancel_tasks(scheduler);
        if let Some(id) = self.next_wave_task.take() {
            scheduler.cancel(id);
        }
        let enemy_count = self.waves[index].enemy_count;
        self.current_wave_index = Some(index);
        self.wave_in_progress = true;
        self.enemies_remaining = enemy_count;
        self.enemies_alive = 0;
        self.active_enemies.clear();
        if enemy_count > 0 {
            self.phase = WavePhase::Spawning;
            self.spawn_task = Some(scheduler.schedule(now, 0.0, Task::SpawnEnemy));
        } else {
            self.phase = WavePhase::AwaitingCompletion;
            self.poll_task = Some(scheduler.schedule(now, 0.0, Task::PollWaveCompletion));
        }

        info!(wave = wave_number, enemy_count, name = %self.waves[index].name, "wave started");
        game.wave_started(wave_number, enemy_count);
        true
    }

    /// Treat waves up to `wave_number` (1-based) as already played, so the
    /// next start resumes after it. Any running wave is stopped first.
    pub fn restore_wave(&mut self, wave_number: u32, world: &mut World, scheduler: &mut Scheduler) {
        self.stop_current_wave(world, scheduler);
        let played = (wave_number as usize).min(self.waves.len());
        self.current_wave_index = played.checked_sub(1);
        debug!(wave = played, "wave progress restored");
    }

    /// Operator override: start the next wave now, dropping any pending auto-start.
    pub fn force_start_next_wave(&mut self, scheduler: &mut Scheduler, now: f64, game: &mut GameManager) -> bool {
        let next = self.current_wave_index.map_or(0, |i| i + 1);
        if self.wave_in_progress || next >= self.waves.len() {
            debug!("force start rejected");
            return false;
        }
        self.start_next_wave(scheduler, now, game)
    }

    /// Operator override: despawn every tracked enemy and reset the wave.
    pub fn stop_current_wave(&mut self, world: &mut World, scheduler: &mut Scheduler) {
        self.cancel_tasks(scheduler);
        for entity in self.active_enemies.drain(..) {
            let _ = world.despawn(entity);
        }
        self.wave_in_progress = false;
        self.phase = WavePhase::Idle;
        self.enemies_remaining = 0;
        self.enemies_alive = 0;
    }

    fn cancel_tasks(&mut self, scheduler: &mut Scheduler) {
        for id in [self.spawn_task.take(), self.poll_task.take()].into_iter().flatten() {
            scheduler.cancel(id);
        }
    }

    /// `Task::SpawnEnemy`: emit one enemy and schedule the next or start polling.
    pub fn spawn_next(&mut self, world: &mut World, scheduler: &mut Scheduler, now: f64, log: &mut CombatLog) {
        self.spawn_task = None;
        if !self.wave_in_progress || self.phase != WavePhase::Spawning || self.enemies_remaining == 0 {
            return;
        }
        let Some(wave) = self.current_wave() else {
            return;
        };
        let template = wave.scaled_enemy();
        let interval = wave.spawn_interval();

        let entity = world_setup::spawn_enemy(world, self.spawn_point, Arc::clone(&self.path), &template, log);
        self.active_enemies.push(entity);
        self.enemies_alive += 1;
        self.enemies_remaining -= 1;

        if self.enemies_remaining > 0 {
            self.spawn_task = Some(scheduler.schedule(now, interval, Task::SpawnEnemy));
        } else {
            self.phase = WavePhase::AwaitingCompletion;
            self.poll_task = Some(scheduler.schedule(now, 0.0, Task::PollWaveCompletion));
        }
    }

    /// `Task::PollWaveCompletion`: recount live enemies, complete at zero.
    pub fn poll_completion(&mut self, world: &World, scheduler: &mut Scheduler, now: f64, game: &mut GameManager) {
        self.poll_task = None;
        if self.phase != WavePhase::AwaitingCompletion {
            return;
        }
        self.active_enemies.retain(|entity| {
            world
                .get::<&Enemy>(*entity)
                .map(|enemy| enemy.is_alive())
                .unwrap_or(false)
        });
        self.enemies_alive = self.active_enemies.len() as u32;
        if self.enemies_alive == 0 {
            self.complete(scheduler, now, game);
        } else {
            self.poll_task = Some(scheduler.schedule(now, WAVE_POLL_INTERVAL_SECS, Task::PollWaveCompletion));
        }
    }

    fn complete(&mut self, scheduler: &mut Scheduler, now: f64, game: &mut GameManager) {
        self.wave_in_progress = false;
        self.phase = WavePhase::Completed;
        let wave_number = self.current_wave_number();
        info!(wave = wave_number, "wave completed");
        game.wave_completed();

        let more_waves = (wave_number as usize) < self.waves.len();
        if self.auto_start && more_waves && !game.is_game_over() {
            let delay = self.current_wave().map_or(0.0, |w| w.time_between_waves);
            self.next_wave_task = Some(scheduler.schedule(now, delay, Task::StartNextWave));
        }
    }

    /// A tracked enemy was killed.
    pub fn on_enemy_death(&mut self, entity: Entity) {
        self.forget(entity);
    }

    /// A tracked enemy walked off the end of the path.
    pub fn on_enemy_left(&mut self, entity: Entity) {
        self.forget(entity);
    }

    fn forget(&mut self, entity: Entity) {
        if let Some(i) = self.active_enemies.iter().position(|e| *e == entity) {
            self.active_enemies.swap_remove(i);
            self.enemies_alive = self.enemies_alive.saturating_sub(1);
        }
    }
}
