//! Game loop thread: runs the simulation engine at 60Hz and publishes snapshots.
//!
//! The engine is moved into this thread and owned there. Commands arrive
//! via `mpsc` channel; each snapshot is stored in shared state for polling.
//! Without `realtime` the loop runs as fast as it can.

use std::io;
use std::sync::mpsc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use tracing::{debug, info};

use dice_defense_core::commands::PlayerCommand;
use dice_defense_core::constants::TICK_RATE;
use dice_defense_core::events::GameEvent;
use dice_defense_core::state::GameStateSnapshot;
use dice_defense_sim::SimulationEngine;

use crate::state::{GameLoopCommand, SharedSnapshot};

/// Nominal duration of one tick at 1x speed.
const TICK_DURATION: Duration = Duration::from_nanos(1_000_000_000 / TICK_RATE as u64);

#[derive(Debug, Clone, Copy)]
pub struct LoopSettings {
    /// Stop after this many ticks even if the game is still running.
    pub max_ticks: u64,
    /// Pace ticks to wall-clock time.
    pub realtime: bool,
    /// Request the next wave whenever none is running.
    pub drive_waves: bool,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            max_ticks: 36_000,
            realtime: false,
            drive_waves: false,
        }
    }
}

/// Why the loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    GameEnded,
    TickLimit,
    Shutdown,
}

#[derive(Debug, Clone, Copy)]
pub struct LoopReport {
    pub ticks: u64,
    pub exit: LoopExit,
}

/// Spawns the game loop in a new thread.
///
/// Returns the command sender and the join handle yielding the report.
pub fn spawn_game_loop(
    engine: SimulationEngine,
    settings: LoopSettings,
    latest_snapshot: SharedSnapshot,
) -> io::Result<(mpsc::Sender<GameLoopCommand>, JoinHandle<LoopReport>)> {
    let (cmd_tx, cmd_rx) = mpsc::channel::<GameLoopCommand>();

    let handle = std::thread::Builder::new()
        .name("dice-defense-game-loop".into())
        .spawn(move || run_game_loop(engine, settings, cmd_rx, &latest_snapshot))?;

    Ok((cmd_tx, handle))
}

/// The game loop. Runs until the game ends, the tick limit, a Shutdown
/// command or channel disconnect.
pub fn run_game_loop(
    mut engine: SimulationEngine,
    settings: LoopSettings,
    cmd_rx: mpsc::Receiver<GameLoopCommand>,
    latest_snapshot: &std::sync::Mutex<Option<GameStateSnapshot>>,
) -> LoopReport {
    let mut next_tick_time = Instant::now();
    let mut ticks = 0;
    let mut disconnected = false;

    let exit = loop {
        // 1. Drain all pending commands
        let mut shutdown = false;
        while !disconnected {
            match cmd_rx.try_recv() {
                Ok(GameLoopCommand::PlayerCommand(cmd)) => engine.queue_command(cmd),
                Ok(GameLoopCommand::Shutdown) => {
                    shutdown = true;
                    break;
                }
                Err(mpsc::TryRecvError::Empty) => break,
                // The runner may drop its sender and let the game play out.
                Err(mpsc::TryRecvError::Disconnected) => disconnected = true,
            }
        }
        if shutdown {
            break LoopExit::Shutdown;
        }

        // 2. Operator stand-in for manual wave control
        if settings.drive_waves && !engine.waves().is_wave_in_progress() && !engine.game().is_game_over() {
            engine.queue_command(PlayerCommand::StartNextWave);
        }

        // 3. Advance one tick (engine handles pause semantics internally)
        let snapshot = engine.tick();
        ticks += 1;
        log_progress(&snapshot);
        let ended = snapshot.economy.game_over;

        // 4. Store latest snapshot for polling
        if let Ok(mut lock) = latest_snapshot.lock() {
            *lock = Some(snapshot);
        }

        if ended {
            break LoopExit::GameEnded;
        }
        if ticks >= settings.max_ticks {
            break LoopExit::TickLimit;
        }

        // 5. Sleep until next tick, adjusting for time_scale
        if settings.realtime {
            let time_scale = engine.time_scale();
            let effective_tick_duration = if time_scale > 0.001 {
                TICK_DURATION.div_f64(time_scale)
            } else {
                TICK_DURATION
            };

            next_tick_time += effective_tick_duration;
            let now = Instant::now();
            if next_tick_time > now {
                std::thread::sleep(next_tick_time - now);
            } else if now - next_tick_time > effective_tick_duration * 2 {
                // Too far behind, reset to avoid catch-up spiral
                next_tick_time = now;
            }
        }
    };

    info!(ticks, ?exit, "game loop stopped");
    LoopReport { ticks, exit }
}

fn log_progress(snapshot: &GameStateSnapshot) {
    for event in &snapshot.events {
        match event {
            GameEvent::WaveStarted { wave, enemy_count } => {
                info!(tick = snapshot.time.tick, wave, enemy_count, "wave started");
            }
            GameEvent::WaveCompleted { wave } => {
                info!(
                    tick = snapshot.time.tick,
                    wave,
                    money = snapshot.economy.money,
                    lives = snapshot.economy.lives,
                    "wave cleared"
                );
            }
            GameEvent::LivesChanged { lives } => debug!(lives, "lives changed"),
            GameEvent::GameOver => info!(tick = snapshot.time.tick, "defeat"),
            GameEvent::GameWon => info!(tick = snapshot.time.tick, "victory"),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use dice_defense_core::enums::GamePhase;
    use dice_defense_sim::scenario::LevelConfig;
    use dice_defense_sim::SimConfig;

    use super::*;

    fn engine() -> SimulationEngine {
        SimulationEngine::new(SimConfig::default(), LevelConfig::default_level())
    }

    #[test]
    fn test_command_channel_round_trip() {
        let (tx, rx) = mpsc::channel::<GameLoopCommand>();

        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::StartNextWave))
            .unwrap();
        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::Pause))
            .unwrap();
        tx.send(GameLoopCommand::Shutdown).unwrap();

        let mut commands = Vec::new();
        while let Ok(cmd) = rx.try_recv() {
            commands.push(cmd);
        }

        assert_eq!(commands.len(), 3);
        assert!(matches!(
            commands[0],
            GameLoopCommand::PlayerCommand(PlayerCommand::StartNextWave)
        ));
        assert!(matches!(commands[2], GameLoopCommand::Shutdown));
    }

    #[test]
    fn test_loop_stops_at_tick_limit_and_publishes_snapshot() {
        let (_tx, rx) = mpsc::channel();
        let latest = Mutex::new(None);
        let settings = LoopSettings {
            max_ticks: 120,
            ..LoopSettings::default()
        };

        let report = run_game_loop(engine(), settings, rx, &latest);
        assert_eq!(report.ticks, 120);
        assert_eq!(report.exit, LoopExit::TickLimit);
        let snapshot = latest.lock().unwrap().take().unwrap();
        assert_eq!(snapshot.time.tick, 120);
        assert_eq!(snapshot.phase, GamePhase::Active);
    }

    #[test]
    fn test_commands_reach_engine_and_shutdown_stops() {
        let (tx, rx) = mpsc::channel();
        let latest = Mutex::new(None);
        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::Pause)).unwrap();
        tx.send(GameLoopCommand::Shutdown).unwrap();

        let report = run_game_loop(engine(), LoopSettings::default(), rx, &latest);
        assert_eq!(report.exit, LoopExit::Shutdown);
        assert_eq!(report.ticks, 0);
    }

    #[test]
    fn test_pause_command_freezes_time() {
        let (tx, rx) = mpsc::channel();
        let latest = Mutex::new(None);
        tx.send(GameLoopCommand::PlayerCommand(PlayerCommand::Pause)).unwrap();
        drop(tx);
        let settings = LoopSettings {
            max_ticks: 30,
            ..LoopSettings::default()
        };

        run_game_loop(engine(), settings, rx, &latest);
        let snapshot = latest.lock().unwrap().take().unwrap();
        assert_eq!(snapshot.phase, GamePhase::Paused);
        assert_eq!(snapshot.time.tick, 0);
    }

    #[test]
    fn test_shutdown_through_app_state_stops_thread() {
        let state = crate::state::AppState::new();
        let settings = LoopSettings {
            max_ticks: u64::MAX,
            realtime: true,
            ..LoopSettings::default()
        };
        let (tx, handle) = spawn_game_loop(engine(), settings, std::sync::Arc::clone(&state.latest_snapshot)).unwrap();
        *state.command_tx.lock().unwrap() = Some(tx);

        assert!(state.send(GameLoopCommand::Shutdown));
        let report = handle.join().unwrap();
        assert_eq!(report.exit, LoopExit::Shutdown);
    }

    #[test]
    fn test_tick_duration_constant() {
        // 60Hz = 16.666ms per tick
        let expected_nanos = 1_000_000_000u64 / 60;
        assert_eq!(TICK_DURATION.as_nanos(), expected_nanos as u128);
    }
}
