//! State shared between the runner and the game loop thread.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use dice_defense_core::commands::PlayerCommand;
use dice_defense_core::state::GameStateSnapshot;

/// Commands sent from the runner to the game loop thread.
#[derive(Debug)]
pub enum GameLoopCommand {
    /// A player command to forward to the simulation engine.
    PlayerCommand(PlayerCommand),
    /// Shut down the game loop thread gracefully.
    Shutdown,
}

/// Latest snapshot, written by the game loop after every tick.
pub type SharedSnapshot = Arc<Mutex<Option<GameStateSnapshot>>>;

/// Handles held by the runner while the loop thread is alive.
#[derive(Default)]
pub struct AppState {
    /// `None` until the game loop has been spawned.
    pub command_tx: Mutex<Option<mpsc::Sender<GameLoopCommand>>>,
    pub latest_snapshot: SharedSnapshot,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward a command to the loop. Returns false if no loop is listening.
    pub fn send(&self, command: GameLoopCommand) -> bool {
        match self.command_tx.lock() {
            Ok(guard) => guard.as_ref().is_some_and(|tx| tx.send(command).is_ok()),
            Err(_) => false,
        }
    }

    /// Take the most recent snapshot, leaving `None` behind.
    pub fn take_snapshot(&self) -> Option<GameStateSnapshot> {
        self.latest_snapshot.lock().ok().and_then(|mut lock| lock.take())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_state_creation() {
        let state = AppState::new();
        assert!(state.command_tx.lock().unwrap().is_none());
        assert!(state.latest_snapshot.lock().unwrap().is_none());
        assert!(!state.send(GameLoopCommand::Shutdown), "no loop spawned yet");
    }

    #[test]
    fn test_send_and_take() {
        let state = AppState::new();
        let (tx, rx) = mpsc::channel();
        *state.command_tx.lock().unwrap() = Some(tx);
        assert!(state.send(GameLoopCommand::PlayerCommand(PlayerCommand::Pause)));
        assert!(matches!(
            rx.try_recv().unwrap(),
            GameLoopCommand::PlayerCommand(PlayerCommand::Pause)
        ));

        *state.latest_snapshot.lock().unwrap() = Some(GameStateSnapshot::default());
        assert!(state.take_snapshot().is_some());
        assert!(state.take_snapshot().is_none());
    }
}
