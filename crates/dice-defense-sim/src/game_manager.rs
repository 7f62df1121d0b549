//! Economy, lives and win/lose state with guarded mutators.
//!
//! Once the game has ended every mutator is a no-op until `restart`.
//! Observer notifications are queued and drained into the snapshot.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dice_defense_core::constants::WAVE_COMPLETION_BONUS_PER_WAVE;
use dice_defense_core::enums::GamePhase;
use dice_defense_core::events::GameEvent;

use crate::scheduler::Scheduler;
use crate::systems::wave_spawner::WaveManager;

/// In-memory save data.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameData {
    pub money: i32,
    pub lives: i32,
    pub wave: u32,
    pub kills: u32,
}

#[derive(Debug)]
pub struct GameManager {
    starting_money: i32,
    starting_lives: i32,
    total_waves: u32,
    money: i32,
    lives: i32,
    current_wave: u32,
    enemies_killed: u32,
    game_over: bool,
    game_won: bool,
    paused: bool,
    events: Vec<GameEvent>,
}

impl GameManager {
    pub fn new(starting_money: i32, starting_lives: i32, total_waves: u32) -> Self {
        let mut manager = Self {
            starting_money,
            starting_lives,
            total_waves,
            money: 0,
            lives: 0,
            current_wave: 0,
            enemies_killed: 0,
            game_over: false,
            game_won: false,
            paused: false,
            events: Vec::new(),
        };
        manager.initialize();
        manager
    }

    /// Reset to the starting economy and announce it.
    fn initialize(&mut self) {
        self.money = self.starting_money;
        self.lives = self.starting_lives;
        self.current_wave = 0;
        self.enemies_killed = 0;
        self.game_over = false;
        self.game_won = false;
        self.paused = false;
        self.events.push(GameEvent::MoneyChanged { money: self.money });
        self.events.push(GameEvent::LivesChanged { lives: self.lives });
        self.events.push(GameEvent::WaveChanged { wave: 0 });
    }

    pub fn money(&self) -> i32 {
        self.money
    }

    pub fn lives(&self) -> i32 {
        self.lives
    }

    /// 1-based; 0 before the first wave.
    pub fn current_wave(&self) -> u32 {
        self.current_wave
    }

    pub fn total_waves(&self) -> u32 {
        self.total_waves
    }

    pub fn enemies_killed(&self) -> u32 {
        self.enemies_killed
    }

    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    pub fn is_game_won(&self) -> bool {
        self.game_won
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn phase(&self) -> GamePhase {
        match (self.game_over, self.game_won, self.paused) {
            (true, true, _) => GamePhase::Victory,
            (true, false, _) => GamePhase::Defeat,
            (false, _, true) => GamePhase::Paused,
            (false, _, false) => GamePhase::Active,
        }
    }

    /// Multiplier on the simulation clock: 0 while paused or ended.
    pub fn time_scale(&self) -> f64 {
        if self.game_over || self.paused {
            0.0
        } else {
            1.0
        }
    }

    pub fn add_money(&mut self, amount: i32) {
        if self.game_over {
            return;
        }
        self.money += amount;
        self.events.push(GameEvent::MoneyChanged { money: self.money });
    }

    /// Returns false, leaving money untouched, if unaffordable or the game is over.
    pub fn spend_money(&mut self, amount: i32) -> bool {
        if self.game_over || amount > self.money {
            debug!(amount, money = self.money, "spend rejected");
            return false;
        }
        self.money -= amount;
        self.events.push(GameEvent::MoneyChanged { money: self.money });
        true
    }

    pub fn can_afford(&self, cost: i32) -> bool {
        !self.game_over && self.money >= cost
    }

    /// Lose lives; reaching zero ends the game.
    pub fn take_damage(&mut self, damage: i32) {
        if self.game_over {
            return;
        }
        self.lives -= damage;
        self.events.push(GameEvent::LivesChanged { lives: self.lives });
        if self.lives <= 0 {
            self.end_game(false);
        }
    }

    pub fn add_lives(&mut self, amount: i32) {
        if self.game_over {
            return;
        }
        self.lives += amount;
        self.events.push(GameEvent::LivesChanged { lives: self.lives });
    }

    pub fn enemy_killed(&mut self) {
        if self.game_over {
            return;
        }
        self.enemies_killed += 1;
    }

    /// Ask the wave manager for the next wave.
    pub fn start_next_wave(&mut self, waves: &mut WaveManager, scheduler: &mut Scheduler, now: f64) -> bool {
        if self.game_over {
            return false;
        }
        waves.start_next_wave(scheduler, now, self)
    }

    /// Called by the wave manager whenever a wave begins.
    pub fn wave_started(&mut self, wave: u32, enemy_count: u32) {
        if self.game_over {
            return;
        }
        self.current_wave = wave;
        self.events.push(GameEvent::WaveChanged { wave });
        self.events.push(GameEvent::WaveStarted { wave, enemy_count });
    }

    /// Award the clear bonus and check for victory.
    pub fn wave_completed(&mut self) {
        if self.game_over {
            return;
        }
        let wave = self.current_wave;
        self.events.push(GameEvent::WaveCompleted { wave });
        self.add_money(wave as i32 * WAVE_COMPLETION_BONUS_PER_WAVE);
        if wave >= self.total_waves {
            self.end_game(true);
        }
    }

    fn end_game(&mut self, won: bool) {
        self.game_over = true;
        self.game_won = won;
        if won {
            info!(wave = self.current_wave, money = self.money, "game won");
            self.events.push(GameEvent::GameWon);
        } else {
            info!(wave = self.current_wave, kills = self.enemies_killed, "game over");
            self.events.push(GameEvent::GameOver);
        }
    }

    pub fn toggle_pause(&mut self) {
        if self.paused {
            self.resume();
        } else {
            self.pause();
        }
    }

    pub fn pause(&mut self) {
        if self.game_over || self.paused {
            return;
        }
        self.paused = true;
        self.events.push(GameEvent::PauseChanged { paused: true });
    }

    pub fn resume(&mut self) {
        if self.game_over || !self.paused {
            return;
        }
        self.paused = false;
        self.events.push(GameEvent::PauseChanged { paused: false });
    }

    /// Reset all state. Allowed after the game has ended.
    pub fn restart(&mut self) {
        info!("restarting game");
        self.initialize();
    }

    pub fn game_data(&self) -> GameData {
        GameData {
            money: self.money,
            lives: self.lives,
            wave: self.current_wave,
            kills: self.enemies_killed,
        }
    }

    /// Restore saved economy and progress. The wave manager must be
    /// rewound to the same wave; `SimulationEngine::load_game_data` does both.
    pub fn load_game_data(&mut self, data: GameData) -> bool {
        if self.game_over {
            debug!("load ignored after game over");
            return false;
        }
        self.money = data.money;
        self.lives = data.lives;
        self.current_wave = data.wave.min(self.total_waves);
        self.enemies_killed = data.kills;
        self.events.push(GameEvent::MoneyChanged { money: self.money });
        self.events.push(GameEvent::LivesChanged { lives: self.lives });
        self.events.push(GameEvent::WaveChanged { wave: self.current_wave });
        true
    }

    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> GameManager {
        let mut gm = GameManager::new(100, 3, 2);
        gm.drain_events();
        gm
    }

    #[test]
    fn test_spend_money_rejects_overdraft() {
        let mut gm = manager();
        assert!(!gm.spend_money(150));
        assert_eq!(gm.money(), 100);
        assert!(gm.drain_events().is_empty(), "no notification on rejection");
        assert!(gm.spend_money(60));
        assert_eq!(gm.money(), 40);
        assert!(gm.can_afford(40));
        assert!(!gm.can_afford(41));
    }

    #[test]
    fn test_game_over_fires_once_and_freezes_state() {
        let mut gm = manager();
        gm.take_damage(2);
        gm.take_damage(5);
        gm.take_damage(1);
        gm.add_money(50);
        gm.add_lives(10);

        assert!(gm.is_game_over());
        assert!(!gm.is_game_won());
        assert_eq!(gm.lives(), -4);
        assert_eq!(gm.money(), 100);
        assert_eq!(gm.phase(), GamePhase::Defeat);
        assert_eq!(gm.time_scale(), 0.0);
        let overs = gm.drain_events().iter().filter(|e| **e == GameEvent::GameOver).count();
        assert_eq!(overs, 1);
        assert!(!gm.spend_money(1));
    }

    #[test]
    fn test_wave_bonus_and_victory() {
        let mut gm = manager();
        gm.wave_started(1, 5);
        gm.wave_completed();
        assert_eq!(gm.money(), 110);
        assert!(!gm.is_game_over());

        gm.wave_started(2, 5);
        gm.wave_completed();
        assert_eq!(gm.money(), 130);
        assert!(gm.is_game_won());
        assert_eq!(gm.phase(), GamePhase::Victory);
        assert!(gm.drain_events().contains(&GameEvent::GameWon));
    }

    #[test]
    fn test_pause_toggle_and_restart() {
        let mut gm = manager();
        gm.toggle_pause();
        assert!(gm.is_paused());
        assert_eq!(gm.time_scale(), 0.0);
        gm.toggle_pause();
        assert!(!gm.is_paused());
        assert_eq!(
            gm.drain_events(),
            vec![
                GameEvent::PauseChanged { paused: true },
                GameEvent::PauseChanged { paused: false },
            ]
        );

        gm.take_damage(3);
        gm.pause();
        assert!(!gm.is_paused(), "pause is a no-op after game over");
        gm.restart();
        assert!(!gm.is_game_over());
        assert_eq!(gm.lives(), 3);
        assert_eq!(gm.money(), 100);
        assert_eq!(gm.current_wave(), 0);
    }

    #[test]
    fn test_game_data_round_trip() {
        let mut gm = manager();
        gm.wave_started(1, 4);
        gm.enemy_killed();
        gm.enemy_killed();
        let saved = gm.game_data();
        assert_eq!(
            saved,
            GameData {
                money: 100,
                lives: 3,
                wave: 1,
                kills: 2,
            }
        );

        let mut fresh = manager();
        assert!(fresh.load_game_data(saved));
        assert_eq!(fresh.game_data(), saved);
        let json = serde_json::to_string(&saved).unwrap();
        assert_eq!(serde_json::from_str::<GameData>(&json).unwrap(), saved);
    }

    #[test]
    fn test_load_game_data_ignored_after_game_over() {
        let mut gm = manager();
        gm.take_damage(3);
        assert!(gm.is_game_over());

        let loaded = gm.load_game_data(GameData {
            money: 500,
            lives: 9,
            wave: 2,
            kills: 7,
        });
        assert!(!loaded);
        assert_eq!(gm.money(), 100);
        assert_eq!(gm.lives(), 0);
        assert_eq!(gm.current_wave(), 0);
    }
}
