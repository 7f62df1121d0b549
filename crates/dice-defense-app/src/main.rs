use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context};
use clap::Parser;
use glam::Vec3;
use tracing::{info, warn};

use dice_defense_app::game_loop::{self, LoopSettings};
use dice_defense_app::state::{AppState, GameLoopCommand};
use dice_defense_core::commands::PlayerCommand;
use dice_defense_core::enums::TowerType;
use dice_defense_sim::game_manager::GameData;
use dice_defense_sim::scenario::LevelConfig;
use dice_defense_sim::{SimConfig, SimulationEngine};

/// Headless dice tower-defense simulation.
#[derive(Debug, Parser)]
#[command(name = "dice-defense", version)]
struct Args {
    /// Level file (JSON). Defaults to the built-in level.
    #[arg(long)]
    level: Option<PathBuf>,
    /// Stop after this many ticks (60 per simulated second at 1x).
    #[arg(long, default_value_t = 36_000)]
    max_ticks: u64,
    /// Pace ticks to wall-clock time instead of running flat out.
    #[arg(long)]
    realtime: bool,
    #[arg(long, default_value_t = 1.0)]
    time_scale: f64,
    /// Disable auto-advance; the runner starts each wave once the last clears.
    #[arg(long)]
    no_auto_waves: bool,
    /// Extra tower to buy at start, e.g. `d8@2,6` (x,z). Repeatable.
    #[arg(long = "tower", value_parser = parse_placement)]
    towers: Vec<Placement>,
    /// Saved progress (JSON money/lives/wave/kills) to resume from.
    #[arg(long)]
    save: Option<PathBuf>,
    /// Stop the loop after this much wall-clock time.
    #[arg(long)]
    timeout_secs: Option<f64>,
    /// Pretty-print the final snapshot.
    #[arg(long)]
    pretty: bool,
}

#[derive(Debug, Clone, Copy)]
struct Placement {
    tower_type: TowerType,
    position: Vec3,
}

fn parse_placement(raw: &str) -> Result<Placement, String> {
    let (label, coords) = raw
        .split_once('@')
        .ok_or_else(|| format!("expected TYPE@X,Z, got `{raw}`"))?;
    let tower_type = TowerType::ALL
        .into_iter()
        .find(|t| t.label().eq_ignore_ascii_case(label))
        .ok_or_else(|| format!("unknown tower type `{label}`"))?;
    let (x, z) = coords
        .split_once(',')
        .ok_or_else(|| format!("expected X,Z coordinates, got `{coords}`"))?;
    let parse = |v: &str| v.trim().parse::<f32>().map_err(|e| format!("bad coordinate `{v}`: {e}"));
    Ok(Placement {
        tower_type,
        position: Vec3::new(parse(x)?, 0.0, parse(z)?),
    })
}

fn load_save(path: &std::path::Path) -> anyhow::Result<GameData> {
    let raw = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    if !args.time_scale.is_finite() || args.time_scale < 0.0 {
        bail!("time scale must be a non-negative number, got {}", args.time_scale);
    }
    if let Some(limit) = args.timeout_secs {
        if !limit.is_finite() || limit <= 0.0 {
            bail!("timeout must be a positive number of seconds, got {limit}");
        }
    }
    let level = match &args.level {
        Some(path) => LevelConfig::from_path(path).with_context(|| format!("loading level {}", path.display()))?,
        None => LevelConfig::default_level(),
    };
    info!(level = %level.name, waves = level.total_waves(), "starting simulation");

    let config = SimConfig {
        time_scale: args.time_scale,
        auto_start_waves: !args.no_auto_waves,
        ..SimConfig::default()
    };
    let mut engine = SimulationEngine::new(config, level);
    if let Some(path) = &args.save {
        let data = load_save(path).with_context(|| format!("loading save {}", path.display()))?;
        if !engine.load_game_data(data) {
            bail!("save {} could not be applied", path.display());
        }
        info!(wave = data.wave, money = data.money, lives = data.lives, "resuming saved game");
    }
    engine.queue_commands(args.towers.iter().map(|p| PlayerCommand::PlaceTower {
        tower_type: p.tower_type,
        position: p.position,
    }));

    let settings = LoopSettings {
        max_ticks: args.max_ticks,
        realtime: args.realtime,
        drive_waves: args.no_auto_waves,
    };
    let state = AppState::new();
    let (command_tx, handle) = game_loop::spawn_game_loop(engine, settings, Arc::clone(&state.latest_snapshot))
        .context("spawning game loop thread")?;
    if let Ok(mut slot) = state.command_tx.lock() {
        *slot = Some(command_tx);
    }

    if let Some(limit) = args.timeout_secs {
        let deadline = Instant::now() + Duration::from_secs_f64(limit);
        while !handle.is_finished() {
            if Instant::now() >= deadline {
                warn!(limit, "wall-clock timeout, stopping game loop");
                state.send(GameLoopCommand::Shutdown);
                break;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
    }

    let report = handle.join().map_err(|_| anyhow!("game loop thread panicked"))?;
    let snapshot = state.take_snapshot().context("simulation produced no snapshot")?;
    info!(
        ticks = report.ticks,
        exit = ?report.exit,
        wave = snapshot.wave.current_wave,
        money = snapshot.economy.money,
        lives = snapshot.economy.lives,
        kills = snapshot.economy.enemies_killed,
        "simulation finished"
    );

    let json = if args.pretty {
        serde_json::to_string_pretty(&snapshot)?
    } else {
        serde_json::to_string(&snapshot)?
    };
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_placement() {
        let placement = parse_placement("D8@2,-6.5").unwrap();
        assert_eq!(placement.tower_type, TowerType::D8);
        assert_eq!(placement.position, Vec3::new(2.0, 0.0, -6.5));
        assert_eq!(parse_placement("d14@0,0").unwrap().tower_type, TowerType::D14);
        assert!(parse_placement("d7@0,0").is_err());
        assert!(parse_placement("d6").is_err());
        assert!(parse_placement("d6@1").is_err());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::try_parse_from(["dice-defense", "--no-auto-waves", "--tower", "d4@1,1", "--max-ticks", "10"]).unwrap();
        assert!(args.no_auto_waves);
        assert_eq!(args.max_ticks, 10);
        assert_eq!(args.towers.len(), 1);
        assert!(args.save.is_none());

        let args = Args::try_parse_from(["dice-defense", "--save", "run.json", "--timeout-secs", "2.5"]).unwrap();
        assert_eq!(args.save, Some(PathBuf::from("run.json")));
        assert_eq!(args.timeout_secs, Some(2.5));
    }

    #[test]
    fn test_load_save_file() {
        let path = std::env::temp_dir().join(format!("dice-defense-save-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"money":240,"lives":7,"wave":3,"kills":12}"#).unwrap();
        let data = load_save(&path).unwrap();
        std::fs::remove_file(&path).unwrap();
        assert_eq!(
            data,
            GameData {
                money: 240,
                lives: 7,
                wave: 3,
                kills: 12,
            }
        );
        assert!(load_save(&path).is_err(), "missing file is an error");
    }
}
