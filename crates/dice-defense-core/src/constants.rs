//! Simulation constants and tuning parameters.

/// Simulation tick rate (Hz).
pub const TICK_RATE: u32 = 60;

/// Seconds per tick.
pub const DT: f64 = 1.0 / TICK_RATE as f64;

/// Upper bound for the player-selected time scale.
pub const MAX_TIME_SCALE: f64 = 4.0;

// --- Economy ---

pub const STARTING_MONEY: i32 = 100;
pub const STARTING_LIVES: i32 = 20;

/// Money awarded per wave number when a wave is cleared.
pub const WAVE_COMPLETION_BONUS_PER_WAVE: i32 = 10;

// --- Enemies ---

/// Distance at which an enemy counts as having reached its waypoint.
pub const WAYPOINT_REACHED_EPSILON: f32 = 0.1;

/// Seconds a dead enemy lingers before removal (death animation).
pub const ENEMY_DESPAWN_DELAY_SECS: f64 = 1.0;

/// Contact radius of an enemy body for projectile collisions.
pub const ENEMY_COLLISION_RADIUS: f32 = 0.5;

pub const DEFAULT_ENEMY_SPEED: f32 = 2.0;
pub const DEFAULT_ENEMY_REWARD: i32 = 10;
pub const DEFAULT_ENEMY_DAMAGE: i32 = 1;
pub const DEFAULT_ENEMY_HEALTH: f32 = 100.0;

// --- Towers ---

/// Target rescan cadence (10 Hz).
pub const TOWER_SCAN_INTERVAL_SECS: f64 = 0.1;

/// Height of one die in a stack.
pub const TOWER_HEIGHT: f32 = 1.0;

/// Horizontal offset within which two towers share a column.
pub const STACK_ALIGN_TOLERANCE: f32 = 0.5;

/// Maximum vertical gap for the below/above contact test.
pub const STACK_PROBE_DISTANCE: f32 = 1.6;

/// Projectiles leave the tower this far above its base.
pub const FIRE_POINT_HEIGHT: f32 = 0.5;

pub const DEFAULT_TOWER_DAMAGE: f32 = 25.0;
pub const DEFAULT_TOWER_RANGE: f32 = 5.0;
pub const DEFAULT_TOWER_FIRE_RATE: f32 = 1.0;
pub const DEFAULT_TOWER_COST: i32 = 50;

// Stacking rates: bonus = base stat * rate * towers of that type below.
pub const STACK_RATE_D4_FIRE_RATE: f32 = 0.20;
pub const STACK_RATE_D6_ALL: f32 = 0.10;
pub const STACK_RATE_D8_DAMAGE: f32 = 0.20;
pub const STACK_RATE_D12_RANGE: f32 = 0.15;
pub const STACK_RATE_D14_DAMAGE: f32 = 0.10;
pub const STACK_RATE_D14_RANGE: f32 = 0.10;

// --- Projectiles ---

pub const DEFAULT_PROJECTILE_SPEED: f32 = 10.0;
pub const DEFAULT_PROJECTILE_DAMAGE: f32 = 25.0;
pub const DEFAULT_PROJECTILE_LIFETIME: f32 = 5.0;

/// Arrival distance for direct and explosive shots.
pub const PROJECTILE_ARRIVAL_EPSILON: f32 = 0.1;

/// Arrival distance for homing shots.
pub const HOMING_ARRIVAL_EPSILON: f32 = 0.2;

pub const DIRECT_PREDICTION_ACCURACY: f32 = 0.8;

pub const HOMING_STRENGTH: f32 = 5.0;
pub const HOMING_MAX_TURN_RATE_DEG: f32 = 180.0;
pub const HOMING_DELAY_SECS: f32 = 0.1;
pub const HOMING_RETARGET_RADIUS: f32 = 10.0;

pub const EXPLOSION_RADIUS: f32 = 3.0;
pub const EXPLOSION_DAMAGE_MULTIPLIER: f32 = 0.7;
pub const EXPLOSION_FALLOFF_CENTER: f32 = 1.0;
pub const EXPLOSION_FALLOFF_EDGE: f32 = 0.3;

pub const SPREAD_PELLET_COUNT: u32 = 5;
pub const SPREAD_ANGLE_DEG: f32 = 30.0;
pub const PELLET_DAMAGE_MULTIPLIER: f32 = 0.3;
pub const PELLET_SPEED: f32 = 15.0;
pub const PELLET_LIFETIME: f32 = 2.0;

pub const BEAM_DURATION_SECS: f32 = 3.0;
pub const BEAM_DAMAGE_PER_SECOND: f32 = 15.0;
pub const BEAM_HOMING_STRENGTH: f32 = 8000.0;
pub const BEAM_MAX_TURN_RATE_DEG: f32 = 360.0;
pub const BEAM_WIDTH: f32 = 0.2;
pub const BEAM_SEARCH_RADIUS: f32 = 15.0;

/// Beam damage sampling cadence (10 Hz).
pub const BEAM_TICK_INTERVAL_SECS: f64 = 0.1;

// --- Waves ---

/// Completion polling cadence (2 Hz).
pub const WAVE_POLL_INTERVAL_SECS: f64 = 0.5;

pub const FIRST_WAVE_DELAY_SECS: f64 = 3.0;
pub const DEFAULT_TIME_BETWEEN_WAVES_SECS: f64 = 5.0;
