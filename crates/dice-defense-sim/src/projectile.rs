//! Projectile family: configuration parameters and per-projectile state.
//!
//! A projectile is spawned as `(Transform, Projectile)`. The variant is a
//! closed `Behavior` enum; flight logic lives in
//! `systems::projectiles`.

use glam::Vec3;
use hecs::Entity;
use serde::{Deserialize, Serialize};

use dice_defense_core::constants::*;
use dice_defense_core::enums::{ProjectileKind, TowerType};

use crate::scheduler::{Scheduler, TaskId};

/// Maps normalized distance (0 = centre, 1 = edge) to a damage multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FalloffCurve {
    pub at_center: f32,
    pub at_edge: f32,
}

impl Default for FalloffCurve {
    fn default() -> Self {
        Self {
            at_center: EXPLOSION_FALLOFF_CENTER,
            at_edge: EXPLOSION_FALLOFF_EDGE,
        }
    }
}

impl FalloffCurve {
    pub fn evaluate(&self, normalized_distance: f32) -> f32 {
        let t = normalized_distance.clamp(0.0, 1.0);
        self.at_center + (self.at_edge - self.at_center) * t
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DirectParams {
    pub predictive_aiming: bool,
    /// 0 = aim at current position, 1 = full lead.
    pub prediction_accuracy: f32,
}

impl Default for DirectParams {
    fn default() -> Self {
        Self {
            predictive_aiming: true,
            prediction_accuracy: DIRECT_PREDICTION_ACCURACY,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HomingParams {
    pub homing_strength: f32,
    pub max_turn_rate_deg: f32,
    /// Seconds of straight flight before steering engages.
    pub homing_delay: f32,
    pub retarget_radius: f32,
}

impl Default for HomingParams {
    fn default() -> Self {
        Self {
            homing_strength: HOMING_STRENGTH,
            max_turn_rate_deg: HOMING_MAX_TURN_RATE_DEG,
            homing_delay: HOMING_DELAY_SECS,
            retarget_radius: HOMING_RETARGET_RADIUS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExplosiveParams {
    pub explosion_radius: f32,
    pub explosion_damage_multiplier: f32,
    pub falloff: FalloffCurve,
}

impl Default for ExplosiveParams {
    fn default() -> Self {
        Self {
            explosion_radius: EXPLOSION_RADIUS,
            explosion_damage_multiplier: EXPLOSION_DAMAGE_MULTIPLIER,
            falloff: FalloffCurve::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpreadParams {
    pub pellet_count: u32,
    /// Total fan angle in degrees.
    pub spread_angle_deg: f32,
    pub pellet_damage_multiplier: f32,
    pub pellet_speed: f32,
    pub pellet_lifetime: f32,
}

impl Default for SpreadParams {
    fn default() -> Self {
        Self {
            pellet_count: SPREAD_PELLET_COUNT,
            spread_angle_deg: SPREAD_ANGLE_DEG,
            pellet_damage_multiplier: PELLET_DAMAGE_MULTIPLIER,
            pellet_speed: PELLET_SPEED,
            pellet_lifetime: PELLET_LIFETIME,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeamParams {
    pub beam_duration: f32,
    pub damage_per_second: f32,
    pub homing_strength: f32,
    pub max_turn_rate_deg: f32,
    pub beam_width: f32,
    pub search_radius: f32,
}

impl Default for BeamParams {
    fn default() -> Self {
        Self {
            beam_duration: BEAM_DURATION_SECS,
            damage_per_second: BEAM_DAMAGE_PER_SECOND,
            homing_strength: BEAM_HOMING_STRENGTH,
            max_turn_rate_deg: BEAM_MAX_TURN_RATE_DEG,
            beam_width: BEAM_WIDTH,
            search_radius: BEAM_SEARCH_RADIUS,
        }
    }
}

/// Variant-specific parameters of a projectile archetype.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum VariantSpec {
    Direct(DirectParams),
    Homing(HomingParams),
    Explosive(ExplosiveParams),
    Spread(SpreadParams),
    Beam(BeamParams),
}

/// Projectile archetype fired by a tower template.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProjectileSpec {
    #[serde(default = "default_speed")]
    pub speed: f32,
    #[serde(default = "default_lifetime")]
    pub lifetime: f32,
    pub variant: VariantSpec,
}

fn default_speed() -> f32 {
    DEFAULT_PROJECTILE_SPEED
}

fn default_lifetime() -> f32 {
    DEFAULT_PROJECTILE_LIFETIME
}

impl ProjectileSpec {
    pub fn new(variant: VariantSpec) -> Self {
        Self {
            speed: DEFAULT_PROJECTILE_SPEED,
            lifetime: DEFAULT_PROJECTILE_LIFETIME,
            variant,
        }
    }

    /// Archetype each die fires by default.
    pub fn for_tower(tower_type: TowerType) -> Self {
        match tower_type {
            TowerType::D4 => Self::new(VariantSpec::Homing(HomingParams::default())),
            TowerType::D6 => Self::new(VariantSpec::Direct(DirectParams::default())),
            TowerType::D8 => Self::new(VariantSpec::Explosive(ExplosiveParams::default())),
            TowerType::D12 => Self::new(VariantSpec::Spread(SpreadParams::default())),
            TowerType::D14 => Self::new(VariantSpec::Beam(BeamParams::default())),
        }
    }

    pub fn kind(&self) -> ProjectileKind {
        match self.variant {
            VariantSpec::Direct(_) => ProjectileKind::Direct,
            VariantSpec::Homing(_) => ProjectileKind::Homing,
            VariantSpec::Explosive(_) => ProjectileKind::Explosive,
            VariantSpec::Spread(_) => ProjectileKind::Spread,
            VariantSpec::Beam(_) => ProjectileKind::Beam,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DirectShot {
    pub params: DirectParams,
    pub last_target_position: Vec3,
    pub target_velocity: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HomingShot {
    pub params: HomingParams,
    pub homing_timer: f32,
    pub velocity: Vec3,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExplosiveShot {
    pub params: ExplosiveParams,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SpreadShot {
    pub params: SpreadParams,
    pub has_fired: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BeamShot {
    pub params: BeamParams,
    /// Current rate, replaced by `set_damage` (total budget / duration).
    pub damage_per_second: f32,
    pub active: bool,
    pub beam_timer: f32,
    pub velocity: Vec3,
    pub beam_start: Vec3,
    pub beam_end: Vec3,
    pub damage_task: Option<TaskId>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Behavior {
    Direct(DirectShot),
    Homing(HomingShot),
    Explosive(ExplosiveShot),
    Spread(SpreadShot),
    Pellet,
    Beam(BeamShot),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projectile {
    pub speed: f32,
    pub damage: f32,
    pub lifetime: f32,
    /// Locked enemy. Revalidated every tick.
    pub target: Option<Entity>,
    /// Aim point; `None` means the projectile has nothing to fly at.
    pub target_position: Option<Vec3>,
    pub source: Option<Entity>,
    /// Set once by `destroy`; a destroyed projectile does nothing further.
    pub is_destroyed: bool,
    /// Launch hook has run.
    pub started: bool,
    pub expiry: Option<TaskId>,
    pub behavior: Behavior,
}

impl Projectile {
    pub fn from_spec(spec: &ProjectileSpec) -> Self {
        let behavior = match spec.variant {
            VariantSpec::Direct(params) => Behavior::Direct(DirectShot {
                params,
                last_target_position: Vec3::ZERO,
                target_velocity: Vec3::ZERO,
            }),
            VariantSpec::Homing(params) => Behavior::Homing(HomingShot {
                params,
                homing_timer: 0.0,
                velocity: Vec3::ZERO,
            }),
            VariantSpec::Explosive(params) => Behavior::Explosive(ExplosiveShot { params }),
            VariantSpec::Spread(params) => Behavior::Spread(SpreadShot {
                params,
                has_fired: false,
            }),
            VariantSpec::Beam(params) => Behavior::Beam(BeamShot {
                params,
                damage_per_second: params.damage_per_second,
                active: false,
                beam_timer: 0.0,
                velocity: Vec3::ZERO,
                beam_start: Vec3::ZERO,
                beam_end: Vec3::ZERO,
                damage_task: None,
            }),
        };
        Self {
            speed: spec.speed,
            damage: DEFAULT_PROJECTILE_DAMAGE,
            lifetime: spec.lifetime,
            target: None,
            target_position: None,
            source: None,
            is_destroyed: false,
            started: false,
            expiry: None,
            behavior,
        }
    }

    /// Straight, untargeted sub-projectile of a spread shot.
    pub fn pellet(speed: f32, damage: f32, lifetime: f32) -> Self {
        Self {
            speed,
            damage: damage.max(0.0),
            lifetime,
            target: None,
            target_position: None,
            source: None,
            is_destroyed: false,
            started: false,
            expiry: None,
            behavior: Behavior::Pellet,
        }
    }

    pub fn kind(&self) -> ProjectileKind {
        match self.behavior {
            Behavior::Direct(_) => ProjectileKind::Direct,
            Behavior::Homing(_) => ProjectileKind::Homing,
            Behavior::Explosive(_) => ProjectileKind::Explosive,
            Behavior::Spread(_) => ProjectileKind::Spread,
            Behavior::Pellet => ProjectileKind::Pellet,
            Behavior::Beam(_) => ProjectileKind::Beam,
        }
    }

    /// Common configuration entry point used by towers.
    pub fn configure(&mut self, target: Option<(Entity, Vec3)>, damage: f32) {
        if let Some((entity, position)) = target {
            self.set_target(entity, position);
        }
        self.set_damage(damage);
    }

    /// Lock onto `target`, currently at `position`.
    pub fn set_target(&mut self, target: Entity, position: Vec3) {
        self.target = Some(target);
        self.target_position = Some(position);
        match &mut self.behavior {
            Behavior::Direct(shot) => {
                shot.last_target_position = position;
                shot.target_velocity = Vec3::ZERO;
            }
            Behavior::Homing(shot) => shot.homing_timer = 0.0,
            _ => {}
        }
    }

    /// Aim at a fixed point with no entity lock.
    pub fn set_target_position(&mut self, point: Vec3) {
        self.target = None;
        self.target_position = Some(point);
        if let Behavior::Homing(shot) = &mut self.behavior {
            shot.homing_timer = 0.0;
        }
    }

    /// For beams this is a total budget spread over the beam duration.
    pub fn set_damage(&mut self, damage: f32) {
        self.damage = damage.max(0.0);
        if let Behavior::Beam(beam) = &mut self.behavior {
            if beam.params.beam_duration > 0.0 {
                beam.damage_per_second = self.damage / beam.params.beam_duration;
            }
        }
    }

    pub fn set_speed(&mut self, speed: f32) {
        self.speed = speed.max(0.0);
    }

    /// Mark destroyed and cancel pending tasks. Returns false if already destroyed.
    pub fn destroy(&mut self, scheduler: &mut Scheduler) -> bool {
        if self.is_destroyed {
            return false;
        }
        self.is_destroyed = true;
        if let Some(id) = self.expiry.take() {
            scheduler.cancel(id);
        }
        if let Behavior::Beam(beam) = &mut self.behavior {
            beam.active = false;
            if let Some(id) = beam.damage_task.take() {
                scheduler.cancel(id);
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::Task;

    #[test]
    fn test_falloff_linear_and_clamped() {
        let curve = FalloffCurve::default();
        assert_eq!(curve.evaluate(0.0), 1.0);
        assert!((curve.evaluate(1.0) - 0.3).abs() < 1e-6);
        assert!((curve.evaluate(0.5) - 0.65).abs() < 1e-6);
        assert!((curve.evaluate(4.0) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_set_speed_clamps_negative() {
        let mut shot = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D6));
        shot.set_speed(12.5);
        assert_eq!(shot.speed, 12.5);
        shot.set_speed(-3.0);
        assert_eq!(shot.speed, 0.0);
    }

    #[test]
    fn test_beam_set_damage_is_total_budget() {
        let mut beam = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D14));
        beam.set_damage(30.0);
        match &beam.behavior {
            Behavior::Beam(shot) => assert!((shot.damage_per_second - 10.0).abs() < 1e-6),
            other => panic!("expected beam, got {other:?}"),
        }
    }

    #[test]
    fn test_set_target_resets_homing_timer() {
        let mut world = hecs::World::new();
        let enemy = world.spawn(());
        let mut shot = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D4));
        if let Behavior::Homing(h) = &mut shot.behavior {
            h.homing_timer = 0.5;
        }
        shot.set_target(enemy, Vec3::X);
        assert_eq!(shot.target, Some(enemy));
        assert_eq!(shot.target_position, Some(Vec3::X));
        match &shot.behavior {
            Behavior::Homing(h) => assert_eq!(h.homing_timer, 0.0),
            other => panic!("expected homing, got {other:?}"),
        }

        shot.set_target_position(Vec3::Z);
        assert_eq!(shot.target, None, "point aim clears the lock");
        assert_eq!(shot.target_position, Some(Vec3::Z));
    }

    #[test]
    fn test_destroy_is_idempotent_and_cancels_expiry() {
        let mut scheduler = Scheduler::new();
        let mut world = hecs::World::new();
        let entity = world.spawn(());
        let mut shot = Projectile::from_spec(&ProjectileSpec::for_tower(TowerType::D6));
        let id = scheduler.schedule(0.0, 5.0, Task::ExpireProjectile(entity));
        shot.expiry = Some(id);

        assert!(shot.destroy(&mut scheduler));
        assert!(!scheduler.is_pending(id));
        assert!(!shot.destroy(&mut scheduler), "second destroy is a no-op");
    }

    #[test]
    fn test_spec_json_defaults() {
        let json = r#"{"variant":{"kind":"Spread","pellet_count":3}}"#;
        let spec: ProjectileSpec = serde_json::from_str(json).unwrap();
        assert_eq!(spec.speed, DEFAULT_PROJECTILE_SPEED);
        match spec.variant {
            VariantSpec::Spread(p) => {
                assert_eq!(p.pellet_count, 3);
                assert_eq!(p.spread_angle_deg, SPREAD_ANGLE_DEG);
            }
            other => panic!("expected spread, got {other:?}"),
        }
        assert_eq!(spec.kind(), ProjectileKind::Spread);
    }
}
