//! Systems that operate on the simulation world each tick.
//!
//! Systems are free functions over `&mut World` plus the explicit
//! context they need (scheduler, spatial query, combat log). Long-lived
//! state lives in components or in the managers owned by the engine.

pub mod cleanup;
pub mod damage;
pub mod death;
pub mod firing;
pub mod movement;
pub mod projectiles;
pub mod snapshot;
pub mod stacking;
pub mod targeting;
pub mod wave_spawner;
