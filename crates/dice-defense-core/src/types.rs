//! Fundamental geometric and simulation types.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

/// World-space placement of an entity (meters). Y is up.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform {
    pub position: Vec3,
    /// Unit facing direction.
    pub forward: Vec3,
}

/// Simulation time tracking.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SimTime {
    /// Current tick number (increments by 1 each tick).
    pub tick: u64,
    /// Elapsed scaled simulation time in seconds.
    pub elapsed_secs: f64,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            forward: Vec3::Z,
        }
    }
}

impl Transform {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    /// Transform at `position` facing `forward`. A zero direction keeps +Z.
    pub fn looking(position: Vec3, forward: Vec3) -> Self {
        let dir = forward.normalize_or_zero();
        Self {
            position,
            forward: if dir == Vec3::ZERO { Vec3::Z } else { dir },
        }
    }

    /// Orientation quaternion of the facing direction.
    pub fn rotation(&self) -> Quat {
        look_rotation(self.forward)
    }

    /// Distance on the XZ plane, ignoring height.
    pub fn horizontal_distance_to(&self, point: Vec3) -> f32 {
        let dx = point.x - self.position.x;
        let dz = point.z - self.position.z;
        (dx * dx + dz * dz).sqrt()
    }
}

/// Rotation taking +Z onto `forward`. Identity for a zero direction.
pub fn look_rotation(forward: Vec3) -> Quat {
    let dir = forward.normalize_or_zero();
    if dir == Vec3::ZERO {
        Quat::IDENTITY
    } else {
        Quat::from_rotation_arc(Vec3::Z, dir)
    }
}

impl SimTime {
    /// Advance by one tick of `dt_secs` scaled seconds.
    pub fn advance(&mut self, dt_secs: f64) {
        self.tick += 1;
        self.elapsed_secs += dt_secs;
    }
}
