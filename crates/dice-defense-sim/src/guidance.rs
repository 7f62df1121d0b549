//! Steering and aiming math for enemies and projectiles.
//!
//! Provides clamped point-to-point movement, bounded heading rotation,
//! direction slerp, target velocity estimation and lead-point prediction.

use glam::{Quat, Vec3};

/// Move `current` toward `target` by at most `max_delta`, never overshooting.
pub fn move_towards(current: Vec3, target: Vec3, max_delta: f32) -> Vec3 {
    let offset = target - current;
    let distance = offset.length();
    if distance <= max_delta.max(0.0) || distance <= f32::EPSILON {
        target
    } else {
        current + offset / distance * max_delta.max(0.0)
    }
}

/// Rotate direction `current` toward `desired` by at most `max_radians`.
///
/// Returns a unit vector. Zero inputs pass the other direction through.
pub fn rotate_towards(current: Vec3, desired: Vec3, max_radians: f32) -> Vec3 {
    let from = current.normalize_or_zero();
    let to = desired.normalize_or_zero();
    if from == Vec3::ZERO {
        return to;
    }
    if to == Vec3::ZERO {
        return from;
    }
    let angle = from.angle_between(to);
    if angle <= max_radians || angle <= f32::EPSILON {
        return to;
    }
    let (axis, _) = Quat::from_rotation_arc(from, to).to_axis_angle();
    (Quat::from_axis_angle(axis, max_radians.max(0.0)) * from).normalize()
}

/// Spherical interpolation between two directions, `t` clamped to [0, 1].
pub fn slerp_direction(from: Vec3, to: Vec3, t: f32) -> Vec3 {
    let a = from.normalize_or_zero();
    let b = to.normalize_or_zero();
    if a == Vec3::ZERO || b == Vec3::ZERO {
        return if a == Vec3::ZERO { b } else { a };
    }
    let t = t.clamp(0.0, 1.0);
    (Quat::IDENTITY.slerp(Quat::from_rotation_arc(a, b), t) * a).normalize()
}

/// Turn-rate limited steering blended by a homing strength.
///
/// The heading first rotates toward `desired` by at most
/// `max_turn_rate_deg * dt`, then is blended from the current heading
/// by `homing_strength * dt`.
pub fn steer(
    current: Vec3,
    desired: Vec3,
    max_turn_rate_deg: f32,
    homing_strength: f32,
    dt: f32,
) -> Vec3 {
    let limited = rotate_towards(current, desired, (max_turn_rate_deg * dt).to_radians());
    slerp_direction(current, limited, homing_strength * dt)
}

/// Finite-difference velocity between two sampled positions.
pub fn estimate_velocity(previous: Vec3, current: Vec3, dt: f32) -> Vec3 {
    if dt <= 0.0 {
        Vec3::ZERO
    } else {
        (current - previous) / dt
    }
}

/// Aim point leading a moving target by the shot's flight time.
///
/// Flight time is `distance / speed`; `accuracy` in [0, 1] scales how far
/// along the predicted path the shot leads.
pub fn lead_point(
    shooter: Vec3,
    target: Vec3,
    target_velocity: Vec3,
    projectile_speed: f32,
    accuracy: f32,
) -> Vec3 {
    if projectile_speed <= 0.0 {
        return target;
    }
    let flight_time = shooter.distance(target) / projectile_speed;
    target + target_velocity * flight_time * accuracy.clamp(0.0, 1.0)
}
