//! Throw Aim - stick-driven throw aiming and ballistic projectile flight
//!
//! Core modules:
//! - `sim`: Deterministic aiming, arc solving, lock-on and projectile flight
//! - `tuning`: Data-driven per-entity throw tunables

pub mod sim;
pub mod tuning;

pub use tuning::{AimTuning, TuningError};

use glam::{Quat, Vec3};

/// Simulation configuration constants
pub mod consts {
    /// Fixed simulation timestep (60 Hz)
    pub const SIM_DT: f32 = 1.0 / 60.0;
    /// Maximum substeps per frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;

    /// World gravity magnitude (units/s², acting along -Z)
    pub const WORLD_GRAVITY: f32 = 980.0;

    /// Squared-distance threshold below which interpolation snaps to target
    pub const SMALL_NUMBER: f32 = 1.0e-8;
    /// Generic "nearly zero" tolerance for lengths and divisors
    pub const KINDA_SMALL_NUMBER: f32 = 1.0e-4;
}

/// Forward and right axes on the ground plane for a yaw angle (radians, Z-up)
#[inline]
pub fn yaw_basis(yaw: f32) -> (Vec3, Vec3) {
    let (sin, cos) = yaw.sin_cos();
    (Vec3::new(cos, sin, 0.0), Vec3::new(-sin, cos, 0.0))
}

/// Forward and right axes derived from an entity's facing vector.
///
/// The facing is flattened onto the ground plane; a degenerate facing falls
/// back to +X.
#[inline]
pub fn facing_basis(forward: Vec3) -> (Vec3, Vec3) {
    let flat = Vec3::new(forward.x, forward.y, 0.0)
        .try_normalize()
        .unwrap_or(Vec3::X);
    (flat, Vec3::new(-flat.y, flat.x, 0.0))
}

/// Exponential approach of a scalar toward a target.
///
/// A non-positive speed snaps straight to the target.
#[inline]
pub fn interp_to(current: f32, target: f32, dt: f32, speed: f32) -> f32 {
    if speed <= 0.0 {
        return target;
    }
    let dist = target - current;
    if dist * dist < consts::SMALL_NUMBER {
        return target;
    }
    current + dist * (dt * speed).clamp(0.0, 1.0)
}

/// Exponential approach of a ground-plane direction toward a target direction.
///
/// Turns about +Z along the shorter arc, so the result stays unit length and
/// always makes progress, even when the target points straight back. A
/// non-positive speed snaps straight to the target.
#[inline]
pub fn rotate_toward(current: Vec3, target: Vec3, dt: f32, speed: f32) -> Vec3 {
    if speed <= 0.0 {
        return target;
    }
    let angle = current.cross(target).z.atan2(current.dot(target));
    if angle * angle < consts::SMALL_NUMBER {
        return target;
    }
    let step = angle * (dt * speed).clamp(0.0, 1.0);
    (Quat::from_rotation_z(step) * current).normalize_or(current)
}

/// Length of a vector projected onto the ground plane
#[inline]
pub fn length_2d(v: Vec3) -> f32 {
    v.truncate().length()
}
