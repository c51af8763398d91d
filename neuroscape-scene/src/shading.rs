//! Ambient particle shading
//!
//! These mirror the particle vertex/fragment program so the 2D fallback
//! renderer draws the same drift and sprite falloff as the GPU path.

use crate::math::Point3;

pub const DRIFT_Y_TIME: f32 = 0.2;
pub const DRIFT_Y_FREQ: f32 = 0.04;
pub const DRIFT_Y_AMPLITUDE: f32 = 1.0;
pub const DRIFT_X_TIME: f32 = 0.15;
pub const DRIFT_X_FREQ: f32 = 0.04;
pub const DRIFT_X_AMPLITUDE: f32 = 0.8;

/// Point size scale at unit depth
pub const POINT_SIZE_DEPTH: f32 = 60.0;

/// Sinusoidal drift of a particle at `time`, in the field's local space.
///
/// The y drift is keyed on the particle's own x, the x drift on its own z.
pub fn displace(position: Point3, time: f32) -> Point3 {
    let mut p = position;
    p.y += (time * DRIFT_Y_TIME + position.x * DRIFT_Y_FREQ).sin() * DRIFT_Y_AMPLITUDE;
    p.x += (time * DRIFT_X_TIME + position.z * DRIFT_X_FREQ).cos() * DRIFT_X_AMPLITUDE;
    p
}

/// Sprite diameter in device pixels for a particle `depth` units away
pub fn point_size(size: f32, pixel_ratio: f32, depth: f32) -> f32 {
    size * pixel_ratio * (POINT_SIZE_DEPTH / depth.max(1e-3))
}

pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Alpha at distance `d` from the sprite centre (sprite spans 0..0.5)
pub fn sprite_alpha(d: f32, opacity: f32) -> f32 {
    if d > 0.5 {
        return 0.0;
    }
    (1.0 - smoothstep(0.0, 0.5, d)) * opacity
}
