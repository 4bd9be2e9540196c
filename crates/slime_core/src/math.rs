//! Numeric helpers shared by every oscillator and filter in the pipeline.
//!
//! Everything here is pure and deterministic: the same inputs always give
//! bit-identical outputs, which the replay tests rely on.

use glam::Vec2;

/// Linear interpolation with `t` clamped to [0, 1].
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t.clamp(0.0, 1.0)
}

/// Guard against NaN and Infinity.
/// If the value is not finite, replace it with `fallback`.
#[inline]
pub fn sanitize_f32(v: f32, fallback: f32) -> f32 {
    if v.is_finite() {
        v
    } else {
        tracing::warn!("NaN/Inf detected in state, resetting to fallback {}", fallback);
        fallback
    }
}

/// First-order low-pass step: `value = lerp(value, target, rate * dt)`.
#[inline]
pub fn approach(value: f32, target: f32, rate: f32, dt: f32) -> f32 {
    lerp(value, target, rate * dt)
}

/// Critically damped spring toward `target`.
///
/// `smooth_time` is roughly the time needed to cover most of the distance.
/// The closed-form approximation never overshoots the target, and the
/// velocity is carried between calls through `velocity`.
pub fn smooth_damp(current: f32, target: f32, velocity: &mut f32, smooth_time: f32, dt: f32) -> f32 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + omega * change) * dt;
    *velocity = (*velocity - omega * temp) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current > 0.0) == (output > target) {
        output = target;
        *velocity = 0.0;
    }
    output
}

/// Vector form of [`smooth_damp`]; overshoot is detected along the approach direction.
pub fn smooth_damp_vec2(current: Vec2, target: Vec2, velocity: &mut Vec2, smooth_time: f32, dt: f32) -> Vec2 {
    if dt <= 0.0 {
        return current;
    }
    let smooth_time = smooth_time.max(1e-4);
    let omega = 2.0 / smooth_time;
    let x = omega * dt;
    let decay = 1.0 / (1.0 + x + 0.48 * x * x + 0.235 * x * x * x);

    let change = current - target;
    let temp = (*velocity + change * omega) * dt;
    *velocity = (*velocity - temp * omega) * decay;
    let mut output = target + (change + temp) * decay;

    if (target - current).dot(output - target) > 0.0 {
        output = target;
        *velocity = Vec2::ZERO;
    }
    output
}

/// Clamp a vector's length to `max_len`.
#[inline]
pub fn clamp_length(v: Vec2, max_len: f32) -> Vec2 {
    v.clamp_length_max(max_len.max(0.0))
}

/// Smooth 1D value noise in [0, 1], repeating every `period` lattice cells.
///
/// Lattice values come from an integer hash, so the curve is a pure function
/// of `(t, period, seed)`. The repeat lets a caller wrap its input clock to
/// `[0, period)` without a seam.
pub fn periodic_value_noise(t: f32, period: u32, seed: u32) -> f32 {
    let period = period.max(1) as i32;
    let i = t.floor();
    let cell = (i as i32).rem_euclid(period);
    let a = lattice(cell, seed);
    let b = lattice((cell + 1).rem_euclid(period), seed);
    interpolate(a, b, t - i)
}

fn interpolate(a: f32, b: f32, f: f32) -> f32 {
    let s = f * f * (3.0 - 2.0 * f);
    a + (b - a) * s
}

fn lattice(i: i32, seed: u32) -> f32 {
    let mut h = (i as u32).wrapping_mul(0x27d4_eb2d) ^ seed.wrapping_mul(0x9e37_79b9);
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h = h.wrapping_mul(0xc2b2_ae35);
    h ^= h >> 16;
    (h & 0xffff) as f32 / 65535.0
}
