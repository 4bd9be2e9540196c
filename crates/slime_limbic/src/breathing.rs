//! Multi-layer breathing oscillator.
//!
//! Three sine layers (diaphragm, mid-body, shoulders) share one phase and lag
//! behind each other, so the body swells as a wave rather than a single pump.

use rand::Rng;
use serde::Serialize;
use slime_core::config::BreathingConfig;
use slime_core::math::lerp;
use slime_core::{EmotionalState, PersonalityTraits};
use std::f32::consts::TAU;

/// Outputs of one breathing step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BreathSample {
    pub phase: f32,
    /// Breaths per second, variation included.
    pub rate: f32,
    /// Multiplicative body scale, centred on 1.0.
    pub pulse: f32,
    pub belly_squish: f32,
}

/// Summed breathing pulse for a phase: `1 + Σ sin(2π(phase - lag)) * amp * intensity`.
pub fn breathing_pulse(phase: f32, intensity: f32, lags: &[f32; 3], amplitudes: &[f32; 3]) -> f32 {
    1.0 + lags
        .iter()
        .zip(amplitudes)
        .map(|(lag, amp)| (TAU * (phase - lag)).sin() * amp * intensity)
        .sum::<f32>()
}

#[derive(Debug, Clone)]
pub struct BreathingOscillator {
    config: BreathingConfig,
    rate_factor: f32,
    depth_factor: f32,
    phase: f32,
    variation: f32,
    next_variation_at: f64,
}

impl BreathingOscillator {
    pub fn new(config: BreathingConfig, personality: &PersonalityTraits) -> Self {
        Self {
            config,
            rate_factor: personality.breath_rate_factor(),
            depth_factor: personality.breath_depth_factor(),
            phase: 0.0,
            variation: 0.0,
            next_variation_at: 0.0,
        }
    }

    /// Base rate for an arousal level, before variation.
    pub fn rate_for(&self, arousal: f32) -> f32 {
        lerp(self.config.min_rate, self.config.max_rate, arousal) * self.rate_factor
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, now: f64, mood: &EmotionalState, rng: &mut R) -> BreathSample {
        let c = &self.config;
        if now >= self.next_variation_at {
            self.variation = rng.gen_range(c.variation_min..=c.variation_max);
            self.next_variation_at = now + rng.gen_range(c.variation_interval_min..=c.variation_interval_max) as f64;
            tracing::trace!("Breath variation {:+.2}", self.variation);
        }

        let rate = self.rate_for(mood.arousal) * (1.0 + self.variation);
        self.phase = (self.phase + dt * rate).rem_euclid(1.0);
        // rem_euclid can round up to exactly 1.0 for tiny negative inputs
        if self.phase >= 1.0 {
            self.phase = 0.0;
        }

        self.sample(mood, rate)
    }

    /// Output at the current phase without advancing.
    pub fn current(&self, mood: &EmotionalState) -> BreathSample {
        self.sample(mood, self.rate_for(mood.arousal) * (1.0 + self.variation))
    }

    fn sample(&self, mood: &EmotionalState, rate: f32) -> BreathSample {
        let c = &self.config;
        let pulse = breathing_pulse(self.phase, mood.intensity, &c.layer_lags, &c.layer_amplitudes) * self.depth_factor;
        let belly_squish = c.belly_base + (TAU * self.phase).sin().max(0.0) * c.belly_amplitude * (1.0 - mood.arousal);
        BreathSample {
            phase: self.phase,
            rate,
            pulse,
            belly_squish,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    pub fn variation(&self) -> f32 {
        self.variation
    }

    /// Whether the phase sits strictly inside `(start, end)`.
    pub fn in_window(&self, start: f32, end: f32) -> bool {
        self.phase > start && self.phase < end
    }
}
