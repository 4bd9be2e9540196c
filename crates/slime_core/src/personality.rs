//! Personality traits: five fixed sliders that bias how the creature moves
//! through affect space. They are read-only while the simulation runs.

use crate::math::lerp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonalityTraits {
    /// Social energy (0.0 - 1.0).
    pub extroversion: f32,
    /// Emotional reactivity (0.0 - 1.0). Faster transitions, more shyness.
    pub sensitivity: f32,
    /// Exploration drive (0.0 - 1.0). Eagerness of the gaze spring.
    pub curiosity: f32,
    /// Warmth toward the user (0.0 - 1.0). Slightly larger, softer eyes.
    pub affection: f32,
    /// Baseline activity (0.0 - 1.0). Breathing rate and depth.
    pub energy_level: f32,
}

impl Default for PersonalityTraits {
    fn default() -> Self {
        Self {
            extroversion: 0.5,
            sensitivity: 0.5,
            curiosity: 0.5,
            affection: 0.5,
            energy_level: 0.5,
        }
    }
}

impl PersonalityTraits {
    pub fn new(extroversion: f32, sensitivity: f32, curiosity: f32, affection: f32, energy_level: f32) -> Self {
        let mut traits = Self {
            extroversion,
            sensitivity,
            curiosity,
            affection,
            energy_level,
        };
        traits.normalize();
        traits
    }

    /// Clamp all sliders to [0, 1]; non-finite values fall back to 0.5.
    pub fn normalize(&mut self) {
        for v in [
            &mut self.extroversion,
            &mut self.sensitivity,
            &mut self.curiosity,
            &mut self.affection,
            &mut self.energy_level,
        ] {
            *v = crate::math::sanitize_f32(*v, 0.5).clamp(0.0, 1.0);
        }
    }

    /// Multiplier on the affect transition speed.
    pub fn transition_bias(&self) -> f32 {
        lerp(0.85, 1.15, self.sensitivity)
    }

    /// Multiplier on the breathing rate.
    pub fn breath_rate_factor(&self) -> f32 {
        lerp(0.8, 1.2, self.energy_level)
    }

    /// Multiplier on the breathing pulse amplitude.
    pub fn breath_depth_factor(&self) -> f32 {
        lerp(0.98, 1.02, self.energy_level)
    }

    /// Divisor on the gaze spring time constant (higher = snappier gaze).
    pub fn gaze_eagerness(&self) -> f32 {
        lerp(0.8, 1.2, self.curiosity)
    }

    /// Factor in the shy-break probability.
    pub fn shyness(&self) -> f32 {
        0.5 + self.sensitivity
    }

    /// Multiplier on eye emotiveness.
    pub fn eye_warmth(&self) -> f32 {
        lerp(0.95, 1.05, self.affection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_factors_are_neutral() {
        let p = PersonalityTraits::default();
        assert!((p.transition_bias() - 1.0).abs() < 1e-6);
        assert!((p.breath_rate_factor() - 1.0).abs() < 1e-6);
        assert!((p.breath_depth_factor() - 1.0).abs() < 1e-6);
        assert!((p.gaze_eagerness() - 1.0).abs() < 1e-6);
        assert!((p.shyness() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_new_clamps_sliders() {
        let p = PersonalityTraits::new(2.0, -1.0, f32::NAN, 0.3, 0.9);
        assert_eq!(p.extroversion, 1.0);
        assert_eq!(p.sensitivity, 0.0);
        assert_eq!(p.curiosity, 0.5);
        assert_eq!(p.affection, 0.3);
    }

    #[test]
    fn test_energetic_breathes_faster() {
        let calm = PersonalityTraits::new(0.5, 0.5, 0.5, 0.5, 0.0);
        let lively = PersonalityTraits::new(0.5, 0.5, 0.5, 0.5, 1.0);
        assert!(lively.breath_rate_factor() > calm.breath_rate_factor());
        assert!((lively.breath_rate_factor() - 1.2).abs() < 1e-6);
    }
}
