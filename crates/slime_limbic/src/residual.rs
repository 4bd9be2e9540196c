//! Lingering after-effects of strong emotions.
//!
//! Each channel is a first-order low-pass filter: while its affect condition
//! holds it rises toward a drive level, otherwise it falls back to zero.

use serde::Serialize;
use slime_core::config::ResidualConfig;
use slime_core::math::lerp;
use slime_core::EmotionalState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Residual {
    TearPuffiness,
    ExcitementResidue,
    TensionResidue,
    EyeWetness,
    EyeRedness,
    Blush,
    HeartGlow,
    Sweat,
    SleepDepth,
}

impl Residual {
    pub const ALL: [Residual; 9] = [
        Residual::TearPuffiness,
        Residual::ExcitementResidue,
        Residual::TensionResidue,
        Residual::EyeWetness,
        Residual::EyeRedness,
        Residual::Blush,
        Residual::HeartGlow,
        Residual::Sweat,
        Residual::SleepDepth,
    ];

    /// Level this channel is pulled toward, or `None` when its condition is off.
    pub fn drive(self, m: &EmotionalState) -> Option<f32> {
        let (v, a, d, e, i) = (m.valence, m.arousal, m.dominance, m.engagement, m.intensity);
        match self {
            Residual::TearPuffiness => (v < -0.6 && i > 0.6).then_some(1.0),
            Residual::ExcitementResidue => (a > 0.85 && v > 0.7).then_some(1.0),
            Residual::TensionResidue => (d > 0.8 && i > 0.7).then_some(1.0),
            Residual::EyeWetness => (v < -0.4 && i > 0.4).then_some(i),
            Residual::EyeRedness => (v < -0.6 && i > 0.6).then_some(0.6 * i),
            Residual::Blush => {
                let shy = (d < 0.3 && a > 0.5 && v > -0.3).then_some(i);
                let fond = (v > 0.7 && e > 0.7 && a < 0.7).then_some(0.6 * i);
                match (shy, fond) {
                    (Some(x), Some(y)) => Some(x.max(y)),
                    (x, y) => x.or(y),
                }
            }
            Residual::HeartGlow => (v > 0.75 && e > 0.7).then_some(i),
            Residual::Sweat => (a > 0.7 && d < 0.4).then_some(i),
            Residual::SleepDepth => (a < 0.2).then(|| 1.0 - a / 0.2),
        }
    }

    /// `(rise, fall)` rates per second.
    pub fn rates(self) -> (f32, f32) {
        match self {
            Residual::TearPuffiness => (0.5, 0.1),
            Residual::ExcitementResidue => (0.4, 0.15),
            Residual::TensionResidue => (0.3, 0.12),
            Residual::EyeWetness => (0.8, 0.2),
            Residual::EyeRedness => (0.2, 0.05),
            Residual::Blush => (1.5, 0.4),
            Residual::HeartGlow => (1.0, 0.3),
            Residual::Sweat => (0.8, 0.25),
            Residual::SleepDepth => (0.3, 1.2),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResidualEffectTracker {
    config: ResidualConfig,
    values: [f32; Residual::ALL.len()],
}

impl ResidualEffectTracker {
    pub fn new(config: ResidualConfig) -> Self {
        Self {
            config,
            values: [0.0; Residual::ALL.len()],
        }
    }

    pub fn tick(&mut self, dt: f32, mood: &EmotionalState) {
        for (slot, residual) in self.values.iter_mut().zip(Residual::ALL) {
            let (rise, fall) = residual.rates();
            let (target, rate) = match residual.drive(mood) {
                Some(level) if level > *slot => (level, rise * self.config.rise_scale),
                Some(level) => (level, fall * self.config.fall_scale),
                None => (0.0, fall * self.config.fall_scale),
            };
            *slot = lerp(*slot, target, rate * dt).clamp(0.0, 1.0);
        }
    }

    pub fn get(&self, residual: Residual) -> f32 {
        self.values[residual as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Residual, f32)> + '_ {
        Residual::ALL.into_iter().zip(self.values.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slime_core::EmotionPreset;

    fn run(tracker: &mut ResidualEffectTracker, mood: &EmotionalState, seconds: f32) {
        for _ in 0..(seconds * 20.0) as usize {
            tracker.tick(0.05, mood);
        }
    }

    #[test]
    fn test_crying_builds_then_fades() {
        let mut tracker = ResidualEffectTracker::new(ResidualConfig::default());
        let crying = EmotionalState::new(-0.9, 0.4, 0.2, 0.3, 0.9);
        run(&mut tracker, &crying, 5.0);
        let puffy = tracker.get(Residual::TearPuffiness);
        assert!(puffy > 0.8, "{}", puffy);

        run(&mut tracker, &EmotionPreset::Neutral.state(), 5.0);
        let after = tracker.get(Residual::TearPuffiness);
        assert!(after < puffy && after > 0.4, "tear puffiness should linger: {}", after);
    }

    #[test]
    fn test_calm_mood_leaves_no_residue() {
        let mut tracker = ResidualEffectTracker::new(ResidualConfig::default());
        run(&mut tracker, &EmotionPreset::Neutral.state(), 10.0);
        assert!(tracker.iter().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_sleep_depth_follows_low_arousal() {
        let mut tracker = ResidualEffectTracker::new(ResidualConfig::default());
        let sleeping = EmotionPreset::Sleeping.state();
        run(&mut tracker, &sleeping, 20.0);
        assert!(tracker.get(Residual::SleepDepth) > 0.8);
        run(&mut tracker, &EmotionPreset::Excited.state(), 5.0);
        assert!(tracker.get(Residual::SleepDepth) < 0.01);
    }

    #[test]
    fn test_zero_scales_freeze_channels() {
        let config = ResidualConfig {
            rise_scale: 0.0,
            fall_scale: 0.0,
        };
        let mut tracker = ResidualEffectTracker::new(config);
        run(&mut tracker, &EmotionPreset::Excited.state(), 5.0);
        assert_eq!(tracker.get(Residual::ExcitementResidue), 0.0);
    }
}
