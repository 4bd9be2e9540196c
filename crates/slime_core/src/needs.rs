//! Needs meters: hunger, attention, happiness and energy.
//!
//! The meters drain on their own, are refilled by care events, and when one
//! runs low they ask the affect model for a matching preset (Drowsy,
//! Sleeping, Hungry, Lonely). Those autonomous requests go through the same
//! lock as every other preset change.

use crate::affect::{AffectModel, EmotionPreset, PresetChange, PresetSource};
use crate::config::NeedsConfig;
use crate::math::sanitize_f32;
use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const MAX_RELATIONSHIP: f32 = 100.0;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeedsState {
    /// Feeling noticed (0.0 - 1.0). Drains only after a quiet period.
    pub attention: f32,
    pub happiness: f32,
    /// Satiety (0.0 - 1.0): 1.0 is freshly fed.
    pub hunger: f32,
    pub energy: f32,
    /// Simulation time of the last feed, attention or tap.
    pub last_interaction_time: f64,
    /// Accumulated bond with the user (0 - 100).
    pub relationship_level: f32,
}

impl Default for NeedsState {
    fn default() -> Self {
        Self {
            attention: 1.0,
            happiness: 0.7,
            hunger: 1.0,
            energy: 1.0,
            last_interaction_time: 0.0,
            relationship_level: 0.0,
        }
    }
}

impl NeedsState {
    /// Clamp all meters to valid ranges
    pub fn normalize(&mut self) {
        self.attention = sanitize_f32(self.attention, 0.5).clamp(0.0, 1.0);
        self.happiness = sanitize_f32(self.happiness, 0.5).clamp(0.0, 1.0);
        self.hunger = sanitize_f32(self.hunger, 0.5).clamp(0.0, 1.0);
        self.energy = sanitize_f32(self.energy, 0.5).clamp(0.0, 1.0);
        self.relationship_level = sanitize_f32(self.relationship_level, 0.0).clamp(0.0, MAX_RELATIONSHIP);
    }

    /// Relationship level mapped to [0, 1].
    pub fn relationship_norm(&self) -> f32 {
        self.relationship_level / MAX_RELATIONSHIP
    }
}

/// What a tap did.
#[derive(Debug, Clone, PartialEq)]
pub struct TapOutcome {
    pub position: Vec2,
    /// Taps inside the rolling window, this one included.
    pub count: usize,
    pub tap_intensity: f32,
    pub requested: Option<(EmotionPreset, PresetChange)>,
}

#[derive(Debug, Clone)]
pub struct NeedsSystem {
    config: NeedsConfig,
    state: NeedsState,
    taps: VecDeque<f64>,
    tap_intensity: f32,
}

impl NeedsSystem {
    pub fn new(config: NeedsConfig) -> Self {
        let state = NeedsState {
            relationship_level: config.initial_relationship.clamp(0.0, MAX_RELATIONSHIP),
            ..Default::default()
        };
        Self {
            tap_intensity: config.tap_intensity_base,
            config,
            state,
            taps: VecDeque::new(),
        }
    }

    /// Drain and replenish the meters, then re-select a preset if one runs low.
    ///
    /// Returns the preset that was applied autonomously this tick, if any.
    pub fn tick(&mut self, dt: f32, now: f64, affect: &mut AffectModel) -> Option<EmotionPreset> {
        let c = &self.config;
        let mood = *affect.current();
        let s = &mut self.state;

        s.hunger -= c.hunger_decay * dt;

        let time_alone = now - s.last_interaction_time;
        if time_alone > c.attention_grace_secs as f64 {
            s.attention -= c.attention_decay * dt;
        }

        s.energy -= c.energy_drain * mood.arousal * dt;
        if mood.arousal < 0.4 && mood.intensity < 0.5 {
            s.energy += c.energy_recovery * dt;
        }

        if s.attention < c.low_threshold || s.hunger < c.low_threshold {
            s.happiness -= c.happiness_decay * dt;
        } else if s.attention > c.high_threshold && s.hunger > c.high_threshold {
            s.happiness += c.happiness_gain * dt;
        }

        s.normalize();

        prune_taps(&mut self.taps, c.tap_window_secs as f64, now);
        if self.taps.is_empty() && self.tap_intensity > c.tap_intensity_base {
            self.tap_intensity = (self.tap_intensity - c.tap_intensity_relax * dt).max(c.tap_intensity_base);
        }

        if !self.config.enable_autonomous {
            return None;
        }
        let wanted = self.select_preset()?;
        if wanted == affect.preset() {
            return None;
        }
        match affect.request(wanted, PresetSource::Needs) {
            PresetChange::Applied => {
                tracing::info!(
                    "Needs re-selected {} (hunger={:.2}, attention={:.2}, energy={:.2})",
                    wanted,
                    self.state.hunger,
                    self.state.attention,
                    self.state.energy
                );
                Some(wanted)
            }
            PresetChange::Rejected { .. } => None,
        }
    }

    /// The preset the meters call for, in priority order; first match wins.
    pub fn select_preset(&self) -> Option<EmotionPreset> {
        let c = &self.config;
        let s = &self.state;
        if s.energy < c.drowsy_energy {
            if s.energy < c.sleeping_energy {
                Some(EmotionPreset::Sleeping)
            } else {
                Some(EmotionPreset::Drowsy)
            }
        } else if s.hunger < c.low_threshold {
            Some(EmotionPreset::Hungry)
        } else if s.attention < c.low_threshold {
            Some(EmotionPreset::Lonely)
        } else {
            None
        }
    }

    /// Refill hunger completely and try to settle into Content.
    pub fn feed(&mut self, now: f64, affect: &mut AffectModel) -> PresetChange {
        let s = &mut self.state;
        s.hunger = 1.0;
        s.happiness = (s.happiness + self.config.feed_happiness).min(1.0);
        s.last_interaction_time = now;
        s.relationship_level += self.config.relationship_feed;
        s.normalize();
        tracing::debug!("Fed at t={:.2}", now);
        affect.request(EmotionPreset::Content, PresetSource::Event)
    }

    /// Boost attention and happiness; a happy creature turns affectionate.
    pub fn give_attention(&mut self, now: f64, affect: &mut AffectModel) -> Option<PresetChange> {
        let s = &mut self.state;
        s.attention = (s.attention + self.config.attention_boost).min(1.0);
        s.happiness = (s.happiness + self.config.attention_happiness).min(1.0);
        s.last_interaction_time = now;
        s.relationship_level += self.config.relationship_attention;
        s.normalize();

        (s.happiness > self.config.affection_happiness)
            .then(|| affect.request(EmotionPreset::Affectionate, PresetSource::Event))
    }

    /// Register a tap. Rapid tapping raises tap intensity and eventually annoys.
    pub fn on_tap<R: Rng + ?Sized>(
        &mut self,
        position: Vec2,
        now: f64,
        affect: &mut AffectModel,
        rng: &mut R,
    ) -> TapOutcome {
        let c = &self.config;
        self.state.last_interaction_time = now;
        self.taps.push_back(now);
        prune_taps(&mut self.taps, c.tap_window_secs as f64, now);
        let count = self.taps.len();

        if count > c.tap_excite_count {
            let excess = (count - c.tap_excite_count) as f32;
            self.tap_intensity = (c.tap_intensity_base + c.tap_intensity_step * excess).min(c.tap_intensity_max);
        }

        let requested = if count > c.tap_grumpy_count {
            let change = affect.request(EmotionPreset::Grumpy, PresetSource::Event);
            Some((EmotionPreset::Grumpy, change))
        } else {
            if count <= c.tap_excite_count {
                self.state.relationship_level += c.relationship_tap;
            }
            let roll: f32 = rng.gen();
            (roll < c.surprise_chance).then(|| {
                let change = affect.request(EmotionPreset::Surprised, PresetSource::Event);
                (EmotionPreset::Surprised, change)
            })
        };
        self.state.normalize();

        tracing::trace!("Tap #{} at ({:.2}, {:.2}), intensity {:.2}", count, position.x, position.y, self.tap_intensity);
        TapOutcome {
            position,
            count,
            tap_intensity: self.tap_intensity,
            requested,
        }
    }

    /// Reset the interaction timer without any other effect.
    pub fn note_interaction(&mut self, now: f64) {
        self.state.last_interaction_time = now;
    }

    pub fn state(&self) -> &NeedsState {
        &self.state
    }

    /// Force the meters (for testing or manual intervention); values are clamped.
    pub fn set_state(&mut self, state: NeedsState) {
        self.state = state;
        self.state.normalize();
    }

    pub fn tap_intensity(&self) -> f32 {
        self.tap_intensity
    }

    /// Taps currently inside the rolling window.
    pub fn recent_taps(&self) -> usize {
        self.taps.len()
    }
}

/// Drop taps older than `window` seconds.
fn prune_taps(taps: &mut VecDeque<f64>, window: f64, now: f64) {
    while taps.front().is_some_and(|&t| now - t > window) {
        taps.pop_front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::affect::EmotionalState;
    use crate::config::AffectConfig;
    use crate::personality::PersonalityTraits;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn setup() -> (NeedsSystem, AffectModel) {
        let p = PersonalityTraits::default();
        (
            NeedsSystem::new(NeedsConfig::default()),
            AffectModel::new(AffectConfig::default(), &p),
        )
    }

    /// Tick both systems at 10 Hz from `start` for `seconds`; returns the end time.
    fn run(needs: &mut NeedsSystem, affect: &mut AffectModel, start: f64, seconds: f64) -> f64 {
        let mut now = start;
        let steps = (seconds * 10.0).round() as usize;
        for _ in 0..steps {
            now += 0.1;
            needs.tick(0.1, now, affect);
            affect.tick(0.1);
        }
        now
    }

    #[test]
    fn test_hunger_drains_continuously() {
        let (mut needs, mut affect) = setup();
        run(&mut needs, &mut affect, 0.0, 10.0);
        assert!((needs.state().hunger - 0.9).abs() < 1e-3);
    }

    #[test]
    fn test_attention_grace_period() {
        let (mut needs, mut affect) = setup();
        let now = run(&mut needs, &mut affect, 0.0, 29.5);
        assert_eq!(needs.state().attention, 1.0);
        run(&mut needs, &mut affect, now, 10.5);
        let dropped = 1.0 - needs.state().attention;
        // ~10s past the grace period at 0.02/s
        assert!(dropped > 0.18 && dropped < 0.22, "dropped {}", dropped);
    }

    #[test]
    fn test_attention_decay_ignores_extroversion() {
        let config = NeedsConfig::default();
        for extroversion in [0.0, 1.0] {
            let p = PersonalityTraits::new(extroversion, 0.5, 0.5, 0.5, 0.5);
            let mut needs = NeedsSystem::new(config.clone());
            let mut affect = AffectModel::new(AffectConfig::default(), &p);
            needs.tick(1.0, 100.0, &mut affect);
            assert!((needs.state().attention - 0.98).abs() < 1e-6, "extroversion {}", extroversion);
        }
    }

    #[test]
    fn test_energy_drain_scales_with_arousal() {
        let (mut needs, mut affect) = setup();
        affect.set_current(EmotionalState::new(0.9, 1.0, 0.7, 0.9, 0.9));
        needs.tick(1.0, 1.0, &mut affect);
        assert!((needs.state().energy - (1.0 - 0.03)).abs() < 1e-5);
    }

    #[test]
    fn test_happiness_drops_when_starving() {
        let (mut needs, mut affect) = setup();
        needs.set_state(NeedsState {
            hunger: 0.2,
            happiness: 0.5,
            ..Default::default()
        });
        needs.tick(1.0, 1.0, &mut affect);
        assert!((needs.state().happiness - 0.45).abs() < 1e-5);
    }

    #[test]
    fn test_happiness_grows_when_cared_for() {
        let (mut needs, mut affect) = setup();
        needs.tick(1.0, 1.0, &mut affect);
        assert!((needs.state().happiness - 0.72).abs() < 1e-5);
    }

    #[test]
    fn test_autonomous_priority_order() {
        let (mut needs, mut affect) = setup();
        needs.set_state(NeedsState {
            energy: 0.15,
            hunger: 0.1,
            attention: 0.1,
            ..Default::default()
        });
        assert_eq!(needs.select_preset(), Some(EmotionPreset::Drowsy));

        needs.set_state(NeedsState {
            energy: 0.05,
            ..Default::default()
        });
        assert_eq!(needs.select_preset(), Some(EmotionPreset::Sleeping));

        needs.set_state(NeedsState {
            hunger: 0.2,
            attention: 0.1,
            ..Default::default()
        });
        assert_eq!(needs.select_preset(), Some(EmotionPreset::Hungry));
        assert_eq!(needs.tick(0.1, 0.1, &mut affect), Some(EmotionPreset::Hungry));
        assert_eq!(affect.preset(), EmotionPreset::Hungry);
    }

    #[test]
    fn test_autonomous_waits_for_lock() {
        let (mut needs, mut affect) = setup();
        affect.set_preset(EmotionPreset::Playful);
        needs.set_state(NeedsState {
            attention: 0.1,
            ..Default::default()
        });
        assert_eq!(needs.tick(0.1, 0.1, &mut affect), None);
        assert_eq!(affect.preset(), EmotionPreset::Playful);
        run(&mut needs, &mut affect, 0.1, 3.5);
        assert_eq!(affect.preset(), EmotionPreset::Lonely);
    }

    #[test]
    fn test_feed_sets_hunger_exactly() {
        let (mut needs, mut affect) = setup();
        needs.set_state(NeedsState {
            hunger: 0.123,
            happiness: 0.9,
            ..Default::default()
        });
        let change = needs.feed(5.0, &mut affect);
        assert_eq!(needs.state().hunger, 1.0);
        assert_eq!(needs.state().happiness, 1.0);
        assert_eq!(needs.state().last_interaction_time, 5.0);
        assert!(change.is_applied());
        assert_eq!(affect.preset(), EmotionPreset::Content);
    }

    #[test]
    fn test_give_attention_affection_threshold() {
        let (mut needs, mut affect) = setup();
        needs.set_state(NeedsState {
            attention: 0.2,
            happiness: 0.3,
            ..Default::default()
        });
        // 0.3 + 0.2 = 0.5 is not above 0.6
        assert_eq!(needs.give_attention(1.0, &mut affect), None);
        assert!((needs.state().attention - 0.5).abs() < 1e-6);
        // 0.5 + 0.2 = 0.7
        assert_eq!(needs.give_attention(2.0, &mut affect), Some(PresetChange::Applied));
        assert_eq!(affect.preset(), EmotionPreset::Affectionate);
    }

    #[test]
    fn test_tap_storm_turns_grumpy() {
        let (mut needs, mut affect) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut last = None;
        for i in 0..9 {
            last = Some(needs.on_tap(Vec2::ZERO, 0.1 * i as f64, &mut affect, &mut rng));
        }
        let last = last.unwrap();
        assert_eq!(last.count, 9);
        assert_eq!(last.tap_intensity, 1.5);
        assert_eq!(last.requested.map(|(p, _)| p), Some(EmotionPreset::Grumpy));
    }

    #[test]
    fn test_few_taps_keep_baseline_intensity() {
        let (mut needs, mut affect) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        for i in 0..3 {
            let outcome = needs.on_tap(Vec2::ZERO, 0.2 * i as f64, &mut affect, &mut rng);
            assert_ne!(outcome.requested.map(|(p, _)| p), Some(EmotionPreset::Grumpy));
        }
        assert_eq!(needs.tap_intensity(), 0.5);
        assert_ne!(affect.preset(), EmotionPreset::Grumpy);
    }

    #[test]
    fn test_tap_window_expires() {
        let (mut needs, mut affect) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for i in 0..4 {
            needs.on_tap(Vec2::ZERO, 0.1 * i as f64, &mut affect, &mut rng);
        }
        let outcome = needs.on_tap(Vec2::ZERO, 5.0, &mut affect, &mut rng);
        assert_eq!(outcome.count, 1);
    }

    #[test]
    fn test_tick_prunes_stale_taps() {
        let (mut needs, mut affect) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        for i in 0..3 {
            needs.on_tap(Vec2::ZERO, 0.1 * i as f64, &mut affect, &mut rng);
        }
        assert_eq!(needs.recent_taps(), 3);
        needs.tick(0.1, 1.5, &mut affect);
        assert_eq!(needs.recent_taps(), 3);
        needs.tick(0.1, 2.15, &mut affect);
        assert_eq!(needs.recent_taps(), 1);
        needs.tick(0.1, 3.0, &mut affect);
        assert_eq!(needs.recent_taps(), 0);
    }

    #[test]
    fn test_tap_intensity_relaxes() {
        let (mut needs, mut affect) = setup();
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        for i in 0..7 {
            needs.on_tap(Vec2::ZERO, 0.1 * i as f64, &mut affect, &mut rng);
        }
        assert!(needs.tap_intensity() > 0.5);
        run(&mut needs, &mut affect, 0.7, 5.0);
        assert_eq!(needs.tap_intensity(), 0.5);
    }
}
