//! Affect model: a 5-dimensional emotional state (valence, arousal,
//! dominance, engagement, intensity) that glides toward named presets.
//!
//! Presets are fixed points in affect space. Setting one does not snap the
//! creature there; it retargets a linear transition and locks further
//! changes for `minimum_emotion_duration` so that every emotion gets time
//! to play out.

use crate::config::{AffectConfig, PresetPrecedence};
use crate::error::UnknownPreset;
use crate::math::{lerp, sanitize_f32};
use crate::personality::PersonalityTraits;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;
use std::str::FromStr;

/// Instantaneous mood of the creature. All fields are clamped on assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionalState {
    /// Negative ← → positive (-1.0 to 1.0)
    pub valence: f32,
    /// Calm → excited (0.0 to 1.0)
    pub arousal: f32,
    /// Submissive → assertive (0.0 to 1.0)
    pub dominance: f32,
    /// Withdrawn → curious (0.0 to 1.0)
    pub engagement: f32,
    /// Strength of the expression (0.0 to 1.0)
    pub intensity: f32,
}

impl Default for EmotionalState {
    fn default() -> Self {
        EmotionPreset::Neutral.state()
    }
}

impl EmotionalState {
    pub fn new(valence: f32, arousal: f32, dominance: f32, engagement: f32, intensity: f32) -> Self {
        let mut state = Self {
            valence,
            arousal,
            dominance,
            engagement,
            intensity,
        };
        state.normalize();
        state
    }

    /// Clamp all values to valid ranges, replacing NaN/Inf with neutral values.
    pub fn normalize(&mut self) {
        self.valence = sanitize_f32(self.valence, 0.0).clamp(-1.0, 1.0);
        self.arousal = sanitize_f32(self.arousal, 0.5).clamp(0.0, 1.0);
        self.dominance = sanitize_f32(self.dominance, 0.5).clamp(0.0, 1.0);
        self.engagement = sanitize_f32(self.engagement, 0.5).clamp(0.0, 1.0);
        self.intensity = sanitize_f32(self.intensity, 0.3).clamp(0.0, 1.0);
    }

    /// Euclidean distance over the four affect axes (intensity excluded).
    pub fn distance(&self, other: &EmotionalState) -> f32 {
        let dv = self.valence - other.valence;
        let da = self.arousal - other.arousal;
        let dd = self.dominance - other.dominance;
        let de = self.engagement - other.engagement;
        (dv * dv + da * da + dd * dd + de * de).sqrt()
    }

    /// Interpolate every field toward `other` by `t` (clamped to [0, 1]).
    pub fn lerp(&self, other: &EmotionalState, t: f32) -> EmotionalState {
        EmotionalState {
            valence: lerp(self.valence, other.valence, t),
            arousal: lerp(self.arousal, other.arousal, t),
            dominance: lerp(self.dominance, other.dominance, t),
            engagement: lerp(self.engagement, other.engagement, t),
            intensity: lerp(self.intensity, other.intensity, t),
        }
    }
}

/// Named target points in affect space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum EmotionPreset {
    #[default]
    Neutral,
    Happy,
    Sad,
    Angry,
    Scared,
    Excited,
    Tired,
    Curious,
    Shy,
    Playful,
    Content,
    Lonely,
    Embarrassed,
    Pensive,
    Hopeful,
    Worried,
    Drowsy,
    Sleeping,
    Hungry,
    Affectionate,
    Grumpy,
    Surprised,
}

impl EmotionPreset {
    pub const ALL: [EmotionPreset; 22] = [
        EmotionPreset::Neutral,
        EmotionPreset::Happy,
        EmotionPreset::Sad,
        EmotionPreset::Angry,
        EmotionPreset::Scared,
        EmotionPreset::Excited,
        EmotionPreset::Tired,
        EmotionPreset::Curious,
        EmotionPreset::Shy,
        EmotionPreset::Playful,
        EmotionPreset::Content,
        EmotionPreset::Lonely,
        EmotionPreset::Embarrassed,
        EmotionPreset::Pensive,
        EmotionPreset::Hopeful,
        EmotionPreset::Worried,
        EmotionPreset::Drowsy,
        EmotionPreset::Sleeping,
        EmotionPreset::Hungry,
        EmotionPreset::Affectionate,
        EmotionPreset::Grumpy,
        EmotionPreset::Surprised,
    ];

    /// Coordinates as (valence, arousal, dominance, engagement, intensity).
    pub fn state(self) -> EmotionalState {
        let (v, a, d, e, i) = match self {
            EmotionPreset::Neutral => (0.0, 0.5, 0.5, 0.5, 0.3),
            EmotionPreset::Happy => (0.8, 0.6, 0.6, 0.7, 0.7),
            EmotionPreset::Sad => (-0.7, 0.3, 0.3, 0.2, 0.6),
            EmotionPreset::Angry => (-0.6, 0.9, 0.9, 0.8, 0.8),
            EmotionPreset::Scared => (-0.8, 0.95, 0.1, 0.7, 0.9),
            EmotionPreset::Excited => (0.9, 1.0, 0.7, 0.9, 0.9),
            EmotionPreset::Tired => (-0.2, 0.1, 0.3, 0.2, 0.5),
            EmotionPreset::Curious => (0.3, 0.6, 0.5, 0.95, 0.6),
            EmotionPreset::Shy => (0.1, 0.4, 0.2, 0.4, 0.6),
            EmotionPreset::Playful => (0.7, 0.75, 0.6, 0.85, 0.7),
            EmotionPreset::Content => (0.5, 0.3, 0.5, 0.4, 0.4),
            EmotionPreset::Lonely => (-0.5, 0.25, 0.3, 0.3, 0.6),
            EmotionPreset::Embarrassed => (-0.3, 0.6, 0.15, 0.5, 0.75),
            EmotionPreset::Pensive => (0.0, 0.35, 0.5, 0.6, 0.4),
            EmotionPreset::Hopeful => (0.4, 0.5, 0.45, 0.7, 0.5),
            EmotionPreset::Worried => (-0.4, 0.65, 0.35, 0.65, 0.65),
            EmotionPreset::Drowsy => (0.0, 0.15, 0.4, 0.2, 0.4),
            EmotionPreset::Sleeping => (0.1, 0.02, 0.5, 0.05, 0.2),
            EmotionPreset::Hungry => (-0.3, 0.55, 0.4, 0.6, 0.6),
            EmotionPreset::Affectionate => (0.85, 0.5, 0.5, 0.8, 0.7),
            EmotionPreset::Grumpy => (-0.5, 0.7, 0.75, 0.5, 0.7),
            EmotionPreset::Surprised => (0.2, 0.9, 0.4, 0.85, 0.8),
        };
        EmotionalState::new(v, a, d, e, i)
    }

    pub fn name(self) -> &'static str {
        match self {
            EmotionPreset::Neutral => "Neutral",
            EmotionPreset::Happy => "Happy",
            EmotionPreset::Sad => "Sad",
            EmotionPreset::Angry => "Angry",
            EmotionPreset::Scared => "Scared",
            EmotionPreset::Excited => "Excited",
            EmotionPreset::Tired => "Tired",
            EmotionPreset::Curious => "Curious",
            EmotionPreset::Shy => "Shy",
            EmotionPreset::Playful => "Playful",
            EmotionPreset::Content => "Content",
            EmotionPreset::Lonely => "Lonely",
            EmotionPreset::Embarrassed => "Embarrassed",
            EmotionPreset::Pensive => "Pensive",
            EmotionPreset::Hopeful => "Hopeful",
            EmotionPreset::Worried => "Worried",
            EmotionPreset::Drowsy => "Drowsy",
            EmotionPreset::Sleeping => "Sleeping",
            EmotionPreset::Hungry => "Hungry",
            EmotionPreset::Affectionate => "Affectionate",
            EmotionPreset::Grumpy => "Grumpy",
            EmotionPreset::Surprised => "Surprised",
        }
    }
}

impl fmt::Display for EmotionPreset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EmotionPreset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EmotionPreset::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownPreset(s.to_string()))
    }
}

/// Origin of a preset request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresetSource {
    /// An explicit `SetPreset` call.
    User,
    /// A reaction to feeding, attention or taps.
    Event,
    /// Autonomous re-selection by the needs meters.
    Needs,
}

/// Result of a preset request. A rejection is a normal outcome, not an error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresetChange {
    Applied,
    /// Refused while locked; `remaining` is the time left on the blocking timer.
    Rejected { remaining: f32 },
}

impl PresetChange {
    pub fn is_applied(&self) -> bool {
        matches!(self, PresetChange::Applied)
    }
}

/// Owns the current and target emotional states and the lock timers.
#[derive(Debug, Clone)]
pub struct AffectModel {
    config: AffectConfig,
    transition_bias: f32,
    current: EmotionalState,
    target: EmotionalState,
    preset: EmotionPreset,
    transitioning: bool,
    /// Time since the last accepted preset.
    emotion_timer: f32,
    emotion_lock_timer: f32,
    can_change_emotion: bool,
    /// Time since the last user-initiated preset, if any.
    user_preset_age: Option<f32>,
    history: VecDeque<EmotionalState>,
    history_clock: f32,
}

impl AffectModel {
    pub fn new(config: AffectConfig, personality: &PersonalityTraits) -> Self {
        let neutral = EmotionPreset::Neutral.state();
        Self {
            history: VecDeque::with_capacity(config.history_capacity),
            config,
            transition_bias: personality.transition_bias(),
            current: neutral,
            target: neutral,
            preset: EmotionPreset::Neutral,
            transitioning: false,
            emotion_timer: 0.0,
            emotion_lock_timer: 0.0,
            can_change_emotion: true,
            user_preset_age: None,
            history_clock: 0.0,
        }
    }

    /// Explicit preset change (the `SetPreset` entry point).
    pub fn set_preset(&mut self, preset: EmotionPreset) -> PresetChange {
        self.request(preset, PresetSource::User)
    }

    /// Ask for a preset change on behalf of `source`.
    ///
    /// While the lock is active the request is dropped, never queued.
    pub fn request(&mut self, preset: EmotionPreset, source: PresetSource) -> PresetChange {
        if let Some(remaining) = self.blocking_time(source) {
            tracing::debug!(
                "Preset {} from {:?} rejected: locked for {:.2}s more (current: {})",
                preset,
                source,
                remaining,
                self.preset
            );
            return PresetChange::Rejected { remaining };
        }

        self.target = preset.state();
        self.preset = preset;
        self.transitioning = true;
        if self.config.lock_emotion_during_duration {
            self.emotion_lock_timer = self.config.minimum_emotion_duration;
            self.can_change_emotion = self.emotion_lock_timer <= 0.0;
        }
        self.emotion_timer = 0.0;
        if source == PresetSource::User {
            self.user_preset_age = Some(0.0);
        }

        tracing::debug!(
            "Transitioning to {} from {:?} (locked for {}s)",
            preset,
            source,
            self.config.minimum_emotion_duration
        );
        PresetChange::Applied
    }

    /// Time left before a request from `source` would be accepted, if blocked.
    fn blocking_time(&self, source: PresetSource) -> Option<f32> {
        let locked = self.config.lock_emotion_during_duration && !self.can_change_emotion;
        let lock_remaining = self.emotion_lock_timer.max(0.0);

        if source != PresetSource::Needs {
            return locked.then_some(lock_remaining);
        }

        match self.config.precedence {
            PresetPrecedence::NeedsFirst => None,
            PresetPrecedence::LockOnly => locked.then_some(lock_remaining),
            PresetPrecedence::UserFirst => {
                let hold_remaining = self
                    .user_preset_age
                    .map(|age| (self.config.user_hold_secs - age).max(0.0))
                    .unwrap_or(0.0);
                let remaining = if locked {
                    lock_remaining.max(hold_remaining)
                } else {
                    hold_remaining
                };
                (remaining > 0.0).then_some(remaining)
            }
        }
    }

    /// Advance timers and the transition by `dt` seconds.
    pub fn tick(&mut self, dt: f32) {
        if self.emotion_lock_timer > 0.0 {
            self.emotion_lock_timer -= dt;
        }
        self.can_change_emotion = self.emotion_lock_timer <= 0.0;
        self.emotion_timer += dt;
        if let Some(age) = self.user_preset_age.as_mut() {
            *age += dt;
        }

        if self.transitioning {
            let t = self.config.emotion_transition_speed * self.transition_bias * dt;
            self.current = self.current.lerp(&self.target, t);
            self.current.normalize();
            if self.current.distance(&self.target) < self.config.completion_distance {
                self.transitioning = false;
            }
        }

        self.history_clock += dt;
        if self.history_clock >= self.config.history_interval {
            self.history_clock -= self.config.history_interval;
            if self.config.history_capacity > 0 {
                if self.history.len() >= self.config.history_capacity {
                    self.history.pop_front();
                }
                self.history.push_back(self.current);
            }
        }
    }

    pub fn current(&self) -> &EmotionalState {
        &self.current
    }

    pub fn target(&self) -> &EmotionalState {
        &self.target
    }

    pub fn preset(&self) -> EmotionPreset {
        self.preset
    }

    pub fn is_transitioning(&self) -> bool {
        self.transitioning
    }

    pub fn emotion_timer(&self) -> f32 {
        self.emotion_timer
    }

    pub fn emotion_lock_timer(&self) -> f32 {
        self.emotion_lock_timer.max(0.0)
    }

    pub fn can_change_emotion(&self) -> bool {
        self.can_change_emotion
    }

    /// Samples of `current`, oldest first, taken every `history_interval`.
    pub fn history(&self) -> impl Iterator<Item = &EmotionalState> {
        self.history.iter()
    }

    /// Directly overwrite the current state (for testing or manual intervention).
    pub fn set_current(&mut self, state: EmotionalState) {
        self.current = state;
        self.current.normalize();
    }
}
