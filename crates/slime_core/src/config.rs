use crate::error::ConfigError;
use crate::personality::PersonalityTraits;
use anyhow::{Context, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ============================================================================
// Top-level config
// ============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SlimeConfig {
    pub simulation: SimulationConfig,
    pub affect: AffectConfig,
    pub needs: NeedsConfig,
    pub personality: PersonalityTraits,
    pub breathing: BreathingConfig,
    pub eyes: EyeConfig,
    pub body: BodyConfig,
    pub residual: ResidualConfig,
}

impl SlimeConfig {
    /// Load config from a TOML file, falling back to defaults for missing fields.
    /// After loading, env var overrides are applied and the result is validated.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let mut config = Self::from_toml_str(&content)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML document without touching the environment.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let mut config: SlimeConfig = toml::from_str(content).with_context(|| "Failed to parse TOML config")?;
        config.personality.normalize();
        Ok(config)
    }

    /// Try to load from path; if the file is missing or invalid, return defaults with env overrides.
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Self {
        match Self::load(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::info!("Config file not found or invalid ({:#}), using defaults", e);
                let mut cfg = Self::default();
                cfg.apply_env_overrides();
                cfg
            }
        }
    }

    /// Apply environment variable overrides on top of file-based config.
    fn apply_env_overrides(&mut self) {
        if let Ok(v) = std::env::var("SLIME_SEED") {
            if let Ok(n) = v.parse() {
                self.simulation.seed = n;
            }
        }
        if let Ok(v) = std::env::var("SLIME_MIN_EMOTION_DURATION") {
            if let Ok(n) = v.parse() {
                self.affect.minimum_emotion_duration = n;
            }
        }
        if let Ok(v) = std::env::var("SLIME_TRANSITION_SPEED") {
            if let Ok(n) = v.parse() {
                self.affect.emotion_transition_speed = n;
            }
        }
        if let Ok(v) = std::env::var("SLIME_CURSOR_TRACKING") {
            if let Ok(b) = v.parse() {
                self.simulation.enable_cursor_tracking = b;
            }
        }
        if let Ok(v) = std::env::var("SLIME_TAP_RESPONSE") {
            if let Ok(b) = v.parse() {
                self.simulation.enable_tap_response = b;
            }
        }
    }

    /// Reject tuning values that would destabilize the tick loop.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let s = &self.simulation;
        non_negative("simulation.cursor_tracking_startup_delay", s.cursor_tracking_startup_delay)?;
        positive("simulation.max_step", s.max_step)?;

        let a = &self.affect;
        non_negative("affect.minimum_emotion_duration", a.minimum_emotion_duration)?;
        non_negative("affect.emotion_transition_speed", a.emotion_transition_speed)?;
        non_negative("affect.completion_distance", a.completion_distance)?;
        non_negative("affect.user_hold_secs", a.user_hold_secs)?;
        positive("affect.history_interval", a.history_interval)?;

        let n = &self.needs;
        for (field, value) in [
            ("needs.hunger_decay", n.hunger_decay),
            ("needs.attention_decay", n.attention_decay),
            ("needs.attention_grace_secs", n.attention_grace_secs),
            ("needs.energy_drain", n.energy_drain),
            ("needs.energy_recovery", n.energy_recovery),
            ("needs.happiness_decay", n.happiness_decay),
            ("needs.happiness_gain", n.happiness_gain),
            ("needs.tap_window_secs", n.tap_window_secs),
            ("needs.tap_intensity_base", n.tap_intensity_base),
            ("needs.tap_intensity_step", n.tap_intensity_step),
            ("needs.tap_intensity_relax", n.tap_intensity_relax),
            ("needs.surprise_chance", n.surprise_chance),
        ] {
            non_negative(field, value)?;
        }
        ordered("needs.tap_intensity", n.tap_intensity_base, n.tap_intensity_max)?;

        let b = &self.breathing;
        ordered("breathing.rate", b.min_rate, b.max_rate)?;
        ordered("breathing.variation", b.variation_min, b.variation_max)?;
        ordered("breathing.variation_interval", b.variation_interval_min, b.variation_interval_max)?;
        finite("breathing.variation_min", b.variation_min)?;

        let e = &self.eyes;
        for (field, value) in [
            ("eyes.attention_distance", e.attention_distance),
            ("eyes.movement_epsilon", e.movement_epsilon),
            ("eyes.motion_grace", e.motion_grace),
            ("eyes.max_gaze_offset", e.max_gaze_offset),
            ("eyes.gaze_time_high_arousal", e.gaze_time_high_arousal),
            ("eyes.gaze_time_low_arousal", e.gaze_time_low_arousal),
            ("eyes.gaze_time_default", e.gaze_time_default),
            ("eyes.tracking_error_max", e.tracking_error_max),
            ("eyes.shy_base_chance", e.shy_base_chance),
            ("eyes.first_impression_secs", e.first_impression_secs),
            ("eyes.idle_after_secs", e.idle_after_secs),
            ("eyes.pupil_smooth_time", e.pupil_smooth_time),
            ("eyes.blink_jitter", e.blink_jitter),
            ("eyes.tap_pulse_secs", e.tap_pulse_secs),
        ] {
            non_negative(field, value)?;
        }
        ordered("eyes.awareness", e.noticing_after, e.tracking_after)?;
        ordered("eyes.tracking_error_interval", e.tracking_error_interval_min, e.tracking_error_interval_max)?;
        ordered("eyes.shy_duration", e.shy_duration_min, e.shy_duration_max)?;
        ordered("eyes.glance_interval", e.glance_interval_min, e.glance_interval_max)?;
        ordered("eyes.glance_duration", e.glance_duration_min, e.glance_duration_max)?;
        ordered("eyes.exhale_window", e.exhale_window_start, e.exhale_window_end)?;
        ordered("eyes.pupil", e.pupil_min, e.pupil_max)?;
        positive("eyes.shy_check_interval", e.shy_check_interval)?;
        positive("eyes.blink_duration", e.blink_duration)?;
        positive("eyes.idle_full_secs", e.idle_full_secs)?;
        if e.awareness_timer_cap < e.tracking_after {
            return Err(ConfigError::InvertedRange {
                field: "eyes.awareness_timer_cap",
                min: e.tracking_after,
                max: e.awareness_timer_cap,
            });
        }

        let body = &self.body;
        ordered("body.micro_shift_interval", body.micro_shift_interval_min, body.micro_shift_interval_max)?;
        non_negative("body.tremble_rate", body.tremble_rate)?;
        non_negative("body.micro_shift_max_deg", body.micro_shift_max_deg)?;

        non_negative("residual.rise_scale", self.residual.rise_scale)?;
        non_negative("residual.fall_scale", self.residual.fall_scale)?;
        Ok(())
    }
}

fn finite(field: &'static str, value: f32) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite { field, value })
    }
}

fn non_negative(field: &'static str, value: f32) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value < 0.0 {
        return Err(ConfigError::Negative { field, value });
    }
    Ok(())
}

fn positive(field: &'static str, value: f32) -> Result<(), ConfigError> {
    non_negative(field, value)?;
    if value == 0.0 {
        return Err(ConfigError::Zero { field });
    }
    Ok(())
}

fn ordered(field: &'static str, min: f32, max: f32) -> Result<(), ConfigError> {
    finite(field, min)?;
    finite(field, max)?;
    if min > max {
        return Err(ConfigError::InvertedRange { field, min, max });
    }
    Ok(())
}

// ============================================================================
// Sub-configs
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Seed of the single generator behind every stochastic decision.
    pub seed: u64,
    pub enable_cursor_tracking: bool,
    pub enable_tap_response: bool,
    /// The pointer is ignored for this many seconds after start.
    pub cursor_tracking_startup_delay: f32,
    /// Large frame deltas are split into substeps no longer than this.
    pub max_step: f32,
    /// Run the needs meters (hunger/attention/happiness/energy).
    pub enable_needs: bool,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: 0x5eed,
            enable_cursor_tracking: true,
            enable_tap_response: true,
            cursor_tracking_startup_delay: 0.5,
            max_step: 0.1,
            enable_needs: true,
        }
    }
}

/// Who asked for a preset change. Decides how the lock applies.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresetPrecedence {
    /// Every request waits for the lock to expire.
    #[default]
    LockOnly,
    /// Needs-driven requests additionally wait `user_hold_secs` after a user preset.
    UserFirst,
    /// Needs-driven requests ignore the lock.
    NeedsFirst,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AffectConfig {
    /// Minimum time a preset plays before another one is accepted.
    pub minimum_emotion_duration: f32,
    pub lock_emotion_during_duration: bool,
    /// Per-second interpolation rate toward the target state.
    pub emotion_transition_speed: f32,
    /// Transition ends once the 4-axis distance drops below this.
    pub completion_distance: f32,
    pub precedence: PresetPrecedence,
    pub user_hold_secs: f32,
    /// Seconds between emotion history samples.
    pub history_interval: f32,
    pub history_capacity: usize,
}

impl Default for AffectConfig {
    fn default() -> Self {
        Self {
            minimum_emotion_duration: 3.0,
            lock_emotion_during_duration: true,
            emotion_transition_speed: 1.0,
            completion_distance: 0.05,
            precedence: PresetPrecedence::LockOnly,
            user_hold_secs: 10.0,
            history_interval: 3.0,
            history_capacity: 20,
        }
    }
}

/// Rates are per second; thresholds are on the [0, 1] meters.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NeedsConfig {
    pub hunger_decay: f32,
    pub attention_decay: f32,
    /// Attention only starts to drop after this long without interaction.
    pub attention_grace_secs: f32,
    /// Energy drain, scaled by current arousal.
    pub energy_drain: f32,
    /// Energy regained while calm (arousal < 0.4, intensity < 0.5).
    pub energy_recovery: f32,
    pub happiness_decay: f32,
    pub happiness_gain: f32,
    pub low_threshold: f32,
    pub high_threshold: f32,
    pub drowsy_energy: f32,
    pub sleeping_energy: f32,
    pub feed_happiness: f32,
    pub attention_boost: f32,
    pub attention_happiness: f32,
    /// Happiness above which attention makes the creature affectionate.
    pub affection_happiness: f32,
    pub tap_window_secs: f32,
    pub tap_excite_count: usize,
    pub tap_grumpy_count: usize,
    pub tap_intensity_base: f32,
    pub tap_intensity_step: f32,
    pub tap_intensity_max: f32,
    pub tap_intensity_relax: f32,
    pub surprise_chance: f32,
    pub relationship_feed: f32,
    pub relationship_attention: f32,
    pub relationship_tap: f32,
    pub initial_relationship: f32,
    /// Let low meters re-select presets on their own.
    pub enable_autonomous: bool,
}

impl Default for NeedsConfig {
    fn default() -> Self {
        Self {
            hunger_decay: 0.01,
            attention_decay: 0.02,
            attention_grace_secs: 30.0,
            energy_drain: 0.03,
            energy_recovery: 0.02,
            happiness_decay: 0.05,
            happiness_gain: 0.02,
            low_threshold: 0.3,
            high_threshold: 0.7,
            drowsy_energy: 0.2,
            sleeping_energy: 0.1,
            feed_happiness: 0.25,
            attention_boost: 0.3,
            attention_happiness: 0.2,
            affection_happiness: 0.6,
            tap_window_secs: 2.0,
            tap_excite_count: 5,
            tap_grumpy_count: 8,
            tap_intensity_base: 0.5,
            tap_intensity_step: 0.25,
            tap_intensity_max: 2.0,
            tap_intensity_relax: 0.5,
            surprise_chance: 0.3,
            relationship_feed: 2.0,
            relationship_attention: 3.0,
            relationship_tap: 0.5,
            initial_relationship: 0.0,
            enable_autonomous: true,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BreathingConfig {
    /// Breaths per second at arousal 0 and arousal 1.
    pub min_rate: f32,
    pub max_rate: f32,
    pub variation_min: f32,
    pub variation_max: f32,
    pub variation_interval_min: f32,
    pub variation_interval_max: f32,
    /// Phase lag of the diaphragm, mid-body and shoulder layers.
    pub layer_lags: [f32; 3],
    pub layer_amplitudes: [f32; 3],
    pub belly_base: f32,
    pub belly_amplitude: f32,
}

impl Default for BreathingConfig {
    fn default() -> Self {
        Self {
            min_rate: 0.5,
            max_rate: 2.0,
            variation_min: -0.2,
            variation_max: 0.3,
            variation_interval_min: 8.0,
            variation_interval_max: 15.0,
            layer_lags: [0.0, 0.15, 0.25],
            layer_amplitudes: [0.03, 0.02, 0.01],
            belly_base: 0.15,
            belly_amplitude: 0.1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeConfig {
    // --- awareness ---
    pub attention_distance: f32,
    pub movement_epsilon: f32,
    /// The pointer counts as moving for this long after its last movement.
    pub motion_grace: f32,
    pub noticing_after: f32,
    pub tracking_after: f32,
    /// Awareness timer decay relative to its growth while the pointer is away.
    pub awareness_decay_ratio: f32,
    pub awareness_timer_cap: f32,

    // --- gaze ---
    pub max_gaze_offset: f32,
    pub gaze_time_high_arousal: f32,
    pub gaze_time_low_arousal: f32,
    pub gaze_time_default: f32,
    pub focus_rate: f32,
    pub tracking_error_max: f32,
    pub tracking_error_interval_min: f32,
    pub tracking_error_interval_max: f32,

    // --- shy breaks ---
    pub shy_check_interval: f32,
    pub shy_base_chance: f32,
    pub shy_focus_threshold: f32,
    pub shy_duration_min: f32,
    pub shy_duration_max: f32,
    pub shy_gaze_radius: f32,

    // --- first impression ---
    pub first_impression_secs: f32,
    pub first_impression_bias: f32,
    pub glance_interval_min: f32,
    pub glance_interval_max: f32,
    pub glance_duration_min: f32,
    pub glance_duration_max: f32,
    /// Where the creature assumes the viewer's face is, as a gaze offset.
    pub face_position: Vec2,

    // --- disinterest ---
    pub idle_after_secs: f32,
    pub idle_full_secs: f32,
    pub idle_max_reduction: f32,

    // --- blink ---
    pub blink_duration: f32,
    pub blink_interval_calm: f32,
    pub blink_interval_aroused: f32,
    pub blink_jitter: f32,
    pub exhale_window_start: f32,
    pub exhale_window_end: f32,

    // --- pupil ---
    pub pupil_min: f32,
    pub pupil_max: f32,
    pub pupil_focus_gain: f32,
    pub pupil_smooth_time: f32,
    pub tap_pupil_pulse: f32,
    pub tap_pulse_secs: f32,
}

impl Default for EyeConfig {
    fn default() -> Self {
        Self {
            attention_distance: 5.0,
            movement_epsilon: 0.001,
            motion_grace: 0.25,
            noticing_after: 2.0,
            tracking_after: 5.0,
            awareness_decay_ratio: 0.5,
            awareness_timer_cap: 8.0,

            max_gaze_offset: 0.15,
            gaze_time_high_arousal: 0.6,
            gaze_time_low_arousal: 1.2,
            gaze_time_default: 0.8,
            focus_rate: 2.0,
            tracking_error_max: 0.015,
            tracking_error_interval_min: 0.3,
            tracking_error_interval_max: 0.8,

            shy_check_interval: 1.0,
            shy_base_chance: 0.15,
            shy_focus_threshold: 0.5,
            shy_duration_min: 0.8,
            shy_duration_max: 2.5,
            shy_gaze_radius: 0.04,

            first_impression_secs: 10.0,
            first_impression_bias: 0.8,
            glance_interval_min: 3.0,
            glance_interval_max: 5.0,
            glance_duration_min: 1.0,
            glance_duration_max: 2.0,
            face_position: Vec2::new(0.0, 0.03),

            idle_after_secs: 3.0,
            idle_full_secs: 7.0,
            idle_max_reduction: 0.8,

            blink_duration: 0.1,
            blink_interval_calm: 4.0,
            blink_interval_aroused: 2.0,
            blink_jitter: 0.3,
            exhale_window_start: 0.5,
            exhale_window_end: 0.7,

            pupil_min: 0.7,
            pupil_max: 1.3,
            pupil_focus_gain: 0.2,
            pupil_smooth_time: 0.15,
            tap_pupil_pulse: 0.25,
            tap_pulse_secs: 0.4,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BodyConfig {
    pub enable_idle_micro_animations: bool,
    /// Bounce cycles per second at zero intensity; intensity adds up to one more.
    pub bounce_base_hz: f32,
    /// Tremble oscillation rate in radians per second.
    pub tremble_rate: f32,
    pub micro_shift_max_deg: f32,
    pub micro_shift_interval_min: f32,
    pub micro_shift_interval_max: f32,
}

impl Default for BodyConfig {
    fn default() -> Self {
        Self {
            enable_idle_micro_animations: true,
            bounce_base_hz: 2.0,
            tremble_rate: 45.0,
            micro_shift_max_deg: 2.0,
            micro_shift_interval_min: 8.0,
            micro_shift_interval_max: 12.0,
        }
    }
}

/// Global scaling of the residual filters' rise and fall rates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ResidualConfig {
    pub rise_scale: f32,
    pub fall_scale: f32,
}

impl Default for ResidualConfig {
    fn default() -> Self {
        Self {
            rise_scale: 1.0,
            fall_scale: 1.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
