//! Eye and attention tracking.
//!
//! Per tick the tracker decides where the creature *wants* to look (pointer,
//! a glance away, an idle saccade, a shy look-away), adds a little tracking
//! error, and lets a critically damped spring carry the actual gaze there.
//! Blinks, pupil size and the shy/glance behaviours are driven by a wake-time
//! table so nothing here ever waits.

use crate::awareness::{Awareness, AwarenessStage};
use crate::schedule::Scheduler;
use glam::Vec2;
use rand::Rng;
use serde::Serialize;
use slime_core::config::{EyeConfig, SimulationConfig};
use slime_core::math::{approach, clamp_length, lerp, smooth_damp, smooth_damp_vec2};
use slime_core::{EmotionalState, PersonalityTraits};
use std::f32::consts::{PI, TAU};

/// Per-second decay of the tracking-error drift vector.
const TRACKING_ERROR_DECAY: f32 = 2.0;
/// Glance targets sit within this fraction of the max gaze offset.
const GLANCE_REACH: f32 = 0.6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EyeTask {
    Saccade,
    TrackingError,
    ShyCheck,
    ShyEnd,
    GlanceStart,
    GlanceEnd,
    BlinkDue,
    TapPulseEnd,
}

/// Live attention variables, exposed for debugging.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AttentionState {
    /// Distance from the body centre to the pointer; `None` without a pointer.
    pub cursor_distance: Option<f32>,
    pub attention_focus: f32,
    /// Smoothed gaze offset, never longer than `max_gaze_offset`.
    pub gaze_target: Vec2,
    pub gaze_velocity: Vec2,
    pub tracking_error: Vec2,
    pub shy_break: bool,
    pub shy_remaining: f32,
}

/// What the tracker needs to know about the rest of the creature this tick.
#[derive(Debug, Clone, Copy)]
pub struct EyeInputs<'a> {
    /// Pointer position relative to the body centre.
    pub pointer: Option<Vec2>,
    pub mood: &'a EmotionalState,
    pub breath_phase: f32,
    /// Relationship level in [0, 1].
    pub relationship: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EyeSample {
    pub gaze: Vec2,
    pub is_blinking: bool,
    /// Sine ease-in-out blink curve; 0 while the eyes are open.
    pub blink: f32,
    pub pupil_scale: f32,
    pub attention_focus: f32,
    pub stage: AwarenessStage,
}

#[derive(Debug, Clone)]
pub struct EyeAttentionTracker {
    config: EyeConfig,
    tracking_enabled: bool,
    startup_delay: f64,
    eagerness: f32,
    shyness: f32,

    awareness: Awareness,
    attention: AttentionState,
    tasks: Scheduler<EyeTask>,

    /// Where pointer motion was last registered. Movement is measured from
    /// here rather than from the previous tick, so slow drags count the same
    /// at any frame rate.
    motion_anchor: Option<Vec2>,
    last_motion_at: Option<f64>,

    saccade_point: Vec2,
    shy_point: Vec2,
    glance_point: Option<Vec2>,

    blink_armed: bool,
    blink_phase: Option<f32>,

    pupil: f32,
    pupil_velocity: f32,
}

impl EyeAttentionTracker {
    pub fn new<R: Rng + ?Sized>(
        config: EyeConfig,
        sim: &SimulationConfig,
        personality: &PersonalityTraits,
        rng: &mut R,
    ) -> Self {
        let mut tasks = Scheduler::new();
        tasks.schedule(rng.gen_range(0.5..=2.0), EyeTask::Saccade);
        tasks.schedule(rng.gen_range(2.0..=4.0), EyeTask::BlinkDue);
        tasks.schedule(config.shy_check_interval as f64, EyeTask::ShyCheck);
        tasks.schedule(
            rng.gen_range(config.tracking_error_interval_min..=config.tracking_error_interval_max) as f64,
            EyeTask::TrackingError,
        );
        tasks.schedule(
            rng.gen_range(config.glance_interval_min..=config.glance_interval_max) as f64,
            EyeTask::GlanceStart,
        );

        let pupil = lerp(config.pupil_min, config.pupil_max, 0.5);
        Self {
            awareness: Awareness::new(&config),
            tracking_enabled: sim.enable_cursor_tracking,
            startup_delay: sim.cursor_tracking_startup_delay as f64,
            eagerness: personality.gaze_eagerness(),
            shyness: personality.shyness(),
            attention: AttentionState::default(),
            tasks,
            motion_anchor: None,
            last_motion_at: None,
            saccade_point: Vec2::ZERO,
            shy_point: Vec2::ZERO,
            glance_point: None,
            blink_armed: false,
            blink_phase: None,
            pupil,
            pupil_velocity: 0.0,
            config,
        }
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, now: f64, inputs: EyeInputs<'_>, rng: &mut R) -> EyeSample {
        let pointer = self.effective_pointer(now, inputs.pointer);
        let mood = inputs.mood;

        self.run_tasks(now, mood, inputs.relationship, rng);
        let engaged = self.observe_pointer(now, pointer);

        if let Some((from, to)) = self.awareness.update(dt, engaged) {
            tracing::info!("Awareness {} -> {} (timer {:.2}s)", from, to, self.awareness.timer());
        }

        self.update_gaze(dt, now, pointer, mood);
        self.update_blink(dt, now, mood, inputs.breath_phase, rng);
        self.update_pupil(dt, now, mood);

        self.attention.shy_remaining = self
            .tasks
            .next_wake(|t| *t == EyeTask::ShyEnd)
            .map(|at| (at - now).max(0.0) as f32)
            .unwrap_or(0.0);

        self.sample()
    }

    /// The pointer as far as the eyes are concerned: hidden while tracking is
    /// disabled or the startup delay has not elapsed.
    fn effective_pointer(&self, now: f64, pointer: Option<Vec2>) -> Option<Vec2> {
        if !self.tracking_enabled || now < self.startup_delay {
            return None;
        }
        pointer.filter(|p| p.is_finite())
    }

    /// Record pointer movement; returns whether the pointer is near and moving.
    fn observe_pointer(&mut self, now: f64, pointer: Option<Vec2>) -> bool {
        let Some(p) = pointer else {
            self.attention.cursor_distance = None;
            self.motion_anchor = None;
            return false;
        };

        match self.motion_anchor {
            Some(anchor) if anchor.distance(p) > self.config.movement_epsilon => {
                self.last_motion_at = Some(now);
                self.motion_anchor = Some(p);
            }
            Some(_) => {}
            None => self.motion_anchor = Some(p),
        }

        let distance = p.length();
        self.attention.cursor_distance = Some(distance);
        let moving = self
            .last_motion_at
            .is_some_and(|t| now - t <= self.config.motion_grace as f64);
        distance <= self.config.attention_distance && moving
    }

    fn run_tasks<R: Rng + ?Sized>(&mut self, now: f64, mood: &EmotionalState, relationship: f32, rng: &mut R) {
        let c = &self.config;
        for task in self.tasks.poll_due(now) {
            match task {
                EyeTask::Saccade => {
                    if self.blink_phase.is_some() {
                        // no saccades mid-blink; retry next tick
                        self.tasks.schedule(now, EyeTask::Saccade);
                        continue;
                    }
                    let range = lerp(0.05, 0.15, mood.engagement);
                    self.saccade_point = Vec2::new(rng.gen_range(-range..=range), rng.gen_range(-range..=range));
                    let interval = lerp(3.0, 0.5, mood.engagement) * rng.gen_range(0.8f32..=1.2);
                    self.tasks.schedule(now + interval as f64, EyeTask::Saccade);
                }
                EyeTask::TrackingError => {
                    let magnitude = c.tracking_error_max * (1.0 - 0.5 * relationship) * rng.gen::<f32>();
                    let angle = rng.gen_range(0.0..TAU);
                    self.attention.tracking_error = Vec2::from_angle(angle) * magnitude;
                    let next = rng.gen_range(c.tracking_error_interval_min..=c.tracking_error_interval_max);
                    self.tasks.schedule(now + next as f64, EyeTask::TrackingError);
                }
                EyeTask::ShyCheck => {
                    self.tasks.schedule(now + c.shy_check_interval as f64, EyeTask::ShyCheck);
                    if self.attention.shy_break || self.attention.attention_focus <= c.shy_focus_threshold {
                        continue;
                    }
                    let chance = c.shy_base_chance * (1.5 - 0.8 * relationship) * self.shyness;
                    if rng.gen::<f32>() < chance {
                        let duration = rng.gen_range(c.shy_duration_min..=c.shy_duration_max);
                        let angle = rng.gen_range(0.0..TAU);
                        self.shy_point = Vec2::from_angle(angle) * c.shy_gaze_radius * rng.gen::<f32>();
                        self.attention.shy_break = true;
                        self.tasks.schedule(now + duration as f64, EyeTask::ShyEnd);
                        tracing::debug!("Shy look-away for {:.2}s (chance {:.3})", duration, chance);
                    }
                }
                EyeTask::ShyEnd => {
                    self.attention.shy_break = false;
                }
                EyeTask::GlanceStart => {
                    if now >= c.first_impression_secs as f64 {
                        continue;
                    }
                    let reach = c.max_gaze_offset * GLANCE_REACH;
                    let angle = rng.gen_range(0.0..TAU);
                    self.glance_point = Some(Vec2::from_angle(angle) * reach);
                    let duration = rng.gen_range(c.glance_duration_min..=c.glance_duration_max);
                    let gap = rng.gen_range(c.glance_interval_min..=c.glance_interval_max);
                    self.tasks.schedule(now + duration as f64, EyeTask::GlanceEnd);
                    self.tasks.schedule(now + (duration + gap) as f64, EyeTask::GlanceStart);
                }
                EyeTask::GlanceEnd => {
                    self.glance_point = None;
                }
                EyeTask::BlinkDue => {
                    self.blink_armed = true;
                }
                EyeTask::TapPulseEnd => {}
            }
        }
    }

    fn update_gaze(&mut self, dt: f32, now: f64, pointer: Option<Vec2>, mood: &EmotionalState) {
        let c = &self.config;
        let error = self.attention.tracking_error;
        self.attention.tracking_error = error * (1.0 - TRACKING_ERROR_DECAY * dt).max(0.0);

        let toward_pointer = pointer.map(|p| p.normalize_or_zero() * c.max_gaze_offset + error);

        let (raw_target, focus_target) = if self.attention.shy_break {
            (self.shy_point, 0.0)
        } else if now < c.first_impression_secs as f64 {
            match self.glance_point {
                Some(glance) => (glance, 0.0),
                None => {
                    let anchor = toward_pointer.unwrap_or(c.face_position);
                    (
                        self.saccade_point.lerp(anchor, c.first_impression_bias),
                        c.first_impression_bias,
                    )
                }
            }
        } else {
            match toward_pointer {
                Some(toward) => {
                    let focus = self.awareness.stage().base_focus() * self.disinterest(now);
                    (self.saccade_point.lerp(toward, self.attention.attention_focus), focus)
                }
                None => (self.saccade_point, 0.0),
            }
        };

        self.attention.attention_focus = approach(self.attention.attention_focus, focus_target, c.focus_rate, dt);

        let smooth_time = self.gaze_smooth_time(mood.arousal);
        let gaze = smooth_damp_vec2(
            self.attention.gaze_target,
            raw_target,
            &mut self.attention.gaze_velocity,
            smooth_time,
            dt,
        );
        self.attention.gaze_target = clamp_length(gaze, c.max_gaze_offset);
    }

    /// Multiplier in [1 - idle_max_reduction, 1] that fades focus on an idle pointer.
    fn disinterest(&self, now: f64) -> f32 {
        let c = &self.config;
        let Some(last) = self.last_motion_at else {
            return 1.0 - c.idle_max_reduction;
        };
        let idle = (now - last) as f32;
        if idle <= c.idle_after_secs {
            return 1.0;
        }
        let span = (c.idle_full_secs - c.idle_after_secs).max(f32::EPSILON);
        let t = ((idle - c.idle_after_secs) / span).clamp(0.0, 1.0);
        1.0 - c.idle_max_reduction * t
    }

    /// Spring time constant for the gaze, by arousal band and curiosity.
    pub fn gaze_smooth_time(&self, arousal: f32) -> f32 {
        let c = &self.config;
        let base = if arousal > 0.7 {
            c.gaze_time_high_arousal
        } else if arousal < 0.3 {
            c.gaze_time_low_arousal
        } else {
            c.gaze_time_default
        };
        base / self.eagerness
    }

    fn update_blink<R: Rng + ?Sized>(
        &mut self,
        dt: f32,
        now: f64,
        mood: &EmotionalState,
        breath_phase: f32,
        rng: &mut R,
    ) {
        let c = &self.config;
        match self.blink_phase {
            Some(phase) => {
                let phase = phase + dt / c.blink_duration.max(f32::EPSILON);
                if phase >= 1.0 {
                    self.blink_phase = None;
                    let interval = lerp(c.blink_interval_calm, c.blink_interval_aroused, mood.arousal);
                    let jitter = rng.gen_range((1.0 - c.blink_jitter)..=(1.0 + c.blink_jitter));
                    self.tasks.schedule(now + (interval * jitter) as f64, EyeTask::BlinkDue);
                } else {
                    self.blink_phase = Some(phase);
                }
            }
            None => {
                let exhaling = breath_phase > c.exhale_window_start && breath_phase < c.exhale_window_end;
                if self.blink_armed && exhaling {
                    self.blink_armed = false;
                    self.blink_phase = Some(0.0);
                }
            }
        }
    }

    fn update_pupil(&mut self, dt: f32, now: f64, mood: &EmotionalState) {
        let c = &self.config;
        let focus = self.attention.attention_focus;
        let mut target = lerp(c.pupil_min, c.pupil_max, mood.arousal);
        if focus > 0.5 {
            target *= lerp(1.0, 1.0 + c.pupil_focus_gain, focus);
        }
        if let Some(end) = self.tasks.next_wake(|t| *t == EyeTask::TapPulseEnd) {
            let remaining = ((end - now) as f32 / c.tap_pulse_secs.max(f32::EPSILON)).clamp(0.0, 1.0);
            target += c.tap_pupil_pulse * remaining;
        }
        self.pupil = smooth_damp(self.pupil, target, &mut self.pupil_velocity, c.pupil_smooth_time, dt);
    }

    /// A tap makes the pupils flare briefly.
    pub fn on_tap(&mut self, now: f64) {
        self.tasks.cancel(|t| *t == EyeTask::TapPulseEnd);
        self.tasks.schedule(now + self.config.tap_pulse_secs as f64, EyeTask::TapPulseEnd);
    }

    /// Current outputs without advancing.
    pub fn sample(&self) -> EyeSample {
        EyeSample {
            gaze: self.attention.gaze_target,
            is_blinking: self.blink_phase.is_some(),
            blink: self.blink_phase.map(|p| (p * PI).sin()).unwrap_or(0.0),
            pupil_scale: self.pupil,
            attention_focus: self.attention.attention_focus,
            stage: self.awareness.stage(),
        }
    }

    pub fn stage(&self) -> AwarenessStage {
        self.awareness.stage()
    }

    pub fn awareness_timer(&self) -> f32 {
        self.awareness.timer()
    }

    pub fn attention(&self) -> &AttentionState {
        &self.attention
    }
}

/// Eye size multiplier: small when sad, wide when scared or excited.
pub fn eye_emotiveness(mood: &EmotionalState, warmth: f32) -> f32 {
    let size = if mood.valence < -0.5 && mood.arousal < 0.4 {
        0.75
    } else if mood.arousal > 0.8 && mood.dominance < 0.3 {
        1.5
    } else if mood.arousal > 0.8 && mood.valence > 0.7 {
        1.4
    } else {
        1.0
    };
    size * warmth
}

pub fn squint_amount(mood: &EmotionalState) -> f32 {
    if mood.dominance > 0.7 {
        0.6 * mood.intensity
    } else if mood.dominance < 0.3 && mood.arousal > 0.5 {
        0.4 * mood.intensity
    } else {
        0.0
    }
}
