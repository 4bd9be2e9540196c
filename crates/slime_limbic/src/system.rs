//! The simulation driver: owns every component and runs them in a fixed
//! order once per (sub)step.
//!
//! External code talks to the creature only through the event entry points
//! (`feed`, `give_attention`, `on_tap`, `set_preset`) and reads the snapshot
//! produced by the last tick.

use crate::body::{BodyMotionSelector, BodySample};
use crate::breathing::{BreathSample, BreathingOscillator};
use crate::eye::{eye_emotiveness, squint_amount, EyeAttentionTracker, EyeInputs, EyeSample};
use crate::residual::{Residual, ResidualEffectTracker};
use crate::snapshot::{DebugInfo, RenderParam, RenderParams, Snapshot};
use glam::Vec2;
use rand::SeedableRng;
use slime_core::math::{lerp, sanitize_f32};
use slime_core::{
    AffectModel, ConfigError, EmotionPreset, EmotionalState, NeedsSystem, PersonalityTraits, PresetChange,
    PresetSource, SimRng, SlimeConfig, TapOutcome,
};

/// Upper bound on substeps per tick; beyond it substeps grow past `max_step`.
const MAX_SUBSTEPS: usize = 10_000;

/// Builder for [`SimulationDriver`].
#[derive(Debug, Clone, Default)]
pub struct DriverBuilder {
    config: SlimeConfig,
    seed: Option<u64>,
    personality: Option<PersonalityTraits>,
    needs: Option<bool>,
}

impl DriverBuilder {
    pub fn config(mut self, config: SlimeConfig) -> Self {
        self.config = config;
        self
    }

    /// Override `simulation.seed`.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Override the configured personality.
    pub fn personality(mut self, personality: PersonalityTraits) -> Self {
        self.personality = Some(personality);
        self
    }

    /// Override `simulation.enable_needs`.
    pub fn needs(mut self, enabled: bool) -> Self {
        self.needs = Some(enabled);
        self
    }

    pub fn build(self) -> Result<SimulationDriver, ConfigError> {
        let mut config = self.config;
        if let Some(seed) = self.seed {
            config.simulation.seed = seed;
        }
        if let Some(mut personality) = self.personality {
            personality.normalize();
            config.personality = personality;
        }
        if let Some(enabled) = self.needs {
            config.simulation.enable_needs = enabled;
        }
        config.validate()?;
        Ok(SimulationDriver::assemble(config))
    }
}

pub struct SimulationDriver {
    config: SlimeConfig,
    rng: SimRng,
    clock: f64,
    ticks: u64,

    affect: AffectModel,
    needs: Option<NeedsSystem>,
    breathing: BreathingOscillator,
    eyes: EyeAttentionTracker,
    body: BodyMotionSelector,
    residual: ResidualEffectTracker,

    snapshot: Snapshot,
}

impl SimulationDriver {
    pub fn builder() -> DriverBuilder {
        DriverBuilder::default()
    }

    /// Build from a configuration, validating it first.
    pub fn new(config: SlimeConfig) -> Result<Self, ConfigError> {
        Self::builder().config(config).build()
    }

    fn assemble(config: SlimeConfig) -> Self {
        let p = &config.personality;
        let mut rng = SimRng::seed_from_u64(config.simulation.seed);

        let affect = AffectModel::new(config.affect.clone(), p);
        let needs = config
            .simulation
            .enable_needs
            .then(|| NeedsSystem::new(config.needs.clone()));
        let breathing = BreathingOscillator::new(config.breathing.clone(), p);
        let eyes = EyeAttentionTracker::new(config.eyes.clone(), &config.simulation, p, &mut rng);
        let body = BodyMotionSelector::new(config.body.clone(), &mut rng);
        let residual = ResidualEffectTracker::new(config.residual.clone());

        tracing::info!(
            "Simulation driver ready (seed={:#x}, needs={}, cursor_tracking={})",
            config.simulation.seed,
            needs.is_some(),
            config.simulation.enable_cursor_tracking
        );

        let mut driver = Self {
            snapshot: Snapshot {
                time: 0.0,
                tick: 0,
                pose: Default::default(),
                params: RenderParams::default(),
                debug: DebugInfo {
                    current_emotion: *affect.current(),
                    current_emotion_name: affect.preset().name(),
                    preset: affect.preset(),
                    is_transitioning: false,
                    emotion_timer: 0.0,
                    emotion_lock_timer: 0.0,
                    can_change_emotion: true,
                    needs: needs.as_ref().map(|n| n.state().clone()),
                    tap_intensity: 0.0,
                    awareness: eyes.stage(),
                    awareness_timer: 0.0,
                    shy_break: false,
                    body_motion: body.current(),
                    breath_phase: 0.0,
                },
            },
            config,
            rng,
            clock: 0.0,
            ticks: 0,
            affect,
            needs,
            breathing,
            eyes,
            body,
            residual,
        };
        let mood = *driver.affect.current();
        let breath = driver.breathing.current(&mood);
        let eye = driver.eyes.sample();
        driver.snapshot = driver.compose(&mood, &breath, &eye, &BodySample::rest());
        driver
    }

    /// Advance the simulation by `dt` seconds and return the new snapshot.
    ///
    /// Non-finite or negative `dt` counts as zero. Long frames are split into
    /// substeps no longer than `simulation.max_step`.
    pub fn tick(&mut self, dt: f64, pointer: Option<Vec2>) -> &Snapshot {
        let dt = if dt.is_finite() && dt >= 0.0 {
            dt
        } else {
            tracing::warn!("Ignoring invalid frame delta {}", dt);
            0.0
        };

        let max_step = self.config.simulation.max_step as f64;
        let steps = ((dt / max_step).ceil() as usize).clamp(1, MAX_SUBSTEPS);
        let step = dt / steps as f64;
        for _ in 0..steps {
            self.step(step, pointer);
        }
        &self.snapshot
    }

    fn step(&mut self, dt: f64, pointer: Option<Vec2>) {
        self.clock += dt;
        self.ticks += 1;
        let now = self.clock;
        let dt = dt as f32;

        if let Some(needs) = self.needs.as_mut() {
            needs.tick(dt, now, &mut self.affect);
        }
        self.affect.tick(dt);
        let mood = *self.affect.current();

        let breath = self.breathing.tick(dt, now, &mood, &mut self.rng);
        let inputs = EyeInputs {
            pointer,
            mood: &mood,
            breath_phase: breath.phase,
            relationship: self.relationship(),
        };
        let eye = self.eyes.tick(dt, now, inputs, &mut self.rng);
        let body = self.body.tick(dt, now, &mood, &mut self.rng);
        self.residual.tick(dt, &mood);

        self.snapshot = self.compose(&mood, &breath, &eye, &body);
        tracing::trace!(
            "tick {} t={:.3} {} gaze=({:.3}, {:.3})",
            self.ticks,
            now,
            self.affect.preset(),
            eye.gaze.x,
            eye.gaze.y
        );
    }

    fn compose(&self, mood: &EmotionalState, breath: &BreathSample, eye: &EyeSample, body: &BodySample) -> Snapshot {
        use RenderParam::*;

        let residual = |r| self.residual.get(r);
        let (v, d, i) = (mood.valence, mood.dominance, mood.intensity);
        let glow = lerp(1.2, 3.5, (v + 1.0) / 2.0) * i;
        let color_shift = if d > 0.7 {
            30.0 * i
        } else if v > 0.6 {
            10.0 * i
        } else {
            0.0
        };
        let blink = if eye.is_blinking {
            eye.blink
        } else {
            (residual(Residual::TearPuffiness) * 0.3).max(residual(Residual::SleepDepth))
        };

        let mut params = RenderParams::default();
        params[BreathingPulse] = breath.pulse;
        params[WobbleAmount] = body.wobble_amount;
        params[WobbleSpeed] = body.wobble_speed;
        params[EyeOffsetX] = eye.gaze.x;
        params[EyeOffsetY] = eye.gaze.y;
        params[BlinkAmount] = blink;
        params[PupilScale] = eye.pupil_scale;
        params[EyeEmotiveness] = eye_emotiveness(mood, self.config.personality.eye_warmth());
        params[EyeSquintAmount] = squint_amount(mood);
        params[InnerGlowStrength] = glow;
        params[ParticleGlow] = glow * 0.8;
        params[ColorShift] = color_shift;
        params[BlushIntensity] = residual(Residual::Blush);
        params[HeartGlow] = residual(Residual::HeartGlow);
        params[SurfaceWetness] = residual(Residual::Sweat).max(residual(Residual::EyeWetness) * 0.5);
        params[EyeRedness] = residual(Residual::EyeRedness);
        params[SleepDimming] = residual(Residual::SleepDepth);
        params[TopSquish] = body.top_squish.unwrap_or(0.0);
        params[BottomSquish] = body.bottom_squish.unwrap_or(breath.belly_squish);
        params[TearPuffiness] = residual(Residual::TearPuffiness);
        params[ExcitementResidue] = residual(Residual::ExcitementResidue);
        params[TensionResidue] = residual(Residual::TensionResidue);
        params[AttentionFocus] = eye.attention_focus;
        for param in RenderParam::ALL {
            params[*param] = sanitize_f32(params[*param], 0.0);
        }

        Snapshot {
            time: self.clock,
            tick: self.ticks,
            pose: body.pose,
            params,
            debug: DebugInfo {
                current_emotion: *mood,
                current_emotion_name: self.affect.preset().name(),
                preset: self.affect.preset(),
                is_transitioning: self.affect.is_transitioning(),
                emotion_timer: self.affect.emotion_timer(),
                emotion_lock_timer: self.affect.emotion_lock_timer(),
                can_change_emotion: self.affect.can_change_emotion(),
                needs: self.needs.as_ref().map(|n| n.state().clone()),
                tap_intensity: self.needs.as_ref().map(|n| n.tap_intensity()).unwrap_or(0.0),
                awareness: eye.stage,
                awareness_timer: self.eyes.awareness_timer(),
                shy_break: self.eyes.attention().shy_break,
                body_motion: body.motion,
                breath_phase: breath.phase,
            },
        }
    }

    fn relationship(&self) -> f32 {
        self.needs
            .as_ref()
            .map(|n| n.state().relationship_norm())
            .unwrap_or(0.0)
    }

    // ========================================================================
    // Event entry points
    // ========================================================================

    /// Explicit preset change; rejected while the emotion lock is active.
    pub fn set_preset(&mut self, preset: EmotionPreset) -> PresetChange {
        self.affect.set_preset(preset)
    }

    pub fn feed(&mut self) -> PresetChange {
        match self.needs.as_mut() {
            Some(needs) => needs.feed(self.clock, &mut self.affect),
            None => self.affect.request(EmotionPreset::Content, PresetSource::Event),
        }
    }

    pub fn give_attention(&mut self) -> Option<PresetChange> {
        match self.needs.as_mut() {
            Some(needs) => needs.give_attention(self.clock, &mut self.affect),
            None => Some(self.affect.request(EmotionPreset::Affectionate, PresetSource::Event)),
        }
    }

    /// Register a tap at `position`. Returns `None` when tap response is
    /// disabled or the needs meters are off.
    pub fn on_tap(&mut self, position: Vec2) -> Option<TapOutcome> {
        let now = self.clock;
        if !self.config.simulation.enable_tap_response {
            if let Some(needs) = self.needs.as_mut() {
                needs.note_interaction(now);
            }
            return None;
        }
        self.eyes.on_tap(now);
        let needs = self.needs.as_mut()?;
        let outcome = needs.on_tap(position, now, &mut self.affect, &mut self.rng);
        tracing::debug!("Tap #{} (intensity {:.2})", outcome.count, outcome.tap_intensity);
        Some(outcome)
    }

    // ========================================================================
    // Accessors
    // ========================================================================

    /// Snapshot produced by the last tick.
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn affect(&self) -> &AffectModel {
        &self.affect
    }

    pub fn needs(&self) -> Option<&NeedsSystem> {
        self.needs.as_ref()
    }

    /// Mutable access for scripted setups and tests.
    pub fn needs_mut(&mut self) -> Option<&mut NeedsSystem> {
        self.needs.as_mut()
    }

    pub fn eyes(&self) -> &EyeAttentionTracker {
        &self.eyes
    }

    pub fn breathing(&self) -> &BreathingOscillator {
        &self.breathing
    }

    pub fn config(&self) -> &SlimeConfig {
        &self.config
    }

    /// Simulation time in seconds.
    pub fn clock(&self) -> f64 {
        self.clock
    }

    /// Substeps executed so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}
