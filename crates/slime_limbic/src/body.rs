//! Procedural body motion.
//!
//! A priority table over the affect axes picks one motion generator per
//! tick; the generator produces a pose plus the shader wobble pair.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slime_core::config::BodyConfig;
use slime_core::math::{lerp, periodic_value_noise};
use slime_core::EmotionalState;
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::snapshot::Pose;

/// Noise seed for the idle micro-wobble.
const MICRO_WOBBLE_SEED: u32 = 0x51_1e;
/// Lattice cells before the micro-wobble noise repeats.
const MICRO_WOBBLE_PERIOD: u32 = 256;

/// Oscillator phase wrapped to one period. Advancing by `dt` keeps it small,
/// so frequency changes never jump and the f64 session clock never has to be
/// narrowed to f32.
#[derive(Debug, Clone, Copy, Default)]
struct Phase(f32);

impl Phase {
    /// Advance by `dt * rate` and wrap to `[0, period)`.
    fn advance(&mut self, dt: f32, rate: f32, period: f32) -> f32 {
        self.0 = (self.0 + dt * rate).rem_euclid(period);
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BodyMotion {
    BouncePulse,
    AngryShake,
    ScaredTremble,
    DripSag,
    CuriousStretch,
    BaseWobble,
}

impl BodyMotion {
    /// First matching row of the decision table wins.
    pub fn select(mood: &EmotionalState) -> Self {
        let (v, a, d, e) = (mood.valence, mood.arousal, mood.dominance, mood.engagement);
        if a > 0.75 && v > 0.6 {
            BodyMotion::BouncePulse
        } else if a > 0.8 && v < -0.4 && d > 0.7 {
            BodyMotion::AngryShake
        } else if a > 0.8 && d < 0.3 {
            BodyMotion::ScaredTremble
        } else if a < 0.4 && v < -0.3 {
            BodyMotion::DripSag
        } else if e > 0.8 {
            BodyMotion::CuriousStretch
        } else {
            BodyMotion::BaseWobble
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BodySample {
    pub motion: BodyMotion,
    pub pose: Pose,
    pub wobble_amount: f32,
    pub wobble_speed: f32,
    /// Set only by motions that deform the top of the body.
    pub top_squish: Option<f32>,
    /// Overrides the breathing belly squish when set.
    pub bottom_squish: Option<f32>,
}

impl BodySample {
    /// Motionless base pose.
    pub fn rest() -> Self {
        Self::new(BodyMotion::BaseWobble, Pose::default(), 0.0, 0.0)
    }

    fn new(motion: BodyMotion, pose: Pose, wobble_amount: f32, wobble_speed: f32) -> Self {
        Self {
            motion,
            pose,
            wobble_amount,
            wobble_speed,
            top_squish: None,
            bottom_squish: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BodyMotionSelector {
    config: BodyConfig,
    current: BodyMotion,
    /// Cycles in [0, 1).
    bounce: Phase,
    /// Radians.
    wobble: Phase,
    tremble_x: Phase,
    tremble_y: Phase,
    /// Cycles in [0, 1).
    drip: Phase,
    stretch: Phase,
    noise_clock: Phase,
    micro_shift: f32,
    micro_shift_target: f32,
    next_micro_shift_at: f64,
}

impl BodyMotionSelector {
    pub fn new<R: Rng + ?Sized>(config: BodyConfig, rng: &mut R) -> Self {
        let first_shift = rng.gen_range(config.micro_shift_interval_min..=config.micro_shift_interval_max) as f64;
        Self {
            config,
            current: BodyMotion::BaseWobble,
            bounce: Phase::default(),
            wobble: Phase::default(),
            tremble_x: Phase::default(),
            tremble_y: Phase::default(),
            drip: Phase::default(),
            stretch: Phase::default(),
            noise_clock: Phase::default(),
            micro_shift: 0.0,
            micro_shift_target: 0.0,
            next_micro_shift_at: first_shift,
        }
    }

    pub fn tick<R: Rng + ?Sized>(&mut self, dt: f32, now: f64, mood: &EmotionalState, rng: &mut R) -> BodySample {
        let motion = BodyMotion::select(mood);
        if motion != self.current {
            tracing::debug!("Body motion {:?} -> {:?}", self.current, motion);
            self.current = motion;
        }

        let i = mood.intensity;
        let sample = match motion {
            BodyMotion::BouncePulse => {
                let phase = self.bounce.advance(dt, self.config.bounce_base_hz + i, 1.0);
                bounce(phase, i)
            }
            BodyMotion::AngryShake => {
                let pose = Pose {
                    position: glam::Vec2::new(rng.gen_range(-0.15f32..=0.15) * i, rng.gen_range(-0.08f32..=0.08) * i),
                    rotation: rng.gen_range(-8.0f32..=8.0) * i,
                    ..Pose::default()
                };
                BodySample::new(motion, pose, 0.15 * i, 18.0)
            }
            BodyMotion::ScaredTremble => {
                let rate = self.config.tremble_rate;
                let wx = self.tremble_x.advance(dt, rate, TAU);
                let wy = self.tremble_y.advance(dt, rate * 1.3, TAU);
                let pose = Pose {
                    position: glam::Vec2::new(wx.sin() * 0.04 * i, wy.sin() * 0.03 * i),
                    ..Pose::default()
                };
                BodySample::new(motion, pose, 0.06 * i, 12.0)
            }
            BodyMotion::DripSag => {
                let drip = self.drip.advance(dt, 0.6, 1.0);
                let pose = Pose {
                    scale: glam::Vec2::new(1.0, 1.0 - 0.1 * i),
                    ..Pose::default()
                };
                let mut s = BodySample::new(motion, pose, 0.0, 0.0);
                s.top_squish = Some((drip * PI).sin().max(0.0) * 0.35 * i);
                s.bottom_squish = Some(0.25);
                s
            }
            BodyMotion::CuriousStretch => {
                let stretch = (self.stretch.advance(dt, 1.5, 1.0) * PI).sin() * 0.3 * i;
                let pose = Pose {
                    position: glam::Vec2::new(0.0, stretch * 0.15),
                    rotation: 3.0 * i,
                    scale: glam::Vec2::new(1.0 - stretch * 0.5, 1.0 + stretch),
                };
                BodySample::new(motion, pose, 0.0, 0.0)
            }
            BodyMotion::BaseWobble => self.base_wobble(dt, now, mood, rng),
        };

        if motion != BodyMotion::BaseWobble {
            self.micro_shift = lerp(self.micro_shift, 0.0, dt * 0.5);
        }
        sample
    }

    fn base_wobble<R: Rng + ?Sized>(&mut self, dt: f32, now: f64, mood: &EmotionalState, rng: &mut R) -> BodySample {
        let (a, i) = (mood.arousal, mood.intensity);
        let freq = lerp(1.5, 4.0, a);
        let angle = self.wobble.advance(dt, freq, TAU).sin() * lerp(3.0, 12.0, a) * i;

        let idle = self.config.enable_idle_micro_animations && i <= 0.4 && a <= 0.6;
        if idle && now >= self.next_micro_shift_at {
            let max = self.config.micro_shift_max_deg;
            self.micro_shift_target = rng.gen_range(-max..=max);
            self.next_micro_shift_at =
                now + rng.gen_range(self.config.micro_shift_interval_min..=self.config.micro_shift_interval_max) as f64;
        }
        let shift_target = if idle { self.micro_shift_target } else { 0.0 };
        self.micro_shift = lerp(self.micro_shift, shift_target, dt * 0.5);

        let pose = Pose {
            rotation: angle + self.micro_shift,
            ..Pose::default()
        };
        if idle {
            let clock = self.noise_clock.advance(dt, 10.0, MICRO_WOBBLE_PERIOD as f32);
            let micro = 0.01 + periodic_value_noise(clock, MICRO_WOBBLE_PERIOD, MICRO_WOBBLE_SEED) * 0.01;
            BodySample::new(BodyMotion::BaseWobble, pose, micro, 15.0)
        } else {
            BodySample::new(BodyMotion::BaseWobble, pose, lerp(0.02, 0.1, a) * i, freq * 2.0)
        }
    }

    pub fn current(&self) -> BodyMotion {
        self.current
    }

    pub fn micro_shift(&self) -> f32 {
        self.micro_shift
    }
}

/// Rise, fall, squash-on-landing, recover.
fn bounce(phase: f32, i: f32) -> BodySample {
    let (lift, sx, sy) = if phase < 0.2 {
        let t = phase / 0.2;
        ((t * FRAC_PI_2).sin() * 0.4 * i, 1.0 - t * 0.1 * i, 1.0 + t * 0.15 * i)
    } else if phase < 0.4 {
        let t = (phase - 0.2) / 0.2;
        ((t * FRAC_PI_2).cos() * 0.4 * i, 0.9 + t * 0.1 * i, 1.15 - t * 0.15 * i)
    } else if phase < 0.5 {
        let t = (phase - 0.4) / 0.1;
        (0.0, 1.0 + t * 0.3 * i, 1.0 - t * 0.3 * i)
    } else {
        let t = (phase - 0.5) / 0.5;
        (0.0, 1.3 - t * 0.3, 0.7 + t * 0.3)
    };
    let pose = Pose {
        position: glam::Vec2::new(0.0, lift),
        rotation: 0.0,
        scale: glam::Vec2::new(sx, sy),
    };
    BodySample::new(BodyMotion::BouncePulse, pose, 0.08 * i, 5.0 + i * 3.0)
}
