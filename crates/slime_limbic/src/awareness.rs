//! Three-stage pointer awareness: Oblivious → Noticing → Tracking.
//!
//! The timer grows while the pointer is near and moving and shrinks at a
//! fraction of that rate otherwise. Stages move at most one step per tick.

use serde::{Deserialize, Serialize};
use slime_core::config::EyeConfig;
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AwarenessStage {
    #[default]
    Oblivious,
    Noticing,
    Tracking,
}

impl AwarenessStage {
    /// Baseline attention focus for this stage, before disinterest decay.
    pub fn base_focus(self) -> f32 {
        match self {
            AwarenessStage::Oblivious => 0.0,
            AwarenessStage::Noticing => 0.5,
            AwarenessStage::Tracking => 1.0,
        }
    }
}

impl fmt::Display for AwarenessStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AwarenessStage::Oblivious => "Oblivious",
            AwarenessStage::Noticing => "Noticing",
            AwarenessStage::Tracking => "Tracking",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct Awareness {
    noticing_after: f32,
    tracking_after: f32,
    decay_ratio: f32,
    timer_cap: f32,
    stage: AwarenessStage,
    timer: f32,
}

impl Awareness {
    pub fn new(config: &EyeConfig) -> Self {
        Self {
            noticing_after: config.noticing_after,
            tracking_after: config.tracking_after,
            decay_ratio: config.awareness_decay_ratio,
            timer_cap: config.awareness_timer_cap,
            stage: AwarenessStage::Oblivious,
            timer: 0.0,
        }
    }

    /// Advance the timer; returns `(from, to)` when the stage changed.
    pub fn update(&mut self, dt: f32, engaged: bool) -> Option<(AwarenessStage, AwarenessStage)> {
        self.timer = if engaged {
            (self.timer + dt).min(self.timer_cap)
        } else {
            (self.timer - dt * self.decay_ratio).max(0.0)
        };

        let next = match self.stage {
            AwarenessStage::Oblivious if self.timer > self.noticing_after => AwarenessStage::Noticing,
            AwarenessStage::Noticing if self.timer > self.tracking_after => AwarenessStage::Tracking,
            AwarenessStage::Noticing if self.timer < self.noticing_after => AwarenessStage::Oblivious,
            AwarenessStage::Tracking if self.timer < self.tracking_after => AwarenessStage::Noticing,
            stage => stage,
        };

        (next != self.stage).then(|| {
            let from = std::mem::replace(&mut self.stage, next);
            (from, next)
        })
    }

    pub fn stage(&self) -> AwarenessStage {
        self.stage
    }

    pub fn timer(&self) -> f32 {
        self.timer
    }
}
