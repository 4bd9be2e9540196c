//! # Slime Limbic Pipeline
//!
//! The per-tick half of the living slime. Every component reads the current
//! affect state and advances its own clock; the driver runs them in order
//! and folds their outputs into one read-only [`Snapshot`]:
//!
//! 1. Needs meters (may request a preset)
//! 2. Affect transition and lock timers
//! 3. Breathing oscillator
//! 4. Eye / attention tracker (awareness, gaze, blink, pupil)
//! 5. Body motion selector
//! 6. Residual effects
//!
//! Everything is single-threaded and deterministic for a given seed and
//! input sequence. Delayed behaviour is expressed as wake times on the
//! simulation clock, never as sleeping tasks.

mod awareness;
mod body;
mod breathing;
mod eye;
mod heartbeat;
mod residual;
mod schedule;
mod snapshot;
mod system;

pub use awareness::{Awareness, AwarenessStage};
pub use body::{BodyMotion, BodyMotionSelector, BodySample};
pub use breathing::{breathing_pulse, BreathSample, BreathingOscillator};
pub use eye::{eye_emotiveness, squint_amount, AttentionState, EyeAttentionTracker, EyeInputs, EyeSample};
pub use heartbeat::HeartbeatConfig;
pub use residual::{Residual, ResidualEffectTracker};
pub use schedule::Scheduler;
pub use snapshot::{DebugInfo, Pose, RenderParam, RenderParams, Snapshot};
pub use system::{DriverBuilder, SimulationDriver};
