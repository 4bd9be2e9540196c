//! Core state for the slime simulation: affect, needs, personality and
//! configuration. Everything here is synchronous and driven by explicit
//! `dt` values; the animation layer lives in `slime_limbic`.

pub mod affect;
pub mod config;
pub mod error;
pub mod math;
pub mod needs;
pub mod personality;

pub use affect::{AffectModel, EmotionPreset, EmotionalState, PresetChange, PresetSource};
pub use config::SlimeConfig;
pub use error::{ConfigError, UnknownPreset};
pub use needs::{NeedsState, NeedsSystem, TapOutcome};
pub use personality::PersonalityTraits;

/// Seedable RNG used by every stochastic component, so a run is reproducible from its seed.
pub type SimRng = rand_chacha::ChaCha8Rng;
