//! Read-only output of one simulation tick.
//!
//! Render parameters live in a fixed array indexed by [`RenderParam`], so
//! every channel is known at compile time; on the wire they become a
//! name → value map.

use crate::awareness::AwarenessStage;
use crate::body::BodyMotion;
use glam::Vec2;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use slime_core::{EmotionPreset, EmotionalState, NeedsState};
use std::ops::{Index, IndexMut};

/// Spatial transform relative to the rest pose. Rotation is in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: Vec2::ZERO,
            rotation: 0.0,
            scale: Vec2::ONE,
        }
    }
}

macro_rules! render_params {
    ($($name:ident),+ $(,)?) => {
        /// Named numeric channels consumed by the renderer.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum RenderParam {
            $($name),+
        }

        impl RenderParam {
            pub const ALL: &'static [RenderParam] = &[$(RenderParam::$name),+];

            pub fn name(self) -> &'static str {
                match self {
                    $(RenderParam::$name => stringify!($name)),+
                }
            }
        }
    };
}

render_params! {
    BreathingPulse,
    WobbleAmount,
    WobbleSpeed,
    EyeOffsetX,
    EyeOffsetY,
    BlinkAmount,
    PupilScale,
    EyeEmotiveness,
    EyeSquintAmount,
    InnerGlowStrength,
    ParticleGlow,
    ColorShift,
    BlushIntensity,
    HeartGlow,
    SurfaceWetness,
    EyeRedness,
    SleepDimming,
    TopSquish,
    BottomSquish,
    TearPuffiness,
    ExcitementResidue,
    TensionResidue,
    AttentionFocus,
}

const PARAM_COUNT: usize = RenderParam::ALL.len();

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderParams([f32; PARAM_COUNT]);

impl Default for RenderParams {
    fn default() -> Self {
        Self([0.0; PARAM_COUNT])
    }
}

impl RenderParams {
    pub fn get(&self, param: RenderParam) -> f32 {
        self.0[param as usize]
    }

    pub fn set(&mut self, param: RenderParam, value: f32) {
        self.0[param as usize] = value;
    }

    pub fn iter(&self) -> impl Iterator<Item = (RenderParam, f32)> + '_ {
        RenderParam::ALL.iter().copied().zip(self.0.iter().copied())
    }
}

impl Index<RenderParam> for RenderParams {
    type Output = f32;

    fn index(&self, param: RenderParam) -> &f32 {
        &self.0[param as usize]
    }
}

impl IndexMut<RenderParam> for RenderParams {
    fn index_mut(&mut self, param: RenderParam) -> &mut f32 {
        &mut self.0[param as usize]
    }
}

impl Serialize for RenderParams {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(PARAM_COUNT))?;
        for (param, value) in self.iter() {
            map.serialize_entry(param.name(), &value)?;
        }
        map.end()
    }
}

/// Introspection fields for tooling and tests.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DebugInfo {
    pub current_emotion: EmotionalState,
    pub current_emotion_name: &'static str,
    pub preset: EmotionPreset,
    pub is_transitioning: bool,
    pub emotion_timer: f32,
    pub emotion_lock_timer: f32,
    pub can_change_emotion: bool,
    /// Absent when the needs meters are disabled.
    pub needs: Option<NeedsState>,
    pub tap_intensity: f32,
    pub awareness: AwarenessStage,
    pub awareness_timer: f32,
    pub shy_break: bool,
    pub body_motion: BodyMotion,
    pub breath_phase: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    /// Simulation clock in seconds.
    pub time: f64,
    pub tick: u64,
    pub pose: Pose,
    pub params: RenderParams,
    pub debug: DebugInfo,
}

impl Snapshot {
    pub fn param(&self, param: RenderParam) -> f32 {
        self.params[param]
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_serialize_as_named_map() {
        let mut params = RenderParams::default();
        params[RenderParam::PupilScale] = 1.25;
        params.set(RenderParam::BlinkAmount, 0.5);
        let json = serde_json::to_value(params).unwrap();
        assert_eq!(json["PupilScale"], 1.25);
        assert_eq!(json["BlinkAmount"], 0.5);
        assert_eq!(json.as_object().unwrap().len(), RenderParam::ALL.len());
    }

    #[test]
    fn test_param_names_are_unique() {
        let mut names: Vec<_> = RenderParam::ALL.iter().map(|p| p.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), RenderParam::ALL.len());
    }

    #[test]
    fn test_default_pose_is_identity() {
        let pose = Pose::default();
        assert_eq!(pose.scale, Vec2::ONE);
        assert_eq!(pose.position, Vec2::ZERO);
    }
}
