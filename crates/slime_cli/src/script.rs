//! Timed interaction scripts for headless replays.
//!
//! A script is a TOML file with an `[[event]]` array:
//!
//! ```toml
//! [[event]]
//! at = 1.5
//! action = "preset"
//! preset = "Happy"
//!
//! [[event]]
//! at = 2.0
//! action = "pointer"
//! x = 0.8
//! y = -0.2
//! ```
//!
//! Actions: `feed`, `attention`, `tap` (x, y), `preset` (preset),
//! `pointer` (x, y) and `hide_pointer`.

use anyhow::{Context, Result};
use glam::Vec2;
use serde::Deserialize;
use slime_core::{EmotionPreset, UnknownPreset};
use slime_limbic::SimulationDriver;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("event {index}: time {at} must be finite and non-negative")]
    BadTime { index: usize, at: f64 },

    #[error("event {index}: `{action}` needs field `{field}`")]
    MissingField {
        index: usize,
        action: &'static str,
        field: &'static str,
    },

    #[error("event {index}: {source}")]
    Preset {
        index: usize,
        #[source]
        source: UnknownPreset,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ActionKind {
    Feed,
    Attention,
    Tap,
    Preset,
    Pointer,
    HidePointer,
}

#[derive(Debug, Deserialize)]
struct RawEvent {
    at: f64,
    action: ActionKind,
    x: Option<f32>,
    y: Option<f32>,
    preset: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawScript {
    #[serde(default)]
    event: Vec<RawEvent>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    Feed,
    Attention,
    Tap(Vec2),
    Preset(EmotionPreset),
    Pointer(Vec2),
    HidePointer,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptEvent {
    pub at: f64,
    pub action: Action,
}

/// Events sorted by time, consumed front to back as the replay clock advances.
#[derive(Debug, Clone, Default)]
pub struct Script {
    events: Vec<ScriptEvent>,
    cursor: usize,
    pointer: Option<Vec2>,
}

impl Script {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read script: {}", path.display()))?;
        Self::from_toml_str(&content).with_context(|| format!("Invalid script: {}", path.display()))
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let raw: RawScript = toml::from_str(content).context("Failed to parse TOML script")?;
        let mut events = raw
            .event
            .into_iter()
            .enumerate()
            .map(|(index, e)| e.validate(index))
            .collect::<Result<Vec<_>, ScriptError>>()?;
        // stable: events sharing a timestamp keep file order
        events.sort_by(|a, b| a.at.total_cmp(&b.at));
        Ok(Self {
            events,
            cursor: 0,
            pointer: None,
        })
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Pointer position set by the most recent `pointer` event, if visible.
    pub fn pointer(&self) -> Option<Vec2> {
        self.pointer
    }

    /// Apply every event due at or before `now`; returns how many fired.
    pub fn fire_due(&mut self, now: f64, driver: &mut SimulationDriver) -> usize {
        let start = self.cursor;
        while let Some(event) = self.events.get(self.cursor).filter(|e| e.at <= now) {
            let action = event.action;
            self.cursor += 1;
            match action {
                Action::Feed => {
                    let change = driver.feed();
                    tracing::debug!("t={:.2} feed -> {:?}", now, change);
                }
                Action::Attention => {
                    let change = driver.give_attention();
                    tracing::debug!("t={:.2} attention -> {:?}", now, change);
                }
                Action::Tap(position) => {
                    if let Some(outcome) = driver.on_tap(position) {
                        tracing::debug!("t={:.2} tap #{} -> {:?}", now, outcome.count, outcome.requested);
                    }
                }
                Action::Preset(preset) => {
                    let change = driver.set_preset(preset);
                    tracing::info!("t={:.2} preset {} -> {:?}", now, preset, change);
                }
                Action::Pointer(p) => self.pointer = Some(p),
                Action::HidePointer => self.pointer = None,
            }
        }
        self.cursor - start
    }
}

impl RawEvent {
    fn validate(self, index: usize) -> Result<ScriptEvent, ScriptError> {
        if !self.at.is_finite() || self.at < 0.0 {
            return Err(ScriptError::BadTime { index, at: self.at });
        }
        let point = |action: &'static str| -> Result<Vec2, ScriptError> {
            let field = |name: &'static str, v: Option<f32>| {
                v.ok_or(ScriptError::MissingField {
                    index,
                    action,
                    field: name,
                })
            };
            Ok(Vec2::new(field("x", self.x)?, field("y", self.y)?))
        };

        let action = match self.action {
            ActionKind::Feed => Action::Feed,
            ActionKind::Attention => Action::Attention,
            ActionKind::Tap => Action::Tap(point("tap")?),
            ActionKind::Pointer => Action::Pointer(point("pointer")?),
            ActionKind::HidePointer => Action::HidePointer,
            ActionKind::Preset => {
                let name = self.preset.as_deref().ok_or(ScriptError::MissingField {
                    index,
                    action: "preset",
                    field: "preset",
                })?;
                let preset = name
                    .parse()
                    .map_err(|source| ScriptError::Preset { index, source })?;
                Action::Preset(preset)
            }
        };
        Ok(ScriptEvent { at: self.at, action })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slime_core::SlimeConfig;

    const DEMO: &str = r#"
[[event]]
at = 2.0
action = "tap"
x = 0.1
y = 0.0

[[event]]
at = 0.5
action = "preset"
preset = "happy"

[[event]]
at = 1.0
action = "pointer"
x = 1.0
y = 0.5

[[event]]
at = 3.0
action = "hide_pointer"
"#;

    #[test]
    fn test_parse_sorts_by_time() {
        let script = Script::from_toml_str(DEMO).unwrap();
        assert_eq!(script.len(), 4);
        let times: Vec<f64> = script.events.iter().map(|e| e.at).collect();
        assert_eq!(times, vec![0.5, 1.0, 2.0, 3.0]);
        assert_eq!(script.events[0].action, Action::Preset(EmotionPreset::Happy));
    }

    #[test]
    fn test_empty_script() {
        let script = Script::from_toml_str("").unwrap();
        assert!(script.is_empty());
    }

    #[test]
    fn test_missing_coordinates_rejected() {
        let err = Script::from_toml_str("[[event]]\nat = 1.0\naction = \"tap\"\nx = 0.5\n").unwrap_err();
        match err.downcast_ref::<ScriptError>() {
            Some(ScriptError::MissingField { field, .. }) => assert_eq!(*field, "y"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_preset_rejected() {
        let err = Script::from_toml_str("[[event]]\nat = 0.0\naction = \"preset\"\npreset = \"Ecstatic\"\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<ScriptError>(), Some(ScriptError::Preset { index: 0, .. })));
    }

    #[test]
    fn test_negative_time_rejected() {
        let err = Script::from_toml_str("[[event]]\nat = -1.0\naction = \"feed\"\n").unwrap_err();
        assert!(matches!(err.downcast_ref::<ScriptError>(), Some(ScriptError::BadTime { .. })));
    }

    #[test]
    fn test_fire_due_applies_in_order() {
        let mut script = Script::from_toml_str(DEMO).unwrap();
        let mut driver = SimulationDriver::new(SlimeConfig::default()).unwrap();

        assert_eq!(script.fire_due(0.4, &mut driver), 0);
        assert_eq!(script.fire_due(1.0, &mut driver), 2);
        assert_eq!(driver.affect().preset(), EmotionPreset::Happy);
        assert_eq!(script.pointer(), Some(Vec2::new(1.0, 0.5)));

        assert_eq!(script.fire_due(10.0, &mut driver), 2);
        assert_eq!(script.pointer(), None);
        assert_eq!(script.fire_due(20.0, &mut driver), 0);
    }
}
