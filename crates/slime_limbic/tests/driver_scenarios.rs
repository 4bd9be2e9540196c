//! Scripted end-to-end scenarios for the simulation driver.

use glam::Vec2;
use slime_core::config::{PresetPrecedence, SlimeConfig};
use slime_core::{EmotionPreset, NeedsState, PresetChange};
use slime_limbic::{breathing_pulse, AwarenessStage, BodyMotion, RenderParam, SimulationDriver};

const FRAME: f64 = 1.0 / 60.0;

fn driver() -> SimulationDriver {
    SimulationDriver::new(SlimeConfig::default()).unwrap()
}

/// Run at 60 fps for `seconds`, sampling the pointer from the clock.
fn run(d: &mut SimulationDriver, seconds: f64, pointer: impl Fn(f64) -> Option<Vec2>) {
    let frames = (seconds / FRAME).round() as usize;
    for _ in 0..frames {
        let p = pointer(d.clock() + FRAME);
        d.tick(FRAME, p);
    }
}

fn idle(_: f64) -> Option<Vec2> {
    None
}

/// Near the body and always moving.
fn circling(t: f64) -> Option<Vec2> {
    Some(Vec2::from_angle(t as f32))
}

// ============================================================================
// Emotion lock
// ============================================================================

#[test]
fn test_second_preset_within_lock_is_rejected() {
    let mut d = driver();
    assert_eq!(d.set_preset(EmotionPreset::Happy), PresetChange::Applied);
    run(&mut d, 1.5, idle);

    assert!(!d.set_preset(EmotionPreset::Sad).is_applied());
    run(&mut d, 0.1, idle);
    assert_eq!(d.snapshot().debug.current_emotion_name, "Happy");
    assert!(!d.snapshot().debug.can_change_emotion);

    run(&mut d, 1.5, idle);
    assert!(d.snapshot().debug.can_change_emotion);
    assert!(d.set_preset(EmotionPreset::Sad).is_applied());
    run(&mut d, 0.1, idle);
    assert_eq!(d.snapshot().debug.current_emotion_name, "Sad");
}

#[test]
fn test_transition_glides_rather_than_snaps() {
    let mut d = driver();
    d.set_preset(EmotionPreset::Excited);
    run(&mut d, 0.1, idle);
    let debug = &d.snapshot().debug;
    assert!(debug.is_transitioning);
    assert!(debug.current_emotion.arousal < 0.6);

    run(&mut d, 10.0, idle);
    assert!(!d.snapshot().debug.is_transitioning);
    assert!(d.snapshot().debug.current_emotion.arousal > 0.9);
}

// ============================================================================
// Needs
// ============================================================================

#[test]
fn test_attention_holds_for_grace_period_then_decays() {
    let mut d = driver();
    run(&mut d, 29.5, idle);
    assert_eq!(d.needs().unwrap().state().attention, 1.0);

    run(&mut d, 5.5, idle);
    let attention = d.needs().unwrap().state().attention;
    // ~5s past the 30s grace period at 0.02/s
    assert!(attention < 1.0);
    assert!((attention - 0.9).abs() < 0.01, "attention {}", attention);
}

#[test]
fn test_feed_fills_hunger_and_settles_content() {
    let mut d = driver();
    d.needs_mut().unwrap().set_state(NeedsState {
        hunger: 0.123,
        ..Default::default()
    });
    assert!(d.feed().is_applied());
    assert_eq!(d.needs().unwrap().state().hunger, 1.0);
    run(&mut d, 0.05, idle);
    assert_eq!(d.snapshot().debug.current_emotion_name, "Content");
}

#[test]
fn test_starving_creature_turns_hungry_after_lock() {
    let mut d = driver();
    d.set_preset(EmotionPreset::Playful);
    d.needs_mut().unwrap().set_state(NeedsState {
        hunger: 0.2,
        ..Default::default()
    });
    run(&mut d, 1.0, idle);
    assert_eq!(d.affect().preset(), EmotionPreset::Playful);
    run(&mut d, 2.5, idle);
    assert_eq!(d.affect().preset(), EmotionPreset::Hungry);
}

#[test]
fn test_needs_first_precedence_overrides_lock() {
    let mut config = SlimeConfig::default();
    config.affect.precedence = PresetPrecedence::NeedsFirst;
    let mut d = SimulationDriver::new(config).unwrap();
    d.set_preset(EmotionPreset::Playful);
    d.needs_mut().unwrap().set_state(NeedsState {
        attention: 0.1,
        ..Default::default()
    });
    run(&mut d, 0.05, idle);
    assert_eq!(d.affect().preset(), EmotionPreset::Lonely);
}

#[test]
fn test_exhausted_creature_falls_asleep() {
    let mut config = SlimeConfig::default();
    config.needs.energy_recovery = 0.0;
    let mut d = SimulationDriver::new(config).unwrap();
    d.needs_mut().unwrap().set_state(NeedsState {
        energy: 0.0,
        ..Default::default()
    });
    run(&mut d, 0.05, idle);
    assert_eq!(d.affect().preset(), EmotionPreset::Sleeping);
    run(&mut d, 30.0, idle);
    assert!(d.snapshot().param(RenderParam::SleepDimming) > 0.3);
}

// ============================================================================
// Taps
// ============================================================================

fn tap_driver() -> SimulationDriver {
    let mut config = SlimeConfig::default();
    config.needs.surprise_chance = 0.0;
    SimulationDriver::new(config).unwrap()
}

#[test]
fn test_tap_storm_requests_grumpy() {
    let mut d = tap_driver();
    let mut last = None;
    for _ in 0..9 {
        last = d.on_tap(Vec2::new(0.1, 0.2));
        run(&mut d, 0.1, idle);
    }
    let last = last.unwrap();
    assert_eq!(last.count, 9);
    assert_eq!(last.requested, Some((EmotionPreset::Grumpy, PresetChange::Applied)));
    assert_eq!(d.affect().preset(), EmotionPreset::Grumpy);
    assert!(d.needs().unwrap().tap_intensity() > 0.5);
}

#[test]
fn test_gentle_taps_stay_calm() {
    let mut d = tap_driver();
    for _ in 0..3 {
        let outcome = d.on_tap(Vec2::ZERO).unwrap();
        assert!(outcome.requested.is_none());
        run(&mut d, 0.2, idle);
    }
    assert_eq!(d.needs().unwrap().tap_intensity(), 0.5);
    assert_ne!(d.affect().preset(), EmotionPreset::Grumpy);
}

// ============================================================================
// Awareness
// ============================================================================

#[test]
fn test_awareness_promotes_with_sustained_motion() {
    let mut d = driver();
    // tracking starts after the 0.5s startup delay
    run(&mut d, 2.4, circling);
    assert_eq!(d.eyes().stage(), AwarenessStage::Oblivious);
    run(&mut d, 0.4, circling);
    assert_eq!(d.eyes().stage(), AwarenessStage::Noticing);
    run(&mut d, 2.5, circling);
    assert_eq!(d.eyes().stage(), AwarenessStage::Noticing);
    run(&mut d, 1.2, circling);
    assert_eq!(d.eyes().stage(), AwarenessStage::Tracking);
}

#[test]
fn test_awareness_demotes_when_pointer_rests() {
    let mut d = driver();
    run(&mut d, 6.5, circling);
    assert_eq!(d.eyes().stage(), AwarenessStage::Tracking);

    let rest = d.clock();
    let parked = move |_: f64| circling(rest);
    run(&mut d, 1.5, parked);
    assert_eq!(d.eyes().stage(), AwarenessStage::Tracking);
    run(&mut d, 1.5, parked);
    assert_eq!(d.eyes().stage(), AwarenessStage::Noticing);
    run(&mut d, 6.0, parked);
    assert_eq!(d.eyes().stage(), AwarenessStage::Oblivious);
}

#[test]
fn test_gaze_leans_toward_tracked_pointer() {
    let mut config = SlimeConfig::default();
    config.eyes.shy_base_chance = 0.0;
    let mut d = SimulationDriver::new(config).unwrap();
    run(&mut d, 12.0, |t| Some(Vec2::new(2.0, (t * 3.0).sin() as f32 * 0.1)));
    let s = d.snapshot();
    assert_eq!(s.debug.awareness, AwarenessStage::Tracking);
    assert!(s.param(RenderParam::EyeOffsetX) > 0.05, "gaze x {}", s.param(RenderParam::EyeOffsetX));
    assert!(Vec2::new(s.param(RenderParam::EyeOffsetX), s.param(RenderParam::EyeOffsetY)).length() <= 0.15 + 1e-6);
}

// ============================================================================
// Determinism
// ============================================================================

fn gaze_trajectory(seed: u64) -> Vec<(u32, u32)> {
    let mut d = SimulationDriver::builder().seed(seed).build().unwrap();
    let mut out = Vec::new();
    for k in 0..1200 {
        let t = k as f64 * FRAME;
        let pointer = Vec2::new((t * 0.7).cos() as f32 * 2.0, (t * 1.1).sin() as f32);
        if k == 300 {
            d.on_tap(pointer);
        }
        let s = d.tick(FRAME, Some(pointer));
        out.push((
            s.param(RenderParam::EyeOffsetX).to_bits(),
            s.param(RenderParam::EyeOffsetY).to_bits(),
        ));
    }
    out
}

#[test]
fn test_same_seed_gives_identical_gaze() {
    assert_eq!(gaze_trajectory(42), gaze_trajectory(42));
}

#[test]
fn test_different_seeds_diverge() {
    assert_ne!(gaze_trajectory(1), gaze_trajectory(2));
}

// ============================================================================
// Outputs
// ============================================================================

#[test]
fn test_breathing_pulse_matches_closed_form() {
    use std::f32::consts::TAU;
    let expected = 1.0 + (TAU * 0.25).sin() * 0.03 + (TAU * 0.1).sin() * 0.02 + 0.0;
    let got = breathing_pulse(0.25, 1.0, &[0.0, 0.15, 0.25], &[0.03, 0.02, 0.01]);
    assert!((got - expected).abs() < 1e-6);
}

#[test]
fn test_sad_creature_sags() {
    let mut d = driver();
    d.set_preset(EmotionPreset::Sad);
    run(&mut d, 8.0, idle);
    let s = d.snapshot();
    assert_eq!(s.debug.body_motion, BodyMotion::DripSag);
    assert_eq!(s.param(RenderParam::BottomSquish), 0.25);
    assert!(s.pose.scale.y < 1.0);
}

#[test]
fn test_snapshot_serializes_to_json() {
    let mut d = driver();
    run(&mut d, 0.5, idle);
    let json: serde_json::Value = serde_json::from_str(&d.snapshot().to_json().unwrap()).unwrap();
    assert_eq!(json["debug"]["current_emotion_name"], "Neutral");
    assert!(json["params"]["BreathingPulse"].is_number());
    assert!(json["debug"]["needs"]["hunger"].is_number());
}
