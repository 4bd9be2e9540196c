//! Heartbeat configuration for real-time driving.
//!
//! The heartbeat decides how often the wall clock feeds a tick into the
//! driver. Gaps longer than `max_delta` (a suspended process, a debugger
//! pause) are clamped so the creature does not age minutes in one frame.

use std::time::Duration;

#[derive(Debug, Clone)]
pub struct HeartbeatConfig {
    /// Time between ticks (default: ~60 Hz)
    pub interval: Duration,
    /// Largest wall-clock delta fed as a single tick
    pub max_delta: Duration,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_micros(16_667),
            max_delta: Duration::from_millis(250),
        }
    }
}

impl HeartbeatConfig {
    /// 120 Hz for smooth displays
    pub fn fast() -> Self {
        Self {
            interval: Duration::from_micros(8_333),
            ..Self::default()
        }
    }

    /// 20 Hz for resource-constrained environments
    pub fn slow() -> Self {
        Self {
            interval: Duration::from_millis(50),
            ..Self::default()
        }
    }

    /// Very fast heartbeat for testing
    pub fn testing() -> Self {
        Self {
            interval: Duration::from_millis(1),
            max_delta: Duration::from_millis(50),
        }
    }

    /// Clamp a measured wall-clock delta to `max_delta`, in seconds.
    pub fn clamp_delta(&self, measured: Duration) -> f64 {
        measured.min(self.max_delta).as_secs_f64()
    }
}
