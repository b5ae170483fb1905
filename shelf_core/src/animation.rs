//! Per-frame motion. Everything is a pure function of the injected clock so
//! the shelf animates identically under test and on screen.

use std::time::Duration;

use crate::config::MotionTuning;

/// Distance under which eased values snap onto their target.
const SNAP_EPSILON: f32 = 1e-4;

/// Vertical idle bob of one item, in world units.
pub fn bob_offset(time: f32, phase: f32, motion: &MotionTuning, layout_scale: f32) -> f32 {
    (time * motion.bob_speed + phase).sin() * motion.bob_amplitude * layout_scale
}

/// Radial factor (>= 1) applied to the selection outline's corner brackets.
pub fn pulse(time: f32, motion: &MotionTuning) -> f32 {
    let wave = (time * motion.pulse_speed).sin() * 0.5 + 0.5;
    1.0 + wave * motion.pulse_amplitude
}

/// One exponential easing step: cover `damping` of the remaining distance.
pub fn ease_toward(current: f32, target: f32, damping: f32) -> f32 {
    let next = current + (target - current) * damping.clamp(0.0, 1.0);
    if (target - next).abs() < SNAP_EPSILON {
        target
    } else {
        next
    }
}

/// Shared time base of the render loop. Starts at the first tick and stops
/// for good on unmount.
#[derive(Debug, Clone, Default)]
pub struct FrameClock {
    origin: Option<Duration>,
    stopped: bool,
    frames: u64,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seconds since the first tick, or `None` once stopped.
    pub fn tick(&mut self, now: Duration) -> Option<f32> {
        if self.stopped {
            return None;
        }
        let origin = *self.origin.get_or_insert(now);
        self.frames += 1;
        Some(now.saturating_sub(origin).as_secs_f32())
    }

    pub fn stop(&mut self) {
        self.stopped = true;
    }

    pub fn is_running(&self) -> bool {
        !self.stopped
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}
