#![forbid(unsafe_code)]

//! Time-based fade primitives.
//!
//! Messages fade in right after spawning and fade out just before leaving the
//! surface. Both are driven by the same per-frame `dt` that moves them, so a
//! fade never runs ahead of or behind the motion it decorates.

use std::time::Duration;

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the end has been reached.
    fn is_complete(&self) -> bool;

    /// Current value, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    /// Return to the initial state.
    fn reset(&mut self);
}

/// Progression from 0.0 to 1.0 over a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
}

impl Fade {
    /// A linear fade lasting `duration`.
    ///
    /// A zero duration completes on the first tick.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: duration.max(Duration::from_nanos(1)),
        }
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }
}

/// Opacity factor for something `remaining` away from disappearing, given a
/// fade-out window of `window`.
///
/// Returns 1.0 outside the window and ramps linearly to 0.0 at the end.
pub fn fade_out_factor(remaining: Duration, window: Duration) -> f32 {
    if window.is_zero() || remaining >= window {
        return 1.0;
    }
    (remaining.as_secs_f64() / window.as_secs_f64()).clamp(0.0, 1.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);
    const MS_100: Duration = Duration::from_millis(100);

    #[test]
    fn fade_progresses_and_completes() {
        let mut fade = Fade::new(MS_100);
        assert_eq!(fade.value(), 0.0);
        fade.tick(MS_50);
        assert!((fade.value() - 0.5).abs() < 1e-6);
        assert!(!fade.is_complete());
        fade.tick(MS_50);
        assert!(fade.is_complete());
        assert_eq!(fade.value(), 1.0);
    }

    #[test]
    fn fade_clamps_overshoot() {
        let mut fade = Fade::new(MS_100);
        fade.tick(Duration::from_secs(10));
        assert_eq!(fade.value(), 1.0);
    }

    #[test]
    fn zero_duration_fade_completes_on_first_tick() {
        let mut fade = Fade::new(Duration::ZERO);
        assert!(!fade.is_complete());
        fade.tick(Duration::from_nanos(1));
        assert!(fade.is_complete());
    }

    #[test]
    fn fade_reset_restarts() {
        let mut fade = Fade::new(MS_100);
        fade.tick(MS_100);
        fade.reset();
        assert_eq!(fade.value(), 0.0);
        fade.tick(MS_50);
        assert!((fade.value() - 0.5).abs() < 1e-6);
    }

    #[test]
    fn fade_out_factor_window() {
        assert_eq!(fade_out_factor(MS_100, Duration::ZERO), 1.0);
        assert_eq!(fade_out_factor(MS_100, MS_100), 1.0);
        assert!((fade_out_factor(MS_50, MS_100) - 0.5).abs() < 1e-6);
        assert_eq!(fade_out_factor(Duration::ZERO, MS_100), 0.0);
    }
}
