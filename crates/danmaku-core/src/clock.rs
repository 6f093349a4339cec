#![forbid(unsafe_code)]

//! Frame clock and cooperative deadlines.
//!
//! The overlay runs on one logical timeline. The host advances a
//! [`FrameClock`] once per frame, and anything that wants to "sleep" records
//! a [`Deadline`] on that clock and checks it on later frames instead of
//! blocking. Time is kept as [`Duration`] since the clock started, so
//! accumulation is exact integer nanoseconds with no float drift.

use std::time::Duration;

/// Monotonic frame-driven clock.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameClock {
    now: Duration,
    frames: u64,
}

impl FrameClock {
    /// A clock at time zero.
    pub const fn new() -> Self {
        Self {
            now: Duration::ZERO,
            frames: 0,
        }
    }

    /// Advance by one frame of length `dt`. Returns the new time.
    pub fn advance(&mut self, dt: Duration) -> Duration {
        self.now = self.now.saturating_add(dt);
        self.frames = self.frames.wrapping_add(1);
        self.now
    }

    /// Current time since the clock started.
    #[inline]
    pub const fn now(&self) -> Duration {
        self.now
    }

    /// Number of frames advanced so far.
    #[inline]
    pub const fn frames(&self) -> u64 {
        self.frames
    }

    /// Time elapsed since `earlier` (zero if `earlier` lies in the future).
    #[inline]
    pub fn since(&self, earlier: Duration) -> Duration {
        self.now.saturating_sub(earlier)
    }
}

/// A point on a [`FrameClock`] timeline at which suspended work resumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Deadline {
    at: Duration,
}

impl Deadline {
    /// A deadline at an absolute clock time.
    #[inline]
    pub const fn at(at: Duration) -> Self {
        Self { at }
    }

    /// The absolute clock time of this deadline.
    #[inline]
    pub const fn instant(&self) -> Duration {
        self.at
    }

    /// Whether the deadline has been reached at `now`.
    #[inline]
    pub fn is_due(&self, now: Duration) -> bool {
        now >= self.at
    }

    /// Time left until the deadline (zero once due).
    #[inline]
    pub fn remaining(&self, now: Duration) -> Duration {
        self.at.saturating_sub(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_16: Duration = Duration::from_millis(16);

    #[test]
    fn advance_accumulates_exactly() {
        let mut clock = FrameClock::new();
        for _ in 0..1000 {
            clock.advance(MS_16);
        }
        assert_eq!(clock.now(), Duration::from_millis(16_000));
        assert_eq!(clock.frames(), 1000);
    }

    #[test]
    fn since_saturates() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::from_millis(5));
        assert_eq!(clock.since(Duration::from_millis(2)), Duration::from_millis(3));
        assert_eq!(clock.since(Duration::from_secs(9)), Duration::ZERO);
    }

    #[test]
    fn deadline_due_and_remaining() {
        let mut clock = FrameClock::new();
        let d = Deadline::at(clock.now() + Duration::from_millis(40));
        assert!(!d.is_due(clock.now()));
        assert_eq!(d.remaining(clock.now()), Duration::from_millis(40));
        clock.advance(Duration::from_millis(40));
        assert!(d.is_due(clock.now()));
        assert_eq!(d.remaining(clock.now()), Duration::ZERO);
    }

    #[test]
    fn zero_delay_deadline_is_due_immediately() {
        let clock = FrameClock::new();
        assert!(Deadline::at(clock.now()).is_due(clock.now()));
    }

    #[test]
    fn advance_saturates_at_max() {
        let mut clock = FrameClock::new();
        clock.advance(Duration::MAX);
        clock.advance(MS_16);
        assert_eq!(clock.now(), Duration::MAX);
    }
}
