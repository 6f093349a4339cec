#![forbid(unsafe_code)]

//! Scheduling parameters.
//!
//! A [`SchedulerConfig`] is owned by the host's settings component and handed
//! to the scheduler at construction and on every hot reload. The scheduler
//! never trusts it verbatim: [`SchedulerConfig::sanitize`] clamps every field
//! into a range where at least one lane can always become eligible again and
//! no formula divides by zero.
//!
//! # Failure Modes
//!
//! | Input | Behavior |
//! |-------|----------|
//! | `lane_count == 0` | clamped to 1 |
//! | `lane_count > MAX_LANES` | clamped to `MAX_LANES` |
//! | speed `<= 0`, NaN, or infinite | clamped into `[MIN, MAX]`, NaN uses the default |
//! | negative or NaN gap | clamped to 0 / default |
//! | band outside `0..=100` % | clamped, height limited to `100 - top` |
//! | fixed-poll retry of zero | raised to 1 ms |

use std::time::Duration;

use bitflags::bitflags;

/// Default number of lanes.
pub const DEFAULT_LANE_COUNT: usize = 8;

/// Upper bound on lanes. Well past anything a real surface can fit.
pub const MAX_LANES: usize = 256;

/// Default scroll speed (px/s).
pub const DEFAULT_SPEED_PX_PER_SEC: f32 = 160.0;

/// Slowest permitted scroll speed (px/s).
pub const MIN_SPEED_PX_PER_SEC: f32 = 1.0;

/// Fastest permitted scroll speed (px/s).
pub const MAX_SPEED_PX_PER_SEC: f32 = 100_000.0;

/// Default safety gap between consecutive messages on a lane (px).
pub const DEFAULT_MIN_GAP_PX: f32 = 24.0;

/// Largest permitted gap (px).
pub const MAX_GAP_PX: f32 = 100_000.0;

/// Default wait after a successful placement.
pub const DEFAULT_SPAWN_INTERVAL: Duration = Duration::from_millis(150);

/// Default top of the vertical band, as a percentage of surface height.
pub const DEFAULT_BAND_TOP_PERCENT: f32 = 5.0;

/// Default height of the vertical band, as a percentage of surface height.
pub const DEFAULT_BAND_HEIGHT_PERCENT: f32 = 40.0;

/// Default distance messages start and end beyond the surface edges (px).
pub const DEFAULT_EDGE_MARGIN_PX: f32 = 8.0;

/// Largest permitted edge margin or lane spacing (px).
pub const MAX_SPACING_PX: f32 = 10_000.0;

/// Default poll delay after a lane-busy denial.
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(100);

/// Shortest permitted poll delay.
pub const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// How the drain loop waits after the lane allocator says no.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RetryPolicy {
    /// Re-check the same head request after a fixed delay.
    FixedPoll(Duration),
    /// Sleep until the earliest instant one of the active lanes becomes
    /// eligible.
    ExactWake,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::FixedPoll(DEFAULT_RETRY_DELAY)
    }
}

bitflags! {
    /// Fields that [`SchedulerConfig::sanitize`] had to change.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Clamped: u16 {
        const LANE_COUNT = 1 << 0;
        const SPEED = 1 << 1;
        const MIN_GAP = 1 << 2;
        const BAND_TOP = 1 << 3;
        const BAND_HEIGHT = 1 << 4;
        const EDGE_MARGIN = 1 << 5;
        const LANE_SPACING = 1 << 6;
        const RETRY_DELAY = 1 << 7;
    }
}

/// Hot-swappable scheduling parameters.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Serialize, serde::Deserialize),
    serde(default)
)]
pub struct SchedulerConfig {
    /// Configured number of lanes. Default: 8.
    pub lane_count: usize,

    /// Scroll speed captured by each message at spawn (px/s). Default: 160.
    pub speed_px_per_sec: f32,

    /// Clear space required behind the previous message on a lane before the
    /// next one may spawn there (px). Default: 24.
    pub min_gap_px: f32,

    /// Wait after a successful placement before the next head is evaluated.
    /// Default: 150 ms.
    pub spawn_interval: Duration,

    /// Top of the band lanes are stacked in (% of surface height). Default: 5.
    pub band_top_percent: f32,

    /// Height of the band (% of surface height). Default: 40.
    pub band_height_percent: f32,

    /// How far off-surface messages start and end (px). Default: 8.
    pub edge_margin_px: f32,

    /// Extra vertical space added to the measured line height (px). Default: 0.
    pub lane_spacing_px: f32,

    /// Wait strategy after a denial. Default: fixed 100 ms poll.
    pub retry: RetryPolicy,

    /// Fade-in after spawn. Default: none.
    pub fade_in: Duration,

    /// Fade-out before despawn. Default: none.
    pub fade_out: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            lane_count: DEFAULT_LANE_COUNT,
            speed_px_per_sec: DEFAULT_SPEED_PX_PER_SEC,
            min_gap_px: DEFAULT_MIN_GAP_PX,
            spawn_interval: DEFAULT_SPAWN_INTERVAL,
            band_top_percent: DEFAULT_BAND_TOP_PERCENT,
            band_height_percent: DEFAULT_BAND_HEIGHT_PERCENT,
            edge_margin_px: DEFAULT_EDGE_MARGIN_PX,
            lane_spacing_px: 0.0,
            retry: RetryPolicy::default(),
            fade_in: Duration::ZERO,
            fade_out: Duration::ZERO,
        }
    }
}

impl SchedulerConfig {
    /// Set the lane count.
    #[must_use]
    pub fn with_lane_count(mut self, lane_count: usize) -> Self {
        self.lane_count = lane_count;
        self
    }

    /// Set the scroll speed.
    #[must_use]
    pub fn with_speed(mut self, px_per_sec: f32) -> Self {
        self.speed_px_per_sec = px_per_sec;
        self
    }

    /// Set the minimum gap.
    #[must_use]
    pub fn with_min_gap(mut self, px: f32) -> Self {
        self.min_gap_px = px;
        self
    }

    /// Set the spawn interval.
    #[must_use]
    pub fn with_spawn_interval(mut self, interval: Duration) -> Self {
        self.spawn_interval = interval;
        self
    }

    /// Set the vertical band.
    #[must_use]
    pub fn with_band(mut self, top_percent: f32, height_percent: f32) -> Self {
        self.band_top_percent = top_percent;
        self.band_height_percent = height_percent;
        self
    }

    /// Set the edge margin.
    #[must_use]
    pub fn with_edge_margin(mut self, px: f32) -> Self {
        self.edge_margin_px = px;
        self
    }

    /// Set the lane spacing.
    #[must_use]
    pub fn with_lane_spacing(mut self, px: f32) -> Self {
        self.lane_spacing_px = px;
        self
    }

    /// Set the retry policy.
    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Set fade-in and fade-out durations.
    #[must_use]
    pub fn with_fades(mut self, fade_in: Duration, fade_out: Duration) -> Self {
        self.fade_in = fade_in;
        self.fade_out = fade_out;
        self
    }

    /// Clamp every field into its safe range, reporting what changed.
    pub fn sanitize(&mut self) -> Clamped {
        let mut clamped = Clamped::empty();

        let lanes = self.lane_count.clamp(1, MAX_LANES);
        if lanes != self.lane_count {
            self.lane_count = lanes;
            clamped |= Clamped::LANE_COUNT;
        }

        if clamp_field(
            &mut self.speed_px_per_sec,
            MIN_SPEED_PX_PER_SEC,
            MAX_SPEED_PX_PER_SEC,
            DEFAULT_SPEED_PX_PER_SEC,
        ) {
            clamped |= Clamped::SPEED;
        }
        if clamp_field(&mut self.min_gap_px, 0.0, MAX_GAP_PX, DEFAULT_MIN_GAP_PX) {
            clamped |= Clamped::MIN_GAP;
        }
        if clamp_field(
            &mut self.band_top_percent,
            0.0,
            100.0,
            DEFAULT_BAND_TOP_PERCENT,
        ) {
            clamped |= Clamped::BAND_TOP;
        }
        let band_room = 100.0 - self.band_top_percent;
        if clamp_field(
            &mut self.band_height_percent,
            0.0,
            band_room,
            DEFAULT_BAND_HEIGHT_PERCENT.min(band_room),
        ) {
            clamped |= Clamped::BAND_HEIGHT;
        }
        if clamp_field(
            &mut self.edge_margin_px,
            0.0,
            MAX_SPACING_PX,
            DEFAULT_EDGE_MARGIN_PX,
        ) {
            clamped |= Clamped::EDGE_MARGIN;
        }
        if clamp_field(&mut self.lane_spacing_px, 0.0, MAX_SPACING_PX, 0.0) {
            clamped |= Clamped::LANE_SPACING;
        }

        if let RetryPolicy::FixedPoll(delay) = self.retry
            && delay < MIN_RETRY_DELAY
        {
            self.retry = RetryPolicy::FixedPoll(MIN_RETRY_DELAY);
            clamped |= Clamped::RETRY_DELAY;
        }

        clamped
    }

    /// A sanitized copy.
    #[must_use]
    pub fn sanitized(mut self) -> Self {
        self.sanitize();
        self
    }
}

/// Clamp `value` into `[min, max]`, replacing NaN with `fallback`.
/// Returns whether the value changed.
fn clamp_field(value: &mut f32, min: f32, max: f32, fallback: f32) -> bool {
    let fixed = if value.is_nan() {
        fallback
    } else {
        value.clamp(min, max)
    };
    // Bitwise compare so NaN always counts as changed.
    let changed = fixed.to_bits() != value.to_bits();
    *value = fixed;
    changed
}
