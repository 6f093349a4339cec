#![forbid(unsafe_code)]

//! Lane state table and the greedy first-fit lane allocator.
//!
//! Lanes are horizontal tracks stacked inside the vertical band. Each lane
//! remembers only the most recent message it hosted: when it spawned, how
//! wide it was and the speed it captured. That message has fully cleared the
//! spawn point plus the safety gap once
//!
//! ```text
//! now - last_spawn >= (last_width + min_gap) / last_speed
//! ```
//!
//! Everything behind it on the lane is further along still, so this single
//! comparison keeps messages apart as long as the follower is not faster.
//! When the speed has been raised since, the follower must also not reach
//! the occupant's tail before the occupant exits. With `runway` the distance
//! from the spawn point to where a departing tail leaves the surface:
//!
//! ```text
//! now - last_spawn >= (runway + last_width) / last_speed - (runway - min_gap) / speed
//! ```
//!
//! The table is an index-addressed `Vec<Lane>`; nothing outside this module
//! holds references into it. Active messages keep a plain lane index, which
//! is why shrinking the table while messages are in flight is harmless.

use std::time::Duration;

/// Bookkeeping for one lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    index: usize,
    last_spawn: Option<Duration>,
    last_width: f32,
    last_speed: f32,
}

impl Lane {
    fn new(index: usize) -> Self {
        Self {
            index,
            last_spawn: None,
            last_width: 0.0,
            last_speed: crate::config::MIN_SPEED_PX_PER_SEC,
        }
    }

    /// Position of this lane in the band, 0 at the top.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Clock time the last message spawned here, if any ever did.
    #[inline]
    pub fn last_spawn(&self) -> Option<Duration> {
        self.last_spawn
    }

    /// Measured width of the last message spawned here.
    #[inline]
    pub fn last_width(&self) -> f32 {
        self.last_width
    }

    /// Speed captured by the last message spawned here.
    #[inline]
    pub fn last_speed(&self) -> f32 {
        self.last_speed
    }

    /// How long after the last spawn a message moving under `clearance` may
    /// follow on this lane.
    pub fn window(&self, clearance: Clearance) -> Duration {
        let occupant = Clearance {
            speed_px_per_sec: self.last_speed,
            ..clearance
        };
        let cleared = occupant.window(self.last_width);
        if clearance.speed_px_per_sec <= self.last_speed {
            return cleared;
        }
        let runway = f64::from(clearance.runway_px);
        let exit = (runway + f64::from(self.last_width)) / f64::from(self.last_speed);
        let head_start = (runway - f64::from(clearance.min_gap_px)).max(0.0)
            / f64::from(clearance.speed_px_per_sec);
        let caught = Duration::try_from_secs_f64((exit - head_start).max(0.0))
            .unwrap_or(Duration::MAX);
        cleared.max(caught)
    }

    /// Earliest clock time a new message may spawn here, or `None` if the
    /// lane has never been used.
    pub fn eligible_at(&self, clearance: Clearance) -> Option<Duration> {
        self.last_spawn
            .map(|spawn| spawn.saturating_add(self.window(clearance)))
    }

    /// Whether a new message may spawn here at `now`.
    pub fn is_eligible(&self, now: Duration, clearance: Clearance) -> bool {
        match self.last_spawn {
            None => true,
            Some(spawn) => now.saturating_sub(spawn) >= self.window(clearance),
        }
    }
}

/// Speed, gap and runway in effect for an allocation decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Clearance {
    speed_px_per_sec: f32,
    min_gap_px: f32,
    runway_px: f32,
}

impl Clearance {
    /// Build from raw parameters.
    ///
    /// Non-positive or non-finite speeds fall back to 1 px/s and bad gaps to
    /// zero, so [`window`](Self::window) never divides by zero.
    pub fn new(speed_px_per_sec: f32, min_gap_px: f32) -> Self {
        let speed = if speed_px_per_sec.is_finite() && speed_px_per_sec > 0.0 {
            speed_px_per_sec
        } else {
            crate::config::MIN_SPEED_PX_PER_SEC
        };
        let gap = if min_gap_px.is_finite() && min_gap_px > 0.0 {
            min_gap_px
        } else {
            0.0
        };
        Self {
            speed_px_per_sec: speed,
            min_gap_px: gap,
            runway_px: 0.0,
        }
    }

    /// Distance from the spawn point to where a departing message's tail
    /// leaves the surface. Only matters when the speed has gone up since a
    /// lane's last spawn; zero disables the catch-up check.
    #[must_use]
    pub fn with_runway(mut self, runway_px: f32) -> Self {
        self.runway_px = if runway_px.is_finite() { runway_px.max(0.0) } else { 0.0 };
        self
    }

    /// Speed a message spawned under this clearance moves at.
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed_px_per_sec
    }

    /// Occupancy window of a message `width` px wide: how long after its
    /// spawn the lane stays taken.
    pub fn window(&self, width: f32) -> Duration {
        let width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        let secs = (f64::from(width) + f64::from(self.min_gap_px)) / f64::from(self.speed_px_per_sec);
        Duration::try_from_secs_f64(secs).unwrap_or(Duration::MAX)
    }
}

/// Number of lanes usable for a message whose lane height is `lane_height`.
///
/// `min(configured, floor(band_height / lane_height))`, but never below one:
/// a band too small for even one line still gets a single lane rather than
/// stalling the queue forever.
pub fn active_lane_count(configured: usize, band_height: f32, lane_height: f32) -> usize {
    let lane_height = if lane_height.is_finite() && lane_height > 0.0 {
        lane_height
    } else {
        1.0
    };
    let fit = if band_height.is_finite() && band_height > 0.0 {
        (band_height / lane_height).floor() as usize
    } else {
        0
    };
    configured.min(fit).max(1)
}

/// Per-lane occupancy bookkeeping.
#[derive(Debug, Clone, Default)]
pub struct LaneTable {
    lanes: Vec<Lane>,
}

impl LaneTable {
    /// A table with `count` unused lanes.
    pub fn new(count: usize) -> Self {
        Self {
            lanes: (0..count).map(Lane::new).collect(),
        }
    }

    /// Number of lanes in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    /// Whether the table holds no lanes.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// All lanes, in index order.
    #[inline]
    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    /// A single lane.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Lane> {
        self.lanes.get(index)
    }

    /// Grow or shrink to `count` lanes.
    ///
    /// Existing lanes keep their bookkeeping; new lanes start unused; lanes
    /// beyond `count` are dropped.
    pub fn resize(&mut self, count: usize) {
        if count <= self.lanes.len() {
            self.lanes.truncate(count);
        } else {
            let start = self.lanes.len();
            self.lanes.extend((start..count).map(Lane::new));
        }
    }

    /// Forget every lane's history.
    pub fn reset(&mut self) {
        for lane in &mut self.lanes {
            *lane = Lane::new(lane.index);
        }
    }

    /// Find the lowest-index eligible lane among the first `active` and
    /// record a spawn of a `width`-px message there at `now`.
    ///
    /// Returns `None` when every candidate lane is still occupied.
    pub fn try_acquire(
        &mut self,
        width: f32,
        active: usize,
        now: Duration,
        clearance: Clearance,
    ) -> Option<usize> {
        let limit = active.min(self.lanes.len());
        let lane = self.lanes[..limit]
            .iter_mut()
            .find(|lane| lane.is_eligible(now, clearance))?;
        lane.last_spawn = Some(now);
        lane.last_width = if width.is_finite() { width.max(0.0) } else { 0.0 };
        lane.last_speed = clearance.speed_px_per_sec;
        tracing::trace!(
            target: "danmaku.lanes",
            lane = lane.index,
            width = lane.last_width,
            speed = lane.last_speed,
            active,
            "lane acquired"
        );
        Some(lane.index)
    }

    /// Earliest clock time any of the first `active` lanes becomes eligible.
    ///
    /// An unused lane is eligible from time zero.
    pub fn next_eligible_at(&self, active: usize, clearance: Clearance) -> Option<Duration> {
        self.lanes
            .iter()
            .take(active)
            .map(|lane| lane.eligible_at(clearance).unwrap_or(Duration::ZERO))
            .min()
    }
}
