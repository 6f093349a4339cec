#![forbid(unsafe_code)]

//! Lane scheduler: queue, drain loop, allocator, lifecycle and pool on one
//! frame-driven timeline.
//!
//! # Tick Order
//!
//! Each call to [`Scheduler::tick`] does, in order:
//!
//! 1. advance the clock by `dt`;
//! 2. check the surface is still alive (halt if not);
//! 3. move every active message, releasing those that reached their exit;
//! 4. let the drain loop make at most one placement attempt.
//!
//! # Key Invariants
//!
//! 1. **No overlap**: two messages on one lane never share an occupancy
//!    window (enforced by [`LaneTable::try_acquire`]).
//! 2. **No loss, no reorder**: the head request is only popped on a grant.
//! 3. **Pool closure**: `pool.idle_len() + active_messages().len() ==
//!    pool.allocated()` between calls.
//! 4. **Lane bound**: every placement lands on a lane below the active lane
//!    count for that attempt.
//!
//! # Failure Modes
//!
//! | Condition | Behavior |
//! |-----------|----------|
//! | no eligible lane | request stays at the head, retried per [`RetryPolicy`] |
//! | invalid config | clamped by [`SchedulerConfig::sanitize`] |
//! | surface gone | messages terminated, [`SchedulerError::SurfaceUnavailable`] until [`Scheduler::reinitialize`] |

use std::fmt;
use std::time::Duration;

use danmaku_core::{FrameClock, Rgba, Size};

use crate::config::{Clamped, RetryPolicy, SchedulerConfig};
use crate::drain::{DrainLoop, DrainState};
use crate::lanes::{Clearance, LaneTable, active_lane_count};
use crate::message::{ActiveMessage, Phase, SpawnParams, Trajectory};
use crate::pool::HandlePool;
use crate::queue::{DisplayRequest, IngressQueue, RequestId};
use crate::surface::{RenderHandle, Surface};

/// Errors returned by [`Scheduler::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The host surface was torn down. The scheduler is halted until
    /// [`Scheduler::reinitialize`] installs a new one.
    SurfaceUnavailable,
}

impl fmt::Display for SchedulerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SurfaceUnavailable => write!(f, "display surface is unavailable"),
        }
    }
}

impl std::error::Error for SchedulerError {}

/// Whether the scheduler is placing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulerState {
    /// Normal operation.
    #[default]
    Running,
    /// Surface lost; submissions are queued but nothing is placed.
    Halted,
}

/// Scheduler statistics.
#[derive(Debug, Clone, Default)]
pub struct SchedulerStats {
    /// Requests accepted by `submit`.
    pub total_submitted: u64,

    /// Requests that made it on screen.
    pub total_placed: u64,

    /// Messages that scrolled off and released their handle.
    pub total_despawned: u64,

    /// Placement attempts refused for lack of an eligible lane.
    pub total_denials: u64,

    /// Messages cut short by surface loss or shutdown.
    pub total_force_terminated: u64,

    /// Sum of queue waits of placed requests.
    pub total_wait: Duration,

    /// Longest queue wait observed.
    pub max_wait: Duration,

    /// Current queue length.
    pub queue_length: usize,

    /// Longest the queue has been.
    pub peak_queue_length: usize,

    /// Messages currently on screen.
    pub active_messages: usize,
}

impl SchedulerStats {
    /// Mean time from submission to placement.
    pub fn mean_wait(&self) -> Duration {
        if self.total_placed == 0 {
            return Duration::ZERO;
        }
        let divisor = u32::try_from(self.total_placed).unwrap_or(u32::MAX);
        self.total_wait / divisor
    }
}

/// A successful placement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Placement {
    /// The placed request.
    pub id: RequestId,
    /// Lane granted.
    pub lane: usize,
    /// Clock time of the placement.
    pub spawn_time: Duration,
    /// Time the request spent queued.
    pub waited: Duration,
    /// Measured extent.
    pub extent: Size,
    /// Speed captured by the message.
    pub speed: f32,
    /// Entry, exit and height.
    pub trajectory: Trajectory,
    /// Active lane count for this attempt.
    pub active_lanes: usize,
}

/// What happened during one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickReport {
    /// Clock time after advancing.
    pub now: Duration,
    /// The placement made this tick, if any.
    pub placement: Option<Placement>,
    /// Whether a placement attempt was refused.
    pub denied: bool,
    /// Messages that reached their exit this tick.
    pub despawned: usize,
}

enum Attempt {
    Placed(Placement),
    Denied,
    Empty,
}

/// The scrolling message scheduler.
///
/// One instance per surface, constructed by the host and passed to producers
/// by `&mut`. All work happens inside [`submit`](Self::submit) and
/// [`tick`](Self::tick) on the caller's thread.
pub struct Scheduler<S: Surface> {
    config: SchedulerConfig,
    surface: S,
    queue: IngressQueue,
    lanes: LaneTable,
    pool: HandlePool<S::Handle>,
    active: Vec<ActiveMessage<S::Handle>>,
    drain: DrainLoop,
    clock: FrameClock,
    state: SchedulerState,
    stats: SchedulerStats,
}

impl<S: Surface> fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Scheduler")
            .field("state", &self.state)
            .field("now", &self.clock.now())
            .field("frames", &self.clock.frames())
            .field("queued", &self.queue.len())
            .field("active", &self.active.len())
            .field("lanes", &self.lanes.len())
            .field("drain", &self.drain.state())
            .finish_non_exhaustive()
    }
}

impl<S: Surface> Scheduler<S> {
    /// Create a scheduler drawing on `surface`.
    pub fn new(surface: S, config: SchedulerConfig) -> Self {
        let config = config.sanitized();
        Self {
            lanes: LaneTable::new(config.lane_count),
            config,
            surface,
            queue: IngressQueue::new(),
            pool: HandlePool::new(),
            active: Vec::new(),
            drain: DrainLoop::default(),
            clock: FrameClock::new(),
            state: SchedulerState::Running,
            stats: SchedulerStats::default(),
        }
    }

    /// Queue a request for display. Never blocks, never fails.
    ///
    /// Accepted even while halted; the request waits for a new surface.
    pub fn submit(&mut self, request: DisplayRequest) -> RequestId {
        let id = self.queue.push(request, self.clock.now());
        self.stats.total_submitted += 1;
        self.stats.queue_length = self.queue.len();
        self.stats.peak_queue_length = self.queue.high_water();
        self.drain.wake();
        id
    }

    /// Queue `text` in `color`.
    pub fn submit_text(&mut self, text: impl Into<String>, color: Rgba) -> RequestId {
        self.submit(DisplayRequest::new(text, color))
    }

    /// Allocate handles ahead of time so the first burst does not grow the
    /// pool.
    pub fn prewarm(&mut self, count: usize) {
        let surface = &mut self.surface;
        self.pool.prewarm(count, || surface.create_handle());
    }

    /// Advance the timeline by `dt`.
    pub fn tick(&mut self, dt: Duration) -> Result<TickReport, SchedulerError> {
        if self.state == SchedulerState::Halted {
            return Err(SchedulerError::SurfaceUnavailable);
        }
        let now = self.clock.advance(dt);

        let Some(surface_size) = self.surface.size() else {
            self.surface_lost();
            return Err(SchedulerError::SurfaceUnavailable);
        };

        let despawned = self.advance_messages(dt);
        let mut report = TickReport {
            now,
            placement: None,
            denied: false,
            despawned,
        };

        if self.drain.poll(now, self.queue.is_empty()) {
            match self.attempt_placement(now, surface_size.sanitized()) {
                Attempt::Placed(placement) => report.placement = Some(placement),
                Attempt::Denied => report.denied = true,
                Attempt::Empty => self.drain.restart(true),
            }
        }

        self.stats.queue_length = self.queue.len();
        self.stats.active_messages = self.active.len();
        Ok(report)
    }

    fn advance_messages(&mut self, dt: Duration) -> usize {
        for message in &mut self.active {
            message.advance(dt);
        }
        let mut despawned = 0;
        let mut i = 0;
        while i < self.active.len() {
            if self.active[i].phase() != Phase::Finished {
                i += 1;
                continue;
            }
            let message = self.active.remove(i);
            tracing::trace!(
                target: "danmaku.drain",
                id = message.id().0,
                lane = message.lane(),
                "message despawned"
            );
            self.pool.release(message.into_handle());
            despawned += 1;
        }
        self.stats.total_despawned += despawned as u64;
        despawned
    }

    /// Allocation parameters for the current settings. The runway spans from
    /// the spawn point to where a departing tail leaves `surface_size`.
    fn clearance(&self, surface_size: Size) -> Clearance {
        let margin = self.config.edge_margin_px;
        Clearance::new(self.config.speed_px_per_sec, self.config.min_gap_px)
            .with_runway(surface_size.width + 2.0 * margin)
    }

    fn attempt_placement(&mut self, now: Duration, surface_size: Size) -> Attempt {
        let Some(head) = self.queue.peek() else {
            return Attempt::Empty;
        };
        let id = head.id();
        let submitted_at = head.submitted_at();
        let color = head.request().color();

        let surface = &mut self.surface;
        let mut handle = self.pool.acquire_with(|| surface.create_handle());
        handle.set_text(head.request().text());
        handle.set_color(color);
        let extent = handle.measure().sanitized();

        let line_height = if extent.height > 0.0 { extent.height } else { 1.0 };
        let lane_height = line_height + self.config.lane_spacing_px;
        let band_height = surface_size.height * self.config.band_height_percent / 100.0;
        let active_lanes = active_lane_count(self.config.lane_count, band_height, lane_height);
        let clearance = self.clearance(surface_size);

        let Some(lane) = self
            .lanes
            .try_acquire(extent.width, active_lanes, now, clearance)
        else {
            self.pool.release(handle);
            self.stats.total_denials += 1;
            let resume_at = self.resume_after_denial(now, active_lanes, clearance);
            self.drain.denied(resume_at);
            tracing::trace!(
                target: "danmaku.drain",
                id = id.0,
                width = extent.width,
                active_lanes,
                resume_in_ms = resume_at.saturating_sub(now).as_secs_f64() * 1000.0,
                "no lane available"
            );
            return Attempt::Denied;
        };

        let request = self.queue.pop();
        debug_assert_eq!(request.as_ref().map(|r| r.id()), Some(id));

        let band_top = surface_size.height * self.config.band_top_percent / 100.0;
        let trajectory = Trajectory::compute(
            surface_size,
            extent,
            lane,
            lane_height,
            band_top,
            self.config.edge_margin_px,
        );
        let speed = clearance.speed();
        self.active.push(ActiveMessage::spawn(
            handle,
            SpawnParams {
                id,
                lane,
                spawn_time: now,
                trajectory,
                extent,
                speed,
                color,
                fade_in: self.config.fade_in,
                fade_out: self.config.fade_out,
            },
        ));

        let waited = self.clock.since(submitted_at);
        self.stats.total_placed += 1;
        self.stats.total_wait = self.stats.total_wait.saturating_add(waited);
        self.stats.max_wait = self.stats.max_wait.max(waited);
        self.drain.placed(now, self.config.spawn_interval);

        tracing::debug!(
            target: "danmaku.drain",
            id = id.0,
            lane,
            active_lanes,
            width = extent.width,
            waited_ms = waited.as_secs_f64() * 1000.0,
            "message placed"
        );

        Attempt::Placed(Placement {
            id,
            lane,
            spawn_time: now,
            waited,
            extent,
            speed,
            trajectory,
            active_lanes,
        })
    }

    fn resume_after_denial(&self, now: Duration, active_lanes: usize, clearance: Clearance) -> Duration {
        match self.config.retry {
            RetryPolicy::FixedPoll(delay) => now.saturating_add(delay),
            // A time not in the future still resumes no earlier than the next tick.
            RetryPolicy::ExactWake => self
                .lanes
                .next_eligible_at(active_lanes, clearance)
                .filter(|at| *at > now)
                .unwrap_or(now),
        }
    }

    /// Replace the scheduling parameters.
    ///
    /// Affects subsequent placement decisions only; messages in flight keep
    /// the speed they spawned with, and each lane keeps judging clearance by
    /// its last occupant's speed. Returns the fields that were clamped.
    pub fn apply_settings(&mut self, config: SchedulerConfig) -> Clamped {
        let mut config = config;
        let clamped = config.sanitize();
        if !clamped.is_empty() {
            tracing::debug!(
                target: "danmaku.settings",
                clamped = ?clamped,
                lane_count = config.lane_count,
                speed = config.speed_px_per_sec,
                min_gap = config.min_gap_px,
                "settings clamped"
            );
        }
        self.lanes.resize(config.lane_count);
        self.config = config;
        clamped
    }

    /// Tell the scheduler its surface is gone.
    ///
    /// Every active message is terminated and its handle parked in the pool.
    /// Called automatically when a tick finds the surface has no size.
    pub fn surface_lost(&mut self) {
        if self.state == SchedulerState::Halted {
            return;
        }
        let terminated = self.active.len();
        for message in self.active.drain(..) {
            self.pool.release(message.into_handle());
        }
        self.stats.total_force_terminated += terminated as u64;
        self.stats.active_messages = 0;
        self.state = SchedulerState::Halted;
        tracing::warn!(
            target: "danmaku.surface",
            terminated,
            queued = self.queue.len(),
            "surface lost, scheduler halted"
        );
    }

    /// Install a fresh surface and resume.
    ///
    /// Handles from the old surface are dropped, lane history is cleared and
    /// queued requests start draining on the next tick. Returns the old
    /// surface.
    pub fn reinitialize(&mut self, surface: S) -> S {
        self.surface_lost();
        let old = std::mem::replace(&mut self.surface, surface);
        let discarded = self.pool.discard();
        self.lanes.reset();
        self.state = SchedulerState::Running;
        self.drain.restart(self.queue.is_empty());
        tracing::info!(
            target: "danmaku.surface",
            discarded,
            queued = self.queue.len(),
            "scheduler reinitialized"
        );
        old
    }

    /// Tear down: terminate every message, park the handles and hand back the
    /// surface and pool.
    pub fn shutdown(mut self) -> (S, HandlePool<S::Handle>) {
        let terminated = self.active.len();
        for message in self.active.drain(..) {
            self.pool.release(message.into_handle());
        }
        tracing::debug!(
            target: "danmaku.surface",
            terminated,
            dropped_requests = self.queue.len(),
            "scheduler shut down"
        );
        (self.surface, self.pool)
    }

    /// Running or halted.
    #[inline]
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Current clock time.
    #[inline]
    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Requests waiting for a lane.
    #[inline]
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// The ingress queue.
    #[inline]
    pub fn queue(&self) -> &IngressQueue {
        &self.queue
    }

    /// Messages on screen, in spawn order.
    #[inline]
    pub fn active_messages(&self) -> &[ActiveMessage<S::Handle>] {
        &self.active
    }

    /// Lane bookkeeping.
    #[inline]
    pub fn lanes(&self) -> &LaneTable {
        &self.lanes
    }

    /// Handle pool.
    #[inline]
    pub fn pool(&self) -> &HandlePool<S::Handle> {
        &self.pool
    }

    /// The host surface.
    #[inline]
    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// The host surface, mutably (for resizes).
    #[inline]
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    /// Parameters in effect.
    #[inline]
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Drain loop state.
    #[inline]
    pub fn drain_state(&self) -> DrainState {
        self.drain.state()
    }

    /// Statistics.
    #[inline]
    pub fn stats(&self) -> &SchedulerStats {
        &self.stats
    }
}
