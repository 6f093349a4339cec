#![forbid(unsafe_code)]

//! Message lifecycle: spawn, scroll, fade, despawn.
//!
//! A message progresses through these phases:
//!
//! ```text
//! Entering ──fade-in done──▶ Scrolling ──within fade-out window──▶ Leaving ──x <= despawn_x──▶ Finished
//! ```
//!
//! `Entering` and `Leaving` are skipped when the corresponding fade is
//! zero. Motion is linear at the speed captured at spawn, so a settings
//! change never makes an in-flight message jump.

use std::time::Duration;

use danmaku_core::animation::{Animation, Fade, fade_out_factor};
use danmaku_core::{Point, Rgba, Size};

use crate::queue::RequestId;
use crate::surface::RenderHandle;

/// Lifecycle phase of an active message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Fading in after spawn.
    Entering,
    /// Fully visible and moving.
    Scrolling,
    /// Fading out ahead of the trailing edge.
    Leaving,
    /// Past the despawn point; the handle goes back to the pool.
    Finished,
}

/// Where a message starts, where it ends, and at what height it travels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Trajectory {
    /// Entry x: fully beyond the leading (right) edge.
    pub spawn_x: f32,
    /// Exit x: fully beyond the trailing (left) edge.
    pub despawn_x: f32,
    /// Top of the lane.
    pub y: f32,
}

impl Trajectory {
    /// Compute the path of a message of `extent` on `lane`.
    pub fn compute(
        surface: Size,
        extent: Size,
        lane: usize,
        lane_height: f32,
        band_top: f32,
        edge_margin: f32,
    ) -> Self {
        Self {
            spawn_x: surface.width + edge_margin,
            despawn_x: -(extent.width + edge_margin),
            y: band_top + lane as f32 * lane_height,
        }
    }

    /// Horizontal distance from entry to exit.
    pub fn travel(&self) -> f32 {
        self.spawn_x - self.despawn_x
    }
}

/// A message on screen, owning its render handle.
#[derive(Debug)]
pub struct ActiveMessage<H> {
    id: RequestId,
    handle: H,
    lane: usize,
    spawn_time: Duration,
    trajectory: Trajectory,
    x: f64,
    speed: f32,
    extent: Size,
    color: Rgba,
    fade_in: Option<Fade>,
    fade_out: Duration,
    alpha: f32,
    phase: Phase,
}

/// Everything needed to put a message on screen.
#[derive(Debug, Clone, Copy)]
pub(crate) struct SpawnParams {
    pub(crate) id: RequestId,
    pub(crate) lane: usize,
    pub(crate) spawn_time: Duration,
    pub(crate) trajectory: Trajectory,
    pub(crate) extent: Size,
    pub(crate) speed: f32,
    pub(crate) color: Rgba,
    pub(crate) fade_in: Duration,
    pub(crate) fade_out: Duration,
}

impl<H: RenderHandle> ActiveMessage<H> {
    /// Take ownership of a prepared handle, park it at the entry point and
    /// show it.
    pub(crate) fn spawn(mut handle: H, params: SpawnParams) -> Self {
        handle.set_position(Point::new(params.trajectory.spawn_x, params.trajectory.y));
        let mut message = Self {
            id: params.id,
            handle,
            lane: params.lane,
            spawn_time: params.spawn_time,
            trajectory: params.trajectory,
            x: f64::from(params.trajectory.spawn_x),
            speed: params.speed,
            extent: params.extent,
            color: params.color,
            fade_in: (!params.fade_in.is_zero()).then(|| Fade::new(params.fade_in)),
            fade_out: params.fade_out,
            alpha: 1.0,
            phase: Phase::Scrolling,
        };
        message.phase = message.classify();
        message.alpha = message.compute_alpha();
        message
            .handle
            .set_color(message.color.scale_alpha(message.alpha));
        message.handle.set_active(true);
        message
    }

    /// Move by one frame of `dt`. Returns the resulting phase.
    pub(crate) fn advance(&mut self, dt: Duration) -> Phase {
        if self.phase == Phase::Finished {
            return Phase::Finished;
        }
        self.x -= f64::from(self.speed) * dt.as_secs_f64();
        if let Some(fade) = self.fade_in.as_mut() {
            fade.tick(dt);
        }
        self.phase = self.classify();
        if self.phase == Phase::Finished {
            return Phase::Finished;
        }
        self.handle
            .set_position(Point::new(self.x as f32, self.trajectory.y));
        let alpha = self.compute_alpha();
        if alpha != self.alpha {
            self.alpha = alpha;
            self.handle.set_color(self.color.scale_alpha(alpha));
        }
        self.phase
    }

    /// Give the handle back, ending the message.
    pub(crate) fn into_handle(self) -> H {
        self.handle
    }

    fn remaining_travel(&self) -> Duration {
        let distance = (self.x - f64::from(self.trajectory.despawn_x)).max(0.0);
        Duration::try_from_secs_f64(distance / f64::from(self.speed)).unwrap_or(Duration::MAX)
    }

    fn classify(&self) -> Phase {
        if self.x <= f64::from(self.trajectory.despawn_x) {
            Phase::Finished
        } else if !self.fade_out.is_zero() && self.remaining_travel() < self.fade_out {
            Phase::Leaving
        } else if self.fade_in.as_ref().is_some_and(|f| !f.is_complete()) {
            Phase::Entering
        } else {
            Phase::Scrolling
        }
    }

    fn compute_alpha(&self) -> f32 {
        let fade_in = self.fade_in.as_ref().map_or(1.0, |f| f.value());
        fade_in * fade_out_factor(self.remaining_travel(), self.fade_out)
    }
}

impl<H> ActiveMessage<H> {
    /// Request this message was created from.
    #[inline]
    pub fn id(&self) -> RequestId {
        self.id
    }

    /// The render handle, for hosts that draw after each tick.
    #[inline]
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Lane index this message travels on.
    #[inline]
    pub fn lane(&self) -> usize {
        self.lane
    }

    /// Clock time of placement.
    #[inline]
    pub fn spawn_time(&self) -> Duration {
        self.spawn_time
    }

    /// Current horizontal position.
    #[inline]
    pub fn x(&self) -> f32 {
        self.x as f32
    }

    /// Vertical position.
    #[inline]
    pub fn y(&self) -> f32 {
        self.trajectory.y
    }

    /// Entry and exit points.
    #[inline]
    pub fn trajectory(&self) -> Trajectory {
        self.trajectory
    }

    /// Speed captured at spawn (px/s).
    #[inline]
    pub fn speed(&self) -> f32 {
        self.speed
    }

    /// Measured extent at spawn.
    #[inline]
    pub fn extent(&self) -> Size {
        self.extent
    }

    /// Submitted color, before any fade.
    #[inline]
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Current opacity factor in [0, 1].
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Current lifecycle phase.
    #[inline]
    pub fn phase(&self) -> Phase {
        self.phase
    }
}
