#![forbid(unsafe_code)]

//! Drain loop state machine.
//!
//! The drain loop is a single cooperative task. Instead of sleeping it
//! records a [`Deadline`] on the scheduler clock and is polled once per tick:
//!
//! ```text
//!   Idle ──submit──▶ Ready ──attempt──┬─ granted ─▶ Waiting(AfterPlacement, +spawn_interval)
//!    ▲                 ▲              └─ denied ──▶ Waiting(LaneBusy, +retry)
//!    │                 └──────── deadline due ─────────┘
//!    └──────────── queue empty when ready ─────────────┘
//! ```
//!
//! At most one placement attempt happens per tick.

use std::time::Duration;

use danmaku_core::Deadline;

/// Why the drain loop is suspended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitReason {
    /// Spacing out consecutive placements.
    AfterPlacement,
    /// The head request was denied a lane.
    LaneBusy,
}

/// Current state of the drain loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrainState {
    /// Queue empty; woken by the next submit.
    #[default]
    Idle,
    /// Will attempt a placement on the next poll.
    Ready,
    /// Suspended until a deadline.
    Waiting {
        /// When the loop resumes.
        until: Deadline,
        /// What it is waiting for.
        reason: WaitReason,
    },
}

/// The drain task's control state.
#[derive(Debug, Default)]
pub(crate) struct DrainLoop {
    state: DrainState,
}

impl DrainLoop {
    pub(crate) fn state(&self) -> DrainState {
        self.state
    }

    /// A request arrived. Restarts an idle loop; a suspended loop keeps its
    /// deadline.
    pub(crate) fn wake(&mut self) {
        if self.state == DrainState::Idle {
            self.state = DrainState::Ready;
        }
    }

    /// Decide whether to attempt a placement at `now`.
    pub(crate) fn poll(&mut self, now: Duration, queue_empty: bool) -> bool {
        if let DrainState::Waiting { until, .. } = self.state {
            if !until.is_due(now) {
                return false;
            }
            self.state = DrainState::Ready;
        }
        if self.state == DrainState::Ready && queue_empty {
            self.state = DrainState::Idle;
        }
        self.state == DrainState::Ready
    }

    /// The head was placed; suspend for the spawn interval.
    pub(crate) fn placed(&mut self, now: Duration, spawn_interval: Duration) {
        self.state = DrainState::Waiting {
            until: Deadline::at(now.saturating_add(spawn_interval)),
            reason: WaitReason::AfterPlacement,
        };
    }

    /// The head was denied; suspend until `resume_at`.
    pub(crate) fn denied(&mut self, resume_at: Duration) {
        self.state = DrainState::Waiting {
            until: Deadline::at(resume_at),
            reason: WaitReason::LaneBusy,
        };
    }

    /// Back to `Idle` or `Ready` depending on whether work is queued.
    pub(crate) fn restart(&mut self, queue_empty: bool) {
        self.state = if queue_empty {
            DrainState::Idle
        } else {
            DrainState::Ready
        };
    }
}
