#![forbid(unsafe_code)]

//! Scheduling engine for a scrolling message overlay.
//!
//! Producers [`submit`](Scheduler::submit) text at any rate. A single drain
//! loop, advanced by [`Scheduler::tick`], places the head of the queue on the
//! lowest free lane once the previous message there has cleared the entry
//! edge, and throttles display throughput to what the lanes can take.
//! Nothing is ever dropped or reordered.
//!
//! The host plugs in through [`Surface`] and [`RenderHandle`].

pub mod config;
pub mod drain;
pub mod lanes;
pub mod message;
pub mod pool;
pub mod queue;
pub mod scheduler;
pub mod simulator;
pub mod surface;

pub use config::{Clamped, RetryPolicy, SchedulerConfig};
pub use drain::{DrainState, WaitReason};
pub use lanes::{Clearance, Lane, LaneTable};
pub use message::{ActiveMessage, Phase, Trajectory};
pub use pool::HandlePool;
pub use queue::{DisplayRequest, RequestId};
pub use scheduler::{Placement, Scheduler, SchedulerError, SchedulerState, SchedulerStats, TickReport};
pub use surface::{RenderHandle, Surface};
