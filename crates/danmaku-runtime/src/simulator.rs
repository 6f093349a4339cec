#![forbid(unsafe_code)]

//! Deterministic headless surface and schedule simulator for testing.
//!
//! [`HeadlessSurface`] measures text with fixed glyph metrics and draws
//! nothing, so scheduling decisions are fully reproducible.
//! [`ScheduleSimulator`] drives a [`Scheduler`] with a fixed frame step and
//! records every placement.
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use danmaku_core::Rgba;
//! use danmaku_runtime::SchedulerConfig;
//! use danmaku_runtime::simulator::{HeadlessSurface, ScheduleSimulator};
//!
//! let mut sim = ScheduleSimulator::headless(
//!     HeadlessSurface::new(640.0, 360.0),
//!     SchedulerConfig::default(),
//!     Duration::from_millis(16),
//! );
//! sim.submit_text("hello", Rgba::WHITE);
//! sim.run_until_drained(Duration::from_secs(1)).unwrap();
//! assert_eq!(sim.placements().len(), 1);
//! ```

use std::cell::Cell;
use std::rc::Rc;
use std::time::Duration;

use danmaku_core::{Point, Rgba, Size};

use crate::config::SchedulerConfig;
use crate::scheduler::{Placement, Scheduler, SchedulerError, TickReport};
use crate::surface::{RenderHandle, Surface};

/// Fixed text metrics used by the headless surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GlyphMetrics {
    /// Advance per character (px).
    pub glyph_width: f32,
    /// Height of one line (px).
    pub line_height: f32,
}

impl Default for GlyphMetrics {
    fn default() -> Self {
        Self {
            glyph_width: 8.0,
            line_height: 16.0,
        }
    }
}

/// Surface with fixed glyph metrics and no output.
#[derive(Debug)]
pub struct HeadlessSurface {
    size: Option<Size>,
    metrics: Rc<Cell<GlyphMetrics>>,
    created: u64,
}

impl HeadlessSurface {
    /// A live surface of `width` x `height` px with 8x16 glyphs.
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            size: Some(Size::new(width, height)),
            metrics: Rc::new(Cell::new(GlyphMetrics::default())),
            created: 0,
        }
    }

    /// Use `metrics` instead of the default.
    #[must_use]
    pub fn with_metrics(self, metrics: GlyphMetrics) -> Self {
        self.metrics.set(metrics);
        self
    }

    /// Change the metrics for every handle, existing and future. Models a
    /// live style change.
    pub fn set_metrics(&self, metrics: GlyphMetrics) {
        self.metrics.set(metrics);
    }

    /// Change the drawable size.
    pub fn resize(&mut self, width: f32, height: f32) {
        self.size = Some(Size::new(width, height));
    }

    /// Tear the surface down. `size()` reports `None` from now on.
    pub fn destroy(&mut self) {
        self.size = None;
    }

    /// Handles created so far.
    pub fn created(&self) -> u64 {
        self.created
    }
}

impl Surface for HeadlessSurface {
    type Handle = HeadlessHandle;

    fn size(&self) -> Option<Size> {
        self.size
    }

    fn create_handle(&mut self) -> HeadlessHandle {
        let serial = self.created;
        self.created += 1;
        HeadlessHandle {
            serial,
            text: String::new(),
            color: Rgba::TRANSPARENT,
            position: Point::ORIGIN,
            active: false,
            metrics: Rc::clone(&self.metrics),
        }
    }
}

/// Handle produced by [`HeadlessSurface`]. Records every setter.
#[derive(Debug)]
pub struct HeadlessHandle {
    serial: u64,
    text: String,
    color: Rgba,
    position: Point,
    active: bool,
    metrics: Rc<Cell<GlyphMetrics>>,
}

impl HeadlessHandle {
    /// Creation order on its surface; stable for the handle's lifetime.
    pub fn serial(&self) -> u64 {
        self.serial
    }

    /// Current text.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Current color.
    pub fn color(&self) -> Rgba {
        self.color
    }

    /// Current position.
    pub fn position(&self) -> Point {
        self.position
    }
}

impl RenderHandle for HeadlessHandle {
    fn set_text(&mut self, text: &str) {
        self.text.clear();
        self.text.push_str(text);
    }

    fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }

    fn set_position(&mut self, position: Point) {
        self.position = position;
    }

    fn measure(&self) -> Size {
        let metrics = self.metrics.get();
        let chars = self.text.chars().count() as f32;
        Size::new(chars * metrics.glyph_width, metrics.line_height)
    }

    fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    fn is_active(&self) -> bool {
        self.active
    }
}

/// Fixed-step driver that records what the scheduler did.
#[derive(Debug)]
pub struct ScheduleSimulator<S: Surface> {
    scheduler: Scheduler<S>,
    step: Duration,
    placements: Vec<Placement>,
    denials: u64,
    ticks: u64,
}

impl ScheduleSimulator<HeadlessSurface> {
    /// A simulator over a fresh scheduler on a headless surface.
    pub fn headless(surface: HeadlessSurface, config: SchedulerConfig, step: Duration) -> Self {
        Self::new(Scheduler::new(surface, config), step)
    }
}

impl<S: Surface> ScheduleSimulator<S> {
    /// Wrap an existing scheduler.
    pub fn new(scheduler: Scheduler<S>, step: Duration) -> Self {
        Self {
            scheduler,
            step,
            placements: Vec::new(),
            denials: 0,
            ticks: 0,
        }
    }

    /// Submit a request to the wrapped scheduler.
    pub fn submit_text(&mut self, text: impl Into<String>, color: Rgba) -> crate::RequestId {
        self.scheduler.submit_text(text, color)
    }

    /// Advance one frame.
    pub fn step(&mut self) -> Result<TickReport, SchedulerError> {
        let report = self.scheduler.tick(self.step)?;
        self.ticks += 1;
        if let Some(placement) = report.placement {
            self.placements.push(placement);
        }
        if report.denied {
            self.denials += 1;
        }
        Ok(report)
    }

    /// Advance frames until at least `span` of clock time has passed.
    pub fn run_for(&mut self, span: Duration) -> Result<(), SchedulerError> {
        let until = self.scheduler.now().saturating_add(span);
        while self.scheduler.now() < until {
            self.step()?;
            if self.step.is_zero() {
                break;
            }
        }
        Ok(())
    }

    /// Advance until the queue is empty, giving up after `limit` of clock
    /// time. Returns whether the queue drained.
    pub fn run_until_drained(&mut self, limit: Duration) -> Result<bool, SchedulerError> {
        let until = self.scheduler.now().saturating_add(limit);
        while self.scheduler.queue_len() > 0 {
            if self.scheduler.now() >= until || self.step.is_zero() {
                return Ok(false);
            }
            self.step()?;
        }
        Ok(true)
    }

    /// Whether idle plus active handles account for every allocation.
    pub fn pool_is_closed(&self) -> bool {
        self.scheduler.pool().idle_len() + self.scheduler.active_messages().len()
            == self.scheduler.pool().allocated()
    }

    /// Every placement so far, in order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Denied attempts so far.
    pub fn denials(&self) -> u64 {
        self.denials
    }

    /// Successful ticks so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// The wrapped scheduler.
    pub fn scheduler(&self) -> &Scheduler<S> {
        &self.scheduler
    }

    /// The wrapped scheduler, mutably.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler<S> {
        &mut self.scheduler
    }
}
