#![forbid(unsafe_code)]

//! The interactive showcase.
//!
//! Every frame: feed the producer's output into the scheduler, tick it,
//! compose the active messages into a cell buffer, add a status row and
//! present only the cells that changed. The bottom row is the status line;
//! everything above it is the stage the scheduler lays lanes on.

use std::io::{self, Write};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use danmaku_core::Rgba;
use danmaku_render::{Buffer, BufferDiff, Cell, CellSurface, PresentStats, Presenter, compose};
use danmaku_runtime::lanes::active_lane_count;
use danmaku_runtime::{
    Clamped, RetryPolicy, Scheduler, SchedulerConfig, SchedulerError, SchedulerState,
};

use crate::cli::{Opts, RetryMode};
use crate::producer::Producer;
use crate::session::TerminalSession;

/// Comments submitted by one press of `b`.
const BURST_SIZE: usize = 12;

/// Speed factor applied by `f` and `s`.
const SPEED_STEP: f32 = 1.25;

const STATUS_FG: Rgba = Rgba::rgb(200, 200, 200);
const STATUS_BG: Rgba = Rgba::rgb(40, 40, 60);
const WARNING_FG: Rgba = Rgba::rgb(255, 120, 80);

/// Whether the event loop keeps going.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    Continue,
    Quit,
}

/// Demo state, independent of the real terminal.
#[derive(Debug)]
pub struct App {
    scheduler: Scheduler<CellSurface>,
    producer: Producer,
    auto: bool,
    retry: RetryMode,
    last_clamped: Clamped,
    frame: Buffer,
    previous: Buffer,
    columns: u16,
    rows: u16,
    needs_clear: bool,
}

impl App {
    /// Build the demo for a terminal of `columns` x `rows`.
    pub fn new(opts: &Opts, columns: u16, rows: u16) -> Self {
        let (stage_columns, stage_rows) = stage(columns, rows);
        let mut surface = CellSurface::new(stage_columns, stage_rows);
        if stage_columns == 0 || stage_rows == 0 {
            surface.detach();
        }
        let mut scheduler = Scheduler::new(surface, opts.scheduler_config());
        scheduler.prewarm(opts.lanes.saturating_mul(2).min(64));
        Self {
            scheduler,
            producer: Producer::new(opts.seed, opts.rate),
            auto: opts.auto,
            retry: opts.retry,
            last_clamped: Clamped::empty(),
            frame: Buffer::new(columns, rows),
            previous: Buffer::new(columns, rows),
            columns,
            rows,
            needs_clear: true,
        }
    }

    /// Route one terminal event.
    pub fn handle_event(&mut self, event: Event) -> Control {
        match event {
            Event::Key(key) => self.handle_key(key),
            Event::Resize(columns, rows) => {
                self.resize(columns, rows);
                Control::Continue
            }
            _ => Control::Continue,
        }
    }

    /// Apply a key press.
    pub fn handle_key(&mut self, key: KeyEvent) -> Control {
        if key.kind == KeyEventKind::Release {
            return Control::Continue;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                return Control::Quit;
            }
            KeyCode::Char('q') | KeyCode::Esc => return Control::Quit,
            KeyCode::Char('b') => {
                for request in self.producer.burst(BURST_SIZE) {
                    self.scheduler.submit(request);
                }
            }
            KeyCode::Char('a') => self.auto = !self.auto,
            KeyCode::Char('+') | KeyCode::Char('=') => {
                self.update_settings(|config| {
                    config.lane_count = config.lane_count.saturating_add(1);
                });
            }
            KeyCode::Char('-') => {
                self.update_settings(|config| {
                    config.lane_count = config.lane_count.saturating_sub(1);
                });
            }
            KeyCode::Char('f') => {
                self.update_settings(|config| config.speed_px_per_sec *= SPEED_STEP);
            }
            KeyCode::Char('s') => {
                self.update_settings(|config| config.speed_px_per_sec /= SPEED_STEP);
            }
            KeyCode::Char('r') => {
                self.retry = match self.retry {
                    RetryMode::Poll => RetryMode::Exact,
                    RetryMode::Exact => RetryMode::Poll,
                };
                let policy = self.retry.policy();
                self.update_settings(|config| config.retry = policy);
            }
            _ => {}
        }
        Control::Continue
    }

    fn update_settings(&mut self, edit: impl FnOnce(&mut SchedulerConfig)) {
        let mut config = self.scheduler.config().clone();
        edit(&mut config);
        self.last_clamped = self.scheduler.apply_settings(config);
    }

    /// Follow a terminal resize.
    ///
    /// A terminal too small for a stage detaches the surface, which halts
    /// the scheduler on its next tick. Growing back installs a fresh surface
    /// and the backlog resumes draining.
    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.columns = columns;
        self.rows = rows;
        self.frame.resize(columns, rows);
        self.previous.resize(columns, rows);
        self.needs_clear = true;

        let (stage_columns, stage_rows) = stage(columns, rows);
        if stage_columns == 0 || stage_rows == 0 {
            self.scheduler.surface_mut().detach();
        } else if self.scheduler.state() == SchedulerState::Halted
            || !self.scheduler.surface().is_attached()
        {
            self.scheduler.reinitialize(CellSurface::new(stage_columns, stage_rows));
            tracing::debug!(target: "danmaku.demo", columns, rows, "stage restored");
        } else {
            self.scheduler.surface_mut().resize(stage_columns, stage_rows);
        }
    }

    /// Produce and schedule for one frame of length `dt`.
    pub fn update(&mut self, dt: Duration) {
        if self.auto {
            for request in self.producer.poll(dt) {
                self.scheduler.submit(request);
            }
        }
        match self.scheduler.tick(dt) {
            Ok(_) => {}
            // Logged when the stage collapsed; the next resize revives it.
            Err(SchedulerError::SurfaceUnavailable) => {}
        }
    }

    /// Compose the next frame.
    pub fn render(&mut self) {
        self.frame.clear();
        compose(&mut self.frame, self.scheduler.active_messages());
        self.render_status();
    }

    fn render_status(&mut self) {
        let Some(y) = self.rows.checked_sub(1) else {
            return;
        };
        let line = self.status_line();
        let row = i32::from(y);
        for x in 0..self.columns {
            self.frame.set(x, y, Cell::default().with_bg(STATUS_BG));
        }
        let fg = if self.scheduler.state() == SchedulerState::Halted {
            WARNING_FG
        } else {
            STATUS_FG
        };
        self.frame.draw_text(0, row, &line, fg);
    }

    /// The text of the status row.
    pub fn status_line(&self) -> String {
        if self.scheduler.state() == SchedulerState::Halted {
            return format!(
                " surface lost, {} queued; enlarge the terminal to resume",
                self.scheduler.queue_len()
            );
        }
        let stats = self.scheduler.stats();
        let config = self.scheduler.config();
        let (_, stage_rows) = stage(self.columns, self.rows);
        let band_height = f32::from(stage_rows) * config.band_height_percent / 100.0;
        let lanes = active_lane_count(config.lane_count, band_height, 1.0 + config.lane_spacing_px);
        let retry = match config.retry {
            RetryPolicy::FixedPoll(_) => "poll",
            RetryPolicy::ExactWake => "exact",
        };
        let mut line = format!(
            " queue {}  active {}  lanes {}/{}  speed {:.0}  placed {}  denied {}  wait {}ms  {}  {}",
            stats.queue_length,
            stats.active_messages,
            lanes,
            config.lane_count,
            config.speed_px_per_sec,
            stats.total_placed,
            stats.total_denials,
            stats.mean_wait().as_millis(),
            retry,
            if self.auto { "auto" } else { "paused" },
        );
        if !self.last_clamped.is_empty() {
            line.push_str("  (clamped)");
        }
        line
    }

    /// Write the cells that changed since the last frame.
    pub fn present<W: Write>(&mut self, presenter: &mut Presenter<W>) -> io::Result<PresentStats> {
        if self.needs_clear {
            presenter.clear_screen()?;
            self.previous.clear();
            self.needs_clear = false;
        }
        let diff = BufferDiff::compute(&self.previous, &self.frame);
        let stats = presenter.present(&self.frame, &diff)?;
        std::mem::swap(&mut self.previous, &mut self.frame);
        Ok(stats)
    }

    pub fn scheduler(&self) -> &Scheduler<CellSurface> {
        &self.scheduler
    }

    pub fn is_auto(&self) -> bool {
        self.auto
    }

    /// The most recently composed frame, before presenting.
    pub fn frame(&self) -> &Buffer {
        &self.frame
    }
}

/// Stage size for a terminal: everything above the status row.
fn stage(columns: u16, rows: u16) -> (u16, u16) {
    (columns, rows.saturating_sub(1))
}

/// Run the demo on the real terminal until the user quits.
pub fn run(opts: &Opts) -> io::Result<()> {
    let session = TerminalSession::new()?;
    let (columns, rows) = session.size()?;
    let mut app = App::new(opts, columns, rows);
    let mut presenter = Presenter::new(io::stdout());

    let period = opts.frame_period();
    let exit_after = (opts.exit_after_ms > 0).then(|| Duration::from_millis(opts.exit_after_ms));
    let started = Instant::now();
    let mut last = started;

    tracing::info!(
        target: "danmaku.demo",
        columns,
        rows,
        lanes = opts.lanes,
        fps = opts.fps,
        "demo started"
    );

    'frames: loop {
        let deadline = last + period;
        loop {
            let timeout = deadline.saturating_duration_since(Instant::now());
            if timeout.is_zero() || !event::poll(timeout)? {
                break;
            }
            if app.handle_event(event::read()?) == Control::Quit {
                break 'frames;
            }
        }

        let now = Instant::now();
        app.update(now.duration_since(last));
        last = now;
        app.render();
        app.present(&mut presenter)?;

        if exit_after.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
    }

    let stats = app.scheduler().stats();
    tracing::info!(
        target: "danmaku.demo",
        submitted = stats.total_submitted,
        placed = stats.total_placed,
        denials = stats.total_denials,
        mean_wait_ms = stats.mean_wait().as_millis() as u64,
        max_wait_ms = stats.max_wait.as_millis() as u64,
        "demo finished"
    );
    drop(session);
    Ok(())
}
