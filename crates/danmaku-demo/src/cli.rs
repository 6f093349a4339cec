#![forbid(unsafe_code)]

//! Command-line argument parsing for the demo.
//!
//! Flags are parsed by hand. Every flag also has a `DANMAKU_DEMO_*`
//! environment override; explicit flags win over the environment.

use std::fmt;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use danmaku_runtime::config::DEFAULT_RETRY_DELAY;
use danmaku_runtime::{RetryPolicy, SchedulerConfig};

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const HELP_TEXT: &str = "\
danmaku-demo: scrolling comments on lanes, in your terminal

USAGE:
    danmaku-demo [OPTIONS]

OPTIONS:
    --lanes=N            Configured lane count (default: 8)
    --speed=N            Scroll speed in cells per second (default: 24)
    --gap=N              Minimum gap between messages in cells (default: 4)
    --interval-ms=N      Minimum delay between placements (default: 150)
    --retry=POLICY       'poll' (default) or 'exact'
    --rate=N             Auto producer messages per second (default: 6)
    --seed=N             Producer seed (default: 0)
    --fps=N              Frames per second (default: 30)
    --no-auto            Start with the auto producer paused
    --log-file=PATH      Write tracing output to PATH
    --exit-after-ms=N    Quit after N milliseconds (0 = never)
    --help, -h           Show this help message
    --version, -V        Show version

KEYBINDINGS:
    b               Submit a burst of comments
    a               Pause or resume the auto producer
    + / -           Add or remove a lane
    f / s           Scroll faster or slower
    r               Switch between poll and exact-wake retry
    q / Esc / Ctrl+C  Quit

ENVIRONMENT VARIABLES:
    DANMAKU_DEMO_LANES          Override --lanes
    DANMAKU_DEMO_SPEED          Override --speed
    DANMAKU_DEMO_GAP            Override --gap
    DANMAKU_DEMO_INTERVAL_MS    Override --interval-ms
    DANMAKU_DEMO_RETRY          Override --retry
    DANMAKU_DEMO_RATE           Override --rate
    DANMAKU_DEMO_SEED           Override --seed
    DANMAKU_DEMO_FPS            Override --fps
    DANMAKU_DEMO_LOG_FILE       Override --log-file
    DANMAKU_DEMO_EXIT_AFTER_MS  Auto-quit after N milliseconds (for testing)
    DANMAKU_LOG                 Tracing filter, e.g. 'danmaku=debug'";

/// Retry policy as chosen on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryMode {
    Poll,
    Exact,
}

impl RetryMode {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "poll" => Some(Self::Poll),
            "exact" => Some(Self::Exact),
            _ => None,
        }
    }

    pub fn policy(self) -> RetryPolicy {
        match self {
            Self::Poll => RetryPolicy::FixedPoll(DEFAULT_RETRY_DELAY),
            Self::Exact => RetryPolicy::ExactWake,
        }
    }
}

/// Parsed command-line options.
#[derive(Debug, Clone, PartialEq)]
pub struct Opts {
    /// Configured lane count.
    pub lanes: usize,
    /// Scroll speed in cells per second.
    pub speed: f32,
    /// Minimum horizontal gap in cells.
    pub gap: f32,
    /// Minimum delay between placements.
    pub interval_ms: u64,
    pub retry: RetryMode,
    /// Auto producer messages per second.
    pub rate: f64,
    pub seed: u64,
    pub fps: u32,
    /// Whether the auto producer starts running.
    pub auto: bool,
    pub log_file: Option<PathBuf>,
    /// Auto-exit after this many milliseconds (0 = disabled).
    pub exit_after_ms: u64,
}

impl Default for Opts {
    fn default() -> Self {
        Self {
            lanes: 8,
            speed: 24.0,
            gap: 4.0,
            interval_ms: 150,
            retry: RetryMode::Poll,
            rate: 6.0,
            seed: 0,
            fps: 30,
            auto: true,
            log_file: None,
            exit_after_ms: 0,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Run(Opts),
    Help,
    Version,
}

/// A flag the parser could not accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliError {
    InvalidValue { flag: &'static str, value: String },
    UnknownArgument(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidValue { flag, value } => write!(f, "Invalid {flag} value: {value}"),
            Self::UnknownArgument(arg) => write!(f, "Unknown argument: {arg}"),
        }
    }
}

impl std::error::Error for CliError {}

fn value<T: std::str::FromStr>(flag: &'static str, raw: &str) -> Result<T, CliError> {
    raw.parse().map_err(|_| CliError::InvalidValue {
        flag,
        value: raw.to_string(),
    })
}

impl Opts {
    /// Parse the process arguments and environment.
    ///
    /// Prints help or version and exits when asked to; prints the error and
    /// exits with status 1 on a bad flag.
    pub fn parse() -> Self {
        let args = std::env::args().skip(1);
        match Self::parse_from(args, |key| std::env::var(key).ok()) {
            Ok(Command::Run(opts)) => opts,
            Ok(Command::Help) => {
                println!("{HELP_TEXT}");
                process::exit(0);
            }
            Ok(Command::Version) => {
                println!("danmaku-demo {VERSION}");
                process::exit(0);
            }
            Err(err) => {
                eprintln!("{err}");
                eprintln!("Run with --help for usage information.");
                process::exit(1);
            }
        }
    }

    /// Parse `args` with `env` as the environment lookup.
    ///
    /// Unparseable environment values are ignored; unparseable flags are
    /// errors.
    pub fn parse_from<I, F>(args: I, env: F) -> Result<Command, CliError>
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(val) = env("DANMAKU_DEMO_LANES")
            && let Ok(n) = val.parse()
        {
            opts.lanes = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_SPEED")
            && let Ok(n) = val.parse()
        {
            opts.speed = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_GAP")
            && let Ok(n) = val.parse()
        {
            opts.gap = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_INTERVAL_MS")
            && let Ok(n) = val.parse()
        {
            opts.interval_ms = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_RETRY")
            && let Some(mode) = RetryMode::parse(&val)
        {
            opts.retry = mode;
        }
        if let Some(val) = env("DANMAKU_DEMO_RATE")
            && let Ok(n) = val.parse()
        {
            opts.rate = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_SEED")
            && let Ok(n) = val.parse()
        {
            opts.seed = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_FPS")
            && let Ok(n) = val.parse()
        {
            opts.fps = n;
        }
        if let Some(val) = env("DANMAKU_DEMO_LOG_FILE")
            && !val.is_empty()
        {
            opts.log_file = Some(PathBuf::from(val));
        }
        if let Some(val) = env("DANMAKU_DEMO_EXIT_AFTER_MS")
            && let Ok(n) = val.parse()
        {
            opts.exit_after_ms = n;
        }

        for arg in args {
            match arg.as_ref() {
                "--help" | "-h" => return Ok(Command::Help),
                "--version" | "-V" => return Ok(Command::Version),
                "--no-auto" => opts.auto = false,
                other => {
                    if let Some(val) = other.strip_prefix("--lanes=") {
                        opts.lanes = value("--lanes", val)?;
                    } else if let Some(val) = other.strip_prefix("--speed=") {
                        opts.speed = value("--speed", val)?;
                    } else if let Some(val) = other.strip_prefix("--gap=") {
                        opts.gap = value("--gap", val)?;
                    } else if let Some(val) = other.strip_prefix("--interval-ms=") {
                        opts.interval_ms = value("--interval-ms", val)?;
                    } else if let Some(val) = other.strip_prefix("--retry=") {
                        opts.retry =
                            RetryMode::parse(val).ok_or_else(|| CliError::InvalidValue {
                                flag: "--retry",
                                value: val.to_string(),
                            })?;
                    } else if let Some(val) = other.strip_prefix("--rate=") {
                        opts.rate = value("--rate", val)?;
                    } else if let Some(val) = other.strip_prefix("--seed=") {
                        opts.seed = value("--seed", val)?;
                    } else if let Some(val) = other.strip_prefix("--fps=") {
                        opts.fps = value("--fps", val)?;
                    } else if let Some(val) = other.strip_prefix("--log-file=") {
                        opts.log_file = Some(PathBuf::from(val));
                    } else if let Some(val) = other.strip_prefix("--exit-after-ms=") {
                        opts.exit_after_ms = value("--exit-after-ms", val)?;
                    } else {
                        return Err(CliError::UnknownArgument(other.to_string()));
                    }
                }
            }
        }

        Ok(Command::Run(opts))
    }

    /// Frame period, with the frame rate held to 1..=240.
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs(1) / self.fps.clamp(1, 240)
    }

    /// Scheduler settings for a terminal where one cell is one pixel.
    ///
    /// The band covers the whole drawing area; the status row sits outside it.
    pub fn scheduler_config(&self) -> SchedulerConfig {
        SchedulerConfig::default()
            .with_lane_count(self.lanes)
            .with_speed(self.speed)
            .with_min_gap(self.gap)
            .with_spawn_interval(Duration::from_millis(self.interval_ms))
            .with_band(0.0, 100.0)
            .with_edge_margin(1.0)
            .with_lane_spacing(0.0)
            .with_retry(self.retry.policy())
            .with_fades(Duration::from_millis(200), Duration::from_millis(300))
    }
}
