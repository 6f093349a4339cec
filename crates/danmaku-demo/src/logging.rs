#![forbid(unsafe_code)]

//! Log file setup.
//!
//! The terminal is busy drawing frames, so tracing output only ever goes to
//! a file. Without `--log-file` no subscriber is installed.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "DANMAKU_LOG";

const DEFAULT_FILTER: &str = "danmaku=debug";

/// Build the filter from `DANMAKU_LOG`, falling back to debug output for
/// the danmaku targets.
pub fn filter() -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Append tracing output to `path`.
pub fn init(path: &Path) -> io::Result<()> {
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    tracing_subscriber::fmt()
        .with_env_filter(filter())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(io::Error::other)
}
