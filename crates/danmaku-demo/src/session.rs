#![forbid(unsafe_code)]

//! Terminal session lifecycle.
//!
//! [`TerminalSession`] puts the terminal in raw mode on the alternate screen
//! with the cursor hidden, and undoes all of it on drop. A panic hook
//! restores the terminal before the panic message prints, so a crash never
//! leaves the shell in raw mode.

use std::io::{self, Write};
use std::sync::OnceLock;

/// RAII guard for raw mode and the alternate screen.
#[derive(Debug)]
pub struct TerminalSession {
    raw_mode: bool,
    alternate_screen: bool,
    cursor_hidden: bool,
}

impl TerminalSession {
    /// Enter raw mode and the alternate screen.
    ///
    /// If a later step fails, the steps already taken are undone before the
    /// error is returned.
    pub fn new() -> io::Result<Self> {
        install_panic_hook();

        let mut session = Self {
            raw_mode: false,
            alternate_screen: false,
            cursor_hidden: false,
        };
        let mut stdout = io::stdout();

        crossterm::terminal::enable_raw_mode()?;
        session.raw_mode = true;
        tracing::info!(target: "danmaku.session", "raw mode enabled");

        crossterm::execute!(stdout, crossterm::terminal::EnterAlternateScreen)?;
        session.alternate_screen = true;

        crossterm::execute!(stdout, crossterm::cursor::Hide)?;
        session.cursor_hidden = true;

        Ok(session)
    }

    /// Current terminal size as (columns, rows).
    pub fn size(&self) -> io::Result<(u16, u16)> {
        crossterm::terminal::size()
    }

    fn cleanup(&mut self) {
        let mut stdout = io::stdout();

        // Reverse order of enabling
        if self.cursor_hidden {
            let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
            self.cursor_hidden = false;
        }

        if self.alternate_screen {
            let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
            self.alternate_screen = false;
        }

        if self.raw_mode {
            let _ = crossterm::terminal::disable_raw_mode();
            self.raw_mode = false;
            tracing::info!(target: "danmaku.session", "raw mode disabled");
        }

        let _ = stdout.flush();
    }
}

impl Drop for TerminalSession {
    fn drop(&mut self) {
        self.cleanup();
    }
}

fn install_panic_hook() {
    static HOOK: OnceLock<()> = OnceLock::new();
    HOOK.get_or_init(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            best_effort_cleanup();
            previous(info);
        }));
    });
}

fn best_effort_cleanup() {
    let mut stdout = io::stdout();

    let _ = crossterm::execute!(stdout, crossterm::cursor::Show);
    let _ = crossterm::execute!(stdout, crossterm::terminal::LeaveAlternateScreen);
    let _ = crossterm::terminal::disable_raw_mode();
    let _ = stdout.flush();
}
