#![forbid(unsafe_code)]

//! ANSI escape sequence helpers.
//!
//! Pure byte generation; the [`Presenter`](crate::presenter::Presenter)
//! tracks terminal state.
//!
//! | Sequence | Description |
//! |----------|-------------|
//! | `ESC [ 0 m` | SGR reset |
//! | `ESC [ 38;2;r;g;b m` | true-color foreground |
//! | `ESC [ 48;2;r;g;b m` | true-color background |
//! | `ESC [ row ; col H` | cursor position (1-indexed) |
//! | `ESC [ 2 J` | erase display |
//! | `ESC [ ? 25 l/h` | hide/show cursor |
//! | `ESC [ ? 2026 h/l` | synchronized output |

use std::io::{self, Write};

use danmaku_core::Rgba;

/// SGR reset: `CSI 0 m`
pub const SGR_RESET: &[u8] = b"\x1b[0m";

/// Begin synchronized output: `CSI ? 2026 h`
pub const SYNC_BEGIN: &[u8] = b"\x1b[?2026h";

/// End synchronized output: `CSI ? 2026 l`
pub const SYNC_END: &[u8] = b"\x1b[?2026l";

/// Write SGR reset.
#[inline]
pub fn sgr_reset<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SGR_RESET)
}

/// True-color foreground: `CSI 38;2;r;g;b m`
pub fn sgr_fg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[38;2;{r};{g};{b}m")
}

/// True-color background: `CSI 48;2;r;g;b m`
pub fn sgr_bg_rgb<W: Write>(w: &mut W, r: u8, g: u8, b: u8) -> io::Result<()> {
    write!(w, "\x1b[48;2;{r};{g};{b}m")
}

/// Foreground for an [`Rgba`]; transparent selects the terminal default.
pub fn sgr_fg<W: Write>(w: &mut W, color: Rgba) -> io::Result<()> {
    if color.a() == 0 {
        return w.write_all(b"\x1b[39m");
    }
    sgr_fg_rgb(w, color.r(), color.g(), color.b())
}

/// Background for an [`Rgba`]; transparent selects the terminal default.
pub fn sgr_bg<W: Write>(w: &mut W, color: Rgba) -> io::Result<()> {
    if color.a() == 0 {
        return w.write_all(b"\x1b[49m");
    }
    sgr_bg_rgb(w, color.r(), color.g(), color.b())
}

/// CUP: `CSI row ; col H`. Inputs are 0-indexed.
pub fn cup<W: Write>(w: &mut W, row: u16, col: u16) -> io::Result<()> {
    write!(
        w,
        "\x1b[{};{}H",
        row.saturating_add(1),
        col.saturating_add(1)
    )
}

/// Erase the whole display: `CSI 2 J`
#[inline]
pub fn erase_display<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[2J")
}

/// Hide the cursor: `CSI ? 25 l`
#[inline]
pub fn cursor_hide<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[?25l")
}

/// Show the cursor: `CSI ? 25 h`
#[inline]
pub fn cursor_show<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(b"\x1b[?25h")
}

/// Begin synchronized output.
#[inline]
pub fn sync_begin<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_BEGIN)
}

/// End synchronized output.
#[inline]
pub fn sync_end<W: Write>(w: &mut W) -> io::Result<()> {
    w.write_all(SYNC_END)
}
