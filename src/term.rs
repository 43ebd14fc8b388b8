//! Terminal control: the exact escape sequences the player emits, the
//! window-size query, and the idempotent restore guard that puts the
//! terminal back the way we found it.

use std::io::{self, Write};

/// Hide / show the cursor.
pub const CURSOR_HIDE: &str = "\x1b[?25l";
pub const CURSOR_SHOW: &str = "\x1b[?25h";
/// Erase the whole screen.
pub const CLEAR_SCREEN: &str = "\x1b[2J";
/// Move the cursor to the top-left corner. Written before every frame.
pub const CURSOR_HOME: &str = "\x1b[H";
/// Erase the scrollback buffer. Inline-image payloads otherwise pile up
/// there and keep the memory alive after playback.
pub const CLEAR_SCROLLBACK: &str = "\x1b[3J";
/// Reset all character attributes.
pub const RESET: &str = "\x1b[0m";

/// Grid fallback when the size ioctl fails (not a tty, CI).
const FALLBACK_COLS: u16 = 80;
const FALLBACK_ROWS: u16 = 24;

/// Terminal size in character cells, from the controlling terminal's
/// window-size ioctl.
pub fn terminal_cells() -> (u16, u16) {
    match crossterm::terminal::size() {
        Ok((cols, rows)) if cols > 0 && rows > 0 => (cols, rows),
        _ => (FALLBACK_COLS, FALLBACK_ROWS),
    }
}

/// Pixel grid available to the half-block encoder: one column per
/// pixel, two pixel rows per character row.
pub fn block_pixel_grid() -> (u32, u32) {
    let (cols, rows) = terminal_cells();
    (u32::from(cols), u32::from(rows) * 2)
}

/// Switches the terminal into playback state on construction and
/// restores it exactly once, either explicitly or on drop. Restoration
/// is idempotent: the second call is a no-op.
pub struct ScreenGuard {
    clear_scrollback: bool,
    restored: bool,
}

impl ScreenGuard {
    /// Hide the cursor and clear to home. `clear_scrollback` is set in
    /// high-resolution mode only.
    pub fn enter(out: &mut impl Write, clear_scrollback: bool) -> io::Result<Self> {
        write!(out, "{CURSOR_HIDE}{CLEAR_SCREEN}{CURSOR_HOME}")?;
        out.flush()?;
        Ok(Self {
            clear_scrollback,
            restored: false,
        })
    }

    /// Restore cursor visibility and formatting, clear the screen, and
    /// in high-resolution mode drop the scrollback too.
    pub fn restore(&mut self, out: &mut impl Write) -> io::Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        write!(out, "{RESET}{CLEAR_SCREEN}")?;
        if self.clear_scrollback {
            write!(out, "{CLEAR_SCROLLBACK}")?;
        }
        write!(out, "{CURSOR_HOME}{CURSOR_SHOW}")?;
        out.flush()
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        if !self.restored {
            let _ = self.restore(&mut io::stdout());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_sequences_are_verbatim() {
        assert_eq!(CURSOR_HIDE, "\u{1b}[?25l");
        assert_eq!(CURSOR_SHOW, "\u{1b}[?25h");
        assert_eq!(CLEAR_SCREEN, "\u{1b}[2J");
        assert_eq!(CURSOR_HOME, "\u{1b}[H");
        assert_eq!(CLEAR_SCROLLBACK, "\u{1b}[3J");
        assert_eq!(RESET, "\u{1b}[0m");
    }

    #[test]
    fn enter_hides_cursor_and_clears() {
        let mut out = Vec::new();
        let mut guard = ScreenGuard::enter(&mut out, false).unwrap();
        assert_eq!(out, b"\x1b[?25l\x1b[2J\x1b[H");
        guard.restore(&mut out).unwrap();
    }

    #[test]
    fn restore_is_idempotent() {
        let mut out = Vec::new();
        let mut guard = ScreenGuard::enter(&mut out, false).unwrap();
        out.clear();

        guard.restore(&mut out).unwrap();
        let first = out.clone();
        assert!(!first.is_empty());

        guard.restore(&mut out).unwrap();
        assert_eq!(out, first, "second restore should emit nothing");
    }

    #[test]
    fn restore_clears_scrollback_only_when_asked() {
        let mut plain = Vec::new();
        let mut guard = ScreenGuard::enter(&mut plain, false).unwrap();
        plain.clear();
        guard.restore(&mut plain).unwrap();
        assert!(!String::from_utf8(plain).unwrap().contains("\x1b[3J"));

        let mut hires = Vec::new();
        let mut guard = ScreenGuard::enter(&mut hires, true).unwrap();
        hires.clear();
        guard.restore(&mut hires).unwrap();
        assert!(String::from_utf8(hires).unwrap().contains("\x1b[3J"));
    }
}
