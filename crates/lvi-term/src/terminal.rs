// SPDX-License-Identifier: MIT
//
// Terminal control: raw mode, size queries, and guaranteed restore.
//
// Safety: termios (tcgetattr, tcsetattr), ioctl (TIOCGWINSZ), isatty and
// the raw fd write in the panic path have no safe std equivalent. Each
// unsafe block wraps exactly one libc call.
#![allow(unsafe_code)]
//
// The editor cannot run without a terminal on stdin. `enter` refuses with
// "tty is required" in that case, before anything on screen changes.
//
// While active the terminal is in raw mode with auto-wrap disabled (and,
// by default, on the alternate screen). Three paths put it back:
// `leave`, the `Drop` impl, and a process-wide panic hook that writes a
// prebuilt restore sequence straight to fd 1 without taking the stdout
// lock.

use std::io::{self, Write};
use std::sync::Once;

use bitflags::bitflags;

use crate::ansi;

// ─── Size ───────────────────────────────────────────────────────────────────

/// Terminal dimensions in character cells, as the OS reports them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Size {
    /// Width in cells.
    pub cols: u16,
    /// Height in cells, including the row the editor uses for status.
    pub rows: u16,
}

impl Size {
    /// Fallback when the OS cannot tell us.
    pub const FALLBACK: Self = Self { cols: 80, rows: 24 };
}

// ─── Terminal Queries ───────────────────────────────────────────────────────

/// Query the current terminal size via `ioctl(TIOCGWINSZ)`.
///
/// Returns `None` if stdout is not a terminal or reports a zero dimension.
#[cfg(unix)]
#[must_use]
pub fn get_size() -> Option<Size> {
    let mut ws: libc::winsize = unsafe { std::mem::zeroed() };
    let result = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut ws) };

    (result == 0 && ws.ws_col > 0 && ws.ws_row > 0).then_some(Size {
        cols: ws.ws_col,
        rows: ws.ws_row,
    })
}

#[cfg(not(unix))]
#[must_use]
pub fn get_size() -> Option<Size> {
    None
}

/// Whether stdin is connected to a terminal.
#[cfg(unix)]
#[must_use]
pub fn is_tty() -> bool {
    unsafe { libc::isatty(libc::STDIN_FILENO) != 0 }
}

#[cfg(not(unix))]
#[must_use]
pub fn is_tty() -> bool {
    false
}

// ─── Features ───────────────────────────────────────────────────────────────

bitflags! {
    /// Optional screen behaviour switched on by [`Terminal::enter`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Features: u8 {
        /// Draw on the alternate screen so the shell scrollback survives.
        const ALT_SCREEN   = 0b0000_0001;
        /// Turn auto-wrap off while active.
        const NO_LINE_WRAP = 0b0000_0010;
    }
}

impl Default for Features {
    fn default() -> Self {
        Self::ALT_SCREEN | Self::NO_LINE_WRAP
    }
}

// ─── Restore Paths ──────────────────────────────────────────────────────────

/// Everything `leave` undoes, as one byte string: full-screen scroll
/// region, auto-wrap on, default attributes, visible cursor, main screen.
/// The screen switch comes last.
#[rustfmt::skip]
const EMERGENCY_RESTORE: &[u8] = b"\
    \x1b[r\
    \x1b[?7h\
    \x1b[0m\
    \x1b[?25h\
    \x1b[?1049l";

static HOOK: Once = Once::new();

/// Chain a panic hook in front of the current one. It puts the screen and
/// the line discipline back first, so the panic message is readable.
fn hook_panics() {
    HOOK.call_once(|| {
        let previous = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            write_restore_sequence();
            raw::restore_saved();
            previous(info);
        }));
    });
}

/// Raw write to fd 1. The panicking thread may hold the stdout lock.
fn write_restore_sequence() {
    #[cfg(unix)]
    unsafe {
        let _ = libc::write(
            libc::STDOUT_FILENO,
            EMERGENCY_RESTORE.as_ptr().cast::<libc::c_void>(),
            EMERGENCY_RESTORE.len(),
        );
    }

    #[cfg(not(unix))]
    {
        let mut out = io::stdout();
        let _ = out.write_all(EMERGENCY_RESTORE).and_then(|()| out.flush());
    }
}

// ─── Line Discipline ────────────────────────────────────────────────────────

#[cfg(unix)]
mod raw {
    use std::io;
    use std::sync::Mutex;

    /// Copy of the cooked settings, reachable from the panic hook.
    static SAVED: Mutex<Option<libc::termios>> = Mutex::new(None);

    fn read(fd: libc::c_int) -> io::Result<libc::termios> {
        let mut t: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &raw mut t) } == 0 {
            Ok(t)
        } else {
            Err(io::Error::last_os_error())
        }
    }

    fn write(fd: libc::c_int, t: &libc::termios) -> io::Result<()> {
        if unsafe { libc::tcsetattr(fd, libc::TCSAFLUSH, t) } == 0 {
            Ok(())
        } else {
            Err(io::Error::last_os_error())
        }
    }

    /// `cooked` with input processing, output processing, echo, canonical
    /// lines and signal keys turned off. Reads return after one byte.
    fn rawify(cooked: &libc::termios) -> libc::termios {
        let mut t = *cooked;
        let input_off = libc::IGNBRK
            | libc::BRKINT
            | libc::PARMRK
            | libc::ISTRIP
            | libc::INLCR
            | libc::IGNCR
            | libc::ICRNL
            | libc::IXON;
        let local_off = libc::ECHO | libc::ECHONL | libc::ICANON | libc::ISIG | libc::IEXTEN;
        t.c_iflag &= !input_off;
        t.c_oflag &= !libc::OPOST;
        t.c_lflag &= !local_off;
        t.c_cflag = (t.c_cflag & !(libc::CSIZE | libc::PARENB)) | libc::CS8;
        t.c_cc[libc::VMIN] = 1;
        t.c_cc[libc::VTIME] = 0;
        t
    }

    /// Switch stdin to raw mode and return the settings it had before.
    pub(super) fn enable() -> io::Result<libc::termios> {
        let fd = libc::STDIN_FILENO;
        let cooked = read(fd)?;
        if let Ok(mut slot) = SAVED.lock() {
            *slot = Some(cooked);
        }
        write(fd, &rawify(&cooked))?;
        Ok(cooked)
    }

    pub(super) fn disable(cooked: &libc::termios) -> io::Result<()> {
        write(libc::STDIN_FILENO, cooked)?;
        if let Ok(mut slot) = SAVED.lock() {
            slot.take();
        }
        Ok(())
    }

    /// Best effort, for the panic hook.
    pub(super) fn restore_saved() {
        let Ok(slot) = SAVED.lock() else { return };
        if let Some(cooked) = slot.as_ref() {
            let _ = write(libc::STDIN_FILENO, cooked);
        }
    }

}

#[cfg(not(unix))]
mod raw {
    pub(super) const fn restore_saved() {}
}

// ─── Terminal ───────────────────────────────────────────────────────────────

/// Terminal handle with RAII cleanup.
///
/// ```no_run
/// use lvi_term::terminal::{Features, Terminal};
///
/// let mut term = Terminal::new();
/// term.enter(Features::default())?;
/// // ... draw, read bytes ...
/// term.leave()?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct Terminal {
    /// Cooked settings to put back on `leave`.
    #[cfg(unix)]
    cooked: Option<libc::termios>,

    /// Last size seen; refresh with [`refresh_size`](Self::refresh_size).
    size: Size,

    /// Features switched on by the current `enter`, if active.
    active: Option<Features>,
}

impl Terminal {
    /// Create a handle and query the current size (80×24 if unknown).
    /// Nothing on the terminal changes until [`enter`](Self::enter).
    #[must_use]
    pub fn new() -> Self {
        Self {
            #[cfg(unix)]
            cooked: None,
            size: get_size().unwrap_or(Size::FALLBACK),
            active: None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.size
    }

    /// Re-query the size from the OS and cache it. Keeps the previous
    /// value if the query fails.
    pub fn refresh_size(&mut self) -> Size {
        if let Some(s) = get_size() {
            self.size = s;
        }
        self.size
    }

    #[inline]
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Take over the terminal: raw mode, then the requested features.
    ///
    /// Idempotent while active.
    ///
    /// # Errors
    ///
    /// Fails with "tty is required" when stdin is not a terminal, or with
    /// the OS error if termios or the initial output fails.
    pub fn enter(&mut self, features: Features) -> io::Result<()> {
        if self.active.is_some() {
            return Ok(());
        }
        if !is_tty() {
            return Err(io::Error::other("tty is required"));
        }

        hook_panics();
        self.raw_on()?;
        self.active = Some(features);

        let mut out = io::stdout().lock();
        if features.contains(Features::ALT_SCREEN) {
            ansi::enter_alt_screen(&mut out)?;
        }
        if features.contains(Features::NO_LINE_WRAP) {
            ansi::disable_line_wrap(&mut out)?;
        }
        ansi::clear_screen(&mut out)?;
        out.flush()?;

        tracing::debug!(?features, size = ?self.size, "terminal entered");
        Ok(())
    }

    /// Give the terminal back in the state we found it. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if output or the termios restore fails.
    pub fn leave(&mut self) -> io::Result<()> {
        let Some(features) = self.active.take() else {
            return Ok(());
        };

        let mut out = io::stdout().lock();
        ansi::reset_scroll_region(&mut out)?;
        if features.contains(Features::NO_LINE_WRAP) {
            ansi::enable_line_wrap(&mut out)?;
        }
        ansi::reset(&mut out)?;
        ansi::cursor_show(&mut out)?;
        if features.contains(Features::ALT_SCREEN) {
            ansi::exit_alt_screen(&mut out)?;
        }
        out.flush()?;
        drop(out);

        self.raw_off()?;
        tracing::debug!("terminal left");
        Ok(())
    }

    #[cfg(unix)]
    fn raw_on(&mut self) -> io::Result<()> {
        self.cooked = Some(raw::enable()?);
        Ok(())
    }

    #[cfg(unix)]
    fn raw_off(&mut self) -> io::Result<()> {
        self.cooked.take().map_or(Ok(()), |cooked| raw::disable(&cooked))
    }

    #[cfg(not(unix))]
    fn raw_on(&mut self) -> io::Result<()> {
        Ok(())
    }

    #[cfg(not(unix))]
    fn raw_off(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Default for Terminal {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        let _ = self.leave();
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
